//! Request-scoped cancellation
//!
//! Every lifecycle call receives a `Context` as its first argument. Clones
//! share one cancellation flag.

use crate::error::{Result, TfplugError};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    done: watch::Receiver<bool>,
    done_tx: watch::Sender<bool>,
}

impl Context {
    pub fn new() -> Self {
        let (done_tx, done) = watch::channel(false);

        Self {
            inner: Arc::new(ContextInner { done, done_tx }),
        }
    }

    /// Err once the context has been cancelled
    pub fn check(&self) -> Result<()> {
        if *self.inner.done.borrow() {
            return Err(TfplugError::Custom("context cancelled".to_string()));
        }
        Ok(())
    }

    pub fn cancel(&self) {
        let _ = self.inner.done_tx.send(true);
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
