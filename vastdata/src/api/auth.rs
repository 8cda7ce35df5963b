//! Credentials and JWT session handling

use serde::Deserialize;
use std::fmt;
use std::time::{Duration, Instant};

pub const TOKEN_PATH: &str = "/api/token/";
pub const TOKEN_REFRESH_PATH: &str = "/api/token/refresh/";

/// Access tokens are renewed once they are this old
pub const TOKEN_REFRESH_AFTER: Duration = Duration::from_secs(10 * 60);

#[derive(Clone, PartialEq)]
pub enum Credentials {
    /// Sent as `Api-Token {token}`
    ApiToken(String),
    /// Exchanged for a JWT session on first use
    UserPassword { username: String, password: String },
}

impl Credentials {
    pub fn uses_session(&self) -> bool {
        matches!(self, Credentials::UserPassword { .. })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::ApiToken(_) => f.write_str("ApiToken(****)"),
            Credentials::UserPassword { username, .. } => f
                .debug_struct("UserPassword")
                .field("username", username)
                .field("password", &"****")
                .finish(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access: String,
    pub refresh: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct Session {
    pub access: String,
    pub refresh: String,
    pub issued_at: Instant,
}

impl Session {
    pub fn new(access: String, refresh: String) -> Self {
        Self {
            access,
            refresh,
            issued_at: Instant::now(),
        }
    }

    pub fn is_stale(&self) -> bool {
        self.issued_at.elapsed() >= TOKEN_REFRESH_AFTER
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access)
    }
}
