//! Default value providers for attributes
//!
//! A default is consulted when an optional attribute is absent from the
//! configuration. `EnvDefault` reads an environment variable first, which is
//! how provider-level settings such as the cluster host are usually supplied.

use crate::schema::{Default, DefaultRequest, DefaultResponse};
use crate::types::Dynamic;
use std::env;
use std::sync::Arc;

/// StaticDefault provides a fixed value
pub struct StaticDefault {
    value: Dynamic,
}

impl StaticDefault {
    pub fn create(value: Dynamic) -> Arc<dyn Default> {
        Arc::new(Self { value })
    }

    pub fn string(value: &str) -> Arc<dyn Default> {
        Self::create(Dynamic::String(value.to_string()))
    }

    pub fn number(value: f64) -> Arc<dyn Default> {
        Self::create(Dynamic::Number(value))
    }

    pub fn bool(value: bool) -> Arc<dyn Default> {
        Self::create(Dynamic::Bool(value))
    }

    pub fn empty_list() -> Arc<dyn Default> {
        Self::create(Dynamic::List(vec![]))
    }
}

impl Default for StaticDefault {
    fn description(&self) -> String {
        format!("static default value: {:?}", self.value)
    }

    fn default_value(&self, _request: DefaultRequest) -> DefaultResponse {
        DefaultResponse {
            value: self.value.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum EnvKind {
    String,
    Number,
    Bool,
}

/// EnvDefault gets the default value from an environment variable.
/// The variable is parsed according to the attribute type; a value that
/// does not parse is ignored in favour of the fallback.
pub struct EnvDefault {
    env_var: String,
    kind: EnvKind,
    fallback: Dynamic,
}

impl EnvDefault {
    pub fn string(env_var: &str, fallback: Option<&str>) -> Arc<dyn Default> {
        Arc::new(Self {
            env_var: env_var.to_string(),
            kind: EnvKind::String,
            fallback: fallback.map(Dynamic::from).unwrap_or(Dynamic::Null),
        })
    }

    pub fn number(env_var: &str, fallback: f64) -> Arc<dyn Default> {
        Arc::new(Self {
            env_var: env_var.to_string(),
            kind: EnvKind::Number,
            fallback: Dynamic::Number(fallback),
        })
    }

    pub fn bool(env_var: &str, fallback: bool) -> Arc<dyn Default> {
        Arc::new(Self {
            env_var: env_var.to_string(),
            kind: EnvKind::Bool,
            fallback: Dynamic::Bool(fallback),
        })
    }

    fn parse(&self, raw: String) -> Option<Dynamic> {
        match self.kind {
            EnvKind::String => Some(Dynamic::String(raw)),
            EnvKind::Number => raw.trim().parse::<f64>().ok().map(Dynamic::Number),
            EnvKind::Bool => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => Some(Dynamic::Bool(true)),
                "0" | "false" | "no" => Some(Dynamic::Bool(false)),
                _ => None,
            },
        }
    }
}

impl Default for EnvDefault {
    fn description(&self) -> String {
        format!(
            "default from environment variable {} (fallback: {:?})",
            self.env_var, self.fallback
        )
    }

    fn default_value(&self, _request: DefaultRequest) -> DefaultResponse {
        let value = env::var(&self.env_var)
            .ok()
            .filter(|raw| !raw.is_empty())
            .and_then(|raw| self.parse(raw))
            .unwrap_or_else(|| self.fallback.clone());

        DefaultResponse { value }
    }
}
