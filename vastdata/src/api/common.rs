//! Common types and utilities for the VAST REST API

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use super::error::ApiError;

/// Every resource lives under this prefix
pub const API_PREFIX: &str = "/api";

/// Collection path, e.g. `/api/qospolicies/`
pub fn collection_path(resource: &str) -> String {
    format!("{}/{}/", API_PREFIX, resource.trim_matches('/'))
}

/// Item path, e.g. `/api/qospolicies/7/`
pub fn item_path(resource: &str, id: i64) -> String {
    format!("{}/{}/{}/", API_PREFIX, resource.trim_matches('/'), id)
}

/// Error bodies are either `{"detail": "..."}` or a map of field errors
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub detail: Option<String>,
    #[serde(flatten)]
    pub fields: HashMap<String, Value>,
}

#[derive(Debug, thiserror::Error)]
#[error("API error details: detail={detail:?}, field_errors={field_errors:?}")]
pub struct ApiErrorDetails {
    pub detail: Option<String>,
    pub field_errors: Option<HashMap<String, Vec<String>>>,
}

impl From<ApiErrorResponse> for ApiErrorDetails {
    fn from(response: ApiErrorResponse) -> Self {
        let field_errors: HashMap<String, Vec<String>> = response
            .fields
            .into_iter()
            .filter_map(|(field, value)| match value {
                Value::Array(items) => Some((
                    field,
                    items
                        .iter()
                        .filter_map(|i| i.as_str().map(str::to_string))
                        .collect(),
                )),
                Value::String(s) => Some((field, vec![s])),
                _ => None,
            })
            .collect();

        Self {
            detail: response.detail,
            field_errors: (!field_errors.is_empty()).then_some(field_errors),
        }
    }
}

/// List endpoints answer with a bare array or a paginated `{"results": [...]}` page
pub fn list_items(value: Value) -> Result<Vec<Value>, ApiError> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut page) => match page.remove("results") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(ApiError::ParseError(
                "expected a list or an object with a 'results' list".to_string(),
            )),
        },
        Value::Null => Ok(Vec::new()),
        other => Err(ApiError::ParseError(format!(
            "expected a list response, got {}",
            other
        ))),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiQueryParams {
    params: Vec<(String, String)>,
}

impl ApiQueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn add_optional<K: Into<String>, V: ToString>(mut self, key: K, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.params.push((key.into(), v.to_string()));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn to_query_string(&self) -> String {
        if self.params.is_empty() {
            String::new()
        } else {
            format!(
                "?{}",
                self.params
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
                    .collect::<Vec<_>>()
                    .join("&")
            )
        }
    }
}
