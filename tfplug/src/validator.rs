//! Built-in attribute validators

use crate::schema::{Validator, ValidatorRequest, ValidatorResponse};
use crate::types::{Diagnostic, Dynamic};
use std::sync::Arc;

/// String value must be one of a fixed set
pub struct OneOf {
    allowed: Vec<String>,
}

impl OneOf {
    pub fn create(allowed: &[&str]) -> Arc<dyn Validator> {
        Arc::new(Self {
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
        })
    }
}

impl Validator for OneOf {
    fn description(&self) -> String {
        format!("value must be one of: {}", self.allowed.join(", "))
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let mut diagnostics = vec![];
        if let Dynamic::String(s) = &request.config_value {
            if !self.allowed.iter().any(|a| a == s) {
                diagnostics.push(
                    Diagnostic::error(
                        format!("Invalid value for {}", request.path),
                        format!("Got '{}', expected one of: {}", s, self.allowed.join(", ")),
                    )
                    .with_attribute(request.path),
                );
            }
        }
        ValidatorResponse { diagnostics }
    }
}

/// String value must match a regular expression
pub struct StringPattern {
    pattern: regex::Regex,
    description: String,
}

impl StringPattern {
    /// Fails on an invalid expression so callers can surface it at registration time
    pub fn create(
        pattern: &str,
        description: &str,
    ) -> std::result::Result<Arc<dyn Validator>, regex::Error> {
        Ok(Arc::new(Self {
            pattern: regex::Regex::new(pattern)?,
            description: description.to_string(),
        }))
    }
}

impl Validator for StringPattern {
    fn description(&self) -> String {
        format!("value must match {}", self.description)
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let mut diagnostics = vec![];
        if let Dynamic::String(s) = &request.config_value {
            if !self.pattern.is_match(s) {
                diagnostics.push(
                    Diagnostic::error(
                        format!("{} must match {}", request.path, self.description),
                        format!("Value '{}' does not match pattern", s),
                    )
                    .with_attribute(request.path),
                );
            }
        }
        ValidatorResponse { diagnostics }
    }
}

/// Numeric value within inclusive bounds
pub struct NumberRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumberRange {
    pub fn create(min: Option<f64>, max: Option<f64>) -> Arc<dyn Validator> {
        Arc::new(Self { min, max })
    }
}

impl Validator for NumberRange {
    fn description(&self) -> String {
        format!("value must be within {:?}..={:?}", self.min, self.max)
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let mut diagnostics = vec![];
        if let Dynamic::Number(n) = request.config_value {
            if let Some(min) = self.min.filter(|min| n < *min) {
                diagnostics.push(
                    Diagnostic::error(
                        format!("{} must be at least {}", request.path, min),
                        format!("Got {}", n),
                    )
                    .with_attribute(request.path.clone()),
                );
            }
            if let Some(max) = self.max.filter(|max| n > *max) {
                diagnostics.push(
                    Diagnostic::error(
                        format!("{} must be at most {}", request.path, max),
                        format!("Got {}", n),
                    )
                    .with_attribute(request.path),
                );
            }
        }
        ValidatorResponse { diagnostics }
    }
}
