//! Provider configuration: schema, environment fallbacks and resolution

use tfplug::defaults::EnvDefault;
use tfplug::schema::DefaultRequest;
use tfplug::validator::NumberRange;
use tfplug::{AttributeBuilder, AttributePath, AttributeType, Diagnostic, Dynamic, DynamicValue};
use tfplug::{Schema, SchemaBuilder};

use crate::api::Credentials;
use crate::versions::ValidationMode;

pub const HOST_ENV: &str = "VASTDATA_HOST";
pub const PORT_ENV: &str = "VASTDATA_PORT";
pub const SKIP_SSL_VERIFY_ENV: &str = "VASTDATA_VERIFY_SSL";
pub const USERNAME_ENV: &str = "VASTDATA_CLUSTER_USERNAME";
pub const PASSWORD_ENV: &str = "VASTDATA_CLUSTER_PASSWORD";
pub const API_TOKEN_ENV: &str = "VASTDATA_API_TOKEN";
pub const VALIDATION_MODE_ENV: &str = "VERSION_VALIDATION_MODE";

pub const DEFAULT_PORT: u16 = 443;

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Base URL of the cluster's management API
    pub endpoint: String,
    pub credentials: Credentials,
    pub skip_ssl_verify: bool,
    pub validation_mode: ValidationMode,
}

pub fn schema() -> Schema {
    SchemaBuilder::new()
        .description("Interact with a VAST Data cluster through its REST API")
        .attribute(
            AttributeBuilder::new("host", AttributeType::String)
                .description("The VAST cluster management host, optionally with a scheme. Falls back to VASTDATA_HOST")
                .optional()
                .default(EnvDefault::string(HOST_ENV, None))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("port", AttributeType::Number)
                .description("The management API port. Falls back to VASTDATA_PORT, then 443")
                .optional()
                .validator(NumberRange::create(Some(1.0), Some(65535.0)))
                .default(EnvDefault::number(PORT_ENV, DEFAULT_PORT as f64))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("skip_ssl_verify", AttributeType::Bool)
                .description("Skip TLS certificate verification. Falls back to VASTDATA_VERIFY_SSL")
                .optional()
                .default(EnvDefault::bool(SKIP_SSL_VERIFY_ENV, false))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("username", AttributeType::String)
                .description("Cluster user name. Falls back to VASTDATA_CLUSTER_USERNAME")
                .optional()
                .default(EnvDefault::string(USERNAME_ENV, None))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("password", AttributeType::String)
                .description("Cluster password. Falls back to VASTDATA_CLUSTER_PASSWORD")
                .optional()
                .sensitive()
                .default(EnvDefault::string(PASSWORD_ENV, None))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("api_token", AttributeType::String)
                .description("API token, used instead of username and password when set. Falls back to VASTDATA_API_TOKEN")
                .optional()
                .sensitive()
                .default(EnvDefault::string(API_TOKEN_ENV, None))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("version_validation_mode", AttributeType::String)
                .description("warn or strict. In strict mode, fields unknown to the cluster version abort create and update. Falls back to VERSION_VALIDATION_MODE")
                .optional()
                .default(EnvDefault::string(VALIDATION_MODE_ENV, Some("warn")))
                .build(),
        )
        .build()
}

impl ProviderConfig {
    /// Resolves the configuration, falling back to each attribute's default.
    /// Every problem found is reported, not only the first.
    pub fn from_config(config: &DynamicValue) -> Result<Self, Vec<Diagnostic>> {
        let schema = schema();
        let mut diagnostics = schema.validate(config);
        let resolved = Resolved {
            schema: &schema,
            config,
        };

        let host = resolved.string("host");
        let port = resolved.number("port");
        let skip_ssl_verify = resolved.bool("skip_ssl_verify").unwrap_or(false);
        let username = resolved.string("username");
        let password = resolved.string("password");
        let api_token = resolved.string("api_token");
        let mode = resolved
            .string("version_validation_mode")
            .unwrap_or_else(|| ValidationMode::default().to_string());

        let endpoint = match host {
            Some(host) => match endpoint(&host, port) {
                Ok(endpoint) => Some(endpoint),
                Err(reason) => {
                    diagnostics.push(
                        Diagnostic::error("Invalid port", reason)
                            .with_attribute(AttributePath::new("port")),
                    );
                    None
                }
            },
            None => {
                diagnostics.push(
                    Diagnostic::error(
                        "Missing host",
                        format!(
                            "host is required (set it in the provider configuration or {})",
                            HOST_ENV
                        ),
                    )
                    .with_attribute(AttributePath::new("host")),
                );
                None
            }
        };

        let credentials = match (api_token, username, password) {
            (Some(token), _, _) => Some(Credentials::ApiToken(token)),
            (None, Some(username), Some(password)) => {
                Some(Credentials::UserPassword { username, password })
            }
            _ => {
                diagnostics.push(Diagnostic::error(
                    "Missing credentials",
                    format!(
                        "either api_token ({}) or username and password ({}, {}) must be provided",
                        API_TOKEN_ENV, USERNAME_ENV, PASSWORD_ENV
                    ),
                ));
                None
            }
        };

        let validation_mode = match mode.parse::<ValidationMode>() {
            Ok(mode) => Some(mode),
            Err(reason) => {
                diagnostics.push(
                    Diagnostic::error("Invalid version validation mode", reason)
                        .with_attribute(AttributePath::new("version_validation_mode")),
                );
                None
            }
        };

        match (endpoint, credentials, validation_mode) {
            (Some(endpoint), Some(credentials), Some(validation_mode))
                if !tfplug::types::has_errors(&diagnostics) =>
            {
                Ok(Self {
                    endpoint,
                    credentials,
                    skip_ssl_verify,
                    validation_mode,
                })
            }
            _ => Err(diagnostics),
        }
    }
}

/// `https://{host}:{port}` unless the host already names a scheme
fn endpoint(host: &str, port: Option<f64>) -> Result<String, String> {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        return Ok(host.to_string());
    }

    let port = port.unwrap_or(DEFAULT_PORT as f64);
    if port.fract() != 0.0 || !(1.0..=65535.0).contains(&port) {
        return Err(format!("{} is not a valid TCP port", port));
    }
    Ok(format!("https://{}:{}", host, port as u16))
}

/// Configured values with schema defaults applied
struct Resolved<'a> {
    schema: &'a Schema,
    config: &'a DynamicValue,
}

impl Resolved<'_> {
    fn value(&self, name: &str) -> Option<Dynamic> {
        let path = AttributePath::new(name);
        match self.config.get(&path) {
            None | Some(Dynamic::Null) | Some(Dynamic::Unknown) => self
                .schema
                .attribute(name)
                .and_then(|attr| attr.default.as_ref())
                .map(|default| default.default_value(DefaultRequest { path }).value),
            Some(value) => Some(value.clone()),
        }
    }

    fn string(&self, name: &str) -> Option<String> {
        match self.value(name) {
            Some(Dynamic::String(s)) if !s.trim().is_empty() => Some(s),
            _ => None,
        }
    }

    fn number(&self, name: &str) -> Option<f64> {
        self.value(name).and_then(|v| v.as_f64())
    }

    fn bool(&self, name: &str) -> Option<bool> {
        self.value(name).and_then(|v| v.as_bool())
    }
}
