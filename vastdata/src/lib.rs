pub mod api;
pub mod config;
pub mod engine;
pub mod logging;
pub mod provider_data;
pub mod resources;
pub mod versions;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tfplug::context::Context;
use tfplug::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, ProviderSchemaRequest,
    ProviderSchemaResponse,
};
use tfplug::types::Diagnostic;
use tfplug::{
    DataSourceFactory, Provider, ProviderMetadataRequest, ProviderMetadataResponse,
    ResourceFactory,
};

use crate::config::ProviderConfig;
use crate::versions::ClusterVersion;

pub use provider_data::VastProviderData;

pub struct VastProvider {
    provider_data: Option<VastProviderData>,
}

impl Default for VastProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl VastProvider {
    pub fn new() -> Self {
        Self {
            provider_data: None,
        }
    }

    pub fn provider_data(&self) -> Option<&VastProviderData> {
        self.provider_data.as_ref()
    }
}

#[async_trait]
impl Provider for VastProvider {
    fn type_name(&self) -> &str {
        "vastdata"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ProviderMetadataRequest,
    ) -> ProviderMetadataResponse {
        ProviderMetadataResponse {
            type_name: self.type_name().to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ProviderSchemaRequest,
    ) -> ProviderSchemaResponse {
        ProviderSchemaResponse {
            schema: config::schema(),
            diagnostics: vec![],
        }
    }

    async fn configure(
        &mut self,
        ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        let mut diagnostics = vec![];

        let config = match ProviderConfig::from_config(&request.config) {
            Ok(config) => config,
            Err(errors) => {
                return ConfigureProviderResponse {
                    diagnostics: errors,
                    provider_data: None,
                };
            }
        };

        let client = match api::Client::new(
            &config.endpoint,
            config.credentials,
            config.skip_ssl_verify,
        ) {
            Ok(client) => client,
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "Failed to create API client",
                    e.to_string(),
                ));
                return ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                };
            }
        };

        if let Err(e) = ctx.check() {
            diagnostics.push(Diagnostic::error("Operation cancelled", e.to_string()));
            return ConfigureProviderResponse {
                diagnostics,
                provider_data: None,
            };
        }

        let cluster_version = match client
            .cluster_version()
            .await
            .map_err(|e| e.to_string())
            .and_then(|raw| ClusterVersion::parse(&raw).map_err(|e| e.to_string()))
        {
            Ok(version) => version,
            Err(reason) => {
                diagnostics.push(Diagnostic::error("Error obtaining cluster version", reason));
                return ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                };
            }
        };

        tracing::info!("Cluster version found: {}", cluster_version);
        versions::warn_on_mismatch(&cluster_version);
        if let Some(warning) = versions::compatibility_warning(&cluster_version) {
            diagnostics.push(Diagnostic::warning("Cluster version mismatch", warning));
        }

        let provider_data =
            VastProviderData::new(client, cluster_version, config.validation_mode);
        self.provider_data = Some(provider_data.clone());

        ConfigureProviderResponse {
            diagnostics,
            provider_data: Some(Arc::new(provider_data)),
        }
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        resources::factories()
    }

    fn data_sources(&self) -> HashMap<String, DataSourceFactory> {
        resources::data_source_factories()
    }
}
