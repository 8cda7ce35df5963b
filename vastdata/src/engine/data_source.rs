//! Terraform data source backed by a resource descriptor

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource,
    DataSourceMetadataRequest, DataSourceMetadataResponse, DataSourceSchemaRequest,
    DataSourceSchemaResponse, DataSourceWithConfigure, ReadDataSourceRequest,
    ReadDataSourceResponse, ValidateDataSourceConfigRequest, ValidateDataSourceConfigResponse,
};
use tfplug::types::Diagnostic;

use super::crud::Engine;
use super::descriptor::{DomainObject, ResourceDescriptor};
use crate::provider_data::VastProviderData;

/// Looks up one existing object by the descriptor's lookup keys. Shares the
/// resource's type name.
pub struct VastDataSource<T: 'static> {
    descriptor: &'static ResourceDescriptor<T>,
    provider_data: Option<VastProviderData>,
}

impl<T: DomainObject> VastDataSource<T> {
    pub fn new(descriptor: &'static ResourceDescriptor<T>) -> Self {
        Self {
            descriptor,
            provider_data: None,
        }
    }
}

#[async_trait]
impl<T: DomainObject> DataSource for VastDataSource<T> {
    fn type_name(&self) -> &str {
        self.descriptor.type_name
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: DataSourceMetadataRequest,
    ) -> DataSourceMetadataResponse {
        DataSourceMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        DataSourceSchemaResponse {
            schema: self.descriptor.data_source_schema(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateDataSourceConfigRequest,
    ) -> ValidateDataSourceConfigResponse {
        ValidateDataSourceConfigResponse {
            diagnostics: self.descriptor.data_source_schema().validate(&request.config),
        }
    }

    async fn read(&self, ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let mut diagnostics = vec![];

        let Some(provider_data) = &self.provider_data else {
            diagnostics.push(Diagnostic::error(
                "Provider not configured",
                "Provider data was not properly configured",
            ));
            return ReadDataSourceResponse {
                state: request.config,
                diagnostics,
            };
        };

        let found = Engine::new(provider_data, self.descriptor)
            .lookup(&ctx, &request.config, &mut diagnostics)
            .await;

        ReadDataSourceResponse {
            state: found.unwrap_or(request.config),
            diagnostics,
        }
    }
}

#[async_trait]
impl<T: DomainObject> DataSourceWithConfigure for VastDataSource<T> {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        let mut diagnostics = vec![];

        match request.provider_data {
            Some(data) => match data.downcast_ref::<VastProviderData>() {
                Some(provider_data) => self.provider_data = Some(provider_data.clone()),
                None => diagnostics.push(Diagnostic::error(
                    "Invalid provider data",
                    "Failed to extract VastProviderData from provider data",
                )),
            },
            None => diagnostics.push(Diagnostic::error(
                "No provider data",
                "No provider data was provided to the data source",
            )),
        }

        ConfigureDataSourceResponse { diagnostics }
    }
}
