//! Terraform resource backed by a resource descriptor

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ImportedResource,
    ReadResourceRequest, ReadResourceResponse, Resource, ResourceMetadataRequest,
    ResourceMetadataResponse, ResourceSchemaRequest, ResourceSchemaResponse,
    ResourceWithConfigure, ResourceWithImportState, UpdateResourceRequest,
    UpdateResourceResponse, ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::types::Diagnostic;

use super::crud::Engine;
use super::descriptor::{DomainObject, ResourceDescriptor};
use crate::provider_data::VastProviderData;

pub struct VastResource<T: 'static> {
    descriptor: &'static ResourceDescriptor<T>,
    provider_data: Option<VastProviderData>,
}

impl<T: DomainObject> VastResource<T> {
    pub fn new(descriptor: &'static ResourceDescriptor<T>) -> Self {
        Self {
            descriptor,
            provider_data: None,
        }
    }

    fn engine(&self, diagnostics: &mut Vec<Diagnostic>) -> Option<Engine<'_, T>> {
        match &self.provider_data {
            Some(data) => Some(Engine::new(data, self.descriptor)),
            None => {
                diagnostics.push(Diagnostic::error(
                    "Provider not configured",
                    "Provider data was not properly configured",
                ));
                None
            }
        }
    }
}

#[async_trait]
impl<T: DomainObject> Resource for VastResource<T> {
    fn type_name(&self) -> &str {
        self.descriptor.type_name
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ResourceMetadataRequest,
    ) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        ResourceSchemaResponse {
            schema: self.descriptor.schema(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        ValidateResourceConfigResponse {
            diagnostics: self.descriptor.validate(&request.config),
        }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let mut diagnostics = vec![];

        let new_state = match self.engine(&mut diagnostics) {
            Some(engine) => engine.create(&ctx, &request.config, &mut diagnostics).await,
            None => None,
        };

        CreateResourceResponse {
            new_state: new_state.unwrap_or(request.planned_state),
            diagnostics,
        }
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let mut diagnostics = vec![];

        let new_state = match self.engine(&mut diagnostics) {
            Some(engine) => engine.read(&ctx, &request.current_state, &mut diagnostics).await,
            None => Some(request.current_state),
        };

        ReadResourceResponse {
            new_state,
            diagnostics,
        }
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let mut diagnostics = vec![];

        let new_state = match self.engine(&mut diagnostics) {
            Some(engine) => {
                engine
                    .update(
                        &ctx,
                        &request.prior_state,
                        &request.planned_state,
                        &mut diagnostics,
                    )
                    .await
            }
            None => request.prior_state,
        };

        UpdateResourceResponse {
            new_state,
            diagnostics,
        }
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let mut diagnostics = vec![];

        if let Some(engine) = self.engine(&mut diagnostics) {
            engine
                .delete(&ctx, &request.prior_state, &mut diagnostics)
                .await;
        }

        DeleteResourceResponse { diagnostics }
    }
}

#[async_trait]
impl<T: DomainObject> ResourceWithConfigure for VastResource<T> {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        let mut diagnostics = vec![];

        if let Some(data) = request.provider_data {
            if let Some(provider_data) = data.downcast_ref::<VastProviderData>() {
                self.provider_data = Some(provider_data.clone());
            } else {
                diagnostics.push(Diagnostic::error(
                    "Invalid provider data",
                    "Failed to extract VastProviderData from provider data",
                ));
            }
        } else {
            diagnostics.push(Diagnostic::error(
                "No provider data",
                "No provider data was provided to the resource",
            ));
        }

        ConfigureResourceResponse { diagnostics }
    }
}

#[async_trait]
impl<T: DomainObject> ResourceWithImportState for VastResource<T> {
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut diagnostics = vec![];

        let state = match self.engine(&mut diagnostics) {
            Some(engine) => engine.import(&ctx, &request.id, &mut diagnostics).await,
            None => None,
        };

        ImportResourceStateResponse {
            imported_resources: state
                .map(|state| ImportedResource {
                    type_name: request.type_name,
                    state,
                })
                .into_iter()
                .collect(),
            diagnostics,
        }
    }
}
