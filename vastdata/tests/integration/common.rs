//! Shared fixtures for the engine integration tests

use mockito::{Matcher, Server};
use std::sync::Arc;
use tfplug::context::Context;
use tfplug::data_source::{ConfigureDataSourceRequest, DataSourceWithConfigure};
use tfplug::resource::{ConfigureResourceRequest, ResourceWithConfigure};
use tfplug::types::{AttributePath, Dynamic, DynamicValue};
use vastdata::api::{Client, Credentials};
use vastdata::engine::{DomainObject, ResourceDescriptor, VastDataSource, VastResource};
use vastdata::versions::{ClusterVersion, ValidationMode, BUILD_VERSION};
use vastdata::VastProviderData;

pub const TOKEN: &str = "secret";

pub fn provider_data(
    server: &Server,
    version: ClusterVersion,
    mode: ValidationMode,
) -> VastProviderData {
    let client = Client::new(&server.url(), Credentials::ApiToken(TOKEN.to_string()), false)
        .unwrap();
    VastProviderData::new(client, version, mode)
}

/// Resource configured against `server` on a cluster running the build version
pub async fn resource<T: DomainObject>(
    server: &Server,
    descriptor: &'static ResourceDescriptor<T>,
) -> VastResource<T> {
    resource_on(server, descriptor, BUILD_VERSION, ValidationMode::Warn).await
}

pub async fn resource_on<T: DomainObject>(
    server: &Server,
    descriptor: &'static ResourceDescriptor<T>,
    version: ClusterVersion,
    mode: ValidationMode,
) -> VastResource<T> {
    let mut resource = VastResource::new(descriptor);
    let response = resource
        .configure(
            Context::new(),
            ConfigureResourceRequest {
                provider_data: Some(Arc::new(provider_data(server, version, mode))),
            },
        )
        .await;
    assert!(response.diagnostics.is_empty());
    resource
}

/// Data source configured against `server` on a cluster running the build version
pub async fn data_source<T: DomainObject>(
    server: &Server,
    descriptor: &'static ResourceDescriptor<T>,
) -> VastDataSource<T> {
    let mut data_source = VastDataSource::new(descriptor);
    let response = data_source
        .configure(
            Context::new(),
            ConfigureDataSourceRequest {
                provider_data: Some(Arc::new(provider_data(
                    server,
                    BUILD_VERSION,
                    ValidationMode::Warn,
                ))),
            },
        )
        .await;
    assert!(response.diagnostics.is_empty());
    data_source
}

pub fn state(pairs: &[(&str, Dynamic)]) -> DynamicValue {
    let mut state = DynamicValue::empty_object();
    for (name, value) in pairs {
        state
            .set_value(&AttributePath::new(name), value.clone())
            .unwrap();
    }
    state
}

pub fn string(state: &DynamicValue, name: &str) -> String {
    state.get_string(&AttributePath::new(name)).unwrap()
}

/// Matches `GET /api/{path}/?key=value...` whatever the parameter order
pub fn list_query(path: &str, query: &[(&str, &str)]) -> (Matcher, Matcher) {
    (
        Matcher::Regex(format!(r"^/api/{}/(\?.*)?$", path)),
        Matcher::AllOf(
            query
                .iter()
                .map(|(k, v)| Matcher::UrlEncoded(k.to_string(), v.to_string()))
                .collect(),
        ),
    )
}
