//! tfplug - Terraform Plugin Framework for Rust
//!
//! Values, schemas, diagnostics and the async provider, resource and data
//! source traits a Terraform provider is written against.

// Core modules
pub mod context;
pub mod error;
pub mod schema;
pub mod types;

// Provider API modules
pub mod data_source;
pub mod provider;
pub mod resource;

// Helper modules
pub mod defaults;
pub mod validator;

pub use context::Context;
pub use data_source::{DataSource, DataSourceWithConfigure};
pub use error::{Result, TfplugError};
pub use provider::{
    DataSourceFactory, Provider, ProviderMetadataRequest, ProviderMetadataResponse,
    ResourceFactory,
};
pub use resource::{
    ConfigurableResource, Resource, ResourceWithConfigure, ResourceWithImportState,
};
pub use schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
pub use types::{AttributePath, Diagnostic, DiagnosticSeverity, Dynamic, DynamicValue};
