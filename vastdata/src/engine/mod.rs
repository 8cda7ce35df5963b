//! Generic CRUD engine shared by every VAST resource

pub mod crud;
pub mod data_source;
pub mod descriptor;
pub mod projector;
pub mod resource;

pub use crud::Engine;
pub use data_source::VastDataSource;
pub use descriptor::{
    object_of, to_dynamic, AttributeKind, AttributeSpec, DomainObject, FallbackPolicy, Hooks,
    ImportKey, Lookup, Mode, NestedField, Payload, Primitive, ResourceDescriptor,
};
pub use projector::{extract, extract_changes, project, StateBag};
pub use resource::VastResource;
