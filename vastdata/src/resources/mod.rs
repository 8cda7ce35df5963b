//! Resource descriptors and the registry mapping type names to them

pub mod qos_policy;
pub mod s3_policy;
pub mod snapshot;
pub mod tenant;
pub mod view_policy;
pub mod vip_pool;

use std::collections::BTreeMap;
use std::sync::OnceLock;
use tfplug::{
    ConfigurableResource, DataSourceFactory, DataSourceWithConfigure, ResourceFactory, Schema,
};

use crate::engine::{VastDataSource, VastResource};

/// One registered resource type and its data source
pub struct RegistryEntry {
    pub type_name: &'static str,
    pub schema: fn() -> Schema,
    pub create: fn() -> Box<dyn ConfigurableResource>,
    pub data_source: fn() -> Box<dyn DataSourceWithConfigure>,
}

macro_rules! register {
    ($module:ident) => {
        RegistryEntry {
            type_name: $module::TYPE_NAME,
            schema: || $module::descriptor().schema(),
            create: || {
                Box::new(VastResource::new($module::descriptor())) as Box<dyn ConfigurableResource>
            },
            data_source: || {
                Box::new(VastDataSource::new($module::descriptor()))
                    as Box<dyn DataSourceWithConfigure>
            },
        }
    };
}

/// Every resource the provider serves, keyed by type name
pub fn registry() -> &'static BTreeMap<&'static str, RegistryEntry> {
    static REGISTRY: OnceLock<BTreeMap<&'static str, RegistryEntry>> = OnceLock::new();

    REGISTRY.get_or_init(|| {
        [
            register!(qos_policy),
            register!(s3_policy),
            register!(snapshot),
            register!(tenant),
            register!(view_policy),
            register!(vip_pool),
        ]
        .into_iter()
        .map(|entry| (entry.type_name, entry))
        .collect()
    })
}

pub fn schema(type_name: &str) -> Option<Schema> {
    registry().get(type_name).map(|entry| (entry.schema)())
}

pub fn factories() -> std::collections::HashMap<String, ResourceFactory> {
    registry()
        .values()
        .map(|entry| {
            let create = entry.create;
            let factory: ResourceFactory = Box::new(move || create());
            (entry.type_name.to_string(), factory)
        })
        .collect()
}

pub fn data_source_factories() -> std::collections::HashMap<String, DataSourceFactory> {
    registry()
        .values()
        .map(|entry| {
            let build = entry.data_source;
            let factory: DataSourceFactory = Box::new(move || build());
            (entry.type_name.to_string(), factory)
        })
        .collect()
}
