//! Snapshot resource

use serde::Deserialize;
use std::sync::OnceLock;
use tfplug::validator::StringPattern;

use crate::engine::{
    AttributeKind, AttributeSpec, DomainObject, FallbackPolicy, Hooks, ImportKey, Lookup,
    ResourceDescriptor,
};

pub const TYPE_NAME: &str = "vastdata_snapshot";

const RFC3339: &str =
    r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})$";

#[derive(Debug, Clone, Deserialize)]
pub struct Snapshot {
    pub id: Option<i64>,
    pub guid: Option<String>,
    pub name: Option<String>,
    pub path: Option<String>,
    pub expiration_time: Option<String>,
    pub tenant_id: Option<i64>,
    pub indestructible: Option<bool>,
}

impl DomainObject for Snapshot {
    fn id(&self) -> Option<i64> {
        self.id
    }

    fn guid(&self) -> Option<&str> {
        self.guid.as_deref()
    }
}

fn expiration_time() -> AttributeSpec<Snapshot> {
    let spec = AttributeSpec::optional("expiration_time", AttributeKind::String, |s: &Snapshot| {
        s.expiration_time.clone().into()
    })
    .description("When the snapshot expires, as an RFC 3339 timestamp");

    match StringPattern::create(RFC3339, "an RFC 3339 timestamp") {
        Ok(validator) => spec.validator(validator),
        Err(e) => {
            tracing::error!("Invalid expiration_time pattern: {}", e);
            spec
        }
    }
}

pub fn descriptor() -> &'static ResourceDescriptor<Snapshot> {
    static DESCRIPTOR: OnceLock<ResourceDescriptor<Snapshot>> = OnceLock::new();
    DESCRIPTOR.get_or_init(|| ResourceDescriptor {
        type_name: TYPE_NAME,
        path: "snapshots",
        description: "Manages a snapshot of a path on the cluster",
        attributes: vec![
            AttributeSpec::computed("guid", AttributeKind::String, |s: &Snapshot| {
                s.guid.clone().into()
            })
            .description("A unique guid given to the snapshot"),
            AttributeSpec::required("name", AttributeKind::String, |s: &Snapshot| {
                s.name.clone().into()
            })
            .description("The name of the snapshot"),
            AttributeSpec::required("path", AttributeKind::String, |s: &Snapshot| {
                s.path.clone().into()
            })
            .description("The path to make the snapshot from"),
            expiration_time(),
            AttributeSpec::optional("tenant_id", AttributeKind::Integer, |s: &Snapshot| {
                s.tenant_id.into()
            }),
            AttributeSpec::optional("indestructible", AttributeKind::Bool, |s: &Snapshot| {
                s.indestructible.into()
            }),
        ],
        // No version specific descriptor is published for snapshots
        versions: &[],
        fallback: FallbackPolicy::Disabled,
        import: ImportKey::Fields(&[("name", "name")]),
        lookup: Lookup {
            required: &["name"],
            optional: &["tenant_id"],
        },
        hooks: Hooks::default(),
    })
}
