//! S3 user policy resource

use serde::Deserialize;
use serde_json::Value;
use std::sync::OnceLock;
use tfplug::DynamicValue;

use crate::engine::{
    AttributeKind, AttributeSpec, DomainObject, FallbackPolicy, Hooks, ImportKey, Lookup, Payload,
    Primitive, ResourceDescriptor,
};
use crate::versions::ClusterVersion;

pub const TYPE_NAME: &str = "vastdata_s3_policy";

/// Cluster versions with a known field set
const VERSIONS: &[ClusterVersion] = &[
    ClusterVersion::new(5, 1, 0),
    ClusterVersion::new(5, 2, 0),
];

#[derive(Debug, Clone, Deserialize)]
pub struct S3Policy {
    pub id: Option<i64>,
    pub guid: Option<String>,
    pub name: Option<String>,
    pub policy: Option<String>,
    pub users: Option<Vec<String>>,
    pub groups: Option<Vec<String>>,
    pub is_replicated: Option<bool>,
    pub enabled: Option<bool>,
    pub tenant_id: Option<i64>,
}

impl DomainObject for S3Policy {
    fn id(&self) -> Option<i64> {
        self.id
    }

    fn guid(&self) -> Option<&str> {
        self.guid.as_deref()
    }
}

// The API drops `enabled` when false and rejects a create without it
fn send_enabled(payload: &mut Payload, _config: &DynamicValue) {
    payload
        .entry("enabled")
        .or_insert(Value::Bool(false));
}

fn default_enabled(response: &mut Value) {
    if let Value::Object(object) = response {
        object.entry("enabled").or_insert(Value::Bool(false));
    }
}

pub fn descriptor() -> &'static ResourceDescriptor<S3Policy> {
    static DESCRIPTOR: OnceLock<ResourceDescriptor<S3Policy>> = OnceLock::new();
    DESCRIPTOR.get_or_init(|| ResourceDescriptor {
        type_name: TYPE_NAME,
        path: "s3userpolicies",
        description: "Manages an S3 identity policy",
        attributes: vec![
            AttributeSpec::computed("guid", AttributeKind::String, |p: &S3Policy| {
                p.guid.clone().into()
            }),
            AttributeSpec::required("name", AttributeKind::String, |p: &S3Policy| {
                p.name.clone().into()
            }),
            AttributeSpec::required("policy", AttributeKind::String, |p: &S3Policy| {
                p.policy.clone().into()
            })
            .description("The policy document, as JSON"),
            AttributeSpec::computed(
                "users",
                AttributeKind::List(Primitive::String),
                |p: &S3Policy| p.users.clone().into(),
            ),
            AttributeSpec::computed(
                "groups",
                AttributeKind::List(Primitive::String),
                |p: &S3Policy| p.groups.clone().into(),
            ),
            AttributeSpec::computed("is_replicated", AttributeKind::Bool, |p: &S3Policy| {
                p.is_replicated.into()
            }),
            AttributeSpec::optional("enabled", AttributeKind::Bool, |p: &S3Policy| {
                p.enabled.into()
            }),
            AttributeSpec::optional("tenant_id", AttributeKind::Integer, |p: &S3Policy| {
                p.tenant_id.into()
            }),
        ],
        versions: VERSIONS,
        fallback: FallbackPolicy::ByGuid,
        import: ImportKey::Fields(&[("name", "name")]),
        lookup: Lookup::BY_NAME,
        hooks: Hooks {
            before_post: Some(send_enabled),
            before_patch: None,
            after_read: Some(default_enabled),
        },
    })
}
