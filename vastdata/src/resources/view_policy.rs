//! View policy resource

use serde::Deserialize;
use serde_json::Value;
use std::sync::OnceLock;
use tfplug::validator::{NumberRange, OneOf};
use tfplug::{AttributePath, Dynamic, DynamicValue};

use crate::engine::{
    AttributeKind, AttributeSpec, DomainObject, FallbackPolicy, Hooks, ImportKey, Lookup, Payload,
    Primitive, ResourceDescriptor,
};
use crate::versions::ClusterVersion;

pub const TYPE_NAME: &str = "vastdata_view_policy";

/// Cluster versions with a known field set
const VERSIONS: &[ClusterVersion] = &[ClusterVersion::new(5, 1, 0)];

/// Host lists the cluster treats as "nobody" when left empty
const PERMISSION_ATTRIBUTES: &[&str] = &[
    "nfs_all_squash",
    "nfs_root_squash",
    "nfs_read_write",
    "nfs_read_only",
    "s3_read_only",
    "s3_read_write",
    "smb_read_only",
    "smb_read_write",
    "nfs_no_squash",
];

#[derive(Debug, Clone, Deserialize)]
pub struct ViewPolicy {
    pub id: Option<i64>,
    pub guid: Option<String>,
    pub name: Option<String>,
    pub flavor: Option<String>,
    pub access_flavor: Option<String>,
    pub auth_source: Option<String>,
    pub path_length: Option<String>,
    pub allowed_characters: Option<String>,
    pub use32bit_fileid: Option<bool>,
    pub nfs_posix_acl: Option<bool>,
    pub read_write: Option<Vec<String>>,
    pub read_only: Option<Vec<String>>,
    pub nfs_all_squash: Option<Vec<String>>,
    pub nfs_root_squash: Option<Vec<String>>,
    pub nfs_no_squash: Option<Vec<String>>,
    pub nfs_read_write: Option<Vec<String>>,
    pub nfs_read_only: Option<Vec<String>>,
    pub smb_read_write: Option<Vec<String>>,
    pub smb_read_only: Option<Vec<String>>,
    pub s3_read_write: Option<Vec<String>>,
    pub s3_read_only: Option<Vec<String>>,
    pub s3_special_chars_support: Option<bool>,
    pub smb_file_mode: Option<i64>,
    pub smb_directory_mode: Option<i64>,
    pub vip_pools: Option<Vec<i64>>,
    pub protocols: Option<Vec<String>>,
    pub tenant_id: Option<i64>,
    pub tenant_name: Option<String>,
}

impl DomainObject for ViewPolicy {
    fn id(&self) -> Option<i64> {
        self.id
    }

    fn guid(&self) -> Option<&str> {
        self.guid.as_deref()
    }
}

fn is_unset(config: &DynamicValue, name: &str) -> bool {
    matches!(
        config.get(&AttributePath::new(name)),
        None | Some(Dynamic::Null) | Some(Dynamic::Unknown)
    )
}

/// Unset permission lists are sent as `[]`; S3 native policies always carry
/// `s3_special_chars_support`
fn permissions_setup(payload: &mut Payload, config: &DynamicValue) {
    for name in PERMISSION_ATTRIBUTES {
        if is_unset(config, name) {
            payload.insert(name.to_string(), Value::Array(vec![]));
        }
    }

    let s3_native = payload.get("flavor").and_then(Value::as_str) == Some("S3_NATIVE");
    if s3_native && !payload.contains_key("s3_special_chars_support") {
        payload.insert("s3_special_chars_support".to_string(), Value::Bool(false));
    }
}

fn host_list(name: &'static str, get: fn(&ViewPolicy) -> Dynamic) -> AttributeSpec<ViewPolicy> {
    AttributeSpec::optional(name, AttributeKind::List(Primitive::String), get)
}

pub fn descriptor() -> &'static ResourceDescriptor<ViewPolicy> {
    static DESCRIPTOR: OnceLock<ResourceDescriptor<ViewPolicy>> = OnceLock::new();
    DESCRIPTOR.get_or_init(|| ResourceDescriptor {
        type_name: TYPE_NAME,
        path: "viewpolicies",
        description: "Manages a view policy: protocol flavor, permissions and squash rules of views",
        attributes: vec![
            AttributeSpec::computed("guid", AttributeKind::String, |p: &ViewPolicy| {
                p.guid.clone().into()
            }),
            AttributeSpec::required("name", AttributeKind::String, |p: &ViewPolicy| {
                p.name.clone().into()
            }),
            AttributeSpec::optional("flavor", AttributeKind::String, |p: &ViewPolicy| {
                p.flavor.clone().into()
            })
            .description("Security flavor, which determines how file and directory permissions are applied")
            .validator(OneOf::create(&[
                "S3_NATIVE",
                "SMB",
                "NFS",
                "MIXED_LAST_WINS",
            ])),
            AttributeSpec::optional("access_flavor", AttributeKind::String, |p: &ViewPolicy| {
                p.access_flavor.clone().into()
            })
            .validator(OneOf::create(&["S3_NATIVE", "SMB", "NFS", "ALL"])),
            AttributeSpec::optional("auth_source", AttributeKind::String, |p: &ViewPolicy| {
                p.auth_source.clone().into()
            })
            .validator(OneOf::create(&["RPC", "PROVIDERS", "RPC_AND_PROVIDERS"])),
            AttributeSpec::optional("path_length", AttributeKind::String, |p: &ViewPolicy| {
                p.path_length.clone().into()
            })
            .validator(OneOf::create(&["LCD", "NPL"])),
            AttributeSpec::optional(
                "allowed_characters",
                AttributeKind::String,
                |p: &ViewPolicy| p.allowed_characters.clone().into(),
            )
            .validator(OneOf::create(&["LCD", "NPL"])),
            AttributeSpec::optional("use32bit_fileid", AttributeKind::Bool, |p: &ViewPolicy| {
                p.use32bit_fileid.into()
            }),
            AttributeSpec::optional("nfs_posix_acl", AttributeKind::Bool, |p: &ViewPolicy| {
                p.nfs_posix_acl.into()
            }),
            host_list("read_write", |p| p.read_write.clone().into()),
            host_list("read_only", |p| p.read_only.clone().into()),
            host_list("nfs_all_squash", |p| p.nfs_all_squash.clone().into()),
            host_list("nfs_root_squash", |p| p.nfs_root_squash.clone().into()),
            host_list("nfs_no_squash", |p| p.nfs_no_squash.clone().into()),
            host_list("nfs_read_write", |p| p.nfs_read_write.clone().into()),
            host_list("nfs_read_only", |p| p.nfs_read_only.clone().into()),
            host_list("smb_read_write", |p| p.smb_read_write.clone().into()),
            host_list("smb_read_only", |p| p.smb_read_only.clone().into()),
            host_list("s3_read_write", |p| p.s3_read_write.clone().into()),
            host_list("s3_read_only", |p| p.s3_read_only.clone().into()),
            AttributeSpec::optional(
                "s3_special_chars_support",
                AttributeKind::Bool,
                |p: &ViewPolicy| p.s3_special_chars_support.into(),
            )
            .since(ClusterVersion::new(5, 2, 0)),
            AttributeSpec::optional("smb_file_mode", AttributeKind::Integer, |p: &ViewPolicy| {
                p.smb_file_mode.into()
            })
            .validator(NumberRange::create(Some(0.0), Some(511.0))),
            AttributeSpec::optional(
                "smb_directory_mode",
                AttributeKind::Integer,
                |p: &ViewPolicy| p.smb_directory_mode.into(),
            )
            .validator(NumberRange::create(Some(0.0), Some(511.0))),
            AttributeSpec::optional(
                "vip_pools",
                AttributeKind::List(Primitive::Integer),
                |p: &ViewPolicy| p.vip_pools.clone().into(),
            )
            .description("VIP pool IDs the policy is restricted to"),
            AttributeSpec::optional(
                "protocols",
                AttributeKind::List(Primitive::String),
                |p: &ViewPolicy| p.protocols.clone().into(),
            ),
            AttributeSpec::optional("tenant_id", AttributeKind::Integer, |p: &ViewPolicy| {
                p.tenant_id.into()
            }),
            AttributeSpec::computed("tenant_name", AttributeKind::String, |p: &ViewPolicy| {
                p.tenant_name.clone().into()
            }),
        ],
        versions: VERSIONS,
        fallback: FallbackPolicy::ByGuid,
        import: ImportKey::Fields(&[("name", "name"), ("tenant_name", "tenant_name__icontains")]),
        lookup: Lookup::BY_NAME,
        hooks: Hooks {
            before_post: Some(permissions_setup),
            before_patch: Some(permissions_setup),
            after_read: None,
        },
    })
}
