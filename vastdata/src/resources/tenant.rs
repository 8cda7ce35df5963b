//! Tenant resource

use serde::Deserialize;
use std::sync::OnceLock;
use tfplug::validator::OneOf;

use crate::engine::{
    AttributeKind, AttributeSpec, DomainObject, FallbackPolicy, Hooks, ImportKey, Lookup, Primitive,
    ResourceDescriptor,
};
use crate::versions::ClusterVersion;

pub const TYPE_NAME: &str = "vastdata_tenant";

/// Cluster versions with a known field set
const VERSIONS: &[ClusterVersion] = &[ClusterVersion::new(5, 1, 0)];

#[derive(Debug, Clone, Deserialize)]
pub struct Tenant {
    pub id: Option<i64>,
    pub guid: Option<String>,
    pub name: Option<String>,
    pub smb_privileged_user_name: Option<String>,
    pub smb_privileged_group_sid: Option<String>,
    pub smb_administrators_group_name: Option<String>,
    pub default_others_share_level_perm: Option<String>,
    pub trash_gid: Option<i64>,
    pub client_ip_ranges: Option<Vec<Vec<String>>>,
    pub posix_primary_provider: Option<String>,
    pub ad_provider_id: Option<i64>,
    pub ldap_provider_id: Option<i64>,
    pub nis_provider_id: Option<i64>,
    pub encryption_crn: Option<String>,
    pub is_nfsv42_supported: Option<bool>,
    pub allow_locked_users: Option<bool>,
    pub allow_disabled_users: Option<bool>,
    pub use_smb_native: Option<bool>,
    pub vippool_ids: Option<Vec<i64>>,
}

impl DomainObject for Tenant {
    fn id(&self) -> Option<i64> {
        self.id
    }

    fn guid(&self) -> Option<&str> {
        self.guid.as_deref()
    }
}

pub fn descriptor() -> &'static ResourceDescriptor<Tenant> {
    static DESCRIPTOR: OnceLock<ResourceDescriptor<Tenant>> = OnceLock::new();
    DESCRIPTOR.get_or_init(|| ResourceDescriptor {
        type_name: TYPE_NAME,
        path: "tenants",
        description: "Manages a tenant on a VAST Data cluster",
        attributes: vec![
            AttributeSpec::computed("guid", AttributeKind::String, |t: &Tenant| {
                t.guid.clone().into()
            }),
            AttributeSpec::required("name", AttributeKind::String, |t: &Tenant| {
                t.name.clone().into()
            }),
            AttributeSpec::optional(
                "smb_privileged_user_name",
                AttributeKind::String,
                |t: &Tenant| t.smb_privileged_user_name.clone().into(),
            ),
            AttributeSpec::optional(
                "smb_privileged_group_sid",
                AttributeKind::String,
                |t: &Tenant| t.smb_privileged_group_sid.clone().into(),
            ),
            AttributeSpec::optional(
                "smb_administrators_group_name",
                AttributeKind::String,
                |t: &Tenant| t.smb_administrators_group_name.clone().into(),
            ),
            AttributeSpec::optional(
                "default_others_share_level_perm",
                AttributeKind::String,
                |t: &Tenant| t.default_others_share_level_perm.clone().into(),
            )
            .description("Default share-level permissions for others")
            .validator(OneOf::create(&["READ", "CHANGE", "FULL"])),
            AttributeSpec::optional("trash_gid", AttributeKind::Integer, |t: &Tenant| {
                t.trash_gid.into()
            }),
            AttributeSpec::optional(
                "client_ip_ranges",
                AttributeKind::Tuples(&["start_ip", "end_ip"]),
                |t: &Tenant| t.client_ip_ranges.clone().into(),
            )
            .description("Client IP ranges allowed to reach the tenant"),
            AttributeSpec::optional(
                "posix_primary_provider",
                AttributeKind::String,
                |t: &Tenant| t.posix_primary_provider.clone().into(),
            )
            .validator(OneOf::create(&["NONE", "LDAP", "NIS", "AD", "LOCAL"])),
            AttributeSpec::optional("ad_provider_id", AttributeKind::Integer, |t: &Tenant| {
                t.ad_provider_id.into()
            }),
            AttributeSpec::optional("ldap_provider_id", AttributeKind::Integer, |t: &Tenant| {
                t.ldap_provider_id.into()
            }),
            AttributeSpec::optional("nis_provider_id", AttributeKind::Integer, |t: &Tenant| {
                t.nis_provider_id.into()
            }),
            AttributeSpec::optional("encryption_crn", AttributeKind::String, |t: &Tenant| {
                t.encryption_crn.clone().into()
            }),
            AttributeSpec::optional("is_nfsv42_supported", AttributeKind::Bool, |t: &Tenant| {
                t.is_nfsv42_supported.into()
            }),
            AttributeSpec::optional("allow_locked_users", AttributeKind::Bool, |t: &Tenant| {
                t.allow_locked_users.into()
            }),
            AttributeSpec::optional("allow_disabled_users", AttributeKind::Bool, |t: &Tenant| {
                t.allow_disabled_users.into()
            }),
            AttributeSpec::optional("use_smb_native", AttributeKind::Bool, |t: &Tenant| {
                t.use_smb_native.into()
            })
            .since(ClusterVersion::new(5, 2, 0)),
            AttributeSpec::optional(
                "vippool_ids",
                AttributeKind::List(Primitive::Integer),
                |t: &Tenant| t.vippool_ids.clone().into(),
            ),
        ],
        versions: VERSIONS,
        fallback: FallbackPolicy::ByGuid,
        import: ImportKey::Fields(&[("name", "name")]),
        lookup: Lookup::BY_NAME,
        hooks: Hooks::default(),
    })
}
