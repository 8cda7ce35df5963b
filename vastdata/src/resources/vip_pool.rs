//! Virtual IP pool resource

use serde::Deserialize;
use std::sync::OnceLock;
use tfplug::validator::{NumberRange, OneOf};

use crate::engine::{
    AttributeKind, AttributeSpec, DomainObject, FallbackPolicy, Hooks, ImportKey, Lookup, Primitive,
    ResourceDescriptor,
};
use crate::versions::ClusterVersion;

pub const TYPE_NAME: &str = "vastdata_vip_pool";

/// Cluster versions with a known field set
const VERSIONS: &[ClusterVersion] = &[ClusterVersion::new(5, 3, 0)];

#[derive(Debug, Clone, Deserialize)]
pub struct VipPool {
    pub id: Option<i64>,
    pub guid: Option<String>,
    pub name: Option<String>,
    pub subnet_cidr: Option<i64>,
    pub subnet_cidr_ipv6: Option<i64>,
    pub gw_ip: Option<String>,
    pub gw_ipv6: Option<String>,
    pub vlan: Option<i64>,
    pub state: Option<String>,
    pub cnode_ids: Option<Vec<i64>>,
    pub cluster: Option<String>,
    pub domain_name: Option<String>,
    pub role: Option<String>,
    pub ip_ranges: Option<Vec<Vec<String>>>,
    pub vms_preferred: Option<bool>,
    pub enabled: Option<bool>,
    pub port_membership: Option<String>,
    pub enable_l3: Option<bool>,
    pub vast_asn: Option<i64>,
    pub peer_asn: Option<i64>,
    pub tenant_id: Option<i64>,
}

impl DomainObject for VipPool {
    fn id(&self) -> Option<i64> {
        self.id
    }

    fn guid(&self) -> Option<&str> {
        self.guid.as_deref()
    }
}

pub fn descriptor() -> &'static ResourceDescriptor<VipPool> {
    static DESCRIPTOR: OnceLock<ResourceDescriptor<VipPool>> = OnceLock::new();
    DESCRIPTOR.get_or_init(|| ResourceDescriptor {
        type_name: TYPE_NAME,
        path: "vippools",
        description: "Manages a pool of virtual IPs served by the cluster's CNodes",
        attributes: vec![
            AttributeSpec::computed("guid", AttributeKind::String, |p: &VipPool| {
                p.guid.clone().into()
            }),
            AttributeSpec::required("name", AttributeKind::String, |p: &VipPool| {
                p.name.clone().into()
            }),
            AttributeSpec::required("subnet_cidr", AttributeKind::Integer, |p: &VipPool| {
                p.subnet_cidr.into()
            })
            .validator(NumberRange::create(Some(0.0), Some(32.0))),
            AttributeSpec::optional("subnet_cidr_ipv6", AttributeKind::Integer, |p: &VipPool| {
                p.subnet_cidr_ipv6.into()
            })
            .validator(NumberRange::create(Some(0.0), Some(128.0))),
            AttributeSpec::optional("gw_ip", AttributeKind::String, |p: &VipPool| {
                p.gw_ip.clone().into()
            }),
            AttributeSpec::optional("gw_ipv6", AttributeKind::String, |p: &VipPool| {
                p.gw_ipv6.clone().into()
            }),
            AttributeSpec::optional("vlan", AttributeKind::Integer, |p: &VipPool| p.vlan.into())
                .validator(NumberRange::create(Some(0.0), Some(4096.0))),
            AttributeSpec::computed("state", AttributeKind::String, |p: &VipPool| {
                p.state.clone().into()
            }),
            AttributeSpec::optional(
                "cnode_ids",
                AttributeKind::List(Primitive::Integer),
                |p: &VipPool| p.cnode_ids.clone().into(),
            )
            .description("IDs of the CNodes serving the pool"),
            AttributeSpec::computed("cluster", AttributeKind::String, |p: &VipPool| {
                p.cluster.clone().into()
            }),
            AttributeSpec::optional("domain_name", AttributeKind::String, |p: &VipPool| {
                p.domain_name.clone().into()
            }),
            AttributeSpec::required("role", AttributeKind::String, |p: &VipPool| {
                p.role.clone().into()
            })
            .validator(OneOf::create(&["PROTOCOLS", "REPLICATION", "VAST_CATALOG"])),
            AttributeSpec::required(
                "ip_ranges",
                AttributeKind::Tuples(&["start_ip", "end_ip"]),
                |p: &VipPool| p.ip_ranges.clone().into(),
            )
            .description("Ranges of IPs, each from start_ip to end_ip inclusive"),
            AttributeSpec::optional("vms_preferred", AttributeKind::Bool, |p: &VipPool| {
                p.vms_preferred.into()
            }),
            AttributeSpec::optional("enabled", AttributeKind::Bool, |p: &VipPool| {
                p.enabled.into()
            }),
            AttributeSpec::optional("port_membership", AttributeKind::String, |p: &VipPool| {
                p.port_membership.clone().into()
            })
            .validator(OneOf::create(&["ALL", "LEFT", "RIGHT"])),
            AttributeSpec::optional("enable_l3", AttributeKind::Bool, |p: &VipPool| {
                p.enable_l3.into()
            }),
            AttributeSpec::optional("vast_asn", AttributeKind::Integer, |p: &VipPool| {
                p.vast_asn.into()
            }),
            AttributeSpec::optional("peer_asn", AttributeKind::Integer, |p: &VipPool| {
                p.peer_asn.into()
            }),
            AttributeSpec::optional("tenant_id", AttributeKind::Integer, |p: &VipPool| {
                p.tenant_id.into()
            }),
        ],
        versions: VERSIONS,
        fallback: FallbackPolicy::ByGuid,
        import: ImportKey::Fields(&[("name", "name")]),
        lookup: Lookup::BY_NAME,
        hooks: Hooks::default(),
    })
}
