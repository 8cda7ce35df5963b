//! QoS policy resource

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tfplug::validator::{NumberRange, OneOf};

use crate::engine::{
    to_dynamic, AttributeKind, AttributeSpec, DomainObject, FallbackPolicy, Hooks, ImportKey,
    Lookup, NestedField, Primitive, ResourceDescriptor,
};
use crate::versions::ClusterVersion;

pub const TYPE_NAME: &str = "vastdata_qos_policy";

const V52: ClusterVersion = ClusterVersion::new(5, 2, 0);

/// Cluster versions with a known field set
const VERSIONS: &[ClusterVersion] = &[
    ClusterVersion::new(5, 0, 0),
    ClusterVersion::new(5, 1, 0),
    V52,
];

#[derive(Debug, Clone, Deserialize)]
pub struct QosPolicy {
    pub id: Option<i64>,
    pub guid: Option<String>,
    pub name: Option<String>,
    pub mode: Option<String>,
    pub io_size_bytes: Option<i64>,
    pub static_limits: Option<StaticLimits>,
    pub capacity_limits: Option<CapacityLimits>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticLimits {
    pub min_reads_bw_mbps: Option<i64>,
    pub max_reads_bw_mbps: Option<i64>,
    pub min_writes_bw_mbps: Option<i64>,
    pub max_writes_bw_mbps: Option<i64>,
    pub min_reads_iops: Option<i64>,
    pub max_reads_iops: Option<i64>,
    pub min_writes_iops: Option<i64>,
    pub max_writes_iops: Option<i64>,
    pub burst_reads_bw_mb: Option<i64>,
    pub burst_reads_loan_mb: Option<i64>,
    pub burst_writes_bw_mb: Option<i64>,
    pub burst_writes_loan_mb: Option<i64>,
    pub burst_reads_iops: Option<i64>,
    pub burst_reads_loan_iops: Option<i64>,
    pub burst_writes_iops: Option<i64>,
    pub burst_writes_loan_iops: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapacityLimits {
    pub max_reads_bw_mbps_per_gb_capacity: Option<i64>,
    pub max_writes_bw_mbps_per_gb_capacity: Option<i64>,
    pub max_reads_iops_per_gb_capacity: Option<i64>,
    pub max_writes_iops_per_gb_capacity: Option<i64>,
}

impl DomainObject for QosPolicy {
    fn id(&self) -> Option<i64> {
        self.id
    }

    fn guid(&self) -> Option<&str> {
        self.guid.as_deref()
    }
}

// Burst settings arrived with 5.2
static STATIC_LIMITS: &[NestedField] = &[
    NestedField::new("min_reads_bw_mbps", Primitive::Integer),
    NestedField::new("max_reads_bw_mbps", Primitive::Integer),
    NestedField::new("min_writes_bw_mbps", Primitive::Integer),
    NestedField::new("max_writes_bw_mbps", Primitive::Integer),
    NestedField::new("min_reads_iops", Primitive::Integer),
    NestedField::new("max_reads_iops", Primitive::Integer),
    NestedField::new("min_writes_iops", Primitive::Integer),
    NestedField::new("max_writes_iops", Primitive::Integer),
    NestedField::since("burst_reads_bw_mb", Primitive::Integer, V52),
    NestedField::since("burst_reads_loan_mb", Primitive::Integer, V52),
    NestedField::since("burst_writes_bw_mb", Primitive::Integer, V52),
    NestedField::since("burst_writes_loan_mb", Primitive::Integer, V52),
    NestedField::since("burst_reads_iops", Primitive::Integer, V52),
    NestedField::since("burst_reads_loan_iops", Primitive::Integer, V52),
    NestedField::since("burst_writes_iops", Primitive::Integer, V52),
    NestedField::since("burst_writes_loan_iops", Primitive::Integer, V52),
];

static CAPACITY_LIMITS: &[NestedField] = &[
    NestedField::new("max_reads_bw_mbps_per_gb_capacity", Primitive::Integer),
    NestedField::new("max_writes_bw_mbps_per_gb_capacity", Primitive::Integer),
    NestedField::new("max_reads_iops_per_gb_capacity", Primitive::Integer),
    NestedField::new("max_writes_iops_per_gb_capacity", Primitive::Integer),
];

pub fn descriptor() -> &'static ResourceDescriptor<QosPolicy> {
    static DESCRIPTOR: OnceLock<ResourceDescriptor<QosPolicy>> = OnceLock::new();
    DESCRIPTOR.get_or_init(|| ResourceDescriptor {
        type_name: TYPE_NAME,
        path: "qospolicies",
        description: "Manages a quality of service policy on a VAST Data cluster",
        attributes: vec![
            AttributeSpec::computed("guid", AttributeKind::String, |p: &QosPolicy| {
                p.guid.clone().into()
            })
            .description("A unique guid given to the QoS policy"),
            AttributeSpec::required("name", AttributeKind::String, |p: &QosPolicy| {
                p.name.clone().into()
            })
            .description("The name of the QoS policy"),
            AttributeSpec::optional("mode", AttributeKind::String, |p: &QosPolicy| {
                p.mode.clone().into()
            })
            .description("QoS provisioning mode")
            .validator(OneOf::create(&["STATIC", "USED_CAPACITY", "PROVISIONED_CAPACITY"])),
            AttributeSpec::optional("io_size_bytes", AttributeKind::Integer, |p: &QosPolicy| {
                p.io_size_bytes.into()
            })
            .description("Sets the size of IO for static and capacity limit definitions")
            .validator(NumberRange::create(Some(0.0), None)),
            AttributeSpec::optional(
                "static_limits",
                AttributeKind::Object(STATIC_LIMITS),
                |p: &QosPolicy| to_dynamic(&p.static_limits),
            )
            .conflicts_with(&["capacity_limits"]),
            AttributeSpec::optional(
                "capacity_limits",
                AttributeKind::Object(CAPACITY_LIMITS),
                |p: &QosPolicy| to_dynamic(&p.capacity_limits),
            )
            .conflicts_with(&["static_limits"]),
        ],
        versions: VERSIONS,
        fallback: FallbackPolicy::ByGuid,
        import: ImportKey::Guid,
        lookup: Lookup::BY_NAME,
        hooks: Hooks::default(),
    })
}
