//! Version compatibility gate
//!
//! Before a create or update the outbound payload is compared with the field
//! set the resource has on the cluster's version. Fields the cluster does not
//! know about are reported; strict mode turns the report into a failure.

use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use super::ClusterVersion;

pub const INCOMPATIBLE_SUMMARY: &str = "Cluster Version & Build Version Are Too Different";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    #[default]
    Warn,
    Strict,
}

impl FromStr for ValidationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "warn" => Ok(ValidationMode::Warn),
            "strict" => Ok(ValidationMode::Strict),
            other => Err(format!(
                "invalid version validation mode '{}', expected 'warn' or 'strict'",
                other
            )),
        }
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationMode::Warn => f.write_str("warn"),
            ValidationMode::Strict => f.write_str("strict"),
        }
    }
}

/// Field names a resource accepts on one cluster version.
/// Object-valued fields carry their own nested set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet {
    fields: BTreeMap<String, Option<FieldSet>>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &str) -> Self {
        self.fields.insert(name.to_string(), None);
        self
    }

    pub fn nested(mut self, name: &str, fields: FieldSet) -> Self {
        self.fields.insert(name.to_string(), Some(fields));
        self
    }

    pub fn insert(&mut self, name: &str, nested: Option<FieldSet>) {
        self.fields.insert(name.to_string(), nested);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Payload keys absent from this set, as sorted `.a.b` paths
    pub fn unknown_fields(&self, payload: &Map<String, Value>) -> Vec<String> {
        let mut unknown = BTreeSet::new();
        self.collect_unknown(payload, "", &mut unknown);
        unknown.into_iter().collect()
    }

    fn collect_unknown(&self, payload: &Map<String, Value>, prefix: &str, out: &mut BTreeSet<String>) {
        for (key, value) in payload {
            let path = format!("{}.{}", prefix, key);
            match self.fields.get(key) {
                None => {
                    out.insert(path);
                }
                Some(Some(nested)) => match value {
                    Value::Object(inner) => nested.collect_unknown(inner, &path, out),
                    Value::Array(items) => {
                        for item in items {
                            if let Value::Object(inner) = item {
                                nested.collect_unknown(inner, &path, out);
                            }
                        }
                    }
                    _ => {}
                },
                Some(None) => {}
            }
        }
    }
}

/// Anything that can describe its fields for a given cluster version
pub trait VersionedResource {
    fn type_name(&self) -> &str;

    /// None when no version-specific descriptor exists for `version`
    fn fields_for(&self, version: &ClusterVersion) -> Option<FieldSet>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    Equal,
    CompatibleWarn(String),
    IncompatibleFail(String),
}

impl GateOutcome {
    pub fn is_fail(&self) -> bool {
        matches!(self, GateOutcome::IncompatibleFail(_))
    }
}

/// Compares `payload` with the resource's descriptor for `cluster`.
/// A missing descriptor never fails, whatever the mode.
pub fn check<R: VersionedResource + ?Sized>(
    cluster: &ClusterVersion,
    build: &ClusterVersion,
    resource: &R,
    payload: &Map<String, Value>,
    mode: ValidationMode,
) -> GateOutcome {
    if cluster == build {
        return GateOutcome::Equal;
    }

    let Some(fields) = resource.fields_for(cluster) else {
        let message = format!(
            "Could not find resource {} in version {}, things might not work properly",
            resource.type_name(),
            cluster
        );
        tracing::warn!("{}", message);
        return GateOutcome::CompatibleWarn(message);
    };

    let unknown = fields.unknown_fields(payload);
    if unknown.is_empty() {
        return GateOutcome::CompatibleWarn(format!(
            "Cluster version {} differs from build version {}, all fields of {} are known to the cluster",
            cluster,
            build,
            resource.type_name()
        ));
    }

    let mut message = format!(
        "The following fields found which do not match the Cluster version {}\n",
        cluster
    );
    for field in &unknown {
        message.push_str(field);
        message.push('\n');
    }
    tracing::warn!("{}", message);
    tracing::warn!("Version validation mode detected: {}", mode);

    match mode {
        ValidationMode::Strict => GateOutcome::IncompatibleFail(message),
        ValidationMode::Warn => GateOutcome::CompatibleWarn(message),
    }
}
