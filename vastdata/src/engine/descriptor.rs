//! Resource descriptors: the attribute table every VAST resource is built from

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tfplug::schema::{Default as DefaultValue, Validator};
use tfplug::{AttributeBuilder, AttributePath, AttributeType, Diagnostic, Dynamic, DynamicValue};
use tfplug::{Schema, SchemaBuilder};

use crate::versions::{ClusterVersion, FieldSet, VersionedResource};

/// JSON object sent as a request body
pub type Payload = Map<String, Value>;

/// Adjusts the outbound payload; receives the configuration it was extracted from
pub type PayloadHook = fn(&mut Payload, &DynamicValue);

/// Adjusts a raw response before it is decoded
pub type ResponseHook = fn(&mut Value);

/// Decoded form of one remote object
pub trait DomainObject: DeserializeOwned + Send + Sync + 'static {
    fn id(&self) -> Option<i64>;

    fn guid(&self) -> Option<&str> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    String,
    Integer,
    Number,
    Bool,
}

impl Primitive {
    pub fn attribute_type(self) -> AttributeType {
        match self {
            Primitive::String => AttributeType::String,
            Primitive::Integer | Primitive::Number => AttributeType::Number,
            Primitive::Bool => AttributeType::Bool,
        }
    }

    /// Terraform value to request JSON; integers go out as JSON integers
    pub fn to_json(self, value: &Dynamic) -> Result<Value, String> {
        match (self, value) {
            (Primitive::String, Dynamic::String(s)) => Ok(Value::String(s.clone())),
            (Primitive::Bool, Dynamic::Bool(b)) => Ok(Value::Bool(*b)),
            (Primitive::Integer, Dynamic::Number(n)) => {
                if n.fract() != 0.0 || !n.is_finite() {
                    return Err(format!("expected a whole number, got {}", n));
                }
                // i64::MAX rounds up to 2^63 as f64, so the upper bound is exclusive
                if *n < i64::MIN as f64 || *n >= i64::MAX as f64 {
                    return Err(format!("{} does not fit in a 64-bit integer", n));
                }
                Ok(Value::from(*n as i64))
            }
            (Primitive::Number, Dynamic::Number(n)) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .ok_or_else(|| format!("{} is not a valid JSON number", n)),
            (expected, other) => Err(format!(
                "expected {:?}, got {}",
                expected,
                other.type_name()
            )),
        }
    }
}

/// Field of a nested object
#[derive(Debug, Clone, Copy)]
pub struct NestedField {
    pub name: &'static str,
    pub kind: Primitive,
    pub min_version: Option<ClusterVersion>,
}

impl NestedField {
    pub const fn new(name: &'static str, kind: Primitive) -> Self {
        Self {
            name,
            kind,
            min_version: None,
        }
    }

    pub const fn since(name: &'static str, kind: Primitive, version: ClusterVersion) -> Self {
        Self {
            name,
            kind,
            min_version: Some(version),
        }
    }

    fn available_in(&self, version: &ClusterVersion) -> bool {
        self.min_version.map_or(true, |min| *version >= min)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum AttributeKind {
    String,
    Integer,
    Number,
    Bool,
    List(Primitive),
    Object(&'static [NestedField]),
    ObjectList(&'static [NestedField]),
    /// Sent as a list of fixed-size string tuples, kept in state as objects
    /// with these names (e.g. `[["10.0.0.1", "10.0.0.9"]]` as
    /// `[{start_ip = "10.0.0.1", end_ip = "10.0.0.9"}]`)
    Tuples(&'static [&'static str]),
}

impl AttributeKind {
    pub fn attribute_type(&self) -> AttributeType {
        match self {
            AttributeKind::String => AttributeType::String,
            AttributeKind::Integer | AttributeKind::Number => AttributeType::Number,
            AttributeKind::Bool => AttributeType::Bool,
            AttributeKind::List(item) => AttributeType::List(Box::new(item.attribute_type())),
            AttributeKind::Object(fields) => object_type(fields),
            AttributeKind::ObjectList(fields) => AttributeType::List(Box::new(object_type(fields))),
            AttributeKind::Tuples(names) => AttributeType::List(Box::new(AttributeType::Object(
                names
                    .iter()
                    .map(|name| (name.to_string(), AttributeType::String))
                    .collect(),
            ))),
        }
    }

    /// Scalar kinds only
    pub fn primitive(&self) -> Option<Primitive> {
        match self {
            AttributeKind::String => Some(Primitive::String),
            AttributeKind::Integer => Some(Primitive::Integer),
            AttributeKind::Number => Some(Primitive::Number),
            AttributeKind::Bool => Some(Primitive::Bool),
            _ => None,
        }
    }

    fn nested_fields(&self) -> Option<&'static [NestedField]> {
        match self {
            AttributeKind::Object(fields) | AttributeKind::ObjectList(fields) => Some(*fields),
            _ => None,
        }
    }
}

fn object_type(fields: &[NestedField]) -> AttributeType {
    AttributeType::Object(
        fields
            .iter()
            .map(|f| (f.name.to_string(), f.kind.attribute_type()))
            .collect(),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Required,
    Optional,
    /// Set by the cluster only, never sent
    Computed,
    /// May be configured, otherwise filled in by the cluster
    OptionalComputed,
}

pub struct AttributeSpec<T> {
    pub name: &'static str,
    pub kind: AttributeKind,
    pub mode: Mode,
    pub sensitive: bool,
    pub description: &'static str,
    pub default: Option<Arc<dyn DefaultValue>>,
    pub validators: Vec<Arc<dyn Validator>>,
    pub conflicts_with: &'static [&'static str],
    pub min_version: Option<ClusterVersion>,
    pub max_version: Option<ClusterVersion>,
    /// Reads the attribute off a decoded object
    pub get: fn(&T) -> Dynamic,
}

impl<T> AttributeSpec<T> {
    pub fn new(name: &'static str, kind: AttributeKind, mode: Mode, get: fn(&T) -> Dynamic) -> Self {
        Self {
            name,
            kind,
            mode,
            sensitive: false,
            description: "",
            default: None,
            validators: Vec::new(),
            conflicts_with: &[],
            min_version: None,
            max_version: None,
            get,
        }
    }

    pub fn required(name: &'static str, kind: AttributeKind, get: fn(&T) -> Dynamic) -> Self {
        Self::new(name, kind, Mode::Required, get)
    }

    pub fn optional(name: &'static str, kind: AttributeKind, get: fn(&T) -> Dynamic) -> Self {
        Self::new(name, kind, Mode::OptionalComputed, get)
    }

    pub fn computed(name: &'static str, kind: AttributeKind, get: fn(&T) -> Dynamic) -> Self {
        Self::new(name, kind, Mode::Computed, get)
    }

    pub fn description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn default(mut self, default: Arc<dyn DefaultValue>) -> Self {
        self.default = Some(default);
        self
    }

    pub fn validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn conflicts_with(mut self, others: &'static [&'static str]) -> Self {
        self.conflicts_with = others;
        self
    }

    pub fn since(mut self, version: ClusterVersion) -> Self {
        self.min_version = Some(version);
        self
    }

    pub fn until(mut self, version: ClusterVersion) -> Self {
        self.max_version = Some(version);
        self
    }

    pub fn path(&self) -> AttributePath {
        AttributePath::new(self.name)
    }

    pub fn is_sent(&self) -> bool {
        self.mode != Mode::Computed
    }

    pub fn available_in(&self, version: &ClusterVersion) -> bool {
        self.min_version.map_or(true, |min| *version >= min)
            && self.max_version.map_or(true, |max| *version <= max)
    }

    fn schema_attribute(&self) -> tfplug::schema::Attribute {
        let mut builder =
            AttributeBuilder::new(self.name, self.kind.attribute_type()).description(self.description);
        builder = match self.mode {
            Mode::Required => builder.required(),
            Mode::Optional => builder.optional(),
            Mode::Computed => builder.computed(),
            Mode::OptionalComputed => builder.optional().computed(),
        };
        if self.sensitive {
            builder = builder.sensitive();
        }
        if let Some(default) = &self.default {
            builder = builder.default(default.clone());
        }
        for validator in &self.validators {
            builder = builder.validator(validator.clone());
        }
        builder.build()
    }

    fn lookup_attribute(&self, lookup: &Lookup) -> tfplug::schema::Attribute {
        let builder = AttributeBuilder::new(self.name, self.kind.attribute_type())
            .description(self.description);
        let builder = if lookup.required.contains(&self.name) {
            builder.required()
        } else if lookup.optional.contains(&self.name) {
            builder.optional().computed()
        } else {
            builder.computed()
        };
        if self.sensitive {
            builder.sensitive().build()
        } else {
            builder.build()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// On a 404 by id, look the object up by its GUID
    ByGuid,
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKey {
    /// Import id is the object's GUID
    Guid,
    /// Import id is `|`-separated values for (state attribute, query field) pairs
    Fields(&'static [(&'static str, &'static str)]),
}

impl ImportKey {
    /// Human readable import id format, e.g. `name|tenant_name`
    pub fn format(&self) -> String {
        match self {
            ImportKey::Guid => "guid".to_string(),
            ImportKey::Fields(fields) => fields
                .iter()
                .map(|(attribute, _)| *attribute)
                .collect::<Vec<_>>()
                .join("|"),
        }
    }
}

/// Attributes a data source filters the collection by. Each one is sent as
/// a query field of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookup {
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
}

impl Lookup {
    pub const BY_NAME: Lookup = Lookup {
        required: &["name"],
        optional: &[],
    };

    pub fn keys(&self) -> impl Iterator<Item = &'static str> {
        self.required.iter().chain(self.optional.iter()).copied()
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.contains(&name)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Hooks {
    pub before_post: Option<PayloadHook>,
    pub before_patch: Option<PayloadHook>,
    pub after_read: Option<ResponseHook>,
}

pub struct ResourceDescriptor<T> {
    pub type_name: &'static str,
    /// Collection under `/api/`, e.g. `qospolicies`
    pub path: &'static str,
    pub description: &'static str,
    pub attributes: Vec<AttributeSpec<T>>,
    /// Cluster versions that have a version-specific descriptor
    pub versions: &'static [ClusterVersion],
    pub fallback: FallbackPolicy,
    pub import: ImportKey,
    pub lookup: Lookup,
    pub hooks: Hooks,
}

pub const ID_ATTRIBUTE: &str = "id";
pub const GUID_ATTRIBUTE: &str = "guid";

impl<T> ResourceDescriptor<T> {
    pub fn attribute(&self, name: &str) -> Option<&AttributeSpec<T>> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn schema(&self) -> Schema {
        let id = AttributeBuilder::new(ID_ATTRIBUTE, AttributeType::String)
            .description("Cluster assigned identifier")
            .computed()
            .build();

        self.attributes
            .iter()
            .fold(
                SchemaBuilder::new().description(self.description).attribute(id),
                |builder, spec| builder.attribute(spec.schema_attribute()),
            )
            .build()
    }

    /// Read-only view for the data source: lookup keys are configurable and
    /// everything else is computed
    pub fn data_source_schema(&self) -> Schema {
        let id = AttributeBuilder::new(ID_ATTRIBUTE, AttributeType::String)
            .description("Cluster assigned identifier")
            .computed()
            .build();

        self.attributes
            .iter()
            .fold(
                SchemaBuilder::new().description(self.description).attribute(id),
                |builder, spec| builder.attribute(spec.lookup_attribute(&self.lookup)),
            )
            .build()
    }

    /// Attribute validators plus conflict sets
    pub fn validate(&self, config: &DynamicValue) -> Vec<Diagnostic> {
        let mut diagnostics = self.schema().validate(config);
        let is_set = |name: &str| {
            !matches!(
                config.get(&AttributePath::new(name)),
                None | Some(Dynamic::Null)
            )
        };

        for spec in &self.attributes {
            if !is_set(spec.name) {
                continue;
            }
            for other in spec.conflicts_with {
                // Report each conflicting pair once
                if is_set(*other) && spec.name < *other {
                    diagnostics.push(
                        Diagnostic::error(
                            format!("Conflicting configuration arguments \"{}\"", spec.name),
                            format!("\"{}\": conflicts with {}", spec.name, other),
                        )
                        .with_attribute(spec.path()),
                    );
                }
            }
        }

        diagnostics
    }

    /// Fields the resource has on `version`
    pub fn fields_at(&self, version: &ClusterVersion) -> FieldSet {
        let mut fields = FieldSet::new();
        for spec in self.attributes.iter().filter(|a| a.available_in(version)) {
            let nested = spec.kind.nested_fields().map(|nested| {
                nested
                    .iter()
                    .filter(|f| f.available_in(version))
                    .fold(FieldSet::new(), |set, f| set.field(f.name))
            });
            fields.insert(spec.name, nested);
        }
        fields
    }
}

impl<T> VersionedResource for ResourceDescriptor<T> {
    fn type_name(&self) -> &str {
        self.type_name
    }

    fn fields_for(&self, version: &ClusterVersion) -> Option<FieldSet> {
        self.versions
            .contains(version)
            .then(|| self.fields_at(version))
    }
}

/// Any serializable field as a Dynamic tree; None becomes null
pub fn to_dynamic<S: Serialize>(value: &S) -> Dynamic {
    serde_json::to_value(value)
        .map(|json| Dynamic::from_json(&json))
        .unwrap_or(Dynamic::Null)
}

/// Dynamic map keyed by nested field name, as the projector expects for objects
pub fn object_of(pairs: Vec<(&str, Dynamic)>) -> Dynamic {
    Dynamic::Map(
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect::<HashMap<_, _>>(),
    )
}
