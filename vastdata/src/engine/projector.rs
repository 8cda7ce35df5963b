//! Moves values between decoded cluster objects, Terraform state and request payloads

use serde_json::Value;
use std::collections::HashMap;
use tfplug::{AttributePath, Diagnostic, Dynamic, DynamicValue};

use super::descriptor::{
    AttributeKind, AttributeSpec, Mode, NestedField, Payload, Primitive, ResourceDescriptor,
};

/// Destination of a projection
pub trait StateBag {
    fn set(&mut self, path: &AttributePath, value: Dynamic) -> tfplug::Result<()>;
}

impl StateBag for DynamicValue {
    fn set(&mut self, path: &AttributePath, value: Dynamic) -> tfplug::Result<()> {
        self.set_value(path, value)
    }
}

/// Writes every attribute of `object` into `state`.
/// A failed write is reported and the remaining attributes are still written.
pub fn project<T>(
    descriptor: &ResourceDescriptor<T>,
    object: &T,
    state: &mut dyn StateBag,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for spec in &descriptor.attributes {
        let path = spec.path();
        let result = to_state(spec, (spec.get)(object))
            .and_then(|value| state.set(&path, value).map_err(|e| e.to_string()));

        if let Err(reason) = result {
            tracing::debug!(
                "Failed to project {}.{}: {}",
                descriptor.type_name,
                spec.name,
                reason
            );
            diagnostics.push(
                Diagnostic::error(
                    format!("Error occurred setting value to \"{}\"", spec.name),
                    reason,
                )
                .with_attribute(path),
            );
        }
    }

    diagnostics
}

fn to_state<T>(spec: &AttributeSpec<T>, value: Dynamic) -> Result<Dynamic, String> {
    let AttributeKind::Tuples(names) = spec.kind else {
        return Ok(value);
    };

    match value {
        Dynamic::List(items) => items
            .into_iter()
            .map(|item| match item {
                Dynamic::List(parts) if parts.len() == names.len() => Ok(Dynamic::Map(
                    names
                        .iter()
                        .map(|n| n.to_string())
                        .zip(parts)
                        .collect::<HashMap<_, _>>(),
                )),
                other => Err(format!(
                    "expected a list of {} values ({}), got {:?}",
                    names.len(),
                    names.join(", "),
                    other
                )),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Dynamic::List),
        Dynamic::Null => Ok(Dynamic::Null),
        other => Err(format!("expected a list, got {}", other.type_name())),
    }
}

/// Builds the request payload from configuration.
/// Computed-only attributes are never sent, absent optional ones fall back to
/// their default, and each missing required attribute is an error.
pub fn extract<T>(
    descriptor: &ResourceDescriptor<T>,
    config: &DynamicValue,
) -> Result<Payload, Vec<Diagnostic>> {
    let mut payload = Payload::new();
    let mut diagnostics = Vec::new();

    for spec in descriptor.attributes.iter().filter(|s| s.is_sent()) {
        let Some(value) = configured_value(spec, config) else {
            if spec.mode == Mode::Required {
                diagnostics.push(
                    Diagnostic::error(
                        "Missing required argument",
                        format!(
                            "The argument \"{}\" is required, but no definition was found.",
                            spec.name
                        ),
                    )
                    .with_attribute(spec.path()),
                );
            }
            continue;
        };

        match to_payload(&spec.kind, &value) {
            Ok(json) => {
                payload.insert(spec.name.to_string(), json);
            }
            Err(reason) => diagnostics.push(
                Diagnostic::error(format!("Invalid value for \"{}\"", spec.name), reason)
                    .with_attribute(spec.path()),
            ),
        }
    }

    if diagnostics.is_empty() {
        Ok(payload)
    } else {
        Err(diagnostics)
    }
}

/// Like `extract`, limited to attributes whose value differs from `prior`
pub fn extract_changes<T>(
    descriptor: &ResourceDescriptor<T>,
    plan: &DynamicValue,
    prior: &DynamicValue,
) -> Result<Payload, Vec<Diagnostic>> {
    let mut payload = extract(descriptor, plan)?;

    payload.retain(|name, value| {
        let previous = descriptor
            .attribute(name)
            .and_then(|spec| configured_value(spec, prior).map(|v| (spec, v)))
            .and_then(|(spec, v)| to_payload(&spec.kind, &v).ok());
        previous.as_ref() != Some(value)
    });

    Ok(payload)
}

fn configured_value<T>(spec: &AttributeSpec<T>, config: &DynamicValue) -> Option<Dynamic> {
    match config.get(&spec.path()) {
        Some(Dynamic::Null) | Some(Dynamic::Unknown) | None => spec.default.as_ref().map(|d| {
            d.default_value(tfplug::schema::DefaultRequest { path: spec.path() })
                .value
        }),
        Some(value) => Some(value.clone()),
    }
    .filter(|v| !v.is_null())
}

fn to_payload(kind: &AttributeKind, value: &Dynamic) -> Result<Value, String> {
    match kind {
        AttributeKind::String => Primitive::String.to_json(value),
        AttributeKind::Integer => Primitive::Integer.to_json(value),
        AttributeKind::Number => Primitive::Number.to_json(value),
        AttributeKind::Bool => Primitive::Bool.to_json(value),
        AttributeKind::List(item) => list_of(value)?
            .iter()
            .map(|v| item.to_json(v))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        AttributeKind::Object(fields) => object_payload(fields, value).map(Value::Object),
        AttributeKind::ObjectList(fields) => list_of(value)?
            .iter()
            .map(|v| object_payload(fields, v).map(Value::Object))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        AttributeKind::Tuples(names) => list_of(value)?
            .iter()
            .map(|item| {
                let Dynamic::Map(entry) = item else {
                    return Err(format!("expected an object, got {}", item.type_name()));
                };
                names
                    .iter()
                    .map(|name| match entry.get(*name) {
                        Some(Dynamic::String(s)) => Ok(Value::String(s.clone())),
                        _ => Err(format!("\"{}\" must be set on every element", name)),
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array)
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
    }
}

fn list_of(value: &Dynamic) -> Result<&Vec<Dynamic>, String> {
    match value {
        Dynamic::List(items) => Ok(items),
        other => Err(format!("expected a list, got {}", other.type_name())),
    }
}

fn object_payload(fields: &[NestedField], value: &Dynamic) -> Result<Payload, String> {
    let Dynamic::Map(entries) = value else {
        return Err(format!("expected an object, got {}", value.type_name()));
    };

    let mut object = Payload::new();
    for field in fields {
        match entries.get(field.name) {
            None | Some(Dynamic::Null) | Some(Dynamic::Unknown) => {}
            Some(v) => {
                let json = field
                    .kind
                    .to_json(v)
                    .map_err(|e| format!("{}: {}", field.name, e))?;
                object.insert(field.name.to_string(), json);
            }
        }
    }
    Ok(object)
}
