//! Create, read, update, delete, import and data source lookups against the
//! VAST REST API
//!
//! Each operation is independent: the only state is the Terraform state
//! passed in and the object on the cluster. Problems are appended to the
//! caller's diagnostics; nothing here panics.

use serde_json::Value;
use tfplug::{AttributePath, Context, Diagnostic, Dynamic, DynamicValue};

use super::descriptor::{
    DomainObject, FallbackPolicy, ImportKey, Payload, ResourceDescriptor, GUID_ATTRIBUTE,
    ID_ATTRIBUTE,
};
use super::projector::{extract, extract_changes, project};
use crate::api::{collection_path, item_path, ApiError, ApiQueryParams, Client};
use crate::provider_data::VastProviderData;
use crate::versions::gate::INCOMPATIBLE_SUMMARY;
use crate::versions::{check, ClusterVersion, GateOutcome, ValidationMode, BUILD_VERSION};

const READ_ERROR: &str = "Error occurred while obtaining data from the VAST Data cluster";

pub struct Engine<'a, T> {
    client: &'a Client,
    descriptor: &'a ResourceDescriptor<T>,
    cluster_version: ClusterVersion,
    mode: ValidationMode,
}

impl<'a, T: DomainObject> Engine<'a, T> {
    pub fn new(provider_data: &'a VastProviderData, descriptor: &'a ResourceDescriptor<T>) -> Self {
        Self {
            client: provider_data.client.as_ref(),
            descriptor,
            cluster_version: provider_data.cluster_version,
            mode: provider_data.validation_mode,
        }
    }

    /// Extract, gate, POST, then read the new object back
    pub async fn create(
        &self,
        ctx: &Context,
        config: &DynamicValue,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<DynamicValue> {
        let type_name = self.descriptor.type_name;
        tracing::info!("Creating resource {}", type_name);

        // Only configured fields are gated; the hook may add fields of its own
        let mut payload = self.payload(extract(self.descriptor, config), diagnostics)?;
        if !self.gate(&payload, diagnostics) || !self.proceed(ctx, diagnostics) {
            return None;
        }
        if let Some(hook) = self.descriptor.hooks.before_post {
            hook(&mut payload, config);
        }
        let body = Value::Object(payload.clone());
        tracing::debug!("Request json created {}", body);

        let mut response = match self
            .client
            .post(&collection_path(self.descriptor.path), &payload)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "Error occurred while creating a resource in the VAST Data cluster",
                    e.to_string(),
                ));
                return None;
            }
        };

        if let Some(hook) = self.descriptor.hooks.after_read {
            hook(&mut response);
        }
        let object = self.decode(response, diagnostics)?;
        let Some(id) = object.id() else {
            diagnostics.push(Diagnostic::error(
                "Failed to get id of new resource",
                format!("{} create response carried no id", type_name),
            ));
            return None;
        };

        let mut state = DynamicValue::empty_object();
        diagnostics.extend(project(self.descriptor, &object, &mut state));
        self.set_id(&mut state, id, diagnostics);

        match self.read(ctx, &state, diagnostics).await {
            Some(normalised) => Some(normalised),
            None => {
                diagnostics.push(Diagnostic::error(
                    "Resource not found after create",
                    format!("{} with id {} could not be read back", type_name, id),
                ));
                Some(state)
            }
        }
    }

    /// GET by id, falling back to a GUID lookup where allowed.
    /// None means the object no longer exists; errors keep the current state.
    pub async fn read(
        &self,
        ctx: &Context,
        state: &DynamicValue,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<DynamicValue> {
        let Some(id) = self.state_id(state, diagnostics) else {
            return Some(state.clone());
        };
        if !self.proceed(ctx, diagnostics) {
            return Some(state.clone());
        }

        let response = match self.client.get(&item_path(self.descriptor.path, id)).await {
            Ok(response) => Some(response),
            Err(e) if e.is_not_found() => match self.fallback(ctx, state, &e).await {
                Ok(found) => found,
                Err(diagnostic) => {
                    diagnostics.push(diagnostic);
                    return Some(state.clone());
                }
            },
            Err(e) => {
                diagnostics.push(Diagnostic::error(READ_ERROR, e.to_string()));
                return Some(state.clone());
            }
        };

        let Some(mut response) = response else {
            tracing::warn!(
                "Read[{}]: no such resource with id {}, removing it from state",
                self.descriptor.type_name,
                id
            );
            return None;
        };

        if let Some(hook) = self.descriptor.hooks.after_read {
            hook(&mut response);
        }
        let Some(object) = self.decode(response, diagnostics) else {
            return Some(state.clone());
        };

        let mut new_state = state.clone();
        diagnostics.extend(project(self.descriptor, &object, &mut new_state));
        if let Some(current) = object.id().filter(|current| *current != id) {
            tracing::debug!("Resource moved from id {} to {}", id, current);
            self.set_id(&mut new_state, current, diagnostics);
        }
        Some(new_state)
    }

    /// PATCH the changed attributes, then read back.
    /// On failure the prior state is returned unchanged.
    pub async fn update(
        &self,
        ctx: &Context,
        prior: &DynamicValue,
        plan: &DynamicValue,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> DynamicValue {
        let type_name = self.descriptor.type_name;
        tracing::info!("Updating resource {}", type_name);

        let Some(id) = self.state_id(prior, diagnostics) else {
            return prior.clone();
        };
        let Some(mut payload) = self.payload(extract_changes(self.descriptor, plan, prior), diagnostics)
        else {
            return prior.clone();
        };
        if !self.gate(&payload, diagnostics) || !self.proceed(ctx, diagnostics) {
            return prior.clone();
        }
        if let Some(hook) = self.descriptor.hooks.before_patch {
            hook(&mut payload, plan);
        }

        if payload.is_empty() {
            tracing::debug!("Update[{}]: no changes detected", type_name);
        } else if let Err(e) = self
            .client
            .patch(&item_path(self.descriptor.path, id), &payload)
            .await
        {
            diagnostics.push(Diagnostic::error(
                "Error occurred while updating a resource in the VAST Data cluster",
                e.to_string(),
            ));
            return prior.clone();
        }

        let mut base = plan.clone();
        self.set_id(&mut base, id, diagnostics);
        if let Some(guid) = prior.get(&AttributePath::new(GUID_ATTRIBUTE)) {
            let path = AttributePath::new(GUID_ATTRIBUTE);
            if let Err(e) = base.set_value(&path, guid.clone()) {
                diagnostics.push(
                    Diagnostic::error("Error occurred setting value to \"guid\"", e.to_string())
                        .with_attribute(path),
                );
            }
        }

        match self.read(ctx, &base, diagnostics).await {
            Some(state) => state,
            None => {
                diagnostics.push(Diagnostic::error(
                    "Resource not found after update",
                    format!("{} with id {} no longer exists", type_name, id),
                ));
                base
            }
        }
    }

    /// DELETE by id; an object that is already gone counts as deleted
    pub async fn delete(&self, ctx: &Context, state: &DynamicValue, diagnostics: &mut Vec<Diagnostic>) {
        let Some(id) = self.state_id(state, diagnostics) else {
            return;
        };
        if !self.proceed(ctx, diagnostics) {
            return;
        }

        match self.client.delete(&item_path(self.descriptor.path, id)).await {
            Ok(_) => tracing::info!("Deleted {} {}", self.descriptor.type_name, id),
            Err(e) if e.is_not_found() => {
                tracing::debug!("{} {} already deleted", self.descriptor.type_name, id)
            }
            Err(e) => diagnostics.push(Diagnostic::error(
                "Error occurred while deleting a resource from the VAST Data cluster",
                e.to_string(),
            )),
        }
    }

    /// Looks the object up by the import key and builds its state.
    /// Zero matches is an error; with several, the first is taken.
    pub async fn import(
        &self,
        ctx: &Context,
        import_id: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<DynamicValue> {
        let params = match self.import_params(import_id) {
            Ok(params) => params,
            Err(diagnostic) => {
                diagnostics.push(diagnostic);
                return None;
            }
        };
        if !self.proceed(ctx, diagnostics) {
            return None;
        }

        let items = match self
            .client
            .list(&collection_path(self.descriptor.path), &params)
            .await
        {
            Ok(items) => items,
            Err(e) => {
                diagnostics.push(Diagnostic::error(READ_ERROR, e.to_string()));
                return None;
            }
        };

        if items.len() > 1 {
            tracing::warn!(
                "Import[{}]: {} elements match {}, using the first",
                self.descriptor.type_name,
                items.len(),
                import_id
            );
        }
        let Some(mut first) = items.into_iter().next() else {
            diagnostics.push(Diagnostic::error(
                "Error occurred while importing resource",
                "cluster provided 0 elements matching this lookup",
            ));
            return None;
        };

        if let Some(hook) = self.descriptor.hooks.after_read {
            hook(&mut first);
        }
        let object = self.decode(first, diagnostics)?;
        let Some(id) = object.id() else {
            diagnostics.push(Diagnostic::error(
                "Error occurred while importing resource",
                "matched element carries no id",
            ));
            return None;
        };

        let mut state = DynamicValue::empty_object();
        self.set_id(&mut state, id, diagnostics);
        diagnostics.extend(project(self.descriptor, &object, &mut state));
        Some(state)
    }

    /// Lists the collection filtered by the lookup keys in `config`.
    /// Exactly one object must match.
    pub async fn lookup(
        &self,
        ctx: &Context,
        config: &DynamicValue,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<DynamicValue> {
        let type_name = self.descriptor.type_name;
        let params = match self.lookup_params(config) {
            Ok(params) => params,
            Err(diagnostic) => {
                diagnostics.push(diagnostic);
                return None;
            }
        };
        if !self.proceed(ctx, diagnostics) {
            return None;
        }

        let mut items = match self
            .client
            .list(&collection_path(self.descriptor.path), &params)
            .await
        {
            Ok(items) => items,
            Err(e) => {
                diagnostics.push(Diagnostic::error(READ_ERROR, e.to_string()));
                return None;
            }
        };

        if items.len() > 1 {
            diagnostics.push(Diagnostic::error(
                "Multiple results returned, you might want to add more attributes to get a specific resource",
                format!("{} elements of {} match", items.len(), type_name),
            ));
            return None;
        }
        let Some(mut found) = items.pop() else {
            diagnostics.push(Diagnostic::error(
                "Could not find a resource that matches those attributes",
                format!("no {} matches the given lookup", type_name),
            ));
            return None;
        };

        if let Some(hook) = self.descriptor.hooks.after_read {
            hook(&mut found);
        }
        let object = self.decode(found, diagnostics)?;
        let Some(id) = object.id() else {
            diagnostics.push(Diagnostic::error(READ_ERROR, "matched element carries no id"));
            return None;
        };
        tracing::debug!("Lookup[{}]: found id {}", type_name, id);

        let mut state = config.clone();
        self.set_id(&mut state, id, diagnostics);
        diagnostics.extend(project(self.descriptor, &object, &mut state));
        Some(state)
    }

    fn lookup_params(&self, config: &DynamicValue) -> Result<ApiQueryParams, Diagnostic> {
        let lookup = self.descriptor.lookup;
        let mut params = ApiQueryParams::new();

        for name in lookup.keys() {
            let path = AttributePath::new(name);
            let value = match config.get(&path) {
                None | Some(Dynamic::Null) | Some(Dynamic::Unknown) if lookup.is_required(name) => {
                    return Err(Diagnostic::error(
                        "Missing lookup attribute",
                        format!("\"{}\" is required to look up {}", name, self.descriptor.type_name),
                    )
                    .with_attribute(path));
                }
                None | Some(Dynamic::Null) | Some(Dynamic::Unknown) => continue,
                Some(value) => value,
            };

            let converted = self
                .descriptor
                .attribute(name)
                .and_then(|spec| spec.kind.primitive())
                .ok_or_else(|| format!("\"{}\" cannot be used as a lookup key", name))
                .and_then(|primitive| primitive.to_json(value));
            match converted {
                Ok(Value::String(s)) => params = params.add(name, s),
                Ok(other) => params = params.add(name, other),
                Err(reason) => {
                    return Err(
                        Diagnostic::error("Invalid lookup attribute", reason).with_attribute(path)
                    )
                }
            }
        }

        Ok(params)
    }

    fn import_params(&self, import_id: &str) -> Result<ApiQueryParams, Diagnostic> {
        match self.descriptor.import {
            ImportKey::Guid => Ok(ApiQueryParams::new().add("guid", import_id.trim())),
            ImportKey::Fields(fields) => {
                let parts: Vec<&str> = import_id.split('|').map(str::trim).collect();
                if parts.len() != fields.len() || parts.iter().any(|p| p.is_empty()) {
                    return Err(Diagnostic::error(
                        "Invalid import id",
                        format!(
                            "expected import id in the format \"{}\", got \"{}\"",
                            self.descriptor.import.format(),
                            import_id
                        ),
                    ));
                }
                Ok(fields
                    .iter()
                    .zip(parts)
                    .fold(ApiQueryParams::new(), |params, ((_, query), value)| {
                        params.add(*query, value)
                    }))
            }
        }
    }

    /// Ok(None) when no fallback applies or the GUID matches nothing
    async fn fallback(
        &self,
        ctx: &Context,
        state: &DynamicValue,
        original: &ApiError,
    ) -> Result<Option<Value>, Diagnostic> {
        if self.descriptor.fallback == FallbackPolicy::Disabled {
            return Ok(None);
        }
        let Some(guid) = state
            .get_string(&AttributePath::new(GUID_ATTRIBUTE))
            .ok()
            .filter(|guid| !guid.is_empty())
        else {
            return Ok(None);
        };
        ctx.check()
            .map_err(|e| Diagnostic::error("Operation cancelled", e.to_string()))?;

        tracing::debug!(
            "Read[{}]: id not found, looking up GUID {}",
            self.descriptor.type_name,
            guid
        );
        self.client
            .list(
                &collection_path(self.descriptor.path),
                &ApiQueryParams::new().add("guid", &guid),
            )
            .await
            .map(|items| items.into_iter().next())
            .map_err(|e| {
                Diagnostic::error(
                    READ_ERROR,
                    format!(
                        "Initial request failed:\n{}\nFallback request also failed:\n{}",
                        original, e
                    ),
                )
            })
    }

    fn gate(&self, payload: &Payload, diagnostics: &mut Vec<Diagnostic>) -> bool {
        match check(
            &self.cluster_version,
            &BUILD_VERSION,
            self.descriptor,
            payload,
            self.mode,
        ) {
            GateOutcome::Equal | GateOutcome::CompatibleWarn(_) => true,
            GateOutcome::IncompatibleFail(message) => {
                diagnostics.push(Diagnostic::error(INCOMPATIBLE_SUMMARY, message));
                false
            }
        }
    }

    /// False once the context is cancelled
    fn proceed(&self, ctx: &Context, diagnostics: &mut Vec<Diagnostic>) -> bool {
        match ctx.check() {
            Ok(()) => true,
            Err(e) => {
                diagnostics.push(Diagnostic::error("Operation cancelled", e.to_string()));
                false
            }
        }
    }

    fn payload(
        &self,
        extracted: Result<Payload, Vec<Diagnostic>>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<Payload> {
        extracted
            .map_err(|errors| diagnostics.extend(errors))
            .ok()
    }

    fn decode(&self, response: Value, diagnostics: &mut Vec<Diagnostic>) -> Option<T> {
        serde_json::from_value(response)
            .map_err(|e| {
                diagnostics.push(Diagnostic::error(
                    format!(
                        "Failed to convert response body into {}",
                        self.descriptor.type_name
                    ),
                    e.to_string(),
                ))
            })
            .ok()
    }

    fn state_id(&self, state: &DynamicValue, diagnostics: &mut Vec<Diagnostic>) -> Option<i64> {
        let path = AttributePath::new(ID_ATTRIBUTE);
        let parsed = state
            .get_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|raw| raw.parse::<i64>().map_err(|e| format!("'{}': {}", raw, e)));

        match parsed {
            Ok(id) => Some(id),
            Err(reason) => {
                diagnostics.push(
                    Diagnostic::error("Invalid resource id in state", reason).with_attribute(path),
                );
                None
            }
        }
    }

    fn set_id(&self, state: &mut DynamicValue, id: i64, diagnostics: &mut Vec<Diagnostic>) {
        let path = AttributePath::new(ID_ATTRIBUTE);
        if let Err(e) = state.set_string(&path, id.to_string()) {
            diagnostics.push(
                Diagnostic::error("Error occurred setting value to \"id\"", e.to_string())
                    .with_attribute(path),
            );
        }
    }
}
