//! API compilation: allow-list filtering, version selection, extraction and
//! binding per service, and deduplication across the union.

use std::sync::Arc;

use chrono::NaiveDate;
use indexmap::map::Entry;
use indexmap::IndexMap;

use crate::assembly::{assemble, AssembledSchema};
use crate::backend::Backend;
use crate::binder::{bind_operation, BoundEndpoint};
use crate::config::CompileConfig;
use crate::dedupe::{dedupe, DuplicateTypeConflict};
use crate::description::ServiceApiDescription;
use crate::error::{CompileError, Result};
use crate::naming::schema_name;
use crate::types::ExtractedType;

#[derive(Debug, Clone)]
pub struct CompiledService {
    pub endpoint_prefix: String,
    pub service_id: String,
    pub api_version: String,
    /// Root field and entry-point type name.
    pub type_name: String,
    pub endpoints: Vec<BoundEndpoint>,
}

/// Everything compilation produces, before schema assembly.
#[derive(Debug, Clone)]
pub struct CompiledApi {
    pub services: Vec<CompiledService>,
    pub types: Vec<ExtractedType>,
    pub conflicts: Vec<DuplicateTypeConflict>,
}

impl CompiledApi {
    pub fn service(&self, endpoint_prefix: &str) -> Option<&CompiledService> {
        self.services.iter().find(|s| s.endpoint_prefix == endpoint_prefix)
    }

    pub fn get_type(&self, name: &str) -> Option<&ExtractedType> {
        self.types.iter().find(|t| t.name == name)
    }
}

/// Compile descriptions into a servable schema.
pub fn compile(
    config: &CompileConfig,
    descriptions: Vec<ServiceApiDescription>,
    backend: Arc<dyn Backend>,
) -> Result<AssembledSchema> {
    let version = backend.version();
    let api = compile_api(config, descriptions, backend)?;
    assemble(api, version)
}

/// Compile descriptions into types and bound endpoints.
pub fn compile_api(
    config: &CompileConfig,
    descriptions: Vec<ServiceApiDescription>,
    backend: Arc<dyn Backend>,
) -> Result<CompiledApi> {
    let selected = select_descriptions(&config.services, descriptions);
    if selected.is_empty() && !config.services.is_empty() {
        return Err(CompileError::NoMatchingServices {
            allowed: config.services.clone(),
        });
    }
    for wanted in &config.services {
        if !selected.iter().any(|d| &d.metadata.endpoint_prefix == wanted) {
            tracing::warn!(service = %wanted, "Allow-listed service has no description");
        }
    }

    let mut services = Vec::with_capacity(selected.len());
    let mut all_types = Vec::new();
    for description in &selected {
        let (service, types) = compile_service(description, backend.clone())?;
        services.push(service);
        all_types.extend(types);
    }

    let outcome = dedupe(all_types);
    if config.strict_conflicts && outcome.has_conflicts() {
        return Err(CompileError::DuplicateTypeConflict {
            names: outcome.conflicting_names(),
        });
    }

    tracing::info!(
        services = services.len(),
        types = outcome.types.len(),
        conflicts = outcome.conflicts.len(),
        "Compiled service APIs"
    );

    Ok(CompiledApi {
        services,
        types: outcome.types,
        conflicts: outcome.conflicts,
    })
}

/// Keep allow-listed descriptions, one per endpoint prefix.
///
/// `apiVersion` values are compared as `YYYY-MM-DD` dates; the later date
/// replaces an earlier one. Unparseable or equal versions keep whichever
/// description was seen first.
pub fn select_descriptions(
    allowed: &[String],
    descriptions: Vec<ServiceApiDescription>,
) -> Vec<ServiceApiDescription> {
    let mut selected: IndexMap<String, ServiceApiDescription> = IndexMap::new();

    for description in descriptions {
        let prefix = description.metadata.endpoint_prefix.clone();
        if !allowed.contains(&prefix) {
            continue;
        }
        match selected.entry(prefix) {
            Entry::Vacant(slot) => {
                slot.insert(description);
            }
            Entry::Occupied(mut slot) => {
                let current = &slot.get().metadata.api_version;
                let candidate = &description.metadata.api_version;
                if is_newer(candidate, current) {
                    tracing::info!(
                        service = %slot.key(),
                        replaced = %current,
                        with = %candidate,
                        "Preferring newer API version"
                    );
                    slot.insert(description);
                } else {
                    tracing::info!(
                        service = %slot.key(),
                        kept = %current,
                        skipped = %candidate,
                        "Skipping duplicate API description"
                    );
                }
            }
        }
    }

    selected.into_values().collect()
}

fn is_newer(candidate: &str, current: &str) -> bool {
    match (parse_version(candidate), parse_version(current)) {
        (Some(candidate), Some(current)) => candidate > current,
        _ => false,
    }
}

fn parse_version(version: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(version, "%Y-%m-%d").ok()
}

fn compile_service(
    description: &ServiceApiDescription,
    backend: Arc<dyn Backend>,
) -> Result<(CompiledService, Vec<ExtractedType>)> {
    let metadata = &description.metadata;
    let mut endpoints = Vec::with_capacity(description.operations.len());
    let mut types = Vec::new();

    for operation in description.operations.values() {
        let bound = bind_operation(&metadata.service_id, operation, &description.shapes, backend.clone())?;
        endpoints.push(bound.endpoint);
        types.extend(bound.types);
    }

    tracing::info!(
        service = %metadata.endpoint_prefix,
        api_version = %metadata.api_version,
        operations = endpoints.len(),
        types = types.len(),
        "Compiled service"
    );

    let service = CompiledService {
        endpoint_prefix: metadata.endpoint_prefix.clone(),
        service_id: metadata.service_id.clone(),
        api_version: metadata.api_version.clone(),
        type_name: schema_name(&metadata.endpoint_prefix),
        endpoints,
    };
    Ok((service, types))
}
