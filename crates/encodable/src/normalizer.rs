//! Folds a caller's [`SerializationRequest`] into the stored view configuration.
//!
//! Exclusion rules:
//! * the caller's `except` always applies at its own level;
//! * exclusions cascaded from a parent apply unless this model declares the name visible;
//! * only the part of either list this model did not declare travels further down.

use crate::registry::EncodableRegistry;
use crate::request::SerializationRequest;
use crate::schema::{ModelSchema, Name};
use crate::view::{ViewConfig, ViewName};
use fxhash::FxHashSet;
use std::sync::Arc;

/// Where a candidate key came from. Stale configuration is tolerated silently,
/// unknown caller keys are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Origin {
    Config,
    Caller,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Candidate {
    pub(crate) name: Name,
    pub(crate) origin: Origin,
}

/// One request resolved against one model's configuration.
#[derive(Debug)]
pub(crate) struct ResolvedRequest<'r> {
    pub(crate) request: &'r SerializationRequest,
    pub(crate) view: ViewName,
    pub(crate) config: Arc<ViewConfig>,
    /// Visible keys in emission order, before classification and renaming.
    pub(crate) keys: Vec<Candidate>,
    /// Exclusions handed to every related object.
    pub(crate) propagated_except: Vec<Name>,
    pub(crate) strict: bool,
}

pub(crate) fn normalize<'r>(
    registry: &EncodableRegistry,
    schema: &ModelSchema,
    request: &'r SerializationRequest,
) -> ResolvedRequest<'r> {
    let settings = registry.settings();
    let view = request.view_name().cloned().unwrap_or_else(|| settings.default_view());
    let config = registry.resolve(schema, &view);
    let strict = request.strict_mode().unwrap_or(settings.strict);

    let mut excluded: FxHashSet<&str> = request.except_names().iter().map(AsRef::as_ref).collect();
    excluded.extend(
        request.inherited_except().iter().map(AsRef::as_ref).filter(|name| !config.is_declared(name)),
    );

    let mut propagated_except: Vec<Name> = Vec::new();
    for name in request.except_names().iter().chain(request.inherited_except()) {
        if !config.is_declared(name) && !propagated_except.contains(name) {
            propagated_except.push(name.clone());
        }
    }

    let permitted = |name: &str| !excluded.contains(name) && !config.is_hidden(name);
    let mut keys: Vec<Candidate> = Vec::new();
    let mut push = |name: &Name, origin: Origin| {
        if permitted(name) && !keys.iter().any(|c| c.name == *name) {
            keys.push(Candidate { name: name.clone(), origin });
        }
    };

    match request.only_names() {
        Some(only) => {
            for name in only {
                // Unknown names are left for the selector to report or ignore.
                let permitted_by_only = schema.has_field(name)
                    || config.is_declared(name)
                    || schema.classify(name).is_none();
                if permitted_by_only {
                    push(name, Origin::Caller);
                }
            }
        },
        None => {
            for name in &config.visible_attributes(schema) {
                push(name, Origin::Config);
            }
        },
    }
    for name in request.method_names() {
        push(name, Origin::Caller);
    }
    for include in request.includes() {
        push(&Name::from(include.name().to_owned()), Origin::Caller);
    }

    ResolvedRequest { request, view, config, keys, propagated_except, strict }
}
