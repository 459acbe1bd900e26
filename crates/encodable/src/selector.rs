use crate::error::SerializationError;
use crate::normalizer::{Origin, ResolvedRequest};
use crate::request::SerializationRequest;
use crate::schema::{AttributeKind, Cardinality, ModelSchema, Name};
use fxhash::FxHashSet;
use tracing::{trace, warn};

/// A key that will be emitted, classified against the model's schema.
#[derive(Debug)]
pub(crate) enum Selected {
    Field { name: Name, key: Name },
    Property { name: Name, key: Name },
    Relation { name: Name, key: Name, cardinality: Cardinality, request: SerializationRequest },
}

impl Selected {
    pub(crate) fn key(&self) -> &str {
        match self {
            Self::Field { key, .. } | Self::Property { key, .. } | Self::Relation { key, .. } => key,
        }
    }
}

/// Classifies every resolved key and scopes a nested request for each relation.
///
/// Nested requests carry the caller's nested override (if any) plus the propagated
/// exclusions. Configured exclusions of this model never leak into them.
pub(crate) fn select(
    schema: &ModelSchema,
    resolved: &ResolvedRequest<'_>,
) -> Result<Vec<Selected>, SerializationError> {
    let mut selected = Vec::with_capacity(resolved.keys.len());
    let mut emitted: FxHashSet<Name> = FxHashSet::default();

    for candidate in &resolved.keys {
        let name = &candidate.name;
        let Some(kind) = schema.classify(name) else {
            match (candidate.origin, resolved.strict) {
                (Origin::Caller, true) => {
                    return Err(SerializationError::UnknownAttribute {
                        model: schema.name().to_owned().into(),
                        name: name.clone(),
                        context: Some(format!("view `{}`", resolved.view).into()),
                    });
                },
                (Origin::Caller, false) => {
                    warn!(model = schema.name(), name = %name, "Ignoring unknown requested attribute");
                },
                (Origin::Config, _) => {
                    trace!(model = schema.name(), name = %name, "Skipping stale configured attribute");
                },
            }
            continue;
        };

        let key: Name = resolved.config.output_key(name).to_owned().into();
        if !emitted.insert(key.clone()) {
            return Err(SerializationError::KeyCollision {
                model: schema.name().to_owned().into(),
                key,
                context: Some(format!("view `{}`", resolved.view).into()),
            });
        }

        let name = name.clone();
        selected.push(match kind {
            AttributeKind::Field => Selected::Field { name, key },
            AttributeKind::Property => Selected::Property { name, key },
            AttributeKind::Relation(cardinality) => {
                let explicit = resolved
                    .request
                    .includes()
                    .iter()
                    .find(|include| include.name() == name)
                    .and_then(|include| include.request());
                let request = SerializationRequest::nested(
                    explicit,
                    resolved.propagated_except.clone(),
                    resolved.strict,
                );
                Selected::Relation { name, key, cardinality, request }
            },
        });
    }

    Ok(selected)
}
