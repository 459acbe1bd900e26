use crate::Encoded;
use crate::error::{SerializationError, SerializationErrorExt};
use crate::model::{Model, Related};
use crate::normalizer::normalize;
use crate::registry::EncodableRegistry;
use crate::request::SerializationRequest;
use crate::selector::{Selected, select};
use serde_json::Value;
use tracing::trace;

/// Walks the selected keys of one object and recurses into its relations.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Assembler<'a> {
    registry: &'a EncodableRegistry,
    max_depth: usize,
}

impl<'a> Assembler<'a> {
    pub(crate) fn new(registry: &'a EncodableRegistry) -> Self {
        Self { registry, max_depth: registry.settings().max_depth }
    }

    pub(crate) fn assemble(
        self,
        object: &dyn Model,
        request: &SerializationRequest,
        depth: usize,
    ) -> Result<Encoded, SerializationError> {
        if depth > self.max_depth {
            return Err(SerializationError::DepthExceeded { limit: self.max_depth, context: None });
        }

        let schema = object.schema();
        let resolved = normalize(self.registry, &schema, request);
        let selected = select(&schema, &resolved)?;

        let mut encoded = Encoded::new();
        for entry in selected {
            let (key, value) = match entry {
                Selected::Field { name, key } => {
                    let value = object
                        .field_value(&name)
                        .context(format!("reading field `{name}` of {}", schema.name()))?;
                    (key, value)
                },
                Selected::Property { name, key } => {
                    let value = object
                        .call_property(&name)
                        .context(format!("calling property `{name}` of {}", schema.name()))?;
                    (key, value)
                },
                Selected::Relation { name, key, request, .. } => {
                    let related = object
                        .related(&name)
                        .context(format!("loading relation `{name}` of {}", schema.name()))?;
                    trace!(model = schema.name(), relation = %name, depth, "Encoding relation");
                    (key, self.relation(related, &request, depth + 1)?)
                },
            };
            encoded.insert(key.into_owned(), value);
        }

        Ok(encoded)
    }

    fn relation(
        self,
        related: Related<'_>,
        request: &SerializationRequest,
        depth: usize,
    ) -> Result<Value, SerializationError> {
        match related {
            Related::One(None) => Ok(Value::Null),
            Related::One(Some(target)) => self.assemble(target, request, depth).map(Value::Object),
            Related::Many(targets) => targets
                .into_iter()
                .map(|target| self.assemble(target, request, depth).map(Value::Object))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
        }
    }
}
