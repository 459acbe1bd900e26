use crate::Encoded;
use crate::assembler::Assembler;
use crate::error::{SerializationError, SerializationErrorExt};
use crate::model::Model;
use crate::registry::EncodableRegistry;
use crate::request::SerializationRequest;
use crate::view::ViewName;
use serde_json::Value;
use tracing::field::Empty;
use tracing::{Span, instrument};

/// Produces ordered mappings from models using the rules stored in an [`EncodableRegistry`].
///
/// Serialization is read-only against the registry and may run on any number of threads.
///
/// # Example
/// ```rust
/// use encodable::{EncodableRegistry, SerializationRequest, encodable_model};
///
/// #[encodable_model]
/// struct User {
///     id: u64,
///     login: String,
///     encrypted_password: String,
/// }
///
/// let registry = EncodableRegistry::new();
/// registry.configure::<User>().visible(["login", "id"])?;
///
/// let user = User { id: 7, login: "flip".into(), encrypted_password: "x".into() };
/// let encoded = registry.serializer().serialize(&user, &SerializationRequest::new())?;
///
/// assert_eq!(serde_json::Value::Object(encoded), serde_json::json!({ "login": "flip", "id": 7 }));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Serializer {
    registry: EncodableRegistry,
}

impl Serializer {
    #[must_use]
    pub const fn new(registry: EncodableRegistry) -> Self {
        Self { registry }
    }

    #[must_use]
    pub const fn registry(&self) -> &EncodableRegistry {
        &self.registry
    }

    /// Serializes one object.
    ///
    /// # Errors
    /// * [`SerializationError::UnknownAttribute`] for unknown caller keys in strict mode.
    /// * [`SerializationError::KeyCollision`] if two selected names share an output key.
    /// * [`SerializationError::DepthExceeded`] for relation chains deeper than the configured limit.
    /// * [`SerializationError::Model`] when the model fails to produce a value.
    #[instrument(skip_all, fields(model = Empty, view = Empty))]
    pub fn serialize(
        &self,
        object: &dyn Model,
        request: &SerializationRequest,
    ) -> Result<Encoded, SerializationError> {
        let span = Span::current();
        span.record("model", object.schema().name());
        match request.view_name() {
            Some(view) => span.record("view", view.as_str()),
            None => span.record("view", self.registry.settings().default_view.as_str()),
        };

        Assembler::new(&self.registry).assemble(object, request, 0)
    }

    /// Serializes one object with nothing but a view name.
    ///
    /// # Errors
    /// See [`Serializer::serialize`].
    pub fn as_json(
        &self,
        object: &dyn Model,
        view: impl Into<ViewName>,
    ) -> Result<Value, SerializationError> {
        self.serialize(object, &SerializationRequest::new().view(view)).map(Value::Object)
    }

    /// Serializes a sequence of objects with the same request, keeping their order.
    ///
    /// # Errors
    /// Fails on the first object that fails; see [`Serializer::serialize`].
    pub fn serialize_all<'a, M, I>(
        &self,
        objects: I,
        request: &SerializationRequest,
    ) -> Result<Vec<Encoded>, SerializationError>
    where
        M: Model + 'a,
        I: IntoIterator<Item = &'a M>,
    {
        objects.into_iter().map(|object| self.serialize(object, request)).collect()
    }

    /// Serializes a sequence of objects under one view into a JSON array.
    ///
    /// # Errors
    /// See [`Serializer::serialize_all`].
    pub fn as_json_all<'a, M, I>(
        &self,
        objects: I,
        view: impl Into<ViewName>,
    ) -> Result<Value, SerializationError>
    where
        M: Model + 'a,
        I: IntoIterator<Item = &'a M>,
    {
        let request = SerializationRequest::new().view(view);
        let encoded = self.serialize_all(objects, &request)?;
        Ok(Value::Array(encoded.into_iter().map(Value::Object).collect()))
    }

    /// Serializes one object straight to JSON text.
    ///
    /// # Errors
    /// See [`Serializer::serialize`]; additionally [`SerializationError::Json`] if encoding fails.
    pub fn to_json_string(
        &self,
        object: &dyn Model,
        request: &SerializationRequest,
    ) -> Result<String, SerializationError> {
        let encoded = self.serialize(object, request)?;
        serde_json::to_string(&encoded).context("encoding serialized object")
    }
}
