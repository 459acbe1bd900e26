//! The data-model capability interface consumed by the engine.
//!
//! The engine never inspects concrete types. It asks a [`ModelSchema`] what a name refers
//! to and asks the object itself for values, related objects and property results.
//! Implement [`Model`] by hand or let `#[encodable_model]` generate it.

use crate::schema::{ModelSchema, Name};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Failures raised by a model while producing values.
#[encodable_derive::encodable_error]
pub enum ModelError {
    #[error("`{model}` has no attribute `{name}`{}", Self::format_context(.context))]
    UnknownAttribute { model: Name, name: Name, context: Option<Cow<'static, str>> },

    #[error("Property `{name}` failed{}: {message}", Self::format_context(.context))]
    Property { name: Name, message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Value encoding failed{}: {source}", Self::format_context(.context))]
    Encode { source: serde_json::Error, context: Option<Cow<'static, str>> },
}

impl ModelError {
    /// Shorthand for [`ModelError::UnknownAttribute`].
    #[must_use]
    pub fn unknown(model: impl Into<Name>, name: &str) -> Self {
        Self::UnknownAttribute { model: model.into(), name: name.to_owned().into(), context: None }
    }
}

/// An object that can be serialized through the visibility engine.
pub trait Model: Send + Sync {
    /// The schema of the object's concrete type.
    fn schema(&self) -> Arc<ModelSchema>;

    /// Reads a stored field.
    ///
    /// # Errors
    /// Returns [`ModelError`] if the field does not exist or cannot be encoded.
    fn field_value(&self, name: &str) -> Result<Value, ModelError>;

    /// Resolves a relation to its already-loaded targets.
    ///
    /// # Errors
    /// Returns [`ModelError::UnknownAttribute`] unless overridden.
    fn related(&self, name: &str) -> Result<Related<'_>, ModelError> {
        Err(ModelError::unknown(self.schema().name().to_owned(), name))
    }

    /// Invokes a callable property.
    ///
    /// # Errors
    /// Returns [`ModelError::UnknownAttribute`] unless overridden.
    fn call_property(&self, name: &str) -> Result<Value, ModelError> {
        Err(ModelError::unknown(self.schema().name().to_owned(), name))
    }
}

/// Static access to a model's schema, used at configuration time.
pub trait ModelType: Model + Sized + 'static {
    fn model_schema() -> Arc<ModelSchema>;
}

/// The targets of a relation.
pub enum Related<'a> {
    One(Option<&'a dyn Model>),
    Many(Vec<&'a dyn Model>),
}

impl<'a> Related<'a> {
    pub fn one<T: Model>(target: &'a T) -> Self {
        Self::One(Some(target as &dyn Model))
    }

    pub fn optional<T: Model>(target: Option<&'a T>) -> Self {
        Self::One(target.map(|t| t as &dyn Model))
    }

    pub fn many<T, I>(targets: I) -> Self
    where
        T: Model + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        Self::Many(targets.into_iter().map(|t| t as &dyn Model).collect())
    }
}

impl fmt::Debug for Related<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One(target) => f.debug_tuple("One").field(&target.is_some()).finish(),
            Self::Many(targets) => f.debug_tuple("Many").field(&targets.len()).finish(),
        }
    }
}
