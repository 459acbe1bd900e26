use crate::model::ModelError;
use crate::schema::Name;
use std::borrow::Cow;

/// Programmer errors raised while declaring visibility. Surfaced at startup, never retried.
#[encodable_derive::encodable_error]
pub enum ConfigurationError {
    #[error(
        "`{name}` is not a field, relation or property of {model} (view `{view}`){}",
        Self::format_context(.context)
    )]
    UnknownAttribute { model: Name, view: Name, name: Name, context: Option<Cow<'static, str>> },

    #[error(
        "Output key `{key}` of {model} (view `{view}`) is claimed by both `{first}` and `{second}`{}",
        Self::format_context(.context)
    )]
    RenameCollision {
        model: Name,
        view: Name,
        key: Name,
        first: Name,
        second: Name,
        context: Option<Cow<'static, str>>,
    },

    #[error("Invalid name{}: {message}", Self::format_context(.context))]
    InvalidName { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Errors raised while producing a serialized mapping.
#[encodable_derive::encodable_error]
pub enum SerializationError {
    /// Only raised in strict mode; lenient mode ignores unknown override keys.
    #[error("Unknown attribute `{name}` requested on {model}{}", Self::format_context(.context))]
    UnknownAttribute { model: Name, name: Name, context: Option<Cow<'static, str>> },

    #[error("Output key `{key}` of {model} is produced twice{}", Self::format_context(.context))]
    KeyCollision { model: Name, key: Name, context: Option<Cow<'static, str>> },

    #[error("Relation nesting exceeds {limit} levels{}", Self::format_context(.context))]
    DepthExceeded { limit: usize, context: Option<Cow<'static, str>> },

    /// A collaborator failure, carried unchanged as the source.
    #[error("Model error{}: {source}", Self::format_context(.context))]
    Model { source: ModelError, context: Option<Cow<'static, str>> },

    #[error("JSON error{}: {source}", Self::format_context(.context))]
    Json { source: serde_json::Error, context: Option<Cow<'static, str>> },
}
