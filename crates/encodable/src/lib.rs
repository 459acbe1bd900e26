//! Declarative, view-aware attribute visibility for serializing data models.
//!
//! A model type declares which of its stored fields, relations and computed properties may
//! appear in its serialized form, under one or more named views. The first visible
//! declaration flips a view into whitelist mode; hidden declarations always subtract.
//! At call time a [`SerializationRequest`] narrows or extends the stored rules for one call,
//! and its exclusions cascade into related objects for names the parent never opted into.
//!
//! ## Pipeline
//!
//! 1. [`EncodableRegistry`] stores and merges per-type, per-view rules (ancestors first).
//! 2. The normalizer folds a request into the merged rules.
//! 3. The selector classifies each key as a field, relation or property.
//! 4. The assembler pulls values and recurses into relations.
//!
//! ## Example
//!
//! ```rust
//! use encodable::prelude::*;
//! use serde_json::json;
//!
//! #[encodable_model]
//! struct Permission {
//!     id: u64,
//!     name: String,
//! }
//!
//! #[encodable_model(properties(display_name))]
//! struct User {
//!     id: u64,
//!     login: String,
//!     email: String,
//!     #[encodable(relation)]
//!     permissions: Vec<Permission>,
//! }
//!
//! impl User {
//!     fn display_name(&self) -> String {
//!         format!("@{}", self.login)
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = EncodableRegistry::new();
//! registry.configure::<User>().visible(["login", "permissions"])?;
//! registry.configure::<User>().view("profile").visible(["display_name"])?;
//!
//! let user = User {
//!     id: 1,
//!     login: "flip".into(),
//!     email: "flip@example.com".into(),
//!     permissions: vec![Permission { id: 3, name: "admin".into() }],
//! };
//!
//! let serializer = registry.serializer();
//! let request = SerializationRequest::new().except(["id"]);
//! assert_eq!(
//!     serde_json::Value::Object(user.encode(&serializer, &request)?),
//!     json!({ "login": "flip", "permissions": [{ "name": "admin" }] })
//! );
//! assert_eq!(user.as_json(&serializer, "profile")?, json!({ "display_name": "@flip" }));
//! # Ok(())
//! # }
//! ```

mod assembler;
mod error;
pub mod extensions;
mod model;
mod normalizer;
mod registry;
mod request;
mod schema;
mod selector;
mod serializer;
mod settings;
mod view;

pub use encodable_derive::encodable_model;
pub use error::{
    ConfigurationError, ConfigurationErrorExt, SerializationError, SerializationErrorExt,
};
pub use extensions::EncodableExt;
pub use model::{Model, ModelError, ModelErrorExt, ModelType, Related};
pub use registry::{Declaration, EncodableRegistry, ModelConfigurator};
pub use request::{Include, SerializationRequest};
pub use schema::{AttributeKind, Cardinality, ModelKey, ModelSchema, ModelSchemaBuilder, Name};
pub use serde_json;
pub use serde_json::Value;
pub use serializer::Serializer;
pub use settings::{Settings, SettingsError, SettingsErrorExt, load_settings};
pub use view::{ViewConfig, ViewName};

/// An ordered serialized object: output key to value.
pub type Encoded = serde_json::Map<String, Value>;

pub mod prelude {
    pub use crate::error::{ConfigurationError, SerializationError};
    pub use crate::extensions::EncodableExt;
    pub use crate::model::{Model, ModelError, ModelType, Related};
    pub use crate::registry::{Declaration, EncodableRegistry};
    pub use crate::request::SerializationRequest;
    pub use crate::schema::{Cardinality, ModelSchema};
    pub use crate::serializer::Serializer;
    pub use crate::view::ViewName;
    pub use crate::{Encoded, encodable_model};
}
