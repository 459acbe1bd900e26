use encodable::prelude::*;
use encodable::{ModelError, Settings};
use std::sync::Arc;

#[encodable_model(properties(hello))]
#[derive(Debug, Clone)]
pub struct Permission {
    pub id: u64,
    pub user_id: u64,
    pub name: String,
}

impl Permission {
    #[must_use]
    pub fn hello(&self) -> &'static str {
        "World!"
    }
}

#[encodable_model]
#[derive(Debug, Clone)]
pub struct Profile {
    pub id: u64,
    pub bio: String,
}

#[encodable_model(properties(foobar))]
#[derive(Debug, Clone)]
pub struct User {
    pub id: u64,
    pub login: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub encrypted_password: String,
    pub admin: bool,
    #[encodable(relation)]
    pub permissions: Vec<Permission>,
    #[encodable(relation)]
    pub profile: Option<Profile>,
    #[encodable(skip)]
    pub session_token: String,
}

impl User {
    #[must_use]
    pub fn foobar(&self) -> String {
        format!("{}:{}", self.login, self.id)
    }
}

#[encodable_model(name = "Admin", extends = User)]
#[derive(Debug, Clone)]
pub struct Admin {
    pub id: u64,
    pub login: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub encrypted_password: String,
    pub admin: bool,
    pub level: u8,
}

/// A self-referencing model for nesting limits.
#[encodable_model]
#[derive(Debug, Clone)]
pub struct Node {
    pub id: u64,
    #[encodable(relation)]
    pub children: Vec<Node>,
}

/// A hand-written model whose property always fails.
#[derive(Debug)]
pub struct Flaky;

impl Model for Flaky {
    fn schema(&self) -> Arc<ModelSchema> {
        Self::model_schema()
    }

    fn field_value(&self, name: &str) -> Result<serde_json::Value, ModelError> {
        match name {
            "id" => Ok(serde_json::json!(1)),
            _ => Err(ModelError::unknown("Flaky", name)),
        }
    }

    fn call_property(&self, name: &str) -> Result<serde_json::Value, ModelError> {
        Err(ModelError::Property {
            name: name.to_owned().into(),
            message: "upstream unavailable".into(),
            context: None,
        })
    }
}

impl ModelType for Flaky {
    fn model_schema() -> Arc<ModelSchema> {
        Arc::new(ModelSchema::builder::<Self>("Flaky").field("id").property("status").build())
    }
}

#[must_use]
pub fn permission(id: u64, name: &str) -> Permission {
    Permission { id, user_id: 42, name: name.to_owned() }
}

#[must_use]
pub fn user() -> User {
    User {
        id: 42,
        login: "flip".into(),
        email: "flip@example.com".into(),
        first_name: "Flip".into(),
        last_name: "Sasser".into(),
        encrypted_password: "$2a$10$secret".into(),
        admin: false,
        permissions: vec![permission(1, "read"), permission(2, "write")],
        profile: None,
        session_token: "token".into(),
    }
}

#[must_use]
pub fn admin() -> Admin {
    Admin {
        id: 7,
        login: "root".into(),
        email: "root@example.com".into(),
        first_name: "Ada".into(),
        last_name: "Root".into(),
        encrypted_password: "$2a$10$root".into(),
        admin: true,
        level: 3,
    }
}

/// A chain of `depth` nested nodes below the root.
#[must_use]
pub fn chain(depth: u64) -> Node {
    (0..depth).fold(Node { id: depth, children: Vec::new() }, |child, id| Node {
        id: depth - id - 1,
        children: vec![child],
    })
}

#[must_use]
pub fn strict_registry() -> EncodableRegistry {
    EncodableRegistry::with_settings(Settings { strict: true, ..Settings::default() })
}

/// Serializes `object` and wraps the mapping for comparison against `json!` literals.
/// # Panics
/// * If serialization fails.
pub fn encode(
    registry: &EncodableRegistry,
    object: &dyn Model,
    request: &SerializationRequest,
) -> serde_json::Value {
    let encoded = registry.serializer().serialize(object, request).expect("serialization failed");
    serde_json::Value::Object(encoded)
}

#[must_use]
pub fn keys(value: &serde_json::Value) -> Vec<&str> {
    value.as_object().map(|map| map.keys().map(String::as_str).collect()).unwrap_or_default()
}
