use std::any::TypeId;
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Attribute, relation, property and view names.
pub type Name = Cow<'static, str>;

/// Process-wide identity of a model type.
///
/// Equality and hashing use the [`TypeId`] only; the type name is carried for diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct ModelKey {
    id: TypeId,
    type_name: &'static str,
}

impl ModelKey {
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self { id: TypeId::of::<T>(), type_name: std::any::type_name::<T>() }
    }

    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl PartialEq for ModelKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ModelKey {}

impl Hash for ModelKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}

/// How many targets a relation resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    One,
    Many,
}

/// What a name refers to on a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Field,
    Relation(Cardinality),
    Property,
}

/// The introspectable surface of a model type: stored fields, relations,
/// callable properties and its ancestor chain.
///
/// Schemas are built once per type (see [`ModelSchema::builder`]) and answer the
/// capability queries the engine needs, so nothing downstream inspects concrete types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSchema {
    key: ModelKey,
    name: Name,
    fields: Vec<Name>,
    relations: Vec<(Name, Cardinality)>,
    properties: Vec<Name>,
    /// Nearest ancestor first.
    ancestors: Vec<ModelKey>,
}

impl ModelSchema {
    /// Starts a schema for the model type `T`.
    ///
    /// # Example
    /// ```rust
    /// use encodable::{Cardinality, ModelSchema};
    ///
    /// struct Post;
    ///
    /// let schema = ModelSchema::builder::<Post>("Post")
    ///     .fields(["id", "title"])
    ///     .relation("comments", Cardinality::Many)
    ///     .property("summary")
    ///     .build();
    ///
    /// assert!(schema.has_field("title"));
    /// assert_eq!(schema.relation("comments"), Some(Cardinality::Many));
    /// ```
    pub fn builder<T: ?Sized + 'static>(name: impl Into<Name>) -> ModelSchemaBuilder {
        ModelSchemaBuilder {
            schema: Self {
                key: ModelKey::of::<T>(),
                name: name.into(),
                fields: Vec::new(),
                relations: Vec::new(),
                properties: Vec::new(),
                ancestors: Vec::new(),
            },
        }
    }

    #[must_use]
    pub const fn key(&self) -> ModelKey {
        self.key
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stored fields in declaration order.
    #[must_use]
    pub fn stored_fields(&self) -> &[Name] {
        &self.fields
    }

    pub fn relations(&self) -> impl Iterator<Item = (&str, Cardinality)> {
        self.relations.iter().map(|(name, cardinality)| (name.as_ref(), *cardinality))
    }

    pub fn properties(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(AsRef::as_ref)
    }

    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f == name)
    }

    #[must_use]
    pub fn relation(&self, name: &str) -> Option<Cardinality> {
        self.relations.iter().find(|(r, _)| r == name).map(|(_, cardinality)| *cardinality)
    }

    #[must_use]
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.iter().any(|p| p == name)
    }

    /// Ancestor types, nearest first.
    #[must_use]
    pub fn ancestors(&self) -> &[ModelKey] {
        &self.ancestors
    }

    /// Classifies a name. Stored fields win over relations, relations over properties.
    #[must_use]
    pub fn classify(&self, name: &str) -> Option<AttributeKind> {
        if self.has_field(name) {
            Some(AttributeKind::Field)
        } else if let Some(cardinality) = self.relation(name) {
            Some(AttributeKind::Relation(cardinality))
        } else if self.has_property(name) {
            Some(AttributeKind::Property)
        } else {
            None
        }
    }

    /// The furthest ancestor first, this type last. Configuration layers merge in this order.
    pub fn lineage(&self) -> impl Iterator<Item = ModelKey> + '_ {
        self.ancestors.iter().rev().copied().chain(std::iter::once(self.key))
    }
}

/// Builder returned by [`ModelSchema::builder`].
#[derive(Debug)]
pub struct ModelSchemaBuilder {
    schema: ModelSchema,
}

impl ModelSchemaBuilder {
    #[must_use]
    pub fn field(mut self, name: impl Into<Name>) -> Self {
        push_unique(&mut self.schema.fields, name.into());
        self
    }

    #[must_use]
    pub fn fields<I, N>(self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Name>,
    {
        names.into_iter().fold(self, Self::field)
    }

    #[must_use]
    pub fn relation(mut self, name: impl Into<Name>, cardinality: Cardinality) -> Self {
        let name = name.into();
        if self.schema.relation(&name).is_none() {
            self.schema.relations.push((name, cardinality));
        }
        self
    }

    #[must_use]
    pub fn property(mut self, name: impl Into<Name>) -> Self {
        push_unique(&mut self.schema.properties, name.into());
        self
    }

    /// Makes `parent` (and, transitively, its ancestors) the ancestors of this type.
    #[must_use]
    pub fn extends(mut self, parent: &ModelSchema) -> Self {
        self.schema.ancestors = std::iter::once(parent.key)
            .chain(parent.ancestors.iter().copied())
            .collect();
        self
    }

    #[must_use]
    pub fn build(self) -> ModelSchema {
        self.schema
    }
}

fn push_unique(names: &mut Vec<Name>, name: Name) {
    if !names.contains(&name) {
        names.push(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Base;
    struct Middle;
    struct Leaf;

    #[test]
    fn classification_prefers_fields() {
        let schema = ModelSchema::builder::<Leaf>("Leaf")
            .field("owner")
            .relation("owner", Cardinality::One)
            .relation("tags", Cardinality::Many)
            .property("label")
            .build();

        assert_eq!(schema.classify("owner"), Some(AttributeKind::Field));
        assert_eq!(schema.classify("tags"), Some(AttributeKind::Relation(Cardinality::Many)));
        assert_eq!(schema.classify("label"), Some(AttributeKind::Property));
        assert_eq!(schema.classify("missing"), None);
    }

    #[test]
    fn lineage_runs_from_furthest_ancestor() {
        let base = ModelSchema::builder::<Base>("Base").build();
        let middle = ModelSchema::builder::<Middle>("Middle").extends(&base).build();
        let leaf = ModelSchema::builder::<Leaf>("Leaf").extends(&middle).build();

        assert_eq!(leaf.ancestors(), &[ModelKey::of::<Middle>(), ModelKey::of::<Base>()]);
        let lineage: Vec<_> = leaf.lineage().collect();
        assert_eq!(
            lineage,
            vec![ModelKey::of::<Base>(), ModelKey::of::<Middle>(), ModelKey::of::<Leaf>()]
        );
    }

    #[test]
    fn builder_deduplicates_names() {
        let schema = ModelSchema::builder::<Leaf>("Leaf").fields(["a", "b", "a"]).build();
        assert_eq!(schema.stored_fields(), &["a", "b"]);
    }
}
