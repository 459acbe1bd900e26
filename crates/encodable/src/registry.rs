use crate::error::ConfigurationError;
use crate::model::ModelType;
use crate::schema::{ModelKey, ModelSchema, Name};
use crate::serializer::Serializer;
use crate::settings::Settings;
use crate::view::{ViewConfig, ViewName};
use fxhash::FxHashMap;
use moka::sync::Cache;
use parking_lot::RwLock;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, trace};

/// Upper bound of merged configurations kept per registry.
const MAX_RESOLVED_CAPACITY: u64 = 10_000;

/// One entry of a visible declaration: a bare name or a `source -> output` rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    source: Name,
    output: Option<Name>,
}

impl Declaration {
    #[must_use]
    pub fn renamed(source: impl Into<Name>, output: impl Into<Name>) -> Self {
        Self { source: source.into(), output: Some(output.into()) }
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl From<&'static str> for Declaration {
    fn from(source: &'static str) -> Self {
        Self { source: Cow::Borrowed(source), output: None }
    }
}

impl From<String> for Declaration {
    fn from(source: String) -> Self {
        Self { source: Cow::Owned(source), output: None }
    }
}

impl From<Name> for Declaration {
    fn from(source: Name) -> Self {
        Self { source, output: None }
    }
}

impl From<(&'static str, &'static str)> for Declaration {
    fn from((source, output): (&'static str, &'static str)) -> Self {
        Self::renamed(source, output)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ViewKey {
    model: ModelKey,
    view: ViewName,
}

/// Declared layers plus a counter bumped on every commit.
#[derive(Debug, Default)]
struct Layers {
    views: FxHashMap<ViewKey, ViewConfig>,
    generation: u64,
}

/// Merged configurations are cached per generation, so a merge computed from layers
/// that were replaced meanwhile is never served again.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ResolvedKey {
    view: ViewKey,
    generation: u64,
}

struct RegistryInner {
    settings: Settings,
    layers: RwLock<Layers>,
    resolved: Cache<ResolvedKey, Arc<ViewConfig>>,
}

impl fmt::Debug for RegistryInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let layers = self.layers.read();
        f.debug_struct("RegistryInner")
            .field("settings", &self.settings)
            .field("views", &layers.views.len())
            .field("generation", &layers.generation)
            .field("resolved", &self.resolved.entry_count())
            .finish()
    }
}

/// Process-wide store of visibility rules, keyed by model type and view.
///
/// Declarations layer per type. [`EncodableRegistry::resolve`] merges a type's
/// ancestors (furthest first) under its own layer and caches the result until
/// the next declaration. Cloning is cheap and shares the same store.
///
/// # Example
/// ```rust
/// use encodable::{EncodableRegistry, ModelSchema};
///
/// struct User;
/// let schema = ModelSchema::builder::<User>("User").fields(["id", "login", "email"]).build();
///
/// let registry = EncodableRegistry::new();
/// registry.declare_visible(&schema, "default", ["login", "id"], None).unwrap();
///
/// let config = registry.resolve(&schema, &"default".into());
/// assert!(config.is_whitelist());
/// assert!(config.is_hidden("email"));
/// ```
#[derive(Debug, Clone)]
pub struct EncodableRegistry {
    inner: Arc<RegistryInner>,
}

impl Default for EncodableRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EncodableRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    #[must_use]
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                settings,
                layers: RwLock::new(Layers::default()),
                resolved: Cache::new(MAX_RESOLVED_CAPACITY),
            }),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    /// A serializer reading from this registry.
    #[must_use]
    pub fn serializer(&self) -> Serializer {
        Serializer::new(self.clone())
    }

    /// Starts fluent configuration of `T` under the default view.
    #[must_use]
    pub fn configure<T: ModelType>(&self) -> ModelConfigurator<'_> {
        ModelConfigurator {
            registry: self,
            schema: T::model_schema(),
            view: self.inner.settings.default_view(),
        }
    }

    /// Declares `entries` visible for `(schema, view)`.
    ///
    /// The first declaration for a pair switches it to whitelist mode. Stored fields that
    /// no layer of the lineage declares are hidden when the view is resolved, so ancestors
    /// and descendants may be configured in any order. Each entry is un-hidden, appended
    /// to the declared order and, when renamed or prefixed, recorded under its output key.
    /// The call is atomic: on error nothing changes.
    ///
    /// # Errors
    /// * [`ConfigurationError::InvalidName`] for empty names or an empty prefix.
    /// * [`ConfigurationError::UnknownAttribute`] if a name is not a field, relation or property.
    /// * [`ConfigurationError::RenameCollision`] if two visible names, including those
    ///   inherited from ancestors, would share an output key.
    #[instrument(skip_all, fields(model = schema.name()))]
    pub fn declare_visible<I, D>(
        &self,
        schema: &ModelSchema,
        view: impl Into<ViewName>,
        entries: I,
        prefix: Option<&str>,
    ) -> Result<(), ConfigurationError>
    where
        I: IntoIterator<Item = D>,
        D: Into<Declaration>,
    {
        let view = view.into();
        let entries: Vec<Declaration> = entries.into_iter().map(Into::into).collect();
        if prefix.is_some_and(str::is_empty) {
            return Err(ConfigurationError::InvalidName {
                message: "prefix must not be empty".into(),
                context: Some(format!("declaring visible attributes of {}", schema.name()).into()),
            });
        }
        for entry in &entries {
            validate(schema, &view, &entry.source)?;
            if entry.output.as_deref().is_some_and(str::is_empty) {
                return Err(ConfigurationError::InvalidName {
                    message: format!("`{}` is renamed to an empty key", entry.source).into(),
                    context: None,
                });
            }
        }

        let key = ViewKey { model: schema.key(), view };
        let mut layers = self.inner.layers.write();
        let mut staged = layers.views.get(&key).cloned().unwrap_or_default();
        if staged.start_whitelist() {
            debug!(view = %key.view, "Switched to whitelist mode");
        }

        let mut combined =
            merge(&layers.views, schema.lineage().filter(|m| *m != key.model), &key.view);
        combined.layer(&staged);

        let separator = &self.inner.settings.prefix_separator;
        for Declaration { source, output } in entries {
            let output = match prefix {
                Some(prefix) => {
                    let base = output.as_deref().unwrap_or(&source);
                    Some(Cow::Owned(format!("{prefix}{separator}{base}")))
                },
                None => output,
            };
            let emitted = output.as_deref().unwrap_or_else(|| combined.output_key(&source));
            if let Some(first) = combined.claimant_of(emitted, &source) {
                return Err(ConfigurationError::RenameCollision {
                    model: schema.name().to_owned().into(),
                    view: key.view.clone().into_inner(),
                    key: emitted.to_owned().into(),
                    first: first.clone(),
                    second: source,
                    context: None,
                });
            }
            combined.declare(source.clone(), output.clone());
            staged.declare(source, output);
        }

        layers.views.insert(key, staged);
        layers.generation += 1;
        drop(layers);
        self.inner.resolved.invalidate_all();
        Ok(())
    }

    /// Hides `names` for `(schema, view)` in either mode. Hiding never grants visibility,
    /// and hiding a name twice is the same as hiding it once.
    ///
    /// # Errors
    /// Returns [`ConfigurationError::UnknownAttribute`] or [`ConfigurationError::InvalidName`]
    /// for names the model does not know.
    #[instrument(skip_all, fields(model = schema.name()))]
    pub fn declare_hidden<I, N>(
        &self,
        schema: &ModelSchema,
        view: impl Into<ViewName>,
        names: I,
    ) -> Result<(), ConfigurationError>
    where
        I: IntoIterator<Item = N>,
        N: Into<Name>,
    {
        let view = view.into();
        let names: Vec<Name> = names.into_iter().map(Into::into).collect();
        for name in &names {
            validate(schema, &view, name)?;
        }

        let key = ViewKey { model: schema.key(), view };
        let mut layers = self.inner.layers.write();
        let config = layers.views.entry(key).or_default();
        for name in names {
            config.hide(name);
        }
        layers.generation += 1;
        drop(layers);
        self.inner.resolved.invalidate_all();
        Ok(())
    }

    /// The ancestor-merged configuration of `(schema, view)`.
    ///
    /// In whitelist mode the result hides every stored field of `schema` that no layer
    /// declared. Computed on first access and cached until the next declaration.
    #[must_use]
    pub fn resolve(&self, schema: &ModelSchema, view: &ViewName) -> Arc<ViewConfig> {
        let generation = self.inner.layers.read().generation;
        let key = ResolvedKey {
            view: ViewKey { model: schema.key(), view: view.clone() },
            generation,
        };
        if let Some(config) = self.inner.resolved.get(&key) {
            trace!(model = schema.name(), view = %view, "Resolved configuration cache hit");
            return config;
        }

        self.inner.resolved.get_with(key, || {
            let mut merged = merge(&self.inner.layers.read().views, schema.lineage(), view);
            merged.hide_undeclared(schema.stored_fields());
            debug!(
                model = schema.name(),
                view = %view,
                whitelist = merged.is_whitelist(),
                declared = merged.declared().len(),
                "Merged view configuration"
            );
            Arc::new(merged)
        })
    }
}

fn merge(
    views: &FxHashMap<ViewKey, ViewConfig>,
    lineage: impl Iterator<Item = ModelKey>,
    view: &ViewName,
) -> ViewConfig {
    let mut merged = ViewConfig::default();
    for model in lineage {
        if let Some(layer) = views.get(&ViewKey { model, view: view.clone() }) {
            merged.layer(layer);
        }
    }
    merged
}

fn validate(schema: &ModelSchema, view: &ViewName, name: &str) -> Result<(), ConfigurationError> {
    if name.trim().is_empty() {
        return Err(ConfigurationError::InvalidName {
            message: format!("empty attribute name on {} (view `{view}`)", schema.name()).into(),
            context: None,
        });
    }
    if schema.classify(name).is_none() {
        return Err(ConfigurationError::UnknownAttribute {
            model: schema.name().to_owned().into(),
            view: view.clone().into_inner(),
            name: name.to_owned().into(),
            context: None,
        });
    }
    Ok(())
}

/// Fluent, type-driven configuration returned by [`EncodableRegistry::configure`].
///
/// ```rust
/// use encodable::{Declaration, EncodableRegistry, encodable_model};
///
/// #[encodable_model]
/// struct Account {
///     id: u64,
///     login: String,
///     password_hash: String,
/// }
///
/// let registry = EncodableRegistry::new();
/// registry
///     .configure::<Account>()
///     .visible([Declaration::renamed("id", "identifier"), "login".into()])?
///     .view("audit")
///     .hidden(["password_hash"])?;
/// # Ok::<(), encodable::ConfigurationError>(())
/// ```
#[derive(Debug)]
pub struct ModelConfigurator<'r> {
    registry: &'r EncodableRegistry,
    schema: Arc<ModelSchema>,
    view: ViewName,
}

impl ModelConfigurator<'_> {
    /// Switches the view subsequent calls apply to.
    #[must_use]
    pub fn view(mut self, view: impl Into<ViewName>) -> Self {
        self.view = view.into();
        self
    }

    /// # Errors
    /// See [`EncodableRegistry::declare_visible`].
    pub fn visible<I, D>(self, entries: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = D>,
        D: Into<Declaration>,
    {
        self.registry.declare_visible(&self.schema, self.view.clone(), entries, None)?;
        Ok(self)
    }

    /// # Errors
    /// See [`EncodableRegistry::declare_visible`].
    pub fn visible_prefixed<I, D>(self, prefix: &str, entries: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = D>,
        D: Into<Declaration>,
    {
        self.registry.declare_visible(&self.schema, self.view.clone(), entries, Some(prefix))?;
        Ok(self)
    }

    /// # Errors
    /// See [`EncodableRegistry::declare_hidden`].
    pub fn hidden<I, N>(self, names: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = N>,
        N: Into<Name>,
    {
        self.registry.declare_hidden(&self.schema, self.view.clone(), names)?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Cardinality;

    struct User;
    struct Admin;

    fn user() -> ModelSchema {
        ModelSchema::builder::<User>("User")
            .fields(["id", "login", "email", "encrypted_password"])
            .relation("permissions", Cardinality::Many)
            .property("display_name")
            .build()
    }

    fn admin(parent: &ModelSchema) -> ModelSchema {
        ModelSchema::builder::<Admin>("Admin")
            .fields(["id", "login", "email", "encrypted_password", "level"])
            .extends(parent)
            .build()
    }

    fn default_view() -> ViewName {
        ViewName::DEFAULT
    }

    #[test]
    fn first_declaration_hides_every_field() {
        let registry = EncodableRegistry::new();
        let schema = user();

        assert!(registry.resolve(&schema, &default_view()).blacklist().is_empty());

        registry.declare_visible(&schema, "default", ["login"], None).unwrap();
        let config = registry.resolve(&schema, &default_view());

        assert!(config.is_whitelist());
        assert!(!config.is_hidden("login"));
        for field in ["id", "email", "encrypted_password"] {
            assert!(config.is_hidden(field), "{field} should be hidden");
        }
        assert_eq!(config.visible_attributes(&schema), vec!["login"]);
    }

    #[test]
    fn hiding_is_idempotent() {
        let once = EncodableRegistry::new();
        let twice = EncodableRegistry::new();
        let schema = user();

        once.declare_hidden(&schema, "default", ["email"]).unwrap();
        twice.declare_hidden(&schema, "default", ["email"]).unwrap();
        twice.declare_hidden(&schema, "default", ["email"]).unwrap();

        assert_eq!(
            once.resolve(&schema, &default_view()).blacklist(),
            twice.resolve(&schema, &default_view()).blacklist()
        );
    }

    #[test]
    fn prefix_applies_to_one_batch() {
        let registry = EncodableRegistry::new();
        let schema = user();

        registry.declare_visible(&schema, "default", ["id", "login"], Some("t")).unwrap();
        registry.declare_visible(&schema, "default", ["email"], None).unwrap();

        let config = registry.resolve(&schema, &default_view());
        assert_eq!(config.output_key("id"), "t_id");
        assert_eq!(config.output_key("login"), "t_login");
        assert_eq!(config.output_key("email"), "email");
    }

    #[test]
    fn unknown_names_fail_fast_and_change_nothing() {
        let registry = EncodableRegistry::new();
        let schema = user();

        let err = registry.declare_visible(&schema, "default", ["login", "nope"], None).unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownAttribute { ref name, .. } if name == "nope"));
        assert!(!registry.resolve(&schema, &default_view()).is_whitelist());

        let err = registry.declare_hidden(&schema, "default", [""]).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidName { .. }));
    }

    #[test]
    fn rename_collisions_are_rejected() {
        let registry = EncodableRegistry::new();
        let schema = user();

        registry.declare_visible(&schema, "default", ["login"], None).unwrap();
        let err = registry
            .declare_visible(&schema, "default", [Declaration::renamed("email", "login")], None)
            .unwrap_err();

        assert!(matches!(
            err,
            ConfigurationError::RenameCollision { ref first, ref second, .. }
                if first == "login" && second == "email"
        ));
        assert!(!registry.resolve(&schema, &default_view()).is_declared("email"));
    }

    #[test]
    fn subtypes_inherit_and_extend() {
        let registry = EncodableRegistry::new();
        let parent = user();
        let child = admin(&parent);

        registry.declare_visible(&parent, "default", ["id", "login"], None).unwrap();
        assert_eq!(
            registry.resolve(&child, &default_view()).visible_attributes(&child),
            registry.resolve(&parent, &default_view()).visible_attributes(&parent)
        );

        registry.declare_visible(&child, "default", ["level"], None).unwrap();
        let config = registry.resolve(&child, &default_view());
        assert_eq!(config.visible_attributes(&child), vec!["id", "login", "level"]);
        assert!(config.is_hidden("email"));
    }

    #[test]
    fn declarations_invalidate_cached_resolutions() {
        let registry = EncodableRegistry::new();
        let schema = user();

        let before = registry.resolve(&schema, &default_view());
        registry.declare_hidden(&schema, "default", ["email"]).unwrap();
        let after = registry.resolve(&schema, &default_view());

        assert!(!before.is_hidden("email"));
        assert!(after.is_hidden("email"));
    }

    #[test]
    fn views_are_independent() {
        let registry = EncodableRegistry::new();
        let schema = user();

        registry.declare_visible(&schema, "compact", ["id"], None).unwrap();

        assert!(registry.resolve(&schema, &"compact".into()).is_whitelist());
        assert!(!registry.resolve(&schema, &default_view()).is_whitelist());
    }

    #[test]
    fn subtypes_configured_first_still_inherit() {
        let parent = user();
        let child = admin(&parent);

        let parent_first = EncodableRegistry::new();
        parent_first.declare_visible(&parent, "default", ["login"], None).unwrap();
        parent_first.declare_visible(&child, "default", ["level"], None).unwrap();

        let child_first = EncodableRegistry::new();
        child_first.declare_visible(&child, "default", ["level"], None).unwrap();
        child_first.declare_visible(&parent, "default", ["login"], None).unwrap();

        let expected = parent_first.resolve(&child, &default_view());
        assert_eq!(expected.visible_attributes(&child), vec!["login", "level"]);
        assert_eq!(*child_first.resolve(&child, &default_view()), *expected);
    }

    #[test]
    fn renames_onto_inherited_keys_are_rejected() {
        let registry = EncodableRegistry::new();
        let parent = user();
        let child = admin(&parent);

        registry.declare_visible(&parent, "default", [("id", "identifier")], None).unwrap();
        let err = registry
            .declare_visible(&child, "default", [("login", "identifier")], None)
            .unwrap_err();

        assert!(matches!(
            err,
            ConfigurationError::RenameCollision { ref key, ref first, ref second, .. }
                if key == "identifier" && first == "id" && second == "login"
        ));
        assert!(!registry.resolve(&child, &default_view()).is_declared("login"));
    }

    #[test]
    fn subtypes_may_reuse_keys_of_names_they_hide() {
        let registry = EncodableRegistry::new();
        let parent = user();
        let child = admin(&parent);

        registry.declare_visible(&parent, "default", [("id", "identifier")], None).unwrap();
        registry.declare_hidden(&child, "default", ["id"]).unwrap();
        registry.declare_visible(&child, "default", [("login", "identifier")], None).unwrap();

        let config = registry.resolve(&child, &default_view());
        assert_eq!(config.visible_attributes(&child), vec!["login"]);
        assert_eq!(config.output_key("login"), "identifier");
    }

    #[test]
    fn hidden_names_release_their_output_key() {
        let registry = EncodableRegistry::new();
        let schema = user();

        registry.declare_visible(&schema, "default", [("id", "identifier")], None).unwrap();
        registry.declare_hidden(&schema, "default", ["id"]).unwrap();
        registry.declare_visible(&schema, "default", [("login", "identifier")], None).unwrap();

        let config = registry.resolve(&schema, &default_view());
        assert_eq!(config.visible_attributes(&schema), vec!["login"]);
    }

    #[test]
    fn resolutions_racing_a_declaration_are_not_served_stale() {
        let registry = EncodableRegistry::new();
        let schema = user();

        for round in 0..32 {
            let view = ViewName::from(format!("race-{round}"));
            std::thread::scope(|scope| {
                for _ in 0..4 {
                    scope.spawn(|| {
                        for _ in 0..64 {
                            let _ = registry.resolve(&schema, &view);
                        }
                    });
                }
                registry.declare_visible(&schema, view.clone(), ["login"], None).unwrap();
            });

            let config = registry.resolve(&schema, &view);
            assert!(config.is_whitelist(), "round {round} served a stale merge");
            assert_eq!(config.visible_attributes(&schema), vec!["login"]);
        }
    }
}
