use crate::schema::{ModelSchema, Name};
use fxhash::{FxHashMap, FxHashSet};
use std::borrow::Cow;
use std::fmt;

/// Name of a serialization profile. One model may have several.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewName(Name);

impl ViewName {
    /// The sentinel used when a request names no view.
    pub const DEFAULT: Self = Self(Cow::Borrowed("default"));

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> Name {
        self.0
    }
}

impl Default for ViewName {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<&'static str> for ViewName {
    fn from(value: &'static str) -> Self {
        Self(Cow::Borrowed(value))
    }
}

impl From<String> for ViewName {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

impl From<Name> for ViewName {
    fn from(value: Name) -> Self {
        Self(value)
    }
}

impl AsRef<str> for ViewName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ViewName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Visibility rules of one model for one view.
///
/// Mode starts as blacklist-only: every stored field is visible unless hidden.
/// The first visible declaration switches to whitelist mode for good, after which
/// only declared names are visible (minus anything hidden again later).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewConfig {
    whitelist_started: bool,
    blacklist: FxHashSet<Name>,
    declared: Vec<Name>,
    renames: FxHashMap<Name, Name>,
}

impl ViewConfig {
    #[must_use]
    pub const fn is_whitelist(&self) -> bool {
        self.whitelist_started
    }

    #[must_use]
    pub const fn blacklist(&self) -> &FxHashSet<Name> {
        &self.blacklist
    }

    #[must_use]
    pub fn is_hidden(&self, name: &str) -> bool {
        self.blacklist.contains(name)
    }

    /// Names declared visible, in declaration order.
    #[must_use]
    pub fn declared(&self) -> &[Name] {
        &self.declared
    }

    #[must_use]
    pub fn is_declared(&self, name: &str) -> bool {
        self.declared.iter().any(|d| d == name)
    }

    #[must_use]
    pub fn rename_of(&self, name: &str) -> Option<&str> {
        self.renames.get(name).map(|n| &**n)
    }

    /// The key `name` is emitted under.
    #[must_use]
    pub fn output_key<'a>(&'a self, name: &'a str) -> &'a str {
        self.rename_of(name).unwrap_or(name)
    }

    /// The names this configuration makes visible for `schema`, in emission order.
    ///
    /// Whitelist mode yields declared names that are not hidden. Blacklist-only mode
    /// yields the schema's stored fields that are not hidden.
    #[must_use]
    pub fn visible_attributes(&self, schema: &ModelSchema) -> Vec<Name> {
        let candidates =
            if self.whitelist_started { self.declared.as_slice() } else { schema.stored_fields() };
        candidates.iter().filter(|name| !self.is_hidden(name)).cloned().collect()
    }

    /// Switches to whitelist mode. Returns `false` if the switch already happened.
    ///
    /// Stored fields are not hidden here: which of them stay visible depends on every
    /// layer of the lineage, so `hide_undeclared` runs once they are merged.
    pub(crate) fn start_whitelist(&mut self) -> bool {
        !std::mem::replace(&mut self.whitelist_started, true)
    }

    /// Hides every field in `fields` that no layer declared. No-op in blacklist mode.
    pub(crate) fn hide_undeclared(&mut self, fields: &[Name]) {
        if !self.whitelist_started {
            return;
        }
        for field in fields {
            if !self.is_declared(field) {
                self.blacklist.insert(field.clone());
            }
        }
    }

    /// Another visible declared name already emitted under `key`, if any.
    pub(crate) fn claimant_of(&self, key: &str, source: &str) -> Option<&Name> {
        self.declared
            .iter()
            .find(|d| **d != *source && !self.is_hidden(d) && self.output_key(d) == key)
    }

    pub(crate) fn declare(&mut self, source: Name, output: Option<Name>) {
        if let Some(output) = output.filter(|o| *o != source) {
            self.renames.insert(source.clone(), output);
        }
        self.blacklist.remove(&*source);
        if !self.is_declared(&source) {
            self.declared.push(source);
        }
    }

    pub(crate) fn hide(&mut self, name: Name) {
        self.blacklist.insert(name);
    }

    /// Layers a descendant's configuration over this one.
    ///
    /// Names the descendant declares are un-hidden before its own blacklist is applied,
    /// so a name the descendant declared and then hid again stays hidden.
    pub(crate) fn layer(&mut self, upper: &Self) {
        self.whitelist_started |= upper.whitelist_started;
        for name in &upper.declared {
            self.blacklist.remove(&**name);
            if !self.is_declared(name) {
                self.declared.push(name.clone());
            }
        }
        self.blacklist.extend(upper.blacklist.iter().cloned());
        self.renames.extend(upper.renames.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}
