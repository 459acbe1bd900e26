use crate::view::ViewName;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::borrow::Cow;
use std::path::Path;
use tracing::info;

const ENV_PREFIX: &str = "ENCODABLE";

#[encodable_derive::encodable_error]
pub enum SettingsError {
    #[error("Settings error{}: {source}", Self::format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Registry-wide knobs.
///
/// Every field has a default, so partial documents (or none at all) are valid.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// View used when a request does not name one.
    pub default_view: String,
    /// Joins a declaration prefix and the attribute name (`t` + `_` + `a`).
    pub prefix_separator: String,
    /// Fail on unknown caller keys instead of ignoring them.
    pub strict: bool,
    /// Maximum relation nesting depth.
    pub max_depth: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_view: ViewName::DEFAULT.as_str().to_owned(),
            prefix_separator: "_".to_owned(),
            strict: false,
            max_depth: 32,
        }
    }
}

impl Settings {
    /// Parses settings from an inline TOML document.
    ///
    /// # Errors
    /// Returns [`SettingsError::Config`] if the document is malformed.
    pub fn from_toml(document: &str) -> Result<Self, SettingsError> {
        let settings = Config::builder()
            .add_source(File::from_str(document, FileFormat::Toml))
            .build()
            .context("Failed to parse settings document")?
            .try_deserialize::<Self>()
            .context("Failed to deserialize settings")?;

        Ok(settings)
    }

    #[must_use]
    pub fn default_view(&self) -> ViewName {
        ViewName::from(self.default_view.clone())
    }
}

/// Loads [`Settings`] from a file, then overlays `ENCODABLE__*` environment variables.
///
/// The file format follows the extension (`.toml`, `.json`, `.yaml`, ...).
/// Nested keys use double underscores, e.g. `ENCODABLE__MAX_DEPTH=8`.
///
/// # Errors
/// Returns [`SettingsError::Config`] if the file is missing or does not match [`Settings`].
///
/// # Example
/// ```rust,no_run
/// use encodable::{EncodableRegistry, load_settings};
///
/// let settings = load_settings("encodable.toml").unwrap_or_default();
/// let registry = EncodableRegistry::with_settings(settings);
/// # let _ = registry;
/// ```
pub fn load_settings(path: impl AsRef<Path>) -> Result<Settings, SettingsError> {
    let path = path.as_ref();
    info!("Loading encodable settings from {}", path.display());

    let settings = Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(
            Environment::with_prefix(ENV_PREFIX).separator("__").convert_case(config::Case::Snake),
        )
        .build()
        .context("Failed to build settings")?
        .try_deserialize::<Settings>()
        .context("Failed to deserialize settings")?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let settings = Settings::default();
        assert_eq!(settings.default_view(), ViewName::DEFAULT);
        assert_eq!(settings.prefix_separator, "_");
        assert!(!settings.strict);
        assert_eq!(settings.max_depth, 32);
    }

    #[test]
    fn partial_documents_keep_defaults() {
        let settings = Settings::from_toml("strict = true\nmax_depth = 4").unwrap();
        assert!(settings.strict);
        assert_eq!(settings.max_depth, 4);
        assert_eq!(settings.default_view, "default");
    }

    #[test]
    fn malformed_documents_fail_with_context() {
        let err = Settings::from_toml("max_depth = \"deep\"").unwrap_err();
        assert_eq!(err.context_str(), Some("Failed to deserialize settings"));
    }
}
