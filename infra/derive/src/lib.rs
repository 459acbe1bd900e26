#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros for the `encodable` workspace.
//!
//! * [`encodable_error`] wires an error enum into `thiserror` with context helpers.
//! * [`encodable_model`] implements the model capability interface for a plain struct
//!   so the engine can list its fields, relations and properties without reflection.
//!
//! Both macros emit absolute paths (`::encodable::..`, `::thiserror::..`), so consuming
//! crates must depend on `encodable` and `thiserror` directly.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemStruct, parse_macro_input};

/// A high-level attribute macro for defining domain-specific error enums.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]`.
/// * **Context Support**: Generates a companion `...Ext` trait that adds `.context()`
///   to any `Result` that can be converted into this error type.
/// * **Context Access**: Generates an inherent `context_str()` accessor and a private
///   `format_context` helper for use inside `#[error(..)]` strings.
/// * **Standard Conversions**: Implements `From<T>` for variants containing a `source` field,
///   enabling the use of the `?` operator for upstream errors.
/// * **Internal Fallback**: Provides `From<&str>` and `From<String>` implementations
///   if an `Internal` variant is present.
///
/// # Requirements
///
/// 1. The macro must be applied to an **enum**.
/// 2. Variants that support context must include a `context: Option<Cow<'static, str>>` field.
/// 3. Variants wrapping external errors must include a `source: T` field or a field marked
///    with `#[source]`/`#[from]` (compatible with `thiserror`).
/// 4. Tuple or unit variants are rejected.
///
/// # Example
///
/// ```rust,ignore
/// use encodable_derive::encodable_error;
/// use std::borrow::Cow;
///
/// #[encodable_error]
/// pub enum StoreError {
///     #[error("Encoding failed{}: {source}", Self::format_context(.context))]
///     Json { source: serde_json::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal fault{}: {message}", Self::format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
/// ```
#[proc_macro_attribute]
pub fn encodable_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}

/// Attribute macro implementing `encodable::Model` and `encodable::ModelType` for a struct.
///
/// Every named field is a stored field unless marked otherwise.
///
/// # Arguments
///
/// * `name = "..."` - Display name of the model (defaults to the struct name).
/// * `extends = Parent` - Inherits visibility configuration from another model.
/// * `properties(a, b)` - Zero-argument methods exposed as callable properties.
///
/// # Field options
///
/// * `#[encodable(relation)]` - The field holds related models. `Vec<T>` is a
///   one-to-many relation, `Option<T>` and `T` are one-to-one.
/// * `#[encodable(skip)]` - The field is invisible to the engine.
///
/// # Example
///
/// ```rust,ignore
/// use encodable::encodable_model;
///
/// #[encodable_model(properties(display_name))]
/// pub struct User {
///     pub id: u64,
///     pub login: String,
///     #[encodable(relation)]
///     pub permissions: Vec<Permission>,
/// }
///
/// impl User {
///     fn display_name(&self) -> String { format!("@{}", self.login) }
/// }
/// ```
#[proc_macro_attribute]
pub fn encodable_model(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemStruct);
    macros::model::expand_model(args.into(), input).into()
}
