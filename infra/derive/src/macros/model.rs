use proc_macro2::TokenStream;
use quote::quote;
use syn::parse::Parser;
use syn::{Fields, Ident, ItemStruct, LitStr, Path, Type};

struct ModelArgs {
    name: Option<LitStr>,
    extends: Option<Path>,
    properties: Vec<Ident>,
}

enum FieldRole {
    Stored,
    Relation,
    Skip,
}

enum RelationShape {
    Many,
    Optional,
    Single,
}

struct ModelField {
    ident: Ident,
    role: FieldRole,
    shape: RelationShape,
}

/// Expands the `#[encodable_model]` attribute macro.
///
/// Keeps the struct as written (minus the inert `#[encodable(..)]` field attributes) and
/// implements `encodable::Model` and `encodable::ModelType` for it.
pub fn expand_model(args: TokenStream, mut input: ItemStruct) -> TokenStream {
    let args = match parse_model_args(args) {
        Ok(args) => args,
        Err(err) => return err,
    };

    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(
            &input.generics,
            "encodable_model does not support generic structs",
        )
        .to_compile_error();
    }

    let fields = match collect_fields(&mut input) {
        Ok(fields) => fields,
        Err(err) => return err,
    };

    let ident = &input.ident;
    let model_name =
        args.name.unwrap_or_else(|| LitStr::new(&ident.to_string(), proc_macro2::Span::call_site()));

    let schema_fields = fields.iter().filter(|f| matches!(f.role, FieldRole::Stored)).map(|f| {
        let name = f.ident.to_string();
        quote! { .field(#name) }
    });
    let schema_relations =
        fields.iter().filter(|f| matches!(f.role, FieldRole::Relation)).map(|f| {
            let name = f.ident.to_string();
            let cardinality = match f.shape {
                RelationShape::Many => quote! { ::encodable::Cardinality::Many },
                RelationShape::Optional | RelationShape::Single => {
                    quote! { ::encodable::Cardinality::One }
                },
            };
            quote! { .relation(#name, #cardinality) }
        });
    let schema_properties = args.properties.iter().map(|p| {
        let name = p.to_string();
        quote! { .property(#name) }
    });
    let schema_extends = args.extends.as_ref().map(|parent| {
        quote! { .extends(&<#parent as ::encodable::ModelType>::model_schema()) }
    });

    let value_arms = fields.iter().filter(|f| matches!(f.role, FieldRole::Stored)).map(|f| {
        let field = &f.ident;
        let name = field.to_string();
        quote! {
            #name => ::encodable::serde_json::to_value(&self.#field).map_err(::encodable::ModelError::from),
        }
    });
    let relation_arms = fields.iter().filter(|f| matches!(f.role, FieldRole::Relation)).map(|f| {
        let field = &f.ident;
        let name = field.to_string();
        let related = match f.shape {
            RelationShape::Many => quote! { ::encodable::Related::many(self.#field.iter()) },
            RelationShape::Optional => {
                quote! { ::encodable::Related::optional(self.#field.as_ref()) }
            },
            RelationShape::Single => quote! { ::encodable::Related::one(&self.#field) },
        };
        quote! { #name => Ok(#related), }
    });
    let property_arms = args.properties.iter().map(|p| {
        let name = p.to_string();
        quote! {
            #name => ::encodable::serde_json::to_value(self.#p()).map_err(::encodable::ModelError::from),
        }
    });

    quote! {
        #input

        #[automatically_derived]
        impl ::encodable::ModelType for #ident {
            fn model_schema() -> ::std::sync::Arc<::encodable::ModelSchema> {
                static SCHEMA: ::std::sync::LazyLock<::std::sync::Arc<::encodable::ModelSchema>> =
                    ::std::sync::LazyLock::new(|| {
                        ::std::sync::Arc::new(
                            ::encodable::ModelSchema::builder::<#ident>(#model_name)
                                #(#schema_fields)*
                                #(#schema_relations)*
                                #(#schema_properties)*
                                #schema_extends
                                .build(),
                        )
                    });
                ::std::sync::Arc::clone(&SCHEMA)
            }
        }

        #[automatically_derived]
        #[allow(clippy::match_single_binding)]
        impl ::encodable::Model for #ident {
            fn schema(&self) -> ::std::sync::Arc<::encodable::ModelSchema> {
                <Self as ::encodable::ModelType>::model_schema()
            }

            fn field_value(&self, name: &str) -> ::std::result::Result<::encodable::Value, ::encodable::ModelError> {
                match name {
                    #(#value_arms)*
                    _ => Err(::encodable::ModelError::unknown(#model_name, name)),
                }
            }

            fn related(&self, name: &str) -> ::std::result::Result<::encodable::Related<'_>, ::encodable::ModelError> {
                match name {
                    #(#relation_arms)*
                    _ => Err(::encodable::ModelError::unknown(#model_name, name)),
                }
            }

            fn call_property(&self, name: &str) -> ::std::result::Result<::encodable::Value, ::encodable::ModelError> {
                match name {
                    #(#property_arms)*
                    _ => Err(::encodable::ModelError::unknown(#model_name, name)),
                }
            }
        }
    }
}

fn parse_model_args(args: TokenStream) -> Result<ModelArgs, TokenStream> {
    let mut name: Option<LitStr> = None;
    let mut extends: Option<Path> = None;
    let mut properties = Vec::new();

    let parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("name") {
            if name.is_some() {
                return Err(meta.error("Duplicate `name = \"...\"` argument"));
            }
            name = Some(meta.value()?.parse()?);
            Ok(())
        } else if meta.path.is_ident("extends") {
            if extends.is_some() {
                return Err(meta.error("A model can only extend one parent"));
            }
            extends = Some(meta.value()?.parse()?);
            Ok(())
        } else if meta.path.is_ident("properties") {
            meta.parse_nested_meta(|inner| {
                let Some(ident) = inner.path.get_ident() else {
                    return Err(inner.error("Expected a method name"));
                };
                properties.push(ident.clone());
                Ok(())
            })
        } else {
            Err(meta.error("Supported arguments: `name`, `extends`, `properties(..)`"))
        }
    });

    parser.parse2(args).map_err(|err| err.to_compile_error())?;

    Ok(ModelArgs { name, extends, properties })
}

fn collect_fields(input: &mut ItemStruct) -> Result<Vec<ModelField>, TokenStream> {
    let Fields::Named(named) = &mut input.fields else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "encodable_model only supports structs with named fields",
        )
        .to_compile_error());
    };

    let mut fields = Vec::with_capacity(named.named.len());
    for field in &mut named.named {
        let role = field_role(&field.attrs).map_err(|err| err.to_compile_error())?;
        field.attrs.retain(|attr| !attr.path().is_ident("encodable"));

        let Some(ident) = field.ident.clone() else { continue };
        fields.push(ModelField { ident, role, shape: relation_shape(&field.ty) });
    }

    Ok(fields)
}

fn field_role(attrs: &[syn::Attribute]) -> syn::Result<FieldRole> {
    let mut role = FieldRole::Stored;

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("encodable")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("relation") {
                role = FieldRole::Relation;
                Ok(())
            } else if meta.path.is_ident("skip") {
                role = FieldRole::Skip;
                Ok(())
            } else {
                Err(meta.error("Supported field options: `relation`, `skip`"))
            }
        })?;
    }

    Ok(role)
}

fn relation_shape(ty: &Type) -> RelationShape {
    let Type::Path(path) = ty else {
        return RelationShape::Single;
    };
    match path.path.segments.last().map(|seg| seg.ident.to_string()).as_deref() {
        Some("Vec" | "VecDeque") => RelationShape::Many,
        Some("Option") => RelationShape::Optional,
        _ => RelationShape::Single,
    }
}
