//! Procedural macros for ephemeral_db
//!
//! This crate provides the `DynamicSettings` derive macro, which builds the
//! name-to-setter table a foreign settings struct exposes to free-form options.

use inflector::Inflector;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse_macro_input, Data, DeriveInput, Field, Fields, GenericArgument, Ident, LitStr,
    PathArguments, Type,
};

/// Shape a field takes when it is driven by a free-form option
enum FieldShape {
    Text { optional: bool },
    Flag { optional: bool },
    List { optional: bool },
    Parsed { optional: bool, ty: Type },
}

/// Per-field options read from `#[setting(...)]`
#[derive(Default)]
struct FieldOptions {
    skip: bool,
    rename: Option<String>,
}

/// Derive macro for `DynamicSettings`
///
/// Every named field whose type is `String`, `bool`, `Vec<String>`, a primitive
/// integer, or an `Option` of one of those gets a setter called
/// `set` + PascalCase(field name). Other fields (nested sections) are left out.
///
/// ```ignore
/// #[derive(DynamicSettings)]
/// struct MigrationSettings {
///     baseline_on_migrate: bool,          // setBaselineOnMigrate
///     #[setting(rename = "table")]
///     history_table: Option<String>,      // setTable
///     #[setting(skip)]
///     password: Option<String>,
/// }
/// ```
#[proc_macro_derive(DynamicSettings, attributes(setting))]
pub fn derive_dynamic_settings(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand_dynamic_settings(&input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

fn expand_dynamic_settings(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "DynamicSettings does not support generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "DynamicSettings only supports structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "DynamicSettings only supports structs",
            ))
        }
    };

    let mut registrations = Vec::new();
    for field in fields {
        let options = parse_field_options(field)?;
        if options.skip {
            continue;
        }
        let Some(ident) = &field.ident else {
            continue;
        };
        let Some(shape) = classify(&field.ty) else {
            continue;
        };

        let setter_name = setter_name(ident, options.rename.as_deref());
        registrations.push(registration(name, ident, &setter_name, shape));
    }

    Ok(quote! {
        #[automatically_derived]
        impl #name {
            /// Name-to-setter table for free-form options, built on first use
            pub fn setter_table() -> &'static ::ephemeral_db::propagate::SetterTable<#name> {
                static TABLE: ::ephemeral_db::__private::Lazy<
                    ::ephemeral_db::propagate::SetterTable<#name>,
                > = ::ephemeral_db::__private::Lazy::new(|| {
                    ::ephemeral_db::propagate::SetterTable::new()
                        #(#registrations)*
                });
                &TABLE
            }
        }

        #[automatically_derived]
        impl ::ephemeral_db::propagate::DynamicSettings for #name {
            fn apply_setter(
                &mut self,
                setter: &str,
                value: &::ephemeral_db::propagate::OptionValue,
            ) -> bool {
                Self::setter_table().apply(self, setter, value)
            }
        }
    })
}

fn parse_field_options(field: &Field) -> syn::Result<FieldOptions> {
    let mut options = FieldOptions::default();

    for attr in &field.attrs {
        if !attr.path().is_ident("setting") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                options.skip = true;
                Ok(())
            } else if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                options.rename = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unsupported setting attribute, expected `skip` or `rename`"))
            }
        })?;
    }

    Ok(options)
}

/// Build the exposed setter name for a field
fn setter_name(ident: &Ident, rename: Option<&str>) -> String {
    match rename {
        Some(option) => {
            let mut chars = option.chars();
            match chars.next() {
                Some(first) => format!("set{}{}", first.to_uppercase(), chars.as_str()),
                None => "set".to_string(),
            }
        }
        None => {
            let raw = ident.to_string();
            let field = raw.trim_start_matches("r#");
            format!("set{}", field.to_pascal_case())
        }
    }
}

fn registration(
    owner: &Ident,
    ident: &Ident,
    setter_name: &str,
    shape: FieldShape,
) -> TokenStream2 {
    match shape {
        FieldShape::Text { optional } => {
            let value = wrap(optional, quote!(value));
            quote! {
                .text(#setter_name, |target: &mut #owner, value: ::std::string::String| {
                    target.#ident = #value;
                })
            }
        }
        FieldShape::Flag { optional } => {
            let value = wrap(optional, quote!(value));
            quote! {
                .flag(#setter_name, |target: &mut #owner, value: bool| {
                    target.#ident = #value;
                })
            }
        }
        FieldShape::List { optional } => {
            let value = wrap(optional, quote!(value));
            quote! {
                .list(
                    #setter_name,
                    |target: &mut #owner, value: ::std::vec::Vec<::std::string::String>| {
                        target.#ident = #value;
                    },
                )
            }
        }
        FieldShape::Parsed { optional, ty } => {
            let value = wrap(optional, quote!(parsed));
            quote! {
                .parsed(#setter_name, |target: &mut #owner, raw: &str| {
                    match raw.trim().parse::<#ty>() {
                        Ok(parsed) => {
                            target.#ident = #value;
                            true
                        }
                        Err(_) => false,
                    }
                })
            }
        }
    }
}

fn wrap(optional: bool, value: TokenStream2) -> TokenStream2 {
    if optional {
        quote!(::std::option::Option::Some(#value))
    } else {
        value
    }
}

fn classify(ty: &Type) -> Option<FieldShape> {
    if let Some(inner) = generic_argument(ty, "Option") {
        return classify_plain(inner, true);
    }
    classify_plain(ty, false)
}

fn classify_plain(ty: &Type, optional: bool) -> Option<FieldShape> {
    if let Some(inner) = generic_argument(ty, "Vec") {
        return is_named(inner, "String").then_some(FieldShape::List { optional });
    }

    let ident = last_segment(ty)?;
    match ident.to_string().as_str() {
        "String" => Some(FieldShape::Text { optional }),
        "bool" => Some(FieldShape::Flag { optional }),
        "i8" | "i16" | "i32" | "i64" | "isize" | "u8" | "u16" | "u32" | "u64" | "usize" => {
            Some(FieldShape::Parsed {
                optional,
                ty: ty.clone(),
            })
        }
        _ => None,
    }
}

fn last_segment(ty: &Type) -> Option<&Ident> {
    match ty {
        Type::Path(path) if path.qself.is_none() => {
            path.path.segments.last().map(|segment| &segment.ident)
        }
        _ => None,
    }
}

fn is_named(ty: &Type, name: &str) -> bool {
    last_segment(ty).map(|ident| ident == name).unwrap_or(false)
}

/// Returns `T` when `ty` is `wrapper<T>`
fn generic_argument<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    args.args.iter().find_map(|arg| match arg {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    })
}
