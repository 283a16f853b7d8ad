//! Derive macros for Composable Store
//!
//! This crate generates the optics that reducer composition needs, so
//! features don't hand-write a path for every enum case and struct field.
//!
//! # Available Macros
//!
//! - `#[derive(CasePaths)]` - An `ActionPath` per enum variant
//! - `#[derive(StatePaths)]` - A `StatePath` per struct field
//!
//! # Example
//!
//! ```ignore
//! use composable_store_macros::{CasePaths, StatePaths};
//!
//! #[derive(StatePaths, Clone, Debug)]
//! struct AppState {
//!     counter: CounterState,
//! }
//!
//! #[derive(CasePaths, Clone, Debug)]
//! enum AppAction {
//!     Counter(CounterAction),
//!     Reset,
//! }
//!
//! let counter = counter_reducer().pullback(
//!     AppState::counter_path(),
//!     AppAction::counter_case(),
//!     |env: &AppEnvironment| &env.counter,
//! );
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::{format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Fields, Ident, Type, parse_macro_input};

/// Derive macro for action enums
///
/// Generates one associated function per variant, named after the variant
/// in snake case with a `_case` suffix, returning an
/// `ActionPath<Self, Payload>`:
///
/// - unit variants carry `()`
/// - single-field variants carry the field type
/// - multi-field variants carry a tuple of the field types, in declaration order
///
/// # Attributes
///
/// - `#[case_path(skip)]` - Generate nothing for this variant
///
/// # Panics
///
/// This macro will produce a compile error (not a runtime panic) if:
/// - Applied to a non-enum type
/// - Applied to a generic enum
///
/// # Example
///
/// ```ignore
/// #[derive(CasePaths, Clone, Debug)]
/// enum TodoListAction {
///     Todo(u64, TodoAction),
///     AddTapped,
///     Filter { selected: Filter },
/// }
///
/// let path = TodoListAction::todo_case();
/// assert!(matches!(path.embed((7, TodoAction::Toggle)), TodoListAction::Todo(7, _)));
/// assert_eq!(TodoListAction::add_tapped_case().extract(TodoListAction::AddTapped), Some(()));
/// ```
#[proc_macro_derive(CasePaths, attributes(case_path))]
pub fn derive_case_paths(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(&input.generics, "#[derive(CasePaths)] does not support generic enums")
            .to_compile_error()
            .into();
    }

    let Data::Enum(data_enum) = &input.data else {
        return syn::Error::new_spanned(input, "#[derive(CasePaths)] can only be used on enums")
            .to_compile_error()
            .into();
    };

    let mut functions = Vec::new();
    for variant in &data_enum.variants {
        match is_skipped(&variant.attrs, "case_path") {
            Ok(true) => continue,
            Ok(false) => {},
            Err(error) => return error.to_compile_error().into(),
        }

        let variant_name = &variant.ident;
        let fn_name = format_ident!("{}_case", to_snake_case(&variant_name.to_string()));
        let doc = format!("Path into `{name}::{variant_name}`");

        let types: Vec<&Type> = variant.fields.iter().map(|field| &field.ty).collect();
        let bindings: Vec<Ident> = (0..types.len())
            .map(|index| Ident::new(&format!("field_{index}"), Span::call_site()))
            .collect();

        let payload = match types.as_slice() {
            [] => quote! { () },
            [single] => quote! { #single },
            many => quote! { ( #(#many),* ) },
        };
        let value_pattern = match bindings.as_slice() {
            [] => quote! { () },
            [single] => quote! { #single },
            many => quote! { ( #(#many),* ) },
        };
        let variant_pattern = match &variant.fields {
            Fields::Unit => quote! { Self::#variant_name },
            Fields::Unnamed(_) => quote! { Self::#variant_name( #(#bindings),* ) },
            Fields::Named(named) => {
                let field_names = named.named.iter().filter_map(|field| field.ident.as_ref());
                quote! { Self::#variant_name { #(#field_names: #bindings),* } }
            },
        };

        functions.push(quote! {
            #[doc = #doc]
            #[must_use]
            #[allow(unused_parens)]
            pub fn #fn_name() -> ::composable_store_core::paths::ActionPath<Self, #payload> {
                ::composable_store_core::paths::ActionPath::new(
                    |#value_pattern: #payload| #variant_pattern,
                    |root: Self| match root {
                        #variant_pattern => ::core::option::Option::Some(#value_pattern),
                        #[allow(unreachable_patterns)]
                        _ => ::core::option::Option::None,
                    },
                )
            }
        });
    }

    let expanded = quote! {
        impl #name {
            #(#functions)*
        }
    };

    TokenStream::from(expanded)
}

/// Derive macro for state structs
///
/// Generates one associated function per named field, `<field>_path()`,
/// returning a `StatePath<Self, FieldType>` that always focuses the field.
///
/// # Attributes
///
/// - `#[state_path(skip)]` - Generate nothing for this field
///
/// # Panics
///
/// This macro will produce a compile error (not a runtime panic) if:
/// - Applied to anything but a struct with named fields
/// - Applied to a generic struct
///
/// # Example
///
/// ```ignore
/// #[derive(StatePaths, Clone, Debug, Default)]
/// struct AppState {
///     todos: IdentifiedArray<Todo>,
///     #[state_path(skip)]
///     cache: Vec<u8>,
/// }
///
/// let mut state = AppState::default();
/// AppState::todos_path().modify(&mut state, |todos| todos.clear());
/// ```
#[proc_macro_derive(StatePaths, attributes(state_path))]
pub fn derive_state_paths(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(&input.generics, "#[derive(StatePaths)] does not support generic structs")
            .to_compile_error()
            .into();
    }

    let Data::Struct(data_struct) = &input.data else {
        return syn::Error::new_spanned(input, "#[derive(StatePaths)] can only be used on structs")
            .to_compile_error()
            .into();
    };

    let Fields::Named(named) = &data_struct.fields else {
        return syn::Error::new_spanned(&data_struct.fields, "#[derive(StatePaths)] requires named fields")
            .to_compile_error()
            .into();
    };

    let mut functions = Vec::new();
    for field in &named.named {
        match is_skipped(&field.attrs, "state_path") {
            Ok(true) => continue,
            Ok(false) => {},
            Err(error) => return error.to_compile_error().into(),
        }
        let Some(field_name) = field.ident.as_ref() else {
            continue;
        };
        let field_type = &field.ty;
        let fn_name = format_ident!("{}_path", field_name.to_string().trim_start_matches("r#"));
        let doc = format!("Path to `{name}::{field_name}`");

        functions.push(quote! {
            #[doc = #doc]
            #[must_use]
            pub fn #fn_name() -> ::composable_store_core::paths::StatePath<Self, #field_type> {
                ::composable_store_core::paths::StatePath::key(|root: &mut Self| &mut root.#field_name)
            }
        });
    }

    let expanded = quote! {
        impl #name {
            #(#functions)*
        }
    };

    TokenStream::from(expanded)
}

/// Whether `attrs` contain `#[<name>(skip)]`
fn is_skipped(attrs: &[Attribute], name: &str) -> syn::Result<bool> {
    let mut skipped = false;
    for attr in attrs.iter().filter(|attr| attr.path().is_ident(name)) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                skipped = true;
                Ok(())
            } else {
                Err(meta.error(format!("unknown {name} option")))
            }
        })?;
    }
    Ok(skipped)
}

/// `QueryChanged` -> `query_changed`
fn to_snake_case(name: &str) -> String {
    let mut snake = String::with_capacity(name.len() + 4);
    let mut previous_lower = false;
    for character in name.chars() {
        if character.is_uppercase() {
            if previous_lower {
                snake.push('_');
            }
            snake.extend(character.to_lowercase());
            previous_lower = false;
        } else {
            snake.push(character);
            previous_lower = character.is_lowercase() || character.is_ascii_digit();
        }
    }
    snake
}
