//! Procedural macros for reducest

use darling::{FromDeriveInput, FromVariant};
use proc_macro::TokenStream;
use proc_macro2::{Ident, TokenStream as TokenStream2};
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

/// Container-level attributes for #[derive(Action)]
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(action), supports(enum_any))]
struct ActionOpts {
    ident: Ident,
    generics: syn::Generics,
    data: darling::ast::Data<ActionVariant, ()>,
}

/// Variant-level attributes
#[derive(Debug, FromVariant)]
#[darling(attributes(action))]
struct ActionVariant {
    ident: Ident,
    fields: darling::ast::Fields<()>,

    /// Name reported by `Action::name()` instead of the variant name
    #[darling(default)]
    rename: Option<String>,
}

/// Derive macro for the Action trait
///
/// Generates a `name()` method that returns the variant name as a static
/// string, or the value of `#[action(rename = "...")]` when present.
///
/// # Example
/// ```ignore
/// #[derive(Action, Clone, Debug)]
/// enum CartAction {
///     AddItem { sku: String },
///     #[action(rename = "Checkout")]
///     SubmitOrder,
/// }
///
/// assert_eq!(CartAction::AddItem { sku: "a1".into() }.name(), "AddItem");
/// assert_eq!(CartAction::SubmitOrder.name(), "Checkout");
/// ```
#[proc_macro_derive(Action, attributes(action))]
pub fn derive_action(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_action(&input).into()
}

fn expand_action(input: &DeriveInput) -> TokenStream2 {
    let opts = match ActionOpts::from_derive_input(input) {
        Ok(opts) => opts,
        Err(e) => return e.write_errors(),
    };

    let name = &opts.ident;
    let (impl_generics, ty_generics, where_clause) = opts.generics.split_for_impl();

    let variants = match &opts.data {
        darling::ast::Data::Enum(variants) => variants,
        _ => {
            return syn::Error::new_spanned(input, "Action can only be derived for enums")
                .to_compile_error();
        }
    };

    let name_arms = variants.iter().map(|v| name_arm(name, v));

    // Empty enums have no values to name
    let body = if variants.is_empty() {
        quote! { match *self {} }
    } else {
        quote! {
            match self {
                #(#name_arms),*
            }
        }
    };

    quote! {
        impl #impl_generics reducest::Action for #name #ty_generics #where_clause {
            fn name(&self) -> &'static str {
                #body
            }
        }
    }
}

fn name_arm(enum_name: &Ident, variant: &ActionVariant) -> TokenStream2 {
    let variant_name = &variant.ident;
    let variant_str = variant
        .rename
        .clone()
        .unwrap_or_else(|| variant_name.to_string());

    match &variant.fields.style {
        darling::ast::Style::Unit => quote! {
            #enum_name::#variant_name => #variant_str
        },
        darling::ast::Style::Tuple => quote! {
            #enum_name::#variant_name(..) => #variant_str
        },
        darling::ast::Style::Struct => quote! {
            #enum_name::#variant_name { .. } => #variant_str
        },
    }
}
