//! `#[derive(Request)]`.

use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, Type, parse_macro_input, parse_quote};

/// Implementation of the `Request` derive.
pub fn derive_request_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(expanded) => expanded.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut response: Option<Type> = None;
    for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("request")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("response") {
                if response.is_some() {
                    return Err(meta.error("duplicate `response` attribute"));
                }
                response = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("unknown request attribute, expected `response`"))
            }
        })?;
    }
    let response = response.unwrap_or_else(|| parse_quote!(()));

    Ok(quote! {
        impl #impl_generics ::courier::Request for #name #ty_generics #where_clause {
            type Response = #response;
        }
    })
}
