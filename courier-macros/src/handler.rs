//! `#[handler]`: turns an async fn into a unit struct implementing
//! `RequestHandler`.

use proc_macro::TokenStream;
use quote::quote;
use syn::{FnArg, Ident, ItemFn, LitStr, Pat, ReturnType, Type, parse_macro_input, parse_quote};

/// Implementation of the `#[handler]` macro.
pub fn handler_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut name: Option<Ident> = None;
    let args = syn::meta::parser(|meta| {
        if meta.path.is_ident("name") {
            if name.is_some() {
                return Err(meta.error("duplicate `name` attribute"));
            }
            name = Some(meta.value()?.parse::<LitStr>()?.parse()?);
            Ok(())
        } else {
            Err(meta.error("unknown handler attribute, expected `name`"))
        }
    });
    parse_macro_input!(attr with args);
    let input = parse_macro_input!(item as ItemFn);

    match expand(&input, name) {
        Ok(expanded) => expanded.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &ItemFn, name: Option<Ident>) -> syn::Result<proc_macro2::TokenStream> {
    let sig = &input.sig;
    if sig.asyncness.is_none() {
        return Err(syn::Error::new_spanned(sig.fn_token, "handler function must be async"));
    }
    if sig.inputs.len() > 2 {
        return Err(syn::Error::new_spanned(
            &sig.inputs,
            "handler function takes the request and an optional cancellation token",
        ));
    }

    let (request_pat, request_type) = match sig.inputs.first() {
        Some(FnArg::Typed(arg)) => match &*arg.ty {
            Type::Reference(reference) => (&arg.pat, &reference.elem),
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    "request argument must be a reference: `request: &MyRequest`",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                sig,
                "handler function must take the request: `fn(request: &MyRequest, ...)`",
            ));
        }
    };

    let cancel_pat: Box<Pat> = match sig.inputs.iter().nth(1) {
        Some(FnArg::Typed(arg)) => arg.pat.clone(),
        Some(receiver) => {
            return Err(syn::Error::new_spanned(receiver, "handler function cannot take `self`"));
        }
        None => Box::new(parse_quote!(_)),
    };

    let ReturnType::Type(_, output) = &sig.output else {
        return Err(syn::Error::new_spanned(
            sig,
            "handler function must return `Result<Response, BoxError>`",
        ));
    };

    let fn_name = &sig.ident;
    let struct_name = name.unwrap_or_else(|| fn_name.clone());
    let vis = &input.vis;
    let body = &input.block;

    Ok(quote! {
        #[allow(non_camel_case_types)]
        #[derive(Clone, Copy, Debug, Default)]
        #[doc = concat!("Request handler generated from `", stringify!(#fn_name), "`.")]
        #vis struct #struct_name;

        impl ::courier::RequestHandler<#request_type> for #struct_name {
            async fn handle(
                &self,
                #request_pat: &#request_type,
                #cancel_pat: &::courier::CancellationToken,
            ) -> #output {
                #body
            }
        }
    })
}
