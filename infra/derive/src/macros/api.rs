use super::derived_trait_names;
use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::parse::Parser;
use syn::punctuated::Punctuated;
use syn::{Attribute, Expr, ItemFn, ItemStruct, Lit, LitStr, Meta, MetaNameValue, Token};

/// Expands `#[api_model]`.
pub fn expand_api_model(args: TokenStream, input: ItemStruct) -> TokenStream {
    match model_tokens(args, &input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error(),
    }
}

/// Expands `#[api_handler]`.
pub fn expand_api_handler(args: TokenStream, input: ItemFn) -> TokenStream {
    let ItemFn { attrs, vis, sig, block } = input;

    quote! {
        #(#attrs)*
        #[allow(clippy::unused_async)]
        #[::utoipa::path(#args)]
        #vis #sig #block
    }
}

#[derive(Default)]
struct ModelArgs {
    rename_all: Option<LitStr>,
    deny_unknown_fields: Option<bool>,
}

struct SerdeAttrs {
    rename_all: Option<LitStr>,
    deny_unknown_fields: bool,
}

fn model_tokens(args: TokenStream, input: &ItemStruct) -> syn::Result<TokenStream> {
    let args = parse_model_args(args)?;
    let existing = serde_attrs(&input.attrs)?;
    let derives = derived_trait_names(&input.attrs);

    let missing: Vec<TokenStream> = [
        ("Debug", quote! { Debug }),
        ("Serialize", quote! { ::serde::Serialize }),
        ("Deserialize", quote! { ::serde::Deserialize }),
        ("ToSchema", quote! { ::utoipa::ToSchema }),
    ]
    .into_iter()
    .filter(|(name, _)| !derives.contains(*name))
    .map(|(_, tokens)| tokens)
    .collect();

    let derive_attr = if missing.is_empty() {
        quote! {}
    } else {
        quote! { #[derive(#(#missing),*)] }
    };

    let wanted = args.rename_all.unwrap_or_else(|| LitStr::new("camelCase", Span::call_site()));
    let rename_attr = match &existing.rename_all {
        Some(current) if current.value() != wanted.value() => {
            return Err(syn::Error::new_spanned(
                current,
                "serde rename_all conflicts with api_model; align them or drop one",
            ));
        },
        Some(_) => quote! {},
        None => quote! { #[serde(rename_all = #wanted)] },
    };

    let deny = args.deny_unknown_fields.unwrap_or(true);
    let deny_attr = match (existing.deny_unknown_fields, deny) {
        (true, false) => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "deny_unknown_fields is already set through serde",
            ));
        },
        (false, true) => quote! { #[serde(deny_unknown_fields)] },
        _ => quote! {},
    };

    Ok(quote! {
        #derive_attr
        #rename_attr
        #deny_attr
        #input
    })
}

fn parse_model_args(args: TokenStream) -> syn::Result<ModelArgs> {
    let metas = Punctuated::<Meta, Token![,]>::parse_terminated.parse2(args)?;
    let mut parsed = ModelArgs::default();

    for meta in metas {
        let Meta::NameValue(pair) = meta else {
            return Err(syn::Error::new_spanned(meta, "expected `key = value` arguments"));
        };

        if pair.path.is_ident("rename_all") {
            if parsed.rename_all.is_some() {
                return Err(syn::Error::new_spanned(&pair, "duplicate rename_all"));
            }
            parsed.rename_all = Some(string_literal(&pair)?);
        } else if pair.path.is_ident("deny_unknown_fields") {
            if parsed.deny_unknown_fields.is_some() {
                return Err(syn::Error::new_spanned(&pair, "duplicate deny_unknown_fields"));
            }
            parsed.deny_unknown_fields = Some(bool_literal(&pair)?);
        } else {
            return Err(syn::Error::new_spanned(
                &pair.path,
                "unsupported argument; expected rename_all or deny_unknown_fields",
            ));
        }
    }

    Ok(parsed)
}

fn string_literal(pair: &MetaNameValue) -> syn::Result<LitStr> {
    if let Expr::Lit(expr) = &pair.value
        && let Lit::Str(lit) = &expr.lit
    {
        return Ok(lit.clone());
    }
    Err(syn::Error::new_spanned(&pair.value, "expected a string literal"))
}

fn bool_literal(pair: &MetaNameValue) -> syn::Result<bool> {
    if let Expr::Lit(expr) = &pair.value
        && let Lit::Bool(lit) = &expr.lit
    {
        return Ok(lit.value);
    }
    Err(syn::Error::new_spanned(&pair.value, "expected a boolean literal"))
}

fn serde_attrs(attrs: &[Attribute]) -> syn::Result<SerdeAttrs> {
    let mut found = SerdeAttrs { rename_all: None, deny_unknown_fields: false };

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") {
                found.rename_all = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("deny_unknown_fields") {
                found.deny_unknown_fields = true;
            } else if meta.input.peek(Token![=]) {
                let _: Expr = meta.value()?.parse()?;
            }
            Ok(())
        })?;
    }

    Ok(found)
}
