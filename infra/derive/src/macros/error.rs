use super::derived_trait_names;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Field, Fields, GenericArgument, Ident, PathArguments, Type};

struct VariantInfo<'a> {
    ident: &'a Ident,
    source: Option<(&'a Ident, &'a Type)>,
    has_context: bool,
    cfg_attrs: Vec<&'a Attribute>,
}

pub fn expand_derive(input: DeriveInput) -> TokenStream {
    match expand(&input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(&input.ident, "wayfare_error only supports enums"));
    };

    let variants = data
        .variants
        .iter()
        .map(|variant| {
            let Fields::Named(fields) = &variant.fields else {
                return Err(syn::Error::new_spanned(
                    variant,
                    "wayfare_error variants must use named fields",
                ));
            };
            let has_context = context_field(fields.named.iter())?;
            let source = fields
                .named
                .iter()
                .find(|field| is_source(field))
                .and_then(|field| field.ident.as_ref().map(|ident| (ident, &field.ty)));
            if source.is_some() && !has_context {
                return Err(syn::Error::new_spanned(
                    &variant.ident,
                    "variants with a source also need `context: Option<Cow<'static, str>>`",
                ));
            }
            Ok(VariantInfo {
                ident: &variant.ident,
                source,
                has_context,
                cfg_attrs: variant.attrs.iter().filter(|a| a.path().is_ident("cfg")).collect(),
            })
        })
        .collect::<syn::Result<Vec<_>>>()?;

    let name = &input.ident;
    let ext = format_ident!("{name}Ext");

    let derives = derived_trait_names(&input.attrs);
    let mut missing = Vec::new();
    if !derives.contains("Debug") {
        missing.push(quote! { Debug });
    }
    if !derives.contains("Error") {
        missing.push(quote! { ::thiserror::Error });
    }
    let derive_attr = if missing.is_empty() {
        quote! {}
    } else {
        quote! { #[derive(#(#missing),*)] }
    };

    let context_arms = variants.iter().filter(|v| v.has_context).map(|v| {
        let ident = v.ident;
        let cfg_attrs = &v.cfg_attrs;
        quote! { #(#cfg_attrs)* #name::#ident { context: slot, .. } => *slot = Some(context.into()), }
    });

    let source_impls = variants.iter().filter_map(|v| {
        if v.ident == "Internal" {
            return None;
        }
        let (field, ty) = v.source?;
        let ident = v.ident;
        let cfg_attrs = &v.cfg_attrs;
        Some(quote! {
            #(#cfg_attrs)*
            #[automatically_derived]
            impl From<#ty> for #name {
                #[inline]
                fn from(#field: #ty) -> Self {
                    Self::#ident { #field, context: None }
                }
            }

            #(#cfg_attrs)*
            impl<T> #ext<T> for ::std::result::Result<T, #ty> {
                #[inline]
                fn context(
                    self,
                    context: impl Into<::std::borrow::Cow<'static, str>>,
                ) -> ::std::result::Result<T, #name> {
                    self.map_err(|#field| #name::#ident { #field, context: Some(context.into()) })
                }
            }
        })
    });

    let internal_impls = variants.iter().find(|v| v.ident == "Internal").map(|v| {
        let cfg_attrs = &v.cfg_attrs;
        quote! {
            #(#cfg_attrs)*
            impl From<&'static str> for #name {
                #[inline]
                fn from(message: &'static str) -> Self {
                    Self::Internal { message: ::std::borrow::Cow::Borrowed(message), context: None }
                }
            }

            #(#cfg_attrs)*
            impl From<String> for #name {
                #[inline]
                fn from(message: String) -> Self {
                    Self::Internal { message: ::std::borrow::Cow::Owned(message), context: None }
                }
            }
        }
    });

    Ok(quote! {
        #[allow(non_shorthand_field_patterns)]
        #derive_attr
        #input

        /// Adds human-readable context to a failed result.
        pub trait #ext<T> {
            fn context(
                self,
                context: impl Into<::std::borrow::Cow<'static, str>>,
            ) -> ::std::result::Result<T, #name>;
        }

        #[automatically_derived]
        impl<T> #ext<T> for ::std::result::Result<T, #name> {
            #[inline]
            fn context(self, context: impl Into<::std::borrow::Cow<'static, str>>) -> Self {
                self.map_err(|mut err| {
                    #[allow(unreachable_patterns)]
                    match &mut err {
                        #(#context_arms)*
                        _ => {},
                    }
                    err
                })
            }
        }

        #(#source_impls)*
        #internal_impls

        #[allow(dead_code)]
        fn format_context(
            context: &Option<::std::borrow::Cow<'static, str>>,
        ) -> ::std::borrow::Cow<'static, str> {
            context.as_ref().map_or(::std::borrow::Cow::Borrowed(""), |c| {
                ::std::borrow::Cow::Owned(format!(" ({c})"))
            })
        }
    })
}

fn is_source(field: &Field) -> bool {
    field.ident.as_ref().is_some_and(|ident| ident == "source")
        || field.attrs.iter().any(|a| a.path().is_ident("source") || a.path().is_ident("from"))
}

fn context_field<'a>(mut fields: impl Iterator<Item = &'a Field>) -> syn::Result<bool> {
    let Some(field) = fields.find(|f| f.ident.as_ref().is_some_and(|i| i == "context")) else {
        return Ok(false);
    };
    if is_context_type(&field.ty) {
        Ok(true)
    } else {
        Err(syn::Error::new_spanned(&field.ty, "context must be Option<Cow<'static, str>>"))
    }
}

/// Matches `Option<Cow<'static, str>>` by last path segments.
fn is_context_type(ty: &Type) -> bool {
    let Some(option_args) = last_segment_args(ty, "Option") else {
        return false;
    };
    let Some(GenericArgument::Type(cow)) = option_args.first() else {
        return false;
    };
    let Some(cow_args) = last_segment_args(cow, "Cow") else {
        return false;
    };

    matches!(
        (cow_args.first(), cow_args.get(1)),
        (Some(GenericArgument::Lifetime(lt)), Some(GenericArgument::Type(Type::Path(inner))))
            if lt.ident == "static"
                && inner.path.segments.last().is_some_and(|seg| seg.ident == "str")
    )
}

fn last_segment_args<'a>(ty: &'a Type, expected: &str) -> Option<Vec<&'a GenericArgument>> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != expected {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    Some(args.args.iter().collect())
}
