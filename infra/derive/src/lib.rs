#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Attribute macros shared by every Wayfare crate.
//!
//! * [`wayfare_error`] turns an enum into a `thiserror` error with `.context(..)` support.
//! * [`api_model`] and [`api_handler`] wire DTOs and Axum handlers into the `OpenAPI` document.
//! * [`wayfare_slice`] turns a struct into a shareable feature slice handle.
//!
//! Examples below are `ignore`d because a proc-macro crate cannot use its own macros.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemFn, ItemStruct, parse_macro_input};

/// Defines a request or response model.
///
/// Adds `Debug`, `Serialize`, `Deserialize` and `utoipa::ToSchema` unless already derived,
/// renames fields to `camelCase` and rejects unknown fields. Both policies can be overridden:
///
/// ```rust,ignore
/// #[wayfare_derive::api_model(rename_all = "snake_case", deny_unknown_fields = false)]
/// pub struct FareQuoteRequest {
///     pub distance_km: f64,
/// }
/// ```
#[proc_macro_attribute]
pub fn api_model(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemStruct);
    macros::api::expand_api_model(attr.into(), input).into()
}

/// Registers an Axum handler with `utoipa::path`.
///
/// Accepts the usual `utoipa::path` arguments.
///
/// ```rust,ignore
/// #[wayfare_derive::api_handler(
///     get,
///     path = "/api/vehicles",
///     responses((status = OK, body = [VehicleView])),
///     tag = BOOKING_TAG,
/// )]
/// pub(crate) async fn list_vehicles() -> Json<Vec<VehicleView>> { .. }
/// ```
#[proc_macro_attribute]
pub fn api_handler(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    macros::api::expand_api_handler(args.into(), input).into()
}

/// Defines a crate error enum.
///
/// # Generated items
///
/// * `#[derive(Debug, thiserror::Error)]` when not already present.
/// * A `<Name>Ext` trait adding `.context(..)` to `Result<T, Name>` and to `Result<T, Source>`
///   for every variant with a `source` field.
/// * `From<Source>` for those variants.
/// * `From<&'static str>` and `From<String>` when an `Internal` variant exists.
/// * A module-private `format_context` helper for `#[error(..)]` strings.
///
/// Every variant must use named fields; variants with a source must also carry
/// `context: Option<Cow<'static, str>>`.
///
/// ```rust,ignore
/// #[wayfare_derive::wayfare_error]
/// pub enum BookingError {
///     #[error("Database error{}: {source}", format_context(.context))]
///     Database { source: DatabaseError, context: Option<Cow<'static, str>> },
///
///     #[error("Internal booking error{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
/// ```
#[proc_macro_attribute]
pub fn wayfare_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}

/// Defines a feature slice handle.
///
/// The annotated struct becomes `<Name>Inner`; `<Name>` wraps it in an `Arc`, derefs to it
/// and implements `FeatureSlice` so it can be registered in the API state.
///
/// ```rust,ignore
/// #[wayfare_derive::wayfare_slice]
/// pub struct Contact {
///     inquiries: InquiryStore,
/// }
///
/// let slice = Contact::new(ContactInner { inquiries });
/// ```
#[proc_macro_attribute]
pub fn wayfare_slice(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemStruct);
    macros::slice::expand_slice(input).into()
}
