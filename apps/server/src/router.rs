use axum::Router;
use axum::http::HeaderValue;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable};
use wayfare::kernel::prelude::{ApiState, BEARER_SCHEME};

#[derive(OpenApi)]
#[openapi(
    info(title = "Wayfare API", description = "Ride booking, fares, payments and contact"),
    modifiers(&BearerSecurity)
)]
struct ApiDoc;

#[derive(Debug)]
struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            BEARER_SCHEME,
            SecurityScheme::Http(
                HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build(),
            ),
        );
    }
}

pub(crate) fn init(state: ApiState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);
    let api = ApiDoc::openapi();

    let (openapi_routes, api_doc) = OpenApiRouter::with_openapi(api)
        .merge(wayfare::kernel::server::router::system_router())
        .merge(wayfare::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .split_for_parts();

    let scalar_routes = Scalar::with_url("/api", api_doc);

    let router = Router::new().merge(openapi_routes).merge(scalar_routes);
    match cors {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

/// `None` when no origin is configured; the booking site is then expected on the same origin.
fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            },
        })
        .collect();

    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_is_disabled_without_valid_origins() {
        assert!(cors_layer(&[]).is_none());
        assert!(cors_layer(&["bad\norigin".to_owned()]).is_none());
        assert!(cors_layer(&["https://wayfare.ng".to_owned()]).is_some());
    }

    #[test]
    fn openapi_registers_bearer_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key(BEARER_SCHEME));
    }
}
