use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;
use wayfare::domain::config::ApiConfig;
use wayfare_server::Server;

async fn app(config: ApiConfig) -> Router {
    Server::builder().config(config).build().await.expect("server on mem://").router()
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        },
        None => Body::empty(),
    };

    let response = router.clone().oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn health_and_openapi_are_served() {
    let router = app(ApiConfig::default()).await;

    let (status, health) = send(&router, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "up");

    let response = router
        .clone()
        .oneshot(Request::builder().uri("/api").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn every_slice_is_mounted() {
    let server = Server::builder().config(ApiConfig::default()).build().await.expect("server on mem://");
    assert_eq!(server.state().slice_names(), ["Booking", "Contact", "Identity", "Payments"]);
    let router = server.router();

    let (status, vehicles) = send(&router, Method::GET, "/api/vehicles", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(vehicles.as_array().map(Vec::len), Some(4));

    let (status, quote) = send(
        &router,
        Method::POST,
        "/api/fares/quote",
        Some(json!({ "distanceKm": 25.0, "vehicleClass": "suv" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{quote}");
    assert_eq!(quote["totalKobo"], 865_000);

    let (status, receipt) = send(
        &router,
        Method::POST,
        "/api/contact",
        Some(json!({
            "name": "Ngozi Eze",
            "email": "ngozi@example.com",
            "phone": "08031234567",
            "subject": null,
            "message": "Do you run airport pickups in Abuja?"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{receipt}");
    assert!(receipt["id"].is_string());

    let (status, _) = send(&router, Method::GET, "/api/dashboard", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&router, Method::POST, "/api/payments/webhook", Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn cors_preflight_allows_configured_origin() {
    let mut config = ApiConfig::default();
    config.server.cors_origins = vec!["https://wayfare.ng".to_owned()];
    let router = app(config).await;

    let response = router
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/fares/quote")
                .header(header::ORIGIN, "https://wayfare.ng")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).and_then(|v| v.to_str().ok()),
        Some("https://wayfare.ng")
    );
}

#[tokio::test]
async fn empty_jwt_secret_fails_bootstrap() {
    let mut config = ApiConfig::default();
    config.security.identity.jwt.secret = String::new();

    let err = Server::builder().config(config).build().await.unwrap_err();
    assert!(err.to_string().contains("bootstrap"), "{err}");
}
