use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use chrono::Utc;
use serde_json::{Value, json};
use std::time::Duration;
use tower::ServiceExt;
use wayfare_database::Database;
use wayfare_domain::config::ApiConfig;
use wayfare_identity::{Claims, Identity, Role};
use wayfare_kernel::server::ApiState;

struct TestApp {
    router: Router,
    admin: String,
    customer: String,
}

async fn app() -> TestApp {
    let mut config = ApiConfig::default();
    config.security.identity.jwt.secret = "contact-test-secret".to_owned();

    let db = Database::builder()
        .url("mem://")
        .session("test", "contact")
        .migrations(wayfare_contact::MIGRATIONS.iter().copied())
        .init()
        .await
        .expect("in-memory database");

    let identity = wayfare_identity::init(&config, &db).unwrap();
    let contact = wayfare_contact::init(&db);
    let state = ApiState::builder()
        .config(config)
        .db(db)
        .register_slice(identity)
        .register_slice(contact)
        .build()
        .unwrap();

    let tokens = state.get_slice::<Identity>().unwrap().tokens().clone();
    let now = u64::try_from(Utc::now().timestamp()).unwrap();
    let token = |uid: &str, role| tokens.sign(&Claims::new(uid, "wayfare", now, 600).with_role(role)).unwrap();

    let (router, _) = wayfare_contact::router().split_for_parts();
    TestApp {
        router: router.with_state(state),
        admin: token("uid-admin", Role::Admin),
        customer: token("uid-customer", Role::Customer),
    }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn submit(&self, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::post("/api/contact")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn inbox(&self, token: &str) -> (StatusCode, Value) {
        self.send(
            Request::get("/api/admin/inquiries")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }
}

#[tokio::test]
async fn inquiries_are_stored_and_listed_newest_first() {
    let app = app().await;

    let (status, first) = app
        .submit(json!({
            "name": "Tunde Bakare",
            "email": "Tunde@Example.com",
            "phone": "+234 812 345 6789",
            "subject": "Corporate account",
            "message": "We move staff between Lekki and Ikeja every weekday."
        }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{first}");
    assert_eq!(first["id"].as_str().unwrap().len(), 12);
    assert!(first["createdAt"].is_string());

    tokio::time::sleep(Duration::from_millis(5)).await;
    let (status, second) = app
        .submit(json!({ "name": "Ify", "email": "ify@example.com", "message": "Is there a night surcharge?" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, inbox) = app.inbox(&app.admin).await;
    assert_eq!(status, StatusCode::OK);
    let inbox = inbox.as_array().unwrap();
    assert_eq!(inbox.len(), 2);
    assert_eq!(inbox[0]["id"], second["id"]);
    assert_eq!(inbox[1]["email"], "tunde@example.com");
    assert_eq!(inbox[1]["phone"], "+2348123456789");
}

#[tokio::test]
async fn invalid_inquiries_are_rejected() {
    let app = app().await;

    let (status, body) = app
        .submit(json!({ "name": "Ify", "email": "ify-at-example", "message": "Hello" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["message"].as_str().unwrap().starts_with("email"));

    let (status, _) = app
        .submit(json!({ "name": "Ify", "email": "ify@example.com", "message": "m".repeat(2_001) }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = app.inbox(&app.admin).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn inbox_is_for_admins() {
    let app = app().await;

    let (status, _) = app.inbox(&app.customer).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.inbox("not-a-token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
