use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::routing::get;
use chrono::Utc;
use serde_json::{Value, json};
use tower::ServiceExt;
use wayfare_database::Database;
use wayfare_domain::config::ApiConfig;
use wayfare_identity::{AdminUser, Claims, Identity, MIGRATIONS, Role, TokenService};
use wayfare_kernel::server::ApiState;

const SECRET: &str = "identity-test-secret";

struct TestApp {
    router: Router,
    tokens: TokenService,
}

async fn app(admin_emails: &[&str]) -> TestApp {
    let mut config = ApiConfig::default();
    config.security.identity.jwt.secret = SECRET.to_owned();
    config.security.identity.admin_emails = admin_emails.iter().map(|e| (*e).to_owned()).collect();

    let db = Database::builder()
        .url("mem://")
        .session("test", "identity")
        .migrations(MIGRATIONS.iter().copied())
        .init()
        .await
        .expect("in-memory database");

    let slice = wayfare_identity::init(&config, &db).expect("identity slice");
    let state = ApiState::builder().config(config).db(db).register_slice(slice).build().unwrap();
    let tokens = state.get_slice::<Identity>().unwrap().tokens().clone();

    let (router, _) = wayfare_identity::router().split_for_parts();
    let router = router
        .route("/admin-only", get(|AdminUser(user): AdminUser| async move { user.uid }))
        .with_state(state);

    TestApp { router, tokens }
}

impl TestApp {
    fn provider_token(&self, sub: &str, email: &str) -> String {
        let now = u64::try_from(Utc::now().timestamp()).unwrap();
        let claims = Claims::new(sub, "wayfare", now, 600).with_email(email).with_name("Ada Obi");
        self.tokens.sign(&claims).unwrap()
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn open_session(&self, token: &str) -> (StatusCode, Value) {
        self.send(
            Request::post("/api/auth/session")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }
}

fn get_with(uri: &str, token: &str) -> Request<Body> {
    Request::get(uri).header(header::AUTHORIZATION, format!("Bearer {token}")).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn session_upserts_profile_and_issues_role_token() {
    let app = app(&[]).await;
    let provider = app.provider_token("uid-ada", "Ada@Example.com");

    let (status, body) = app.open_session(&provider).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["uid"], "uid-ada");
    assert_eq!(body["profile"]["email"], "ada@example.com");
    assert_eq!(body["profile"]["displayName"], "Ada Obi");
    assert_eq!(body["profile"]["role"], "customer");

    let session = body["token"].as_str().unwrap().to_owned();
    assert_eq!(app.tokens.verify(&session).unwrap().role, Some(Role::Customer));

    let (status, me) = app.send(get_with("/api/me", &session)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["uid"], "uid-ada");
}

#[tokio::test]
async fn repeated_sessions_keep_created_at() {
    let app = app(&[]).await;
    let provider = app.provider_token("uid-ada", "ada@example.com");

    let (_, first) = app.open_session(&provider).await;
    let (status, second) = app.open_session(&provider).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["profile"]["createdAt"], second["profile"]["createdAt"]);
}

#[tokio::test]
async fn admin_emails_receive_admin_claim() {
    let app = app(&["ops@wayfare.ng"]).await;

    let (_, body) = app.open_session(&app.provider_token("uid-ops", "OPS@wayfare.ng")).await;
    assert_eq!(body["profile"]["role"], "admin");
    let admin_session = body["token"].as_str().unwrap().to_owned();

    let (status, _) = app.send(get_with("/admin-only", &admin_session)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.open_session(&app.provider_token("uid-ada", "ada@example.com")).await;
    let customer_session = body["token"].as_str().unwrap().to_owned();
    let (status, body) = app.send(get_with("/admin-only", &customer_session)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn missing_or_invalid_tokens_are_unauthorized() {
    let app = app(&[]).await;

    let (status, body) =
        app.send(Request::post("/api/auth/session").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = app.open_session("header.payload.signature").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send(get_with("/api/me", "nope")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profile_requires_a_session_first() {
    let app = app(&[]).await;
    let provider = app.provider_token("uid-new", "new@example.com");

    let (status, body) = app.send(get_with("/api/me", &provider)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn profile_update_validates_and_normalizes_phone() {
    let app = app(&[]).await;
    let (_, body) = app.open_session(&app.provider_token("uid-ada", "ada@example.com")).await;
    let session = body["token"].as_str().unwrap().to_owned();

    let patch = |payload: Value| {
        Request::patch("/api/me")
            .header(header::AUTHORIZATION, format!("Bearer {session}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap()
    };

    let (status, body) = app.send(patch(json!({ "phone": "12345" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "unprocessable");

    let (status, body) =
        app.send(patch(json!({ "displayName": "  Ada O. ", "phone": "0803 123 4567" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["displayName"], "Ada O.");
    assert_eq!(body["phone"], "+2348031234567");
    assert_eq!(body["email"], "ada@example.com");
}
