use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use chrono::{FixedOffset, TimeDelta, Utc};
use serde_json::{Value, json};
use tower::ServiceExt;
use wayfare_database::Database;
use wayfare_domain::config::ApiConfig;
use wayfare_booking::{Booking, BookingStore};
use wayfare_identity::{Claims, Identity, Role, TokenService};
use wayfare_kernel::server::ApiState;

pub struct TestApp {
    router: Router,
    tokens: TokenService,
    bookings: BookingStore,
}

pub async fn app() -> TestApp {
    let mut config = ApiConfig::default();
    config.security.identity.jwt.secret = "booking-test-secret".to_owned();

    let db = Database::builder()
        .url("mem://")
        .session("test", "booking")
        .migrations(wayfare_identity::MIGRATIONS.iter().copied())
        .migrations(wayfare_booking::MIGRATIONS.iter().copied())
        .init()
        .await
        .expect("in-memory database");

    let identity = wayfare_identity::init(&config, &db).expect("identity slice");
    let booking = wayfare_booking::init(&config, &db).expect("booking slice");
    let state = ApiState::builder()
        .config(config)
        .db(db)
        .register_slice(identity)
        .register_slice(booking)
        .build()
        .unwrap();
    let tokens = state.get_slice::<Identity>().unwrap().tokens().clone();
    let bookings = state.get_slice::<Booking>().unwrap().bookings().clone();

    let (router, _) =
        wayfare_identity::router().merge(wayfare_booking::router()).split_for_parts();

    TestApp { router: router.with_state(state), tokens, bookings }
}

impl TestApp {
    pub fn token(&self, uid: &str, role: Role) -> String {
        let now = u64::try_from(Utc::now().timestamp()).unwrap();
        let claims = Claims::new(uid, "wayfare", now, 600)
            .with_email(format!("{uid}@example.com"))
            .with_name("Chidi Okafor")
            .with_role(role);
        self.tokens.sign(&claims).unwrap()
    }

    /// Direct access to the stored bookings, bypassing the HTTP layer.
    pub const fn bookings(&self) -> &BookingStore {
        &self.bookings
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    /// Runs the wizard to the confirm step and returns the draft ID.
    pub async fn ready_draft(&self, token: &str, pickup_in: TimeDelta) -> String {
        let (status, draft) = self.send(Method::POST, "/api/bookings/drafts", Some(token), Some(route())).await;
        assert_eq!(status, StatusCode::CREATED, "{draft}");
        let id = draft["id"].as_str().unwrap().to_owned();

        let (status, draft) = self
            .send(
                Method::PUT,
                &format!("/api/bookings/drafts/{id}/schedule"),
                Some(token),
                Some(schedule(pickup_in, 2)),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{draft}");
        assert_eq!(draft["step"], "confirm");
        id
    }

    /// Creates a booking paid with `method` and returns its reference.
    pub async fn book(&self, token: &str, method: &str, pickup_in: TimeDelta) -> String {
        let id = self.ready_draft(token, pickup_in).await;
        let (status, booking) = self
            .send(
                Method::POST,
                &format!("/api/bookings/drafts/{id}/confirm"),
                Some(token),
                Some(json!({ "paymentMethod": method })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{booking}");
        booking["reference"].as_str().unwrap().to_owned()
    }
}

pub fn route() -> Value {
    json!({
        "pickup": "Murtala Muhammed Airport, Ikeja",
        "dropoff": "Eko Hotel, Victoria Island",
        "distanceKm": 25.0,
        "vehicleClass": "suv",
    })
}

/// Schedule body for a pickup `ahead` of now, in Lagos time.
pub fn schedule(ahead: TimeDelta, passengers: u8) -> Value {
    let lagos = FixedOffset::east_opt(3600).unwrap();
    let local = (Utc::now() + ahead).with_timezone(&lagos);
    json!({
        "pickupDate": local.format("%Y-%m-%d").to_string(),
        "pickupTime": local.format("%H:%M").to_string(),
        "passengers": passengers,
        "notes": "Flight BA75, two suitcases",
    })
}
