use std::net::SocketAddr;
use std::time::Duration as StdDuration;

use axum::{
    Router,
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode},
};
use chrono::{Duration, Months, NaiveDate, Utc};
use flynest_backend::{
    AppState,
    config::Config,
    db,
    entities::booking,
    entities::payment::{self, PaymentStatus},
    error::AppError,
    routes,
    services::payment::{settle, CardDetails, PaymentSimulator},
};
use http_body_util::BodyExt;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use sea_orm_migration::MigratorTrait;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

const ADMIN_EMAIL: &str = "admin@flynest.com";
const ADMIN_PASSWORD: &str = "Admin@12345";
const PASSWORD: &str = "Secret@123";
const FARE: i64 = 450_000;

struct TestApp {
    router: Router,
    db: DatabaseConnection,
}

async fn spawn_app_with_success_rate(payment_success_rate: f64) -> TestApp {
    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        database_max_connections: 1,
        jwt_secret: "test-secret".to_string(),
        jwt_expiration_hours: 12,
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        admin_email: ADMIN_EMAIL.to_string(),
        admin_password: ADMIN_PASSWORD.to_string(),
        payment_success_rate,
        payment_delay_ms: 0,
        payment_currency: "INR".to_string(),
    };

    let db = db::connect(&config).await.expect("Failed to connect");
    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db::seed_admin(&db, &config)
        .await
        .expect("Failed to seed admin");

    TestApp {
        router: routes::create_app(AppState::new(db.clone(), config)),
        db,
    }
}

async fn spawn_app() -> TestApp {
    spawn_app_with_success_rate(1.0).await
}

impl TestApp {
    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .extension(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40_000))));
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, json)
    }

    async fn register(&self, name: &str, email: &str, phone: &str) -> (String, String) {
        let (status, body) = self
            .send(
                "POST",
                "/api/auth/register",
                None,
                Some(json!({ "name": name, "email": email, "phone": phone, "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);

        (
            body["token"].as_str().unwrap().to_string(),
            body["user"]["id"].as_str().unwrap().to_string(),
        )
    }

    async fn admin_token(&self) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/api/auth/admin-login",
                None,
                Some(json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["token"].as_str().unwrap().to_string()
    }

    async fn create_flight(&self, admin: &str, flight: Value) -> String {
        let (status, body) = self
            .send("POST", "/api/admin/flights", Some(admin), Some(flight))
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["id"].as_str().unwrap().to_string()
    }

    async fn book(&self, token: &str, flight_id: &str, passengers: usize) -> Value {
        let passengers: Vec<Value> = (0..passengers)
            .map(|i| passenger(&format!("Traveller {}", i + 1)))
            .collect();
        let (status, body) = self
            .send(
                "POST",
                "/api/bookings",
                Some(token),
                Some(json!({ "flight_id": flight_id, "passengers": passengers })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body
    }

    async fn pay(&self, token: &str, booking_id: &str) -> (StatusCode, Value) {
        self.send(
            "POST",
            "/api/payments",
            Some(token),
            Some(json!({ "booking_id": booking_id, "card": card() })),
        )
        .await
    }
}

async fn record_succeeded_payment(db: &DatabaseConnection, booking_id: Uuid, user_id: &str) {
    payment::ActiveModel {
        id: Set(Uuid::new_v4()),
        booking_id: Set(booking_id),
        user_id: Set(user_id.parse().unwrap()),
        transaction_id: Set("pi_legacy0000000001".to_string()),
        amount: Set(FARE),
        currency: Set("INR".to_string()),
        status: Set(PaymentStatus::Succeeded),
        method_type: Set("card".to_string()),
        card_last4: Set(Some("4242".to_string())),
        receipt_url: Set(None),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await
    .unwrap();
}

fn in_days(days: i64) -> NaiveDate {
    Utc::now().date_naive() + Duration::days(days)
}

fn route_flight(number: &str, date: NaiveDate) -> Value {
    json!({
        "flight_number": number,
        "flight_date": date.to_string(),
        "departure_airport": "Pune Airport",
        "arrival_airport": "Ahmedabad Airport",
        "airline_name": "IndiGo",
        "price": FARE
    })
}

fn passenger(name: &str) -> Value {
    json!({
        "full_name": name,
        "gender": "female",
        "birthdate": "1990-04-12",
        "passport_number": "123456789012"
    })
}

fn card() -> Value {
    json!({
        "number": "4111 1111 1111 1111",
        "holder": "Asha Rao",
        "expiry_month": 12,
        "expiry_year": 2099,
        "cvv": "123"
    })
}

#[tokio::test]
async fn test_registration_and_login() {
    let app = spawn_app().await;
    app.register("Asha Rao", "asha@example.com", "9876543210").await;

    let (status, body) = app
        .send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "name": "Other", "email": "ASHA@example.com", "phone": "9876543211", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Email already registered");

    let (status, body) = app
        .send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "name": "Other", "email": "other@example.com", "phone": "9876543210", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Phone number already registered");

    let (status, _) = app
        .send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "name": "Weak", "email": "weak@example.com", "phone": "9876543212", "password": "password" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "asha@example.com", "password": "Wrong@1234" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid email or password");

    let (status, body) = app
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "asha@example.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    // Customer credentials are not admin credentials
    let (status, _) = app
        .send(
            "POST",
            "/api/auth/admin-login",
            None,
            Some(json!({ "email": "asha@example.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.send("GET", "/api/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phone"], "9876543210");
    assert!(body.get("password_hash").is_none());

    let (status, body) = app.send("POST", "/api/auth/refresh", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());
}

#[tokio::test]
async fn test_role_separation() {
    let app = spawn_app().await;
    let (user, _) = app.register("Asha Rao", "asha@example.com", "9876543210").await;
    let admin = app.admin_token().await;

    let (status, _) = app.send("GET", "/api/admin/stats", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send("GET", "/api/admin/stats", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send("GET", "/api/admin/stats", Some(&user), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.send("GET", "/api/admin/stats", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_users"], 1);

    // Admins do not book as customers
    let (status, _) = app.send("GET", "/api/bookings", Some(&admin), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_flight_search_filters_and_orders() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let date = in_days(20);

    let mut late = route_flight("6E101", date);
    late["departure_time"] = json!("09:00:00");
    late["arrival_time"] = json!("10:30:00");
    app.create_flight(&admin, late).await;

    let mut early = route_flight("6E100", date);
    early["departure_time"] = json!("06:00:00");
    early["arrival_time"] = json!("07:15:00");
    app.create_flight(&admin, early).await;

    let mut cancelled = route_flight("6E102", date);
    cancelled["flight_status"] = json!("CANCELLED");
    app.create_flight(&admin, cancelled).await;

    let mut unpriced = route_flight("6E103", date);
    unpriced["price"] = Value::Null;
    app.create_flight(&admin, unpriced).await;

    let mut other_route = route_flight("AI200", date);
    other_route["arrival_airport"] = json!("Chhatrapati Shivaji Maharaj International Airport");
    app.create_flight(&admin, other_route).await;

    app.create_flight(&admin, route_flight("6E104", in_days(21))).await;

    let uri = format!(
        "/api/flights/search?departure_airport=pune&arrival_airport=AHMEDABAD&flight_date={}",
        date
    );
    let (status, body) = app.send("GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    let numbers: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["flight_number"].as_str().unwrap())
        .collect();
    assert_eq!(numbers, vec!["6E100", "6E101"]);
    assert_eq!(body[0]["duration"], "1h 15m");

    let (status, body) = app
        .send(
            "GET",
            &format!("/api/flights/search?departure_airport=delhi&arrival_airport=goa&flight_date={}", date),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, _) = app
        .send(
            "GET",
            "/api/flights/search?departure_airport=pune&arrival_airport=ahmedabad&flight_date=20-08-2025",
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!(
        "/api/flights/available-dates?from=pune&to=ahmedabad&start_date={}&end_date={}",
        date,
        in_days(25)
    );
    let (status, body) = app.send("GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[0]["flight_count"], 2);
    assert_eq!(body[0]["airlines"], 1);
}

#[tokio::test]
async fn test_booking_paid_once_is_confirmed() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let (user, user_id) = app.register("Asha Rao", "asha@example.com", "9876543210").await;
    let flight_id = app.create_flight(&admin, route_flight("6E100", in_days(10))).await;

    let booking = app.book(&user, &flight_id, 2).await;
    assert_eq!(booking["status"], "pending");
    assert_eq!(booking["amount"], FARE * 2);
    assert_eq!(booking["passengers"].as_array().unwrap().len(), 2);
    let booking_id = booking["id"].as_str().unwrap();

    let (status, payment) = app.pay(&user, booking_id).await;
    assert_eq!(status, StatusCode::OK, "{}", payment);
    assert_eq!(payment["status"], "succeeded");
    assert_eq!(payment["card_last4"], "1111");
    assert!(payment["transaction_id"].as_str().unwrap().starts_with("pi_"));

    let (_, booking) = app
        .send("GET", &format!("/api/bookings/{}", booking_id), Some(&user), None)
        .await;
    assert_eq!(booking["status"], "confirmed");

    let (status, _) = app.pay(&user, booking_id).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, payments) = app
        .send("GET", &format!("/api/payments/booking/{}", booking_id), Some(&user), None)
        .await;
    assert_eq!(payments.as_array().unwrap().len(), 1);

    let (_, payments) = app
        .send("GET", &format!("/api/payments/user/{}", user_id), Some(&user), None)
        .await;
    assert_eq!(payments.as_array().unwrap().len(), 1);

    let (_, stats) = app.send("GET", "/api/admin/stats", Some(&admin), None).await;
    assert_eq!(stats["total_revenue"], FARE * 2);
}

#[tokio::test]
async fn test_declined_payment_leaves_booking_pending() {
    let app = spawn_app_with_success_rate(0.0).await;
    let admin = app.admin_token().await;
    let (user, _) = app.register("Asha Rao", "asha@example.com", "9876543210").await;
    let flight_id = app.create_flight(&admin, route_flight("6E100", in_days(10))).await;

    let booking = app.book(&user, &flight_id, 1).await;
    let booking_id = booking["id"].as_str().unwrap();

    let (status, body) = app.pay(&user, booking_id).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["error"], "Payment failed, please try again");

    let (_, booking) = app
        .send("GET", &format!("/api/bookings/{}", booking_id), Some(&user), None)
        .await;
    assert_eq!(booking["status"], "pending");

    let (_, payments) = app
        .send("GET", &format!("/api/payments/booking/{}", booking_id), Some(&user), None)
        .await;
    assert_eq!(payments.as_array().unwrap().len(), 1);
    assert_eq!(payments[0]["status"], "failed");
    assert!(payments[0]["receipt_url"].is_null());
}

#[tokio::test]
async fn test_invalid_card_is_rejected_before_charging() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let (user, _) = app.register("Asha Rao", "asha@example.com", "9876543210").await;
    let flight_id = app.create_flight(&admin, route_flight("6E100", in_days(10))).await;
    let booking = app.book(&user, &flight_id, 1).await;

    let mut bad_card = card();
    bad_card["number"] = json!("4111");
    let (status, _) = app
        .send(
            "POST",
            "/api/payments",
            Some(&user),
            Some(json!({ "booking_id": booking["id"], "card": bad_card })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, payments) = app
        .send(
            "GET",
            &format!("/api/payments/booking/{}", booking["id"].as_str().unwrap()),
            Some(&user),
            None,
        )
        .await;
    assert_eq!(payments, json!([]));
}

#[tokio::test]
async fn test_cancellation_window() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let (user, _) = app.register("Asha Rao", "asha@example.com", "9876543210").await;

    let later = app.create_flight(&admin, route_flight("6E100", in_days(5))).await;
    let booking = app.book(&user, &later, 1).await;
    let cancel_uri = format!("/api/bookings/{}/cancel", booking["id"].as_str().unwrap());

    let (status, body) = app.send("POST", &cancel_uri, Some(&user), None).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["status"], "cancelled");

    // Repeating is a no-op
    let (status, body) = app.send("POST", &cancel_uri, Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");

    let soon = app.create_flight(&admin, route_flight("6E101", in_days(1))).await;
    let booking = app.book(&user, &soon, 1).await;
    let (status, body) = app
        .send(
            "DELETE",
            &format!("/api/bookings/{}", booking["id"].as_str().unwrap()),
            Some(&user),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("1 days"), "{}", body);
}

#[tokio::test]
async fn test_reschedule_rules() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let (user, _) = app.register("Asha Rao", "asha@example.com", "9876543210").await;

    let current = app.create_flight(&admin, route_flight("6E100", in_days(5))).await;
    let earlier = app.create_flight(&admin, route_flight("6E101", in_days(3))).await;
    let mut pricier = route_flight("6E102", in_days(10));
    pricier["price"] = json!(FARE + 50_000);
    let later = app.create_flight(&admin, pricier).await;
    let far_date = Utc::now()
        .date_naive()
        .checked_add_months(Months::new(7))
        .unwrap();
    let too_far = app.create_flight(&admin, route_flight("6E103", far_date)).await;
    let mut elsewhere = route_flight("AI200", in_days(12));
    elsewhere["arrival_airport"] = json!("Indira Gandhi International Airport");
    let other_route = app.create_flight(&admin, elsewhere).await;

    let booking = app.book(&user, &current, 1).await;
    let booking_id = booking["id"].as_str().unwrap();
    let uri = format!("/api/bookings/{}/reschedule", booking_id);

    // Pending bookings cannot be rescheduled
    let (status, _) = app
        .send("POST", &uri, Some(&user), Some(json!({ "new_flight_id": later })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app.pay(&user, booking_id).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send("POST", &uri, Some(&user), Some(json!({ "new_flight_id": earlier })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send("POST", &uri, Some(&user), Some(json!({ "new_flight_id": other_route })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send("POST", &uri, Some(&user), Some(json!({ "new_flight_id": later })))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["flight_number"], "6E102");
    assert_eq!(body["flight_date"], in_days(10).to_string());
    assert_eq!(body["status"], "confirmed");
    assert_eq!(body["price_difference"], 50_000);

    let (status, _) = app
        .send("POST", &uri, Some(&user), Some(json!({ "new_flight_id": too_far })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ownership_is_enforced() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let (asha, asha_id) = app.register("Asha Rao", "asha@example.com", "9876543210").await;
    let (ravi, _) = app.register("Ravi Iyer", "ravi@example.com", "9876543211").await;
    let flight_id = app.create_flight(&admin, route_flight("6E100", in_days(10))).await;

    let booking = app.book(&asha, &flight_id, 1).await;
    let booking_uri = format!("/api/bookings/{}", booking["id"].as_str().unwrap());

    let (status, _) = app.send("GET", &booking_uri, Some(&ravi), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.pay(&ravi, booking["id"].as_str().unwrap()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send("GET", &format!("/api/bookings/user/{}", asha_id), Some(&ravi), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.send("GET", &booking_uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], asha_id);

    let (status, body) = app
        .send(
            "GET",
            &format!("/api/passengers/booking/{}", booking["id"].as_str().unwrap()),
            Some(&asha),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_round_trip_checkout() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let (user, _) = app.register("Asha Rao", "asha@example.com", "9876543210").await;

    let onward = app.create_flight(&admin, route_flight("6E100", in_days(10))).await;
    let mut back = route_flight("6E200", in_days(14));
    back["departure_airport"] = json!("Ahmedabad Airport");
    back["arrival_airport"] = json!("Pune Airport");
    let inbound = app.create_flight(&admin, back).await;

    let (status, body) = app
        .send(
            "POST",
            "/api/bookings/checkout",
            Some(&user),
            Some(json!({
                "flight_id": onward,
                "return_flight_id": inbound,
                "passengers": [passenger("Asha Rao")],
                "card": card()
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["bookings"].as_array().unwrap().len(), 2);
    assert_eq!(body["payments"].as_array().unwrap().len(), 2);
    assert_eq!(body["bookings"][1]["flight_number"], "6E200");

    let (_, mine) = app.send("GET", "/api/bookings", Some(&user), None).await;
    let statuses: Vec<&str> = mine
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["status"].as_str().unwrap())
        .collect();
    assert_eq!(statuses, vec!["confirmed", "confirmed"]);

    let (status, body) = app
        .send(
            "GET",
            &format!(
                "/api/flights/search-roundtrip?from=pune&to=ahmedabad&date={}&return_date={}",
                in_days(10),
                in_days(14)
            ),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["onward"][0]["flight_number"], "6E100");
    assert_eq!(body["return"][0]["flight_number"], "6E200");
}

#[tokio::test]
async fn test_admin_booking_management() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let (user, _) = app.register("Asha Rao", "asha@example.com", "9876543210").await;
    // Departure tomorrow: customers can no longer cancel, admins still can
    let flight_id = app.create_flight(&admin, route_flight("6E100", in_days(1))).await;
    let booking = app.book(&user, &flight_id, 1).await;
    let uri = format!("/api/admin/bookings/{}", booking["id"].as_str().unwrap());

    let (status, body) = app
        .send("PUT", &uri, Some(&admin), Some(json!({ "status": "cancelled" })))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["status"], "cancelled");

    let (status, _) = app
        .send("PUT", &uri, Some(&admin), Some(json!({ "status": "confirmed" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, all) = app.send("GET", "/api/admin/bookings", Some(&admin), None).await;
    assert_eq!(all[0]["user_email"], "asha@example.com");

    let (status, _) = app.send("DELETE", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.send("GET", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reconcile_confirms_paid_pending_booking() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let (user, user_id) = app.register("Asha Rao", "asha@example.com", "9876543210").await;
    let flight_id = app.create_flight(&admin, route_flight("6E100", in_days(10))).await;
    let booking = app.book(&user, &flight_id, 1).await;
    let booking_id: Uuid = booking["id"].as_str().unwrap().parse().unwrap();
    let uri = format!("/api/bookings/{}/reconcile", booking_id);

    // Nothing paid yet: unchanged
    let (status, body) = app.send("POST", &uri, Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pending");

    record_succeeded_payment(&app.db, booking_id, &user_id).await;

    let (status, body) = app.send("POST", &uri, Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "confirmed");
}

#[tokio::test]
async fn test_admin_confirm_requires_succeeded_payment() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let (user, user_id) = app.register("Asha Rao", "asha@example.com", "9876543210").await;
    let flight_id = app.create_flight(&admin, route_flight("6E100", in_days(10))).await;
    let booking = app.book(&user, &flight_id, 1).await;
    let booking_id: Uuid = booking["id"].as_str().unwrap().parse().unwrap();
    let uri = format!("/api/admin/bookings/{}", booking_id);

    let (status, _) = app
        .send("PUT", &uri, Some(&admin), Some(json!({ "status": "confirmed" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = app.send("GET", &uri, Some(&admin), None).await;
    assert_eq!(body["status"], "pending");

    record_succeeded_payment(&app.db, booking_id, &user_id).await;

    let (status, body) = app
        .send("PUT", &uri, Some(&admin), Some(json!({ "status": "confirmed" })))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["status"], "confirmed");
}

fn card_details() -> CardDetails {
    CardDetails {
        number: "4111111111111111".to_string(),
        holder: "Asha Rao".to_string(),
        expiry_month: 12,
        expiry_year: 2099,
        cvv: "123".to_string(),
    }
}

async fn load_booking(db: &DatabaseConnection, id: &str) -> booking::Model {
    booking::Entity::find_by_id(id.parse::<Uuid>().unwrap())
        .one(db)
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn test_settlement_refuses_a_booking_changed_since_read() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let (user, user_id) = app.register("Asha Rao", "asha@example.com", "9876543210").await;
    let user_uuid: Uuid = user_id.parse().unwrap();
    let flight_id = app.create_flight(&admin, route_flight("6E100", in_days(10))).await;
    let simulator = PaymentSimulator::new(1.0, StdDuration::ZERO, "INR");

    // Paid by another request after this copy was read
    let booking = app.book(&user, &flight_id, 1).await;
    let booking_id = booking["id"].as_str().unwrap();
    let stale = load_booking(&app.db, booking_id).await;
    let (status, _) = app.pay(&user, booking_id).await;
    assert_eq!(status, StatusCode::OK);

    let result = settle(&app.db, &simulator, user_uuid, &[stale], &card_details()).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    let (_, payments) = app
        .send("GET", &format!("/api/payments/booking/{}", booking_id), Some(&user), None)
        .await;
    assert_eq!(payments.as_array().unwrap().len(), 1);

    // Amount grew after this copy was read
    let booking = app.book(&user, &flight_id, 1).await;
    let booking_id = booking["id"].as_str().unwrap();
    let stale = load_booking(&app.db, booking_id).await;
    let mut extra = passenger("Ravi Rao");
    extra["booking_id"] = json!(booking_id);
    let (status, _) = app.send("POST", "/api/passengers", Some(&user), Some(extra)).await;
    assert_eq!(status, StatusCode::OK);

    let result = settle(&app.db, &simulator, user_uuid, &[stale], &card_details()).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    let current = load_booking(&app.db, booking_id).await;
    assert_eq!(current.status, booking::BookingStatus::Pending);
    assert_eq!(current.amount, FARE * 2);
    let (_, payments) = app
        .send("GET", &format!("/api/payments/booking/{}", booking_id), Some(&user), None)
        .await;
    assert_eq!(payments, json!([]));
}

#[tokio::test]
async fn test_add_passenger_to_pending_booking() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let (asha, _) = app.register("Asha Rao", "asha@example.com", "9876543210").await;
    let (ravi, _) = app.register("Ravi Iyer", "ravi@example.com", "9876543211").await;
    let flight_id = app.create_flight(&admin, route_flight("6E100", in_days(10))).await;

    let booking = app.book(&asha, &flight_id, 2).await;
    let booking_id = booking["id"].as_str().unwrap();
    let mut extra = passenger("Meera Rao");
    extra["booking_id"] = json!(booking_id);

    let (status, _) = app
        .send("POST", "/api/passengers", Some(&ravi), Some(extra.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send("POST", "/api/passengers", Some(&asha), Some(extra.clone()))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["full_name"], "Meera Rao");
    assert_eq!(body["booking_id"], booking_id);

    let (_, booking) = app
        .send("GET", &format!("/api/bookings/{}", booking_id), Some(&asha), None)
        .await;
    assert_eq!(booking["amount"], FARE * 3);
    assert_eq!(booking["passengers"].as_array().unwrap().len(), 3);

    let (status, _) = app.pay(&asha, booking_id).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.send("POST", "/api/passengers", Some(&asha), Some(extra)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, passengers) = app
        .send("GET", &format!("/api/passengers/booking/{}", booking_id), Some(&asha), None)
        .await;
    assert_eq!(passengers.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_search_treats_wildcards_literally() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let date = in_days(20);
    app.create_flight(&admin, route_flight("6E100", date)).await;

    let uri = format!(
        "/api/flights/search?departure_airport=%25&arrival_airport=_&flight_date={}",
        date
    );
    let (status, body) = app.send("GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let uri = format!(
        "/api/flights/available-dates?from=%25&to=%25&start_date={}&end_date={}",
        date, date
    );
    let (_, body) = app.send("GET", &uri, None, None).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_admin_fare_cap_and_nullable_edits() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;

    let mut huge = route_flight("6E999", in_days(10));
    huge["price"] = json!(i64::MAX / 2);
    let (status, _) = app
        .send("POST", "/api/admin/flights", Some(&admin), Some(huge))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut flight = route_flight("6E100", in_days(10));
    flight["departure_time"] = json!("06:00:00");
    flight["departure_terminal"] = json!("T1");
    let flight_id = app.create_flight(&admin, flight).await;
    let uri = format!("/api/admin/flights/{}", flight_id);

    let (status, body) = app
        .send("PUT", &uri, Some(&admin), Some(json!({ "departure_terminal": "T2" })))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["departure_terminal"], "T2");
    assert_eq!(body["departure_time"], "06:00:00");
    assert_eq!(body["price"], FARE);

    let (status, body) = app
        .send(
            "PUT",
            &uri,
            Some(&admin),
            Some(json!({ "price": null, "departure_time": null })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(body["price"].is_null());
    assert!(body["departure_time"].is_null());
    assert_eq!(body["duration"], "TBD");
    assert_eq!(body["departure_terminal"], "T2");

    // Unpriced flights drop out of search
    let uri = format!(
        "/api/flights/search?departure_airport=pune&arrival_airport=ahmedabad&flight_date={}",
        in_days(10)
    );
    let (_, body) = app.send("GET", &uri, None, None).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_reschedule_options_and_flights_by_date() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let (user, _) = app.register("Asha Rao", "asha@example.com", "9876543210").await;

    let current = app.create_flight(&admin, route_flight("6E100", in_days(5))).await;
    let mut pricier = route_flight("6E102", in_days(10));
    pricier["price"] = json!(FARE + 50_000);
    pricier["departure_time"] = json!("09:00:00");
    app.create_flight(&admin, pricier).await;
    let mut cheaper = route_flight("6E101", in_days(10));
    cheaper["price"] = json!(FARE - 20_000);
    cheaper["departure_time"] = json!("06:00:00");
    app.create_flight(&admin, cheaper).await;
    let mut cancelled = route_flight("6E103", in_days(10));
    cancelled["flight_status"] = json!("Cancelled");
    app.create_flight(&admin, cancelled).await;
    let mut elsewhere = route_flight("AI200", in_days(10));
    elsewhere["arrival_airport"] = json!("Indira Gandhi International Airport");
    app.create_flight(&admin, elsewhere).await;

    let booking = app.book(&user, &current, 2).await;
    let booking_id = booking["id"].as_str().unwrap();
    let uri = |date: NaiveDate| {
        format!("/api/bookings/{}/reschedule-options?date={}", booking_id, date)
    };

    // Pending bookings have no options
    let (status, _) = app.send("GET", &uri(in_days(10)), Some(&user), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app.pay(&user, booking_id).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.send("GET", &uri(in_days(10)), Some(&user), None).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let options = body.as_array().unwrap();
    assert_eq!(options.len(), 2);
    assert_eq!(options[0]["flight_number"], "6E101");
    assert_eq!(options[0]["price_difference"], -40_000);
    assert_eq!(options[1]["flight_number"], "6E102");
    assert_eq!(options[1]["price_difference"], 100_000);

    // Earlier than the current flight
    let (status, _) = app.send("GET", &uri(in_days(3)), Some(&user), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send("GET", &format!("/api/flights/by-date?date={}", in_days(10)), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let numbers: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["flight_number"].as_str().unwrap())
        .collect();
    assert_eq!(numbers.len(), 3);
    assert!(!numbers.contains(&"6E103"));
}

#[tokio::test]
async fn test_declined_checkout_reports_pending_bookings() {
    let app = spawn_app_with_success_rate(0.0).await;
    let admin = app.admin_token().await;
    let (user, _) = app.register("Asha Rao", "asha@example.com", "9876543210").await;
    let flight_id = app.create_flight(&admin, route_flight("6E100", in_days(10))).await;

    let (status, body) = app
        .send(
            "POST",
            "/api/bookings/checkout",
            Some(&user),
            Some(json!({
                "flight_id": flight_id,
                "passengers": [passenger("Asha Rao")],
                "card": card()
            })),
        )
        .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["error"], "Payment failed, please try again");
    let ids = body["booking_ids"].as_array().unwrap();
    assert_eq!(ids.len(), 1);

    let (status, booking) = app
        .send(
            "GET",
            &format!("/api/bookings/{}", ids[0].as_str().unwrap()),
            Some(&user),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(booking["status"], "pending");
}
