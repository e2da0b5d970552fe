use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{admin, auth, bookings, flights, passengers, payments, reference, users};
use crate::middleware::auth::{auth_middleware, require_admin, require_user};
use crate::middleware::rate_limit::{create_global_governor, create_public_governor, log_request};
use crate::middleware::user_rate_limit::create_user_governor;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    let public_governor = create_public_governor();
    let user_governor = create_user_governor();

    // Public auth routes; refresh needs a live token of either role
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/admin-login", post(auth::admin_login))
        .layer(public_governor.clone())
        .route(
            "/refresh",
            post(auth::refresh)
                .layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        );

    // Catalog and reference data
    let public_routes = Router::new()
        .route("/flights", get(flights::list_flights))
        .route("/flights/search", get(flights::search_flights))
        .route("/flights/search-roundtrip", get(flights::search_roundtrip))
        .route("/flights/available-dates", get(flights::available_dates))
        .route("/flights/by-date", get(flights::flights_by_date))
        .route("/flights/{id}", get(flights::get_flight))
        .route("/countries", get(reference::list_countries))
        .route("/countries/{id}", get(reference::get_country))
        .route("/cities", get(reference::list_cities))
        .route("/cities/{id}", get(reference::get_city))
        .route("/airports", get(reference::list_airports))
        .route("/airports/{id}", get(reference::get_airport))
        .route("/airlines", get(reference::list_airlines))
        .route("/airlines/{id}", get(reference::get_airline))
        .route("/airplanes", get(reference::list_airplanes))
        .route("/airplanes/{id}", get(reference::get_airplane))
        .layer(public_governor);

    // Customer-only routes
    let customer_routes = Router::new()
        .route("/users/me", get(users::me).put(users::update_me))
        .route(
            "/bookings",
            post(bookings::create_booking).get(bookings::my_bookings),
        )
        .route("/bookings/checkout", post(bookings::checkout))
        .layer(user_governor.clone())
        .layer(middleware::from_fn(require_user))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Owner routes: the owning customer or any admin
    let owner_routes = Router::new()
        .route("/bookings/user/{user_id}", get(bookings::user_bookings))
        .route(
            "/bookings/{id}",
            get(bookings::get_booking).delete(bookings::delete_booking),
        )
        .route("/bookings/{id}/cancel", post(bookings::cancel_booking))
        .route("/bookings/{id}/reschedule", post(bookings::reschedule_booking))
        .route(
            "/bookings/{id}/reschedule-options",
            get(bookings::reschedule_options),
        )
        .route("/bookings/{id}/reconcile", post(bookings::reconcile_booking))
        .route("/passengers", post(passengers::create_passenger))
        .route(
            "/passengers/booking/{booking_id}",
            get(passengers::booking_passengers),
        )
        .route("/payments", post(payments::create_payment))
        .route("/payments/{id}", get(payments::get_payment))
        .route("/payments/user/{user_id}", get(payments::user_payments))
        .route(
            "/payments/booking/{booking_id}",
            get(payments::booking_payments),
        )
        .layer(user_governor)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Admin console; not user-limited
    let admin_routes = Router::new()
        .route("/stats", get(admin::stats))
        // User management
        .route("/users", get(admin::list_users).post(admin::create_user))
        .route(
            "/users/{id}",
            get(admin::get_user)
                .put(admin::update_user)
                .delete(admin::delete_user),
        )
        // Flight management
        .route("/flights", post(admin::create_flight))
        .route(
            "/flights/{id}",
            put(admin::update_flight).delete(admin::delete_flight),
        )
        // Booking management
        .route("/bookings", get(admin::list_all_bookings))
        .route(
            "/bookings/{id}",
            get(admin::get_booking)
                .put(admin::update_booking)
                .delete(admin::delete_booking),
        )
        .route("/payments", get(admin::list_all_payments))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", public_routes)
        .nest("/api", customer_routes)
        .nest("/api", owner_routes)
        .nest("/api/admin", admin_routes)
        .with_state(state)
}

/// The API router wrapped in the server-wide layers. The global per-IP
/// governor is outermost.
pub fn create_app(state: AppState) -> Router {
    create_router(state)
        .layer(middleware::from_fn(log_request))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(create_global_governor())
}
