use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait, Unchanged,
};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus};
use crate::entities::{airplane, flight, passenger, payment, user};
use crate::error::{AppError, AppResult};
use crate::handlers::auth::{ensure_contact_available, RegisterRequest};
use crate::handlers::bookings::{with_passengers, BookingResponse};
use crate::handlers::flights::FlightResponse;
use crate::services::payment::has_succeeded_payment;
use crate::utils::booking_rules::{transition_to, MAX_FARE};
use crate::utils::password::hash_password;
use crate::utils::validation::{
    validate_email, validate_password, validate_phone, validate_registration,
};
use crate::AppState;

const RECENT_BOOKING_DAYS: i64 = 2;

// ============ Dashboard ============

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_users: u64,
    pub total_flights: u64,
    pub total_bookings: u64,
    /// Sum of confirmed booking amounts, minor units.
    pub total_revenue: i64,
    pub recent_bookings: Vec<BookingInfo>,
}

/// Headline counts for the admin console
pub async fn stats(State(state): State<AppState>) -> AppResult<Json<DashboardStats>> {
    let total_users = user::Entity::find().count(&state.db).await?;
    let total_flights = flight::Entity::find().count(&state.db).await?;
    let total_bookings = booking::Entity::find().count(&state.db).await?;

    let total_revenue = booking::Entity::find()
        .filter(booking::Column::Status.eq(BookingStatus::Confirmed))
        .all(&state.db)
        .await?
        .iter()
        .map(|b| b.amount)
        .sum();

    let since = (Utc::now() - Duration::days(RECENT_BOOKING_DAYS)).fixed_offset();
    let recent = booking::Entity::find()
        .filter(booking::Column::BookingDate.gte(since))
        .order_by_desc(booking::Column::BookingDate)
        .all(&state.db)
        .await?;

    Ok(Json(DashboardStats {
        total_users,
        total_flights,
        total_bookings,
        total_revenue,
        recent_bookings: booking_infos(&state, recent).await?,
    }))
}

// ============ User Management ============

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            phone: u.phone,
            created_at: u.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
}

async fn find_user(state: &AppState, id: Uuid) -> AppResult<user::Model> {
    user::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// List all users (admin)
pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserResponse>>> {
    let users = user::Entity::find()
        .order_by_desc(user::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Get one user (admin)
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserResponse>> {
    find_user(&state, id).await.map(|u| Json(u.into()))
}

/// Create a customer account on someone's behalf (admin)
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<Json<UserResponse>> {
    let email = payload.email.trim().to_lowercase();
    let phone = payload.phone.trim().to_string();
    validate_registration(&payload.name, &email, &phone, &payload.password)?;
    ensure_contact_available(&state, &email, &phone, None).await?;

    let created = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        email: Set(email),
        phone: Set(phone),
        password_hash: Set(hash_password(&payload.password)?),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.db)
    .await?;

    tracing::info!(user_id = %created.id, "User created by admin");
    Ok(Json(created.into()))
}

/// Edit a customer account (admin)
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = find_user(&state, id).await?;

    let email = payload
        .email
        .map(|e| e.trim().to_lowercase())
        .unwrap_or_else(|| user.email.clone());
    let phone = payload
        .phone
        .map(|p| p.trim().to_string())
        .unwrap_or_else(|| user.phone.clone());
    validate_email(&email)?;
    validate_phone(&phone)?;
    ensure_contact_available(&state, &email, &phone, Some(user.id)).await?;

    let mut active: user::ActiveModel = user.into();
    if let Some(name) = payload.name {
        if name.trim().is_empty() {
            return Err(AppError::BadRequest("Name is required".to_string()));
        }
        active.name = Set(name.trim().to_string());
    }
    if let Some(password) = payload.password {
        validate_password(&password)?;
        active.password_hash = Set(hash_password(&password)?);
    }
    active.email = Set(email);
    active.phone = Set(phone);

    let updated = active.update(&state.db).await?;
    Ok(Json(updated.into()))
}

/// Delete a customer and everything they own (admin)
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let user = find_user(&state, id).await?;
    let booking_ids: Vec<Uuid> = booking::Entity::find()
        .filter(booking::Column::UserId.eq(user.id))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|b| b.id)
        .collect();

    let txn = state.db.begin().await?;
    payment::Entity::delete_many()
        .filter(payment::Column::UserId.eq(user.id))
        .exec(&txn)
        .await?;
    passenger::Entity::delete_many()
        .filter(passenger::Column::BookingId.is_in(booking_ids))
        .exec(&txn)
        .await?;
    booking::Entity::delete_many()
        .filter(booking::Column::UserId.eq(user.id))
        .exec(&txn)
        .await?;
    user::Entity::delete_by_id(user.id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(user_id = %id, "User deleted");
    Ok(Json(serde_json::json!({ "message": "User deleted" })))
}

// ============ Flight Management ============

#[derive(Debug, Deserialize)]
pub struct CreateFlightRequest {
    pub flight_number: String,
    pub flight_date: NaiveDate,
    pub flight_status: Option<String>,
    pub departure_airport: String,
    pub departure_iata: Option<String>,
    pub departure_terminal: Option<String>,
    pub departure_gate: Option<String>,
    pub departure_time: Option<NaiveTime>,
    pub arrival_airport: String,
    pub arrival_iata: Option<String>,
    pub arrival_terminal: Option<String>,
    pub arrival_gate: Option<String>,
    pub arrival_time: Option<NaiveTime>,
    pub airline_name: Option<String>,
    pub airline_iata: Option<String>,
    pub aircraft_id: Option<i32>,
    pub price: Option<i64>,
}

/// Keeps an explicit `null` apart from an absent field: absent is `None`,
/// `null` is `Some(None)`.
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial flight edit. Absent fields are left unchanged; `null` clears a
/// nullable column.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateFlightRequest {
    pub flight_number: Option<String>,
    pub flight_date: Option<NaiveDate>,
    pub flight_status: Option<String>,
    pub departure_airport: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub departure_iata: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub departure_terminal: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub departure_gate: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub departure_time: Option<Option<NaiveTime>>,
    pub arrival_airport: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub arrival_iata: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub arrival_terminal: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub arrival_gate: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub arrival_time: Option<Option<NaiveTime>>,
    #[serde(default, deserialize_with = "nullable")]
    pub airline_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub airline_iata: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub aircraft_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub price: Option<Option<i64>>,
}

impl UpdateFlightRequest {
    /// Apply the edit onto `model`.
    fn apply(self, model: &mut flight::Model) {
        if let Some(v) = self.flight_number {
            model.flight_number = v.trim().to_string();
        }
        if let Some(v) = self.flight_date {
            model.flight_date = v;
        }
        if let Some(v) = self.flight_status {
            model.flight_status = v;
        }
        if let Some(v) = self.departure_airport {
            model.departure_airport = v.trim().to_string();
        }
        if let Some(v) = self.arrival_airport {
            model.arrival_airport = v.trim().to_string();
        }

        fn patch<T>(field: &mut Option<T>, edit: Option<Option<T>>) {
            if let Some(value) = edit {
                *field = value;
            }
        }
        patch(&mut model.departure_iata, self.departure_iata);
        patch(&mut model.departure_terminal, self.departure_terminal);
        patch(&mut model.departure_gate, self.departure_gate);
        patch(&mut model.departure_time, self.departure_time);
        patch(&mut model.arrival_iata, self.arrival_iata);
        patch(&mut model.arrival_terminal, self.arrival_terminal);
        patch(&mut model.arrival_gate, self.arrival_gate);
        patch(&mut model.arrival_time, self.arrival_time);
        patch(&mut model.airline_name, self.airline_name);
        patch(&mut model.airline_iata, self.airline_iata);
        patch(&mut model.aircraft_id, self.aircraft_id);
        patch(&mut model.price, self.price);
    }
}

fn validate_flight(model: &flight::Model) -> AppResult<()> {
    if model.flight_number.trim().is_empty() {
        return Err(AppError::BadRequest("Flight number is required".to_string()));
    }
    if model.departure_airport.trim().is_empty() || model.arrival_airport.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Departure and arrival airports are required".to_string(),
        ));
    }
    if model
        .departure_airport
        .trim()
        .eq_ignore_ascii_case(model.arrival_airport.trim())
    {
        return Err(AppError::BadRequest(
            "Departure and arrival must be different".to_string(),
        ));
    }
    if model.price.is_some_and(|p| p < 0) {
        return Err(AppError::BadRequest("Price cannot be negative".to_string()));
    }
    if model.price.is_some_and(|p| p > MAX_FARE) {
        return Err(AppError::BadRequest(format!(
            "Price cannot exceed {} minor units",
            MAX_FARE
        )));
    }
    Ok(())
}

/// Every column written; `id` wrapped by the caller (Set to insert, Unchanged to update).
fn flight_active(model: flight::Model, id: fn(Uuid) -> ActiveValue<Uuid>) -> flight::ActiveModel {
    flight::ActiveModel {
        id: id(model.id),
        flight_number: Set(model.flight_number),
        flight_date: Set(model.flight_date),
        flight_status: Set(model.flight_status),
        departure_airport: Set(model.departure_airport),
        departure_iata: Set(model.departure_iata),
        departure_terminal: Set(model.departure_terminal),
        departure_gate: Set(model.departure_gate),
        departure_time: Set(model.departure_time),
        arrival_airport: Set(model.arrival_airport),
        arrival_iata: Set(model.arrival_iata),
        arrival_terminal: Set(model.arrival_terminal),
        arrival_gate: Set(model.arrival_gate),
        arrival_time: Set(model.arrival_time),
        airline_name: Set(model.airline_name),
        airline_iata: Set(model.airline_iata),
        aircraft_id: Set(model.aircraft_id),
        price: Set(model.price),
    }
}

async fn ensure_aircraft(state: &AppState, aircraft_id: Option<i32>) -> AppResult<()> {
    if let Some(id) = aircraft_id {
        airplane::Entity::find_by_id(id)
            .one(&state.db)
            .await?
            .ok_or_else(|| AppError::BadRequest("Invalid aircraft".to_string()))?;
    }
    Ok(())
}

/// Create a new flight (admin)
pub async fn create_flight(
    State(state): State<AppState>,
    Json(payload): Json<CreateFlightRequest>,
) -> AppResult<Json<FlightResponse>> {
    let model = flight::Model {
        id: Uuid::new_v4(),
        flight_number: payload.flight_number.trim().to_string(),
        flight_date: payload.flight_date,
        flight_status: payload
            .flight_status
            .unwrap_or_else(|| flight::STATUS_SCHEDULED.to_string()),
        departure_airport: payload.departure_airport.trim().to_string(),
        departure_iata: payload.departure_iata,
        departure_terminal: payload.departure_terminal,
        departure_gate: payload.departure_gate,
        departure_time: payload.departure_time,
        arrival_airport: payload.arrival_airport.trim().to_string(),
        arrival_iata: payload.arrival_iata,
        arrival_terminal: payload.arrival_terminal,
        arrival_gate: payload.arrival_gate,
        arrival_time: payload.arrival_time,
        airline_name: payload.airline_name,
        airline_iata: payload.airline_iata,
        aircraft_id: payload.aircraft_id,
        price: payload.price,
    };
    validate_flight(&model)?;
    ensure_aircraft(&state, model.aircraft_id).await?;

    let created = flight_active(model, Set).insert(&state.db).await?;

    tracing::info!(flight_id = %created.id, flight = %created.flight_number, "Flight created");
    Ok(Json(created.into()))
}

/// Update a flight (admin). Existing bookings keep their copied details.
pub async fn update_flight(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateFlightRequest>,
) -> AppResult<Json<FlightResponse>> {
    let mut model = flight::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Flight not found".to_string()))?;

    payload.apply(&mut model);

    validate_flight(&model)?;
    ensure_aircraft(&state, model.aircraft_id).await?;

    let updated = flight_active(model, Unchanged).update(&state.db).await?;
    Ok(Json(updated.into()))
}

/// Delete a flight (admin). Bookings keep their copied details.
pub async fn delete_flight(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let txn = state.db.begin().await?;
    booking::Entity::update_many()
        .col_expr(booking::Column::FlightId, Expr::value(Option::<Uuid>::None))
        .filter(booking::Column::FlightId.eq(id))
        .exec(&txn)
        .await?;
    let result = flight::Entity::delete_by_id(id).exec(&txn).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Flight not found".to_string()));
    }
    txn.commit().await?;

    Ok(Json(serde_json::json!({ "message": "Flight deleted" })))
}

// ============ Bookings Management (Admin) ============

#[derive(Debug, Serialize)]
pub struct BookingInfo {
    #[serde(flatten)]
    pub booking: booking::Model,
    pub user_name: String,
    pub user_email: String,
}

async fn booking_infos(state: &AppState, bookings: Vec<booking::Model>) -> AppResult<Vec<BookingInfo>> {
    let user_ids: Vec<Uuid> = bookings.iter().map(|b| b.user_id).collect();
    let users = user::Entity::find()
        .filter(user::Column::Id.is_in(user_ids))
        .all(&state.db)
        .await?;

    Ok(bookings
        .into_iter()
        .map(|b| {
            let user = users.iter().find(|u| u.id == b.user_id);
            BookingInfo {
                user_name: user.map(|u| u.name.clone()).unwrap_or_default(),
                user_email: user.map(|u| u.email.clone()).unwrap_or_default(),
                booking: b,
            }
        })
        .collect())
}

/// List all bookings (admin)
pub async fn list_all_bookings(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<BookingInfo>>> {
    let bookings = booking::Entity::find()
        .order_by_desc(booking::Column::BookingDate)
        .all(&state.db)
        .await?;

    booking_infos(&state, bookings).await.map(Json)
}

/// Get any booking with passengers (admin)
pub async fn get_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<BookingResponse>> {
    let booking = booking::Entity::find_by_id(booking_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    with_passengers(&state.db, vec![booking])
        .await?
        .pop()
        .map(Json)
        .ok_or_else(|| AppError::Internal("Booking vanished while loading passengers".to_string()))
}

#[derive(Debug, Deserialize)]
pub struct UpdateBookingRequest {
    pub status: BookingStatus,
}

/// Move a booking to another status (admin). Date windows do not apply, but
/// confirming needs a succeeded payment on record.
pub async fn update_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<UpdateBookingRequest>,
) -> AppResult<Json<booking::Model>> {
    let booking = booking::Entity::find_by_id(booking_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    let from = booking.status;
    let status = transition_to(from, payload.status)?;
    if status == from {
        return Ok(Json(booking));
    }
    if status == BookingStatus::Confirmed && !has_succeeded_payment(&state.db, booking.id).await? {
        return Err(AppError::Conflict(
            "A booking can only be confirmed after a successful payment".to_string(),
        ));
    }

    let mut active: booking::ActiveModel = booking.into();
    active.status = Set(status);
    let updated = active.update(&state.db).await?;

    tracing::info!(booking_id = %updated.id, %from, to = %status, "Booking status set by admin");
    Ok(Json(updated))
}

/// Hard-delete a booking with its passengers and payments (admin)
pub async fn delete_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let txn = state.db.begin().await?;
    payment::Entity::delete_many()
        .filter(payment::Column::BookingId.eq(booking_id))
        .exec(&txn)
        .await?;
    passenger::Entity::delete_many()
        .filter(passenger::Column::BookingId.eq(booking_id))
        .exec(&txn)
        .await?;
    let result = booking::Entity::delete_by_id(booking_id).exec(&txn).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Booking not found".to_string()));
    }
    txn.commit().await?;

    tracing::info!(%booking_id, "Booking deleted");
    Ok(Json(serde_json::json!({ "message": "Booking deleted" })))
}

// ============ Payments (Admin) ============

/// List every payment attempt, newest first (admin)
pub async fn list_all_payments(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<payment::Model>>> {
    let payments = payment::Entity::find()
        .order_by_desc(payment::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(payments))
}
