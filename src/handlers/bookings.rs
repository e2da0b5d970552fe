use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus};
use crate::entities::passenger::{self, Gender};
use crate::entities::flight;
use crate::entities::payment;
use crate::error::{AppError, AppResult};
use crate::handlers::flights::{bookable_flights, parse_date, FlightResponse};
use crate::services::payment::{has_succeeded_payment, settle, CardDetails};
use crate::utils::booking_rules::{
    check_cancellation_window, check_reschedule_window, departure_instant, fare_for,
    next_status, BookingEvent,
};
use crate::utils::jwt::Claims;
use crate::utils::validation::validate_passenger;
use crate::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct PassengerRequest {
    pub full_name: String,
    pub gender: Gender,
    pub birthdate: NaiveDate,
    pub passport_number: String,
}

impl PassengerRequest {
    pub fn validate(&self, today: NaiveDate) -> AppResult<()> {
        validate_passenger(&self.full_name, self.birthdate, &self.passport_number, today)
    }

    pub fn into_active(self, booking_id: Uuid) -> passenger::ActiveModel {
        passenger::ActiveModel {
            id: Set(Uuid::new_v4()),
            booking_id: Set(booking_id),
            full_name: Set(self.full_name.trim().to_string()),
            gender: Set(self.gender),
            birthdate: Set(self.birthdate),
            passport_number: Set(self.passport_number),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub flight_id: Uuid,
    pub passengers: Vec<PassengerRequest>,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    #[serde(flatten)]
    pub booking: booking::Model,
    pub passengers: Vec<passenger::Model>,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub flight_id: Uuid,
    pub return_flight_id: Option<Uuid>,
    pub passengers: Vec<PassengerRequest>,
    pub card: CardDetails,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub bookings: Vec<BookingResponse>,
    pub payments: Vec<payment::Model>,
}

#[derive(Debug, Deserialize)]
pub struct RescheduleRequest {
    pub new_flight_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct RescheduleResponse {
    #[serde(flatten)]
    pub booking: booking::Model,
    /// New amount minus old amount, minor units.
    pub price_difference: i64,
}

// ============ Lookups ============

/// Load a booking the caller owns (admins may load any booking).
pub async fn load_owned_booking(
    db: &DatabaseConnection,
    claims: &Claims,
    booking_id: Uuid,
) -> AppResult<booking::Model> {
    let booking = booking::Entity::find_by_id(booking_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    if !claims.can_access(booking.user_id) {
        return Err(AppError::Forbidden(
            "You can only access your own bookings".to_string(),
        ));
    }

    Ok(booking)
}

async fn find_flight<C: ConnectionTrait>(conn: &C, flight_id: Uuid) -> AppResult<flight::Model> {
    flight::Entity::find_by_id(flight_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Flight not found".to_string()))
}

/// Attach passenger rows to each booking, preserving booking order.
pub async fn with_passengers(
    db: &DatabaseConnection,
    bookings: Vec<booking::Model>,
) -> AppResult<Vec<BookingResponse>> {
    let ids: Vec<Uuid> = bookings.iter().map(|b| b.id).collect();
    let mut grouped: HashMap<Uuid, Vec<passenger::Model>> = HashMap::new();

    if !ids.is_empty() {
        let passengers = passenger::Entity::find()
            .filter(passenger::Column::BookingId.is_in(ids))
            .all(db)
            .await?;
        for p in passengers {
            grouped.entry(p.booking_id).or_default().push(p);
        }
    }

    Ok(bookings
        .into_iter()
        .map(|booking| BookingResponse {
            passengers: grouped.remove(&booking.id).unwrap_or_default(),
            booking,
        })
        .collect())
}

// ============ Creation ============

fn ensure_bookable_now(flight: &flight::Model) -> AppResult<i64> {
    let price = match flight.price {
        Some(price) if flight.is_bookable() => price,
        _ => {
            return Err(AppError::BadRequest(format!(
                "Flight {} is not available for booking",
                flight.flight_number
            )));
        }
    };

    if departure_instant(flight.flight_date, flight.departure_time) <= Utc::now() {
        return Err(AppError::BadRequest(
            "Cannot book a flight that has already departed".to_string(),
        ));
    }

    Ok(price)
}

fn validate_passengers(passengers: &[PassengerRequest]) -> AppResult<()> {
    if passengers.is_empty() {
        return Err(AppError::BadRequest(
            "At least one passenger is required".to_string(),
        ));
    }

    let today = Utc::now().date_naive();
    passengers.iter().try_for_each(|p| p.validate(today))
}

/// Insert one pending booking for `flight` plus its passengers on `conn`.
async fn insert_booking<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    flight: &flight::Model,
    unit_price: i64,
    currency: &str,
    passengers: &[PassengerRequest],
) -> AppResult<BookingResponse> {
    let booking = booking::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        flight_id: Set(Some(flight.id)),
        flight_number: Set(flight.flight_number.clone()),
        departure_city: Set(flight.departure_airport.clone()),
        arrival_city: Set(flight.arrival_airport.clone()),
        flight_date: Set(flight.flight_date),
        departure_time: Set(flight.departure_time),
        arrival_time: Set(flight.arrival_time),
        amount: Set(fare_for(unit_price, passengers.len() as u64)?),
        currency: Set(currency.to_string()),
        status: Set(BookingStatus::Pending),
        booking_date: Set(Utc::now().into()),
    }
    .insert(conn)
    .await?;

    let mut rows = Vec::with_capacity(passengers.len());
    for p in passengers {
        rows.push(p.clone().into_active(booking.id).insert(conn).await?);
    }

    Ok(BookingResponse {
        booking,
        passengers: rows,
    })
}

/// Create a pending booking together with its passengers
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateBookingRequest>,
) -> AppResult<Json<BookingResponse>> {
    validate_passengers(&payload.passengers)?;
    let flight = find_flight(&state.db, payload.flight_id).await?;
    let unit_price = ensure_bookable_now(&flight)?;

    let txn = state.db.begin().await?;
    let created = insert_booking(
        &txn,
        claims.sub,
        &flight,
        unit_price,
        state.payments.currency(),
        &payload.passengers,
    )
    .await?;
    txn.commit().await?;

    tracing::info!(
        booking_id = %created.booking.id,
        user_id = %claims.sub,
        flight = %flight.flight_number,
        passengers = created.passengers.len(),
        amount = created.booking.amount,
        "Booking created"
    );

    Ok(Json(created))
}

/// Book one or two legs and pay for them in a single call
pub async fn checkout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<Json<CheckoutResponse>> {
    validate_passengers(&payload.passengers)?;
    payload.card.validate(Utc::now().date_naive())?;

    let onward = find_flight(&state.db, payload.flight_id).await?;
    let mut legs = vec![(ensure_bookable_now(&onward)?, onward)];

    if let Some(return_id) = payload.return_flight_id {
        let inbound = find_flight(&state.db, return_id).await?;
        let price = ensure_bookable_now(&inbound)?;
        let onward = &legs[0].1;

        if !same_place(&inbound.departure_airport, &onward.arrival_airport)
            || !same_place(&inbound.arrival_airport, &onward.departure_airport)
        {
            return Err(AppError::BadRequest(
                "Return flight must fly the onward route in reverse".to_string(),
            ));
        }
        if inbound.flight_date < onward.flight_date {
            return Err(AppError::BadRequest(
                "Return flight cannot depart before the onward flight".to_string(),
            ));
        }
        legs.push((price, inbound));
    }

    let txn = state.db.begin().await?;
    let mut created = Vec::with_capacity(legs.len());
    for (price, flight) in &legs {
        created.push(
            insert_booking(
                &txn,
                claims.sub,
                flight,
                *price,
                state.payments.currency(),
                &payload.passengers,
            )
            .await?,
        );
    }
    txn.commit().await?;

    let bookings: Vec<booking::Model> = created.iter().map(|c| c.booking.clone()).collect();
    let payments = settle(&state.db, &state.payments, claims.sub, &bookings, &payload.card)
        .await
        .map_err(|err| match err {
            AppError::PaymentFailed(message) => AppError::CheckoutDeclined {
                message,
                booking_ids: bookings.iter().map(|b| b.id).collect(),
            },
            other => other,
        })?;

    for c in &mut created {
        c.booking.status = BookingStatus::Confirmed;
    }

    Ok(Json(CheckoutResponse {
        bookings: created,
        payments,
    }))
}

// ============ Reads ============

/// List the caller's bookings, newest first
pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<BookingResponse>>> {
    bookings_for_user(&state, claims.sub).await.map(Json)
}

/// List a user's bookings
pub async fn user_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Vec<BookingResponse>>> {
    if !claims.can_access(user_id) {
        return Err(AppError::Forbidden(
            "You can only view your own bookings".to_string(),
        ));
    }

    bookings_for_user(&state, user_id).await.map(Json)
}

async fn bookings_for_user(state: &AppState, user_id: Uuid) -> AppResult<Vec<BookingResponse>> {
    let bookings = booking::Entity::find()
        .filter(booking::Column::UserId.eq(user_id))
        .order_by_desc(booking::Column::BookingDate)
        .all(&state.db)
        .await?;

    with_passengers(&state.db, bookings).await
}

/// Get a booking with its passengers
pub async fn get_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<BookingResponse>> {
    let booking = load_owned_booking(&state.db, &claims, booking_id).await?;
    let mut responses = with_passengers(&state.db, vec![booking]).await?;

    responses
        .pop()
        .map(Json)
        .ok_or_else(|| AppError::Internal("Booking vanished while loading passengers".to_string()))
}

// ============ Lifecycle ============

/// Cancel within the cutoff window. Cancelling twice is a no-op.
async fn cancel(db: &DatabaseConnection, booking: booking::Model) -> AppResult<booking::Model> {
    if booking.status == BookingStatus::Cancelled {
        return Ok(booking);
    }

    let departure = departure_instant(booking.flight_date, booking.departure_time);
    check_cancellation_window(departure, Utc::now())?;
    let status = next_status(booking.status, BookingEvent::Cancel)?;

    let mut active: booking::ActiveModel = booking.into();
    active.status = Set(status);
    let booking = active.update(db).await?;

    tracing::info!(booking_id = %booking.id, "Booking cancelled");
    Ok(booking)
}

/// Cancel a booking
pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<booking::Model>> {
    let booking = load_owned_booking(&state.db, &claims, booking_id).await?;
    cancel(&state.db, booking).await.map(Json)
}

/// Customer-facing delete: cancels, the row is kept
pub async fn delete_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<booking::Model>> {
    let booking = load_owned_booking(&state.db, &claims, booking_id).await?;
    cancel(&state.db, booking).await.map(Json)
}

fn same_place(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Seats the booking pays for; a booking without passenger rows counts as one.
async fn traveller_count(db: &DatabaseConnection, booking_id: Uuid) -> AppResult<u64> {
    let count = passenger::Entity::find()
        .filter(passenger::Column::BookingId.eq(booking_id))
        .count(db)
        .await?;
    Ok(count.max(1))
}

#[derive(Debug, Deserialize)]
pub struct RescheduleOptionsQuery {
    pub date: String,
}

#[derive(Debug, Serialize)]
pub struct RescheduleOption {
    #[serde(flatten)]
    pub flight: FlightResponse,
    /// Fare for the booking's travellers on this flight minus the current amount.
    pub price_difference: i64,
}

/// Flights on the booking's route that it could be moved to on `date`
pub async fn reschedule_options(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
    Query(query): Query<RescheduleOptionsQuery>,
) -> AppResult<Json<Vec<RescheduleOption>>> {
    let booking = load_owned_booking(&state.db, &claims, booking_id).await?;
    next_status(booking.status, BookingEvent::Reschedule)?;

    let date = parse_date(&query.date)?;
    let departure = departure_instant(booking.flight_date, booking.departure_time);
    check_reschedule_window(departure, date, Utc::now())?;

    let travellers = traveller_count(&state.db, booking.id).await?;
    let candidates = bookable_flights()
        .filter(flight::Column::FlightDate.eq(date))
        .order_by_asc(flight::Column::DepartureTime)
        .all(&state.db)
        .await?;

    let mut options = Vec::new();
    for flight in candidates {
        if !same_place(&flight.departure_airport, &booking.departure_city)
            || !same_place(&flight.arrival_airport, &booking.arrival_city)
        {
            continue;
        }
        let Some(price) = flight.price else { continue };
        let price_difference = fare_for(price, travellers)? - booking.amount;
        options.push(RescheduleOption {
            flight: flight.into(),
            price_difference,
        });
    }

    Ok(Json(options))
}

/// Move a confirmed booking onto another flight of the same route
pub async fn reschedule_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<RescheduleRequest>,
) -> AppResult<Json<RescheduleResponse>> {
    let booking = load_owned_booking(&state.db, &claims, booking_id).await?;
    let status = next_status(booking.status, BookingEvent::Reschedule)?;

    let target = find_flight(&state.db, payload.new_flight_id).await?;
    let unit_price = match target.price {
        Some(price) if target.is_bookable() => price,
        _ => {
            return Err(AppError::BadRequest(format!(
                "Flight {} is not available for booking",
                target.flight_number
            )));
        }
    };

    if !same_place(&target.departure_airport, &booking.departure_city)
        || !same_place(&target.arrival_airport, &booking.arrival_city)
    {
        return Err(AppError::BadRequest(
            "New flight must serve the same route as the booking".to_string(),
        ));
    }

    let departure = departure_instant(booking.flight_date, booking.departure_time);
    check_reschedule_window(departure, target.flight_date, Utc::now())?;

    let travellers = traveller_count(&state.db, booking.id).await?;
    let new_amount = fare_for(unit_price, travellers)?;
    let price_difference = new_amount - booking.amount;
    let previous_flight = booking.flight_number.clone();

    let mut active: booking::ActiveModel = booking.into();
    active.flight_id = Set(Some(target.id));
    active.flight_number = Set(target.flight_number.clone());
    active.flight_date = Set(target.flight_date);
    active.departure_time = Set(target.departure_time);
    active.arrival_time = Set(target.arrival_time);
    active.amount = Set(new_amount);
    active.status = Set(status);
    let booking = active.update(&state.db).await?;

    tracing::info!(
        booking_id = %booking.id,
        from = %previous_flight,
        to = %booking.flight_number,
        price_difference,
        "Booking rescheduled"
    );

    Ok(Json(RescheduleResponse {
        booking,
        price_difference,
    }))
}

/// Confirm a pending booking that already has a succeeded payment
pub async fn reconcile_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<booking::Model>> {
    let booking = load_owned_booking(&state.db, &claims, booking_id).await?;
    if booking.status != BookingStatus::Pending {
        return Ok(Json(booking));
    }

    if !has_succeeded_payment(&state.db, booking.id).await? {
        return Ok(Json(booking));
    }

    let status = next_status(booking.status, BookingEvent::PaymentSucceeded)?;
    let mut active: booking::ActiveModel = booking.into();
    active.status = Set(status);
    let booking = active.update(&state.db).await?;

    tracing::info!(booking_id = %booking.id, "Booking reconciled with succeeded payment");
    Ok(Json(booking))
}
