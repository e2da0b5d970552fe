use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus};
use crate::entities::passenger;
use crate::error::{AppError, AppResult};
use crate::handlers::bookings::{load_owned_booking, PassengerRequest};
use crate::utils::booking_rules::add_amounts;
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePassengerRequest {
    pub booking_id: Uuid,
    #[serde(flatten)]
    pub passenger: PassengerRequest,
}

/// Add a traveller to a pending booking. The fare grows by one seat.
pub async fn create_passenger(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreatePassengerRequest>,
) -> AppResult<Json<passenger::Model>> {
    let booking = load_owned_booking(&state.db, &claims, payload.booking_id).await?;
    if booking.status != BookingStatus::Pending {
        return Err(AppError::Conflict(format!(
            "Passengers can only be added to a pending booking; this one is {}",
            booking.status
        )));
    }
    payload.passenger.validate(Utc::now().date_naive())?;

    let txn = state.db.begin().await?;

    let existing = passenger::Entity::find()
        .filter(passenger::Column::BookingId.eq(booking.id))
        .count(&txn)
        .await? as i64;
    let new_amount = if existing > 0 {
        add_amounts(booking.amount, booking.amount / existing)?
    } else {
        booking.amount
    };

    let created = payload.passenger.into_active(booking.id).insert(&txn).await?;

    let mut active: booking::ActiveModel = booking.into();
    active.amount = Set(new_amount);
    active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(
        booking_id = %created.booking_id,
        passenger_id = %created.id,
        "Passenger added"
    );

    Ok(Json(created))
}

/// List passengers on a booking
pub async fn booking_passengers(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<Vec<passenger::Model>>> {
    let booking = load_owned_booking(&state.db, &claims, booking_id).await?;

    let passengers = passenger::Entity::find()
        .filter(passenger::Column::BookingId.eq(booking.id))
        .all(&state.db)
        .await?;

    Ok(Json(passengers))
}
