use axum::{
    extract::{Path, State},
    Extension, Json,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::payment;
use crate::error::{AppError, AppResult};
use crate::handlers::bookings::load_owned_booking;
use crate::services::payment::{settle, CardDetails};
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub booking_id: Uuid,
    pub card: CardDetails,
}

/// Pay for a pending booking with the simulated card processor
pub async fn create_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreatePaymentRequest>,
) -> AppResult<Json<payment::Model>> {
    let booking = load_owned_booking(&state.db, &claims, payload.booking_id).await?;
    let payer = booking.user_id;

    let mut payments = settle(&state.db, &state.payments, payer, &[booking], &payload.card).await?;

    payments
        .pop()
        .map(Json)
        .ok_or_else(|| AppError::Internal("Settlement returned no payment".to_string()))
}

/// Get a payment
pub async fn get_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(payment_id): Path<Uuid>,
) -> AppResult<Json<payment::Model>> {
    let payment = payment::Entity::find_by_id(payment_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;

    if !claims.can_access(payment.user_id) {
        return Err(AppError::Forbidden(
            "You can only view your own payments".to_string(),
        ));
    }

    Ok(Json(payment))
}

/// List a user's payment attempts, newest first
pub async fn user_payments(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Vec<payment::Model>>> {
    if !claims.can_access(user_id) {
        return Err(AppError::Forbidden(
            "You can only view your own payments".to_string(),
        ));
    }

    let payments = payment::Entity::find()
        .filter(payment::Column::UserId.eq(user_id))
        .order_by_desc(payment::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(payments))
}

/// List payment attempts for a booking
pub async fn booking_payments(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<Vec<payment::Model>>> {
    let booking = load_owned_booking(&state.db, &claims, booking_id).await?;

    let payments = payment::Entity::find()
        .filter(payment::Column::BookingId.eq(booking.id))
        .order_by_desc(payment::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(payments))
}
