//! Simulated card payments.
//!
//! This is a stand-in for a payment processor: no card network is contacted.
//! After an artificial delay a charge succeeds with a fixed probability and a
//! synthetic transaction id and receipt URL are recorded. Do not grow this
//! into a real integration without idempotency keys and processor-confirmed
//! state changes.

use std::time::Duration;

use chrono::{Datelike, NaiveDate, Utc};
use rand::{distributions::Alphanumeric, Rng};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, Set, TransactionTrait,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::config::Config;
use crate::entities::booking::{self, BookingStatus};
use crate::entities::payment::{self, PaymentStatus};
use crate::error::{AppError, AppResult};
use crate::utils::booking_rules::{next_status, total_amount, BookingEvent};

const RECEIPT_BASE_URL: &str = "https://receipts.flynest.example";
const METHOD_CARD: &str = "card";

#[derive(Debug, Clone, Deserialize)]
pub struct CardDetails {
    pub number: String,
    pub holder: String,
    pub expiry_month: u32,
    pub expiry_year: i32,
    pub cvv: String,
}

impl CardDetails {
    /// Checks the card shape and expiry; returns the last four digits.
    pub fn validate(&self, today: NaiveDate) -> AppResult<String> {
        let digits: String = self.number.chars().filter(|c| !c.is_whitespace()).collect();
        if digits.len() != 16 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(AppError::BadRequest(
                "Please enter a valid 16-digit card number".to_string(),
            ));
        }

        if self.holder.trim().is_empty() {
            return Err(AppError::BadRequest("Card holder name is required".to_string()));
        }

        if !(1..=12).contains(&self.expiry_month) {
            return Err(AppError::BadRequest("Invalid expiry month".to_string()));
        }

        let expired = (self.expiry_year, self.expiry_month) < (today.year(), today.month());
        if expired {
            return Err(AppError::BadRequest("Card has expired".to_string()));
        }

        if !(3..=4).contains(&self.cvv.len()) || !self.cvv.chars().all(|c| c.is_ascii_digit()) {
            return Err(AppError::BadRequest("Please enter a valid CVV".to_string()));
        }

        Ok(digits[digits.len() - 4..].to_string())
    }
}

#[derive(Debug, Clone)]
pub struct PaymentSimulator {
    success_rate: f64,
    delay: Duration,
    currency: String,
}

impl PaymentSimulator {
    pub fn new(success_rate: f64, delay: Duration, currency: impl Into<String>) -> Self {
        Self {
            success_rate: success_rate.clamp(0.0, 1.0),
            delay,
            currency: currency.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.payment_success_rate,
            Duration::from_millis(config.payment_delay_ms),
            config.payment_currency.clone(),
        )
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Waits out the artificial processing delay, then draws the outcome.
    pub async fn authorize(&self, amount: i64) -> bool {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let approved = rand::thread_rng().gen_bool(self.success_rate);
        tracing::debug!(amount, approved, "Simulated card authorization");
        approved
    }
}

fn synthetic_id(prefix: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(14)
        .map(char::from)
        .collect();
    format!("{}_{}", prefix, suffix)
}

fn payment_row(
    booking: &booking::Model,
    user_id: Uuid,
    status: PaymentStatus,
    currency: &str,
    card_last4: &str,
) -> payment::ActiveModel {
    let transaction_id = synthetic_id("pi");
    let receipt_url = match status {
        PaymentStatus::Succeeded => Some(format!("{}/{}", RECEIPT_BASE_URL, transaction_id)),
        PaymentStatus::Failed => None,
    };

    payment::ActiveModel {
        id: Set(Uuid::new_v4()),
        booking_id: Set(booking.id),
        user_id: Set(user_id),
        transaction_id: Set(transaction_id),
        amount: Set(booking.amount),
        currency: Set(currency.to_string()),
        status: Set(status),
        method_type: Set(METHOD_CARD.to_string()),
        card_last4: Set(Some(card_last4.to_string())),
        receipt_url: Set(receipt_url),
        created_at: Set(Utc::now().into()),
    }
}

fn ensure_payable(booking: &booking::Model) -> AppResult<()> {
    match booking.status {
        BookingStatus::Pending => Ok(()),
        BookingStatus::Confirmed => Err(AppError::Conflict(format!(
            "Booking {} is already paid",
            booking.id
        ))),
        BookingStatus::Cancelled => Err(AppError::Conflict(format!(
            "Booking {} is cancelled",
            booking.id
        ))),
    }
}

/// Whether any `succeeded` payment is recorded for the booking.
pub async fn has_succeeded_payment<C: ConnectionTrait>(
    conn: &C,
    booking_id: Uuid,
) -> AppResult<bool> {
    let paid = payment::Entity::find()
        .filter(payment::Column::BookingId.eq(booking_id))
        .filter(payment::Column::Status.eq(PaymentStatus::Succeeded))
        .one(conn)
        .await?
        .is_some();
    Ok(paid)
}

/// Charge the card once for all `bookings` and record the attempt.
///
/// On approval every booking is moved from `pending` to `confirmed` and a
/// `succeeded` payment row is written per booking inside one transaction. If
/// a booking changed since it was read, or any write fails, nothing is kept.
/// On decline a `failed` row is written per booking and the bookings stay
/// pending.
pub async fn settle(
    db: &DatabaseConnection,
    simulator: &PaymentSimulator,
    user_id: Uuid,
    bookings: &[booking::Model],
    card: &CardDetails,
) -> AppResult<Vec<payment::Model>> {
    if bookings.is_empty() {
        return Err(AppError::BadRequest("Nothing to pay for".to_string()));
    }
    for booking in bookings {
        ensure_payable(booking)?;
    }
    let card_last4 = card.validate(Utc::now().date_naive())?;

    let total = total_amount(bookings.iter().map(|b| b.amount))?;
    let approved = simulator.authorize(total).await;
    let currency = simulator.currency();

    let txn = db.begin().await?;

    if !approved {
        for booking in bookings {
            payment_row(booking, user_id, PaymentStatus::Failed, currency, &card_last4)
                .insert(&txn)
                .await?;
        }
        txn.commit().await?;

        tracing::warn!(%user_id, total, "Payment declined");
        return Err(AppError::PaymentFailed(
            "Payment failed, please try again".to_string(),
        ));
    }

    let mut payments = Vec::with_capacity(bookings.len());
    for booking in bookings {
        let status = next_status(booking.status, BookingEvent::PaymentSucceeded)?;

        // Only a row still pending at the charged amount is confirmed. After any
        // concurrent change nothing matches and the settlement is rolled back.
        let confirmed = booking::Entity::update_many()
            .col_expr(booking::Column::Status, Expr::value(status))
            .filter(booking::Column::Id.eq(booking.id))
            .filter(booking::Column::Status.eq(BookingStatus::Pending))
            .filter(booking::Column::Amount.eq(booking.amount))
            .exec(&txn)
            .await?;
        if confirmed.rows_affected != 1 {
            txn.rollback().await?;
            return Err(AppError::Conflict(format!(
                "Booking {} changed while the payment was processed",
                booking.id
            )));
        }

        let row = payment_row(booking, user_id, PaymentStatus::Succeeded, currency, &card_last4);
        payments.push(row.insert(&txn).await?);
    }

    txn.commit().await?;

    for payment in &payments {
        tracing::info!(
            booking_id = %payment.booking_id,
            transaction_id = %payment.transaction_id,
            amount = payment.amount,
            "Payment succeeded, booking confirmed"
        );
    }

    Ok(payments)
}
