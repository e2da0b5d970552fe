//! Booking lifecycle: the status transition table and the date windows that
//! gate cancellation and rescheduling.

use chrono::{DateTime, Months, NaiveDate, NaiveTime, Utc};

use crate::entities::booking::BookingStatus;
use crate::error::{AppError, AppResult};

pub const CANCELLATION_CUTOFF_DAYS: i64 = 2;
pub const RESCHEDULE_CUTOFF_DAYS: i64 = 1;
pub const RESCHEDULE_WINDOW_MONTHS: u32 = 6;
/// Upper bound for an admin-entered fare, minor units.
pub const MAX_FARE: i64 = 10_000_000_000;

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingEvent {
    PaymentSucceeded,
    Cancel,
    Reschedule,
}

impl BookingEvent {
    fn verb(self) -> &'static str {
        match self {
            BookingEvent::PaymentSucceeded => "confirm",
            BookingEvent::Cancel => "cancel",
            BookingEvent::Reschedule => "reschedule",
        }
    }
}

/// Apply `event` to `current`. Anything outside the table is a conflict.
///
/// | from      | PaymentSucceeded | Cancel    | Reschedule |
/// |-----------|------------------|-----------|------------|
/// | pending   | confirmed        | cancelled | -          |
/// | confirmed | -                | cancelled | confirmed  |
/// | cancelled | -                | cancelled | -          |
pub fn next_status(current: BookingStatus, event: BookingEvent) -> AppResult<BookingStatus> {
    use BookingEvent::*;
    use BookingStatus::*;

    match (current, event) {
        (Pending, PaymentSucceeded) => Ok(Confirmed),
        (_, Cancel) => Ok(Cancelled),
        (Confirmed, Reschedule) => Ok(Confirmed),
        (from, event) => Err(AppError::Conflict(format!(
            "Cannot {} a {} booking",
            event.verb(),
            from
        ))),
    }
}

/// Resolve a requested target status (admin edits) through the transition table.
pub fn transition_to(current: BookingStatus, target: BookingStatus) -> AppResult<BookingStatus> {
    if current == target {
        return Ok(current);
    }

    let event = match target {
        BookingStatus::Confirmed => BookingEvent::PaymentSucceeded,
        BookingStatus::Cancelled => BookingEvent::Cancel,
        BookingStatus::Pending => {
            return Err(AppError::Conflict(format!(
                "Cannot move a {} booking back to pending",
                current
            )));
        }
    };

    next_status(current, event)
}

fn amount_too_large() -> AppError {
    AppError::BadRequest("Booking amount is too large".to_string())
}

/// Fare for `travellers` seats at `unit_price` each.
pub fn fare_for(unit_price: i64, travellers: u64) -> AppResult<i64> {
    i64::try_from(travellers)
        .ok()
        .and_then(|count| unit_price.checked_mul(count))
        .ok_or_else(amount_too_large)
}

pub fn add_amounts(a: i64, b: i64) -> AppResult<i64> {
    a.checked_add(b).ok_or_else(amount_too_large)
}

pub fn total_amount<I: IntoIterator<Item = i64>>(amounts: I) -> AppResult<i64> {
    amounts.into_iter().try_fold(0, add_amounts)
}

/// Departure instant of a flight. A missing time means midnight UTC.
pub fn departure_instant(flight_date: NaiveDate, departure_time: Option<NaiveTime>) -> DateTime<Utc> {
    flight_date
        .and_time(departure_time.unwrap_or(NaiveTime::MIN))
        .and_utc()
}

/// Whole days until departure, rounded up.
pub fn days_until(departure: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let seconds = (departure - now).num_seconds();
    let whole = seconds.div_euclid(SECONDS_PER_DAY);
    if seconds.rem_euclid(SECONDS_PER_DAY) > 0 {
        whole + 1
    } else {
        whole
    }
}

pub fn check_cancellation_window(departure: DateTime<Utc>, now: DateTime<Utc>) -> AppResult<()> {
    let days = days_until(departure, now);
    if days > CANCELLATION_CUTOFF_DAYS {
        return Ok(());
    }

    Err(AppError::BadRequest(format!(
        "Bookings can only be cancelled at least {} days before the flight. Your flight is in {} days.",
        CANCELLATION_CUTOFF_DAYS, days
    )))
}

pub fn check_reschedule_window(
    current_departure: DateTime<Utc>,
    new_flight_date: NaiveDate,
    now: DateTime<Utc>,
) -> AppResult<()> {
    let days = days_until(current_departure, now);
    if days <= RESCHEDULE_CUTOFF_DAYS {
        return Err(AppError::BadRequest(format!(
            "Bookings can only be rescheduled at least {} day before the flight. Your flight is in {} days.",
            RESCHEDULE_CUTOFF_DAYS, days
        )));
    }

    if new_flight_date <= current_departure.date_naive() {
        return Err(AppError::BadRequest(
            "New flight date must be after your current flight date.".to_string(),
        ));
    }

    let latest = now
        .date_naive()
        .checked_add_months(Months::new(RESCHEDULE_WINDOW_MONTHS))
        .unwrap_or(NaiveDate::MAX);
    if new_flight_date > latest {
        return Err(AppError::BadRequest(format!(
            "New flight date must be within {} months from today.",
            RESCHEDULE_WINDOW_MONTHS
        )));
    }

    Ok(())
}
