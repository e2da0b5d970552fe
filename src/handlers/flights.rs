use std::collections::{BTreeMap, HashSet};

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{NaiveDate, NaiveTime};
use sea_orm::{
    sea_query::{Expr, Func, LikeExpr},
    ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Select,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::flight::{self, STATUS_CANCELLED};
use crate::error::{AppError, AppResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct FlightResponse {
    #[serde(flatten)]
    pub flight: flight::Model,
    pub duration: String,
}

impl From<flight::Model> for FlightResponse {
    fn from(flight: flight::Model) -> Self {
        let duration = flight_duration(flight.departure_time, flight.arrival_time);
        Self { flight, duration }
    }
}

/// "Hh Mm" between departure and arrival, wrapping past midnight.
pub fn flight_duration(departure: Option<NaiveTime>, arrival: Option<NaiveTime>) -> String {
    match (departure, arrival) {
        (Some(dep), Some(arr)) => {
            let mut minutes = (arr - dep).num_minutes();
            if minutes < 0 {
                minutes += 24 * 60;
            }
            format!("{}h {}m", minutes / 60, minutes % 60)
        }
        _ => "TBD".to_string(),
    }
}

pub fn parse_date(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest("Invalid date format. Use YYYY-MM-DD.".to_string()))
}

const LIKE_ESCAPE: char = '\\';

/// Escape LIKE wildcards so the text matches literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

fn lower_contains(column: flight::Column, needle: &str) -> sea_orm::sea_query::SimpleExpr {
    let pattern = format!("%{}%", escape_like(&needle.trim().to_lowercase()));
    Expr::expr(Func::lower(Expr::col(column))).like(LikeExpr::new(pattern).escape(LIKE_ESCAPE))
}

fn not_cancelled() -> sea_orm::sea_query::SimpleExpr {
    Expr::expr(Func::lower(Expr::col(flight::Column::FlightStatus)))
        .ne(STATUS_CANCELLED.to_lowercase())
}

/// Flights that can be sold: not cancelled and carrying a positive price.
pub fn bookable_flights() -> Select<flight::Entity> {
    flight::Entity::find()
        .filter(not_cancelled())
        .filter(flight::Column::Price.is_not_null())
        .filter(flight::Column::Price.gt(0))
}

/// Bookable flights whose departure/arrival text contains the given terms.
fn bookable_on_route(from: &str, to: &str) -> Select<flight::Entity> {
    bookable_flights()
        .filter(lower_contains(flight::Column::DepartureAirport, from))
        .filter(lower_contains(flight::Column::ArrivalAirport, to))
}

async fn search_leg(
    state: &AppState,
    from: &str,
    to: &str,
    date: NaiveDate,
) -> AppResult<Vec<FlightResponse>> {
    let flights = bookable_on_route(from, to)
        .filter(flight::Column::FlightDate.eq(date))
        .order_by_asc(flight::Column::DepartureTime)
        .all(&state.db)
        .await?;

    Ok(flights.into_iter().map(FlightResponse::from).collect())
}

/// List all flights
pub async fn list_flights(State(state): State<AppState>) -> AppResult<Json<Vec<FlightResponse>>> {
    let flights = flight::Entity::find()
        .order_by_asc(flight::Column::FlightDate)
        .order_by_asc(flight::Column::DepartureTime)
        .all(&state.db)
        .await?;

    Ok(Json(flights.into_iter().map(FlightResponse::from).collect()))
}

/// Get flight details
pub async fn get_flight(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
) -> AppResult<Json<FlightResponse>> {
    let flight = flight::Entity::find_by_id(flight_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Flight not found".to_string()))?;

    Ok(Json(flight.into()))
}

#[derive(Debug, Deserialize)]
pub struct ByDateQuery {
    pub date: String,
}

/// Every non-cancelled flight on a date, priced or not
pub async fn flights_by_date(
    State(state): State<AppState>,
    Query(query): Query<ByDateQuery>,
) -> AppResult<Json<Vec<FlightResponse>>> {
    let date = parse_date(&query.date)?;
    let flights = flight::Entity::find()
        .filter(flight::Column::FlightDate.eq(date))
        .filter(not_cancelled())
        .order_by_asc(flight::Column::DepartureTime)
        .all(&state.db)
        .await?;

    Ok(Json(flights.into_iter().map(FlightResponse::from).collect()))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub departure_airport: String,
    pub arrival_airport: String,
    pub flight_date: String,
}

/// Single-leg search
pub async fn search_flights(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<FlightResponse>>> {
    let date = parse_date(&query.flight_date)?;
    let flights = search_leg(&state, &query.departure_airport, &query.arrival_airport, date).await?;

    tracing::debug!(
        from = %query.departure_airport,
        to = %query.arrival_airport,
        %date,
        results = flights.len(),
        "Flight search"
    );

    Ok(Json(flights))
}

#[derive(Debug, Deserialize)]
pub struct RoundTripQuery {
    pub from: String,
    pub to: String,
    pub date: String,
    pub return_date: String,
}

#[derive(Debug, Serialize)]
pub struct RoundTripResponse {
    pub onward: Vec<FlightResponse>,
    #[serde(rename = "return")]
    pub return_flights: Vec<FlightResponse>,
}

/// Two independent single-leg searches; pairing is left to the caller
pub async fn search_roundtrip(
    State(state): State<AppState>,
    Query(query): Query<RoundTripQuery>,
) -> AppResult<Json<RoundTripResponse>> {
    let date = parse_date(&query.date)?;
    let return_date = parse_date(&query.return_date)?;

    if return_date < date {
        return Err(AppError::BadRequest(
            "Return date cannot be before the onward date".to_string(),
        ));
    }

    let onward = search_leg(&state, &query.from, &query.to, date).await?;
    let return_flights = search_leg(&state, &query.to, &query.from, return_date).await?;

    Ok(Json(RoundTripResponse {
        onward,
        return_flights,
    }))
}

#[derive(Debug, Deserialize)]
pub struct AvailableDatesQuery {
    pub from: String,
    pub to: String,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct AvailableDate {
    pub date: NaiveDate,
    pub flight_count: usize,
    pub min_price: i64,
    pub max_price: i64,
    pub airlines: usize,
}

/// Per-date summary of bookable flights on a route
pub async fn available_dates(
    State(state): State<AppState>,
    Query(query): Query<AvailableDatesQuery>,
) -> AppResult<Json<Vec<AvailableDate>>> {
    let start = parse_date(&query.start_date)?;
    let end = parse_date(&query.end_date)?;

    if end < start {
        return Err(AppError::BadRequest(
            "End date cannot be before start date".to_string(),
        ));
    }

    let flights = bookable_on_route(&query.from, &query.to)
        .filter(flight::Column::FlightDate.gte(start))
        .filter(flight::Column::FlightDate.lte(end))
        .all(&state.db)
        .await?;

    Ok(Json(summarize_dates(&flights)))
}

pub fn summarize_dates(flights: &[flight::Model]) -> Vec<AvailableDate> {
    let mut by_date: BTreeMap<NaiveDate, Vec<&flight::Model>> = BTreeMap::new();
    for f in flights {
        by_date.entry(f.flight_date).or_default().push(f);
    }

    by_date
        .into_iter()
        .map(|(date, group)| {
            let prices: Vec<i64> = group.iter().filter_map(|f| f.price).collect();
            let airlines: HashSet<&str> = group
                .iter()
                .filter_map(|f| f.airline_name.as_deref())
                .collect();

            AvailableDate {
                date,
                flight_count: group.len(),
                min_price: prices.iter().copied().min().unwrap_or_default(),
                max_price: prices.iter().copied().max().unwrap_or_default(),
                airlines: airlines.len(),
            }
        })
        .collect()
}
