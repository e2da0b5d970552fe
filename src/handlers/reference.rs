//! Read-only lookup tables seeded by migrations.

use axum::{
    extract::{Path, State},
    Json,
};
use sea_orm::{EntityTrait, QueryOrder};

use crate::entities::{airline, airplane, airport, city, country};
use crate::error::{AppError, AppResult};
use crate::AppState;

pub async fn list_countries(State(state): State<AppState>) -> AppResult<Json<Vec<country::Model>>> {
    let rows = country::Entity::find()
        .order_by_asc(country::Column::Name)
        .all(&state.db)
        .await?;
    Ok(Json(rows))
}

pub async fn list_cities(State(state): State<AppState>) -> AppResult<Json<Vec<city::Model>>> {
    let rows = city::Entity::find()
        .order_by_asc(city::Column::Name)
        .all(&state.db)
        .await?;
    Ok(Json(rows))
}

pub async fn list_airports(State(state): State<AppState>) -> AppResult<Json<Vec<airport::Model>>> {
    let rows = airport::Entity::find()
        .order_by_asc(airport::Column::Name)
        .all(&state.db)
        .await?;
    Ok(Json(rows))
}

pub async fn list_airlines(State(state): State<AppState>) -> AppResult<Json<Vec<airline::Model>>> {
    let rows = airline::Entity::find()
        .order_by_asc(airline::Column::Name)
        .all(&state.db)
        .await?;
    Ok(Json(rows))
}

pub async fn list_airplanes(State(state): State<AppState>) -> AppResult<Json<Vec<airplane::Model>>> {
    let rows = airplane::Entity::find()
        .order_by_asc(airplane::Column::Name)
        .all(&state.db)
        .await?;
    Ok(Json(rows))
}

pub async fn get_country(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<country::Model>> {
    country::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Country not found".to_string()))
}

pub async fn get_city(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<city::Model>> {
    city::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("City not found".to_string()))
}

pub async fn get_airport(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<airport::Model>> {
    airport::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Airport not found".to_string()))
}

pub async fn get_airline(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<airline::Model>> {
    airline::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Airline not found".to_string()))
}

pub async fn get_airplane(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<airplane::Model>> {
    airplane::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Airplane not found".to_string()))
}
