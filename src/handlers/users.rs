use axum::{extract::State, Extension, Json};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::Deserialize;

use crate::entities::user;
use crate::error::{AppError, AppResult};
use crate::handlers::auth::{ensure_contact_available, UserInfo};
use crate::utils::jwt::Claims;
use crate::utils::validation::{validate_email, validate_phone};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

async fn find_user(state: &AppState, claims: &Claims) -> AppResult<user::Model> {
    user::Entity::find_by_id(claims.sub)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Current customer's profile
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<UserInfo>> {
    let user = find_user(&state, &claims).await?;
    Ok(Json(user.into()))
}

/// Update name, email or phone of the current customer
pub async fn update_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<UserInfo>> {
    let user = find_user(&state, &claims).await?;

    let name = match payload.name {
        Some(name) if name.trim().is_empty() => {
            return Err(AppError::BadRequest("Name is required".to_string()));
        }
        Some(name) => name.trim().to_string(),
        None => user.name.clone(),
    };
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
    active.name = Set(name);
    active.email = Set(email);
    active.phone = Set(phone);
    let user = active.update(&state.db).await?;

    tracing::info!(user_id = %user.id, "Profile updated");
    Ok(Json(user.into()))
}
