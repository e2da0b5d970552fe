use axum::{extract::State, Extension, Json};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{admin, user};
use crate::error::{AppError, AppResult};
use crate::utils::jwt::{create_token, Claims, Role};
use crate::utils::password::{hash_password, verify_password};
use crate::utils::validation::validate_registration;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl From<user::Model> for UserInfo {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            phone: u.phone,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AdminAuthResponse {
    pub token: String,
    pub admin: AdminInfo,
}

#[derive(Debug, Serialize)]
pub struct AdminInfo {
    pub id: Uuid,
    pub username: String,
    pub name: Option<String>,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

fn issue_user_token(state: &AppState, user: &user::Model) -> AppResult<String> {
    create_token(
        user.id,
        &user.email,
        &user.name,
        Role::User,
        &state.config.jwt_secret,
        state.config.jwt_expiration_hours,
    )
}

/// Reject an email or phone already held by another account.
pub async fn ensure_contact_available(
    state: &AppState,
    email: &str,
    phone: &str,
    except: Option<Uuid>,
) -> AppResult<()> {
    let mut email_query = user::Entity::find().filter(user::Column::Email.eq(email));
    if let Some(id) = except {
        email_query = email_query.filter(user::Column::Id.ne(id));
    }
    if email_query.one(&state.db).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let mut phone_query = user::Entity::find().filter(user::Column::Phone.eq(phone));
    if let Some(id) = except {
        phone_query = phone_query.filter(user::Column::Id.ne(id));
    }
    if phone_query.one(&state.db).await?.is_some() {
        return Err(AppError::Conflict(
            "Phone number already registered".to_string(),
        ));
    }

    Ok(())
}

/// Register a new customer account
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<Json<AuthResponse>> {
    let email = payload.email.trim().to_lowercase();
    let phone = payload.phone.trim().to_string();
    validate_registration(&payload.name, &email, &phone, &payload.password)?;

    ensure_contact_available(&state, &email, &phone, None).await?;

    let new_user = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        email: Set(email),
        phone: Set(phone),
        password_hash: Set(hash_password(&payload.password)?),
        created_at: Set(Utc::now().into()),
    };

    let user = new_user.insert(&state.db).await?;
    tracing::info!(user_id = %user.id, "User registered");

    let token = issue_user_token(&state, &user)?;

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// Login with email and password
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

    let user = user::Entity::find()
        .filter(user::Column::Email.eq(payload.email.trim().to_lowercase()))
        .one(&state.db)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(invalid());
    }

    let token = issue_user_token(&state, &user)?;

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// Admin login against the separate admin table
pub async fn admin_login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AdminAuthResponse>> {
    let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

    let record = admin::Entity::find()
        .filter(admin::Column::Email.eq(payload.email.trim().to_lowercase()))
        .one(&state.db)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&payload.password, &record.password_hash)? {
        return Err(invalid());
    }

    if !record.is_active {
        return Err(AppError::Forbidden("Admin account is disabled".to_string()));
    }

    let token = create_token(
        record.id,
        &record.email,
        record.name.as_deref().unwrap_or(&record.username),
        Role::Admin,
        &state.config.jwt_secret,
        state.config.jwt_expiration_hours,
    )?;

    let mut active: admin::ActiveModel = record.into();
    active.last_login = Set(Some(Utc::now().into()));
    let record = active.update(&state.db).await?;
    tracing::info!(admin_id = %record.id, "Admin logged in");

    Ok(Json(AdminAuthResponse {
        token,
        admin: AdminInfo {
            id: record.id,
            username: record.username,
            name: record.name,
            email: record.email,
        },
    }))
}

/// Re-issue a token for a caller whose token is still valid
pub async fn refresh(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<TokenResponse>> {
    let token = create_token(
        claims.sub,
        &claims.email,
        &claims.name,
        claims.role,
        &state.config.jwt_secret,
        state.config.jwt_expiration_hours,
    )?;

    Ok(Json(TokenResponse { token }))
}
