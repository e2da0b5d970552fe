use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait,
    QueryFilter, Set,
};
use chrono::Utc;
use uuid::Uuid;

use crate::config::Config;
use crate::entities::admin;
use crate::error::{AppError, AppResult};
use crate::utils::password::hash_password;

pub async fn connect(config: &Config) -> AppResult<DatabaseConnection> {
    let mut options = ConnectOptions::new(config.database_url.clone());
    options
        .max_connections(config.database_max_connections)
        .sqlx_logging(false);

    Database::connect(options)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to connect to database: {}", e)))
}

/// Seed the admin account if it doesn't exist
pub async fn seed_admin(db: &DatabaseConnection, config: &Config) -> AppResult<()> {
    let email = config.admin_email.trim().to_lowercase();
    let existing = admin::Entity::find()
        .filter(admin::Column::Email.eq(&email))
        .one(db)
        .await?;

    if existing.is_some() {
        return Ok(());
    }

    let username = email
        .split('@')
        .next()
        .unwrap_or("admin")
        .to_string();

    let record = admin::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username),
        email: Set(email.clone()),
        password_hash: Set(hash_password(&config.admin_password)?),
        name: Set(Some("Admin".to_string())),
        is_active: Set(true),
        last_login: Set(None),
        created_at: Set(Utc::now().into()),
    };

    record.insert(db).await?;
    tracing::info!("Admin account created: {}", email);
    Ok(())
}
