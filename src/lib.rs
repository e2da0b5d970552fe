pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod utils;

use sea_orm::DatabaseConnection;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use services::payment::PaymentSimulator;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Config,
    pub payments: PaymentSimulator,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        let payments = PaymentSimulator::from_config(&config);
        Self {
            db,
            config,
            payments,
        }
    }
}
