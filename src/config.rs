use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub server_host: String,
    pub server_port: u16,
    pub admin_email: String,
    pub admin_password: String,
    /// Probability in [0, 1] that a simulated charge succeeds.
    pub payment_success_rate: f64,
    pub payment_delay_ms: u64,
    pub payment_currency: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            database_url: env::var("DATABASE_URL")
                .expect("DATABASE_URL must be set"),
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .expect("DATABASE_MAX_CONNECTIONS must be a number"),
            jwt_secret: env::var("JWT_SECRET")
                .expect("JWT_SECRET must be set"),
            jwt_expiration_hours: env::var("JWT_EXPIRATION_HOURS")
                .unwrap_or_else(|_| "12".to_string())
                .parse()
                .expect("JWT_EXPIRATION_HOURS must be a number"),
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("SERVER_PORT must be a number"),
            admin_email: env::var("ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@flynest.com".to_string()),
            admin_password: env::var("ADMIN_PASSWORD")
                .expect("ADMIN_PASSWORD must be set"),
            payment_success_rate: env::var("PAYMENT_SUCCESS_RATE")
                .unwrap_or_else(|_| "0.9".to_string())
                .parse::<f64>()
                .expect("PAYMENT_SUCCESS_RATE must be a number")
                .clamp(0.0, 1.0),
            payment_delay_ms: env::var("PAYMENT_DELAY_MS")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("PAYMENT_DELAY_MS must be a number"),
            payment_currency: env::var("PAYMENT_CURRENCY")
                .unwrap_or_else(|_| "INR".to_string()),
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
