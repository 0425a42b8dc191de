use std::env;

/// Environment-backed settings, read once at startup and carried in
/// application state.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub stripe_secret_key: String,
    pub host: String,
    pub port: u16,
}

impl Settings {
    pub fn from_env() -> Result<Self, String> {
        Ok(Settings {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            stripe_secret_key: required("STRIPE_SECRET_KEY")?,
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
        })
    }
}

fn required(name: &str) -> Result<String, String> {
    env::var(name).map_err(|_| format!("{name} must be set"))
}
