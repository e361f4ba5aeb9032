//! Application configuration

use std::env;

/// Which user-store backend to run against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    /// Process-local store for development and tests; data does not
    /// survive a restart
    Memory,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub bind_address: String,

    // Database
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub database_max_connections: u32,

    // Authentication
    pub jwt_secret: String,
    pub access_token_expiry_minutes: i64,
    pub refresh_token_expiry_days: i64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Stripe configuration is loaded separately by the billing crate;
    /// both are checked at startup so a missing secret never surfaces
    /// mid-request.
    pub fn from_env() -> Result<Self, ConfigError> {
        let store_backend = match env::var("STORE_BACKEND").as_deref() {
            Ok("memory") => StoreBackend::Memory,
            Ok("postgres") | Err(_) => StoreBackend::Postgres,
            Ok(other) => return Err(ConfigError::InvalidStoreBackend(other.to_string())),
        };

        let database_url = env::var("DATABASE_URL").ok();
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        Ok(Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),

            store_backend,
            database_url,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),

            jwt_secret: {
                let secret =
                    env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
                if secret.len() < 32 {
                    return Err(ConfigError::WeakSecret(
                        "JWT_SECRET must be at least 32 characters",
                    ));
                }
                secret
            },
            access_token_expiry_minutes: env::var("ACCESS_TOKEN_EXPIRY_MINUTES")
                .unwrap_or_else(|_| "15".to_string())
                .parse()
                .unwrap_or(15),
            refresh_token_expiry_days: env::var("REFRESH_TOKEN_EXPIRY_DAYS")
                .unwrap_or_else(|_| "7".to_string())
                .parse()
                .unwrap_or(7),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid STORE_BACKEND: {0} (expected 'postgres' or 'memory')")]
    InvalidStoreBackend(String),
    #[error("Weak secret: {0}")]
    WeakSecret(&'static str),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Config tests run serially (they modify shared env vars)
    static CONFIG_TEST_MUTEX: Mutex<()> = Mutex::new(());

    fn setup_minimal_config() {
        env::set_var("STORE_BACKEND", "memory");
        env::set_var(
            "JWT_SECRET",
            "test-jwt-secret-must-be-at-least-32-characters-long",
        );
        env::remove_var("DATABASE_URL");
    }

    fn cleanup_config() {
        env::remove_var("STORE_BACKEND");
        env::remove_var("JWT_SECRET");
        env::remove_var("DATABASE_URL");
    }

    #[test]
    fn test_required_variables() {
        let _lock = CONFIG_TEST_MUTEX.lock().unwrap();

        // Missing JWT secret is fatal
        setup_minimal_config();
        env::remove_var("JWT_SECRET");
        match Config::from_env() {
            Err(ConfigError::Missing("JWT_SECRET")) => {}
            other => panic!("expected Missing(JWT_SECRET), got {:?}", other.map(|_| ())),
        }

        // Short JWT secret is rejected
        setup_minimal_config();
        env::set_var("JWT_SECRET", "short");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::WeakSecret(_))
        ));

        // Postgres backend requires DATABASE_URL
        setup_minimal_config();
        env::set_var("STORE_BACKEND", "postgres");
        match Config::from_env() {
            Err(ConfigError::Missing("DATABASE_URL")) => {}
            other => panic!("expected Missing(DATABASE_URL), got {:?}", other.map(|_| ())),
        }

        // Memory backend does not
        setup_minimal_config();
        let config = Config::from_env().unwrap();
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.access_token_expiry_minutes, 15);

        cleanup_config();
    }
}
