//! Error types for the Memberly shared crate

use thiserror::Error;

/// Errors surfaced by user-store implementations.
///
/// Store errors are propagated, never swallowed: a webhook handler that
/// cannot read or write the store must fail the request so the provider
/// redelivers the event.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record already exists: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                // PostgreSQL unique violation
                if db_err.code().as_deref() == Some("23505") {
                    return StoreError::Conflict(db_err.to_string());
                }
                StoreError::Database(db_err.to_string())
            }
            _ => StoreError::Database(err.to_string()),
        }
    }
}
