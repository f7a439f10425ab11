use sqlx::PgPool;

use crate::app_error::AppError;

pub mod refresh_token;
pub mod user;

/// Unique constraint on `users.email`, see migrations.
pub(crate) const USERS_EMAIL_CONSTRAINT: &str = "users_email_key";

#[derive(Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    pub fn new(pool: PgPool) -> Self {
        PostgresPersistence { pool }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err
            && db_err.is_unique_violation()
            && db_err.constraint() == Some(USERS_EMAIL_CONSTRAINT)
        {
            return AppError::DuplicateEmail;
        }
        // Log the actual error for debugging, but don't expose details
        tracing::error!(error = ?err, "Database error");
        AppError::StoreUnavailable("Database operation failed".into())
    }
}
