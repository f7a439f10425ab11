use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("User with this email already exists")]
    DuplicateEmail,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::DuplicateEmail => ErrorCode::DuplicateEmail,
            AppError::InvalidCredentials => ErrorCode::InvalidCredentials,
            AppError::InvalidRefreshToken => ErrorCode::InvalidRefreshToken,
            AppError::Unauthenticated => ErrorCode::Unauthenticated,
            AppError::InvalidInput(_) => ErrorCode::InvalidInput,
            AppError::StoreUnavailable(_) => ErrorCode::StoreUnavailable,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Expected outcomes of validated requests, as opposed to server faults.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, AppError::StoreUnavailable(_) | AppError::Internal(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    DuplicateEmail,
    InvalidCredentials,
    InvalidRefreshToken,
    Unauthenticated,
    InvalidInput,
    StoreUnavailable,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::DuplicateEmail => "DUPLICATE_EMAIL",
            ErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorCode::InvalidRefreshToken => "INVALID_REFRESH_TOKEN",
            ErrorCode::Unauthenticated => "UNAUTHENTICATED",
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::StoreUnavailable => "STORE_UNAVAILABLE",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
