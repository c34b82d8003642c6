use std::fmt;
use thiserror::Error;

/// Closed vocabulary every service operation reports its outcome in.
///
/// The transport layer maps each status onto one response code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Success,
    NotFound,
    BadRequest,
    Forbidden,
    Conflict,
    Unauthorized,
    /// The store, the password hasher or the token signer failed.
    Internal,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Success => "Success",
            Status::NotFound => "NotFound",
            Status::BadRequest => "BadRequest",
            Status::Forbidden => "Forbidden",
            Status::Conflict => "Conflict",
            Status::Unauthorized => "Unauthorized",
            Status::Internal => "Internal",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error types for the loan and user services
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The target record, or the requester itself, does not exist
    #[error("{0}")]
    NotFound(String),

    /// The payload failed validation
    #[error("{0}")]
    BadRequest(String),

    /// The requester may not perform the operation
    #[error("{0}")]
    Forbidden(String),

    /// The operation collides with existing or concurrently changed data
    #[error("{0}")]
    Conflict(String),

    /// Credentials or bearer token were rejected
    #[error("{0}")]
    Unauthorized(String),

    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Error from bcrypt
    #[error("Password hashing error: {0}")]
    Hashing(#[from] bcrypt::BcryptError),

    /// Error while signing a token
    #[error("Token signing error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// A blocking task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ServiceError {
    pub fn status(&self) -> Status {
        match self {
            ServiceError::NotFound(_) => Status::NotFound,
            ServiceError::BadRequest(_) => Status::BadRequest,
            ServiceError::Forbidden(_) => Status::Forbidden,
            ServiceError::Conflict(_) => Status::Conflict,
            ServiceError::Unauthorized(_) => Status::Unauthorized,
            ServiceError::Database(_)
            | ServiceError::Hashing(_)
            | ServiceError::Token(_)
            | ServiceError::Task(_) => Status::Internal,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ServiceError::BadRequest(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ServiceError::Forbidden(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ServiceError::Conflict(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ServiceError::Unauthorized(message.into())
    }
}

/// Type alias for Result with ServiceError
pub type Result<T> = std::result::Result<T, ServiceError>;
