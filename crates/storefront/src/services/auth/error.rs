//! Account error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Failures while registering, logging in or loading an account.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] akaar_core::EmailError),

    /// Unknown email or wrong password; callers must not tell them apart.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Session refers to an account that no longer exists.
    #[error("user not found")]
    UserNotFound,

    #[error("an account with this email already exists")]
    UserAlreadyExists,

    /// Carries the message shown to the user.
    #[error("{0}")]
    WeakPassword(String),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("password hashing failed")]
    PasswordHash,
}
