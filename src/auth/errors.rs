//! # Auth Errors
//!
//! Error types for credential checks and token handling.

use thiserror::Error;

/// Result type for auth operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Authentication errors
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    // ==================
    // Credential Errors
    // ==================

    /// Unknown email or wrong password (generic - don't leak which)
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Email already registered
    #[error("Email already registered")]
    EmailAlreadyExists,

    /// Password does not meet requirements
    #[error("Password does not meet requirements: {0}")]
    WeakPassword(String),

    /// Registration field rejected
    #[error("Invalid registration: {0}")]
    InvalidRegistration(String),

    // ==================
    // Token Errors
    // ==================

    /// No token header on a gated request
    #[error("Missing authentication token")]
    MissingToken,

    /// Token failed signature, algorithm, claim or expiry checks
    #[error("Invalid or expired token")]
    InvalidToken,

    // ==================
    // Internal Errors
    // ==================

    /// Password hashing failed
    #[error("Internal error: password hashing failed")]
    HashingFailed,

    /// Token generation failed
    #[error("Internal error: token generation failed")]
    TokenGenerationFailed,

    /// Identity storage failed
    #[error("Storage error: {0}")]
    StorageError(String),
}

impl AuthError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            AuthError::WeakPassword(_) => 400,
            AuthError::InvalidRegistration(_) => 400,

            // 401 Unauthorized
            AuthError::InvalidCredentials => 401,
            AuthError::MissingToken => 401,

            // 403 Forbidden
            AuthError::InvalidToken => 403,

            // 409 Conflict
            AuthError::EmailAlreadyExists => 409,

            // 500 Internal Server Error
            AuthError::HashingFailed => 500,
            AuthError::TokenGenerationFailed => 500,
            AuthError::StorageError(_) => 500,
        }
    }
}

impl From<crate::storage::StoreError> for AuthError {
    fn from(err: crate::storage::StoreError) -> Self {
        match err {
            crate::storage::StoreError::Conflict(_) => AuthError::EmailAlreadyExists,
            other => AuthError::StorageError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(AuthError::InvalidCredentials.status_code(), 401);
        assert_eq!(AuthError::MissingToken.status_code(), 401);
        assert_eq!(AuthError::InvalidToken.status_code(), 403);
        assert_eq!(AuthError::EmailAlreadyExists.status_code(), 409);
        assert_eq!(AuthError::HashingFailed.status_code(), 500);
        assert_eq!(AuthError::StorageError("down".into()).status_code(), 500);
    }

    #[test]
    fn test_error_messages_do_not_leak_info() {
        let err = AuthError::InvalidCredentials;
        assert!(!err.to_string().contains("password"));
        assert!(!err.to_string().contains("email"));
    }

    #[test]
    fn test_store_conflict_maps_to_duplicate_email() {
        let err: AuthError = crate::storage::StoreError::Conflict("identities_email_key".into()).into();
        assert!(matches!(err, AuthError::EmailAlreadyExists));
    }
}
