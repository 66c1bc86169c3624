//! # Password Hashing
//!
//! Passwords are only ever stored as Argon2id PHC strings. Verification goes
//! through `argon2`, which compares digests in constant time.

use std::sync::OnceLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use super::errors::{AuthError, AuthResult};

/// Password requirements applied at registration
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 128,
        }
    }
}

impl PasswordPolicy {
    /// Validate a password against this policy
    pub fn validate(&self, password: &str) -> AuthResult<()> {
        let length = password.chars().count();

        if length < self.min_length {
            return Err(AuthError::WeakPassword(format!(
                "Password must be at least {} characters",
                self.min_length
            )));
        }

        if length > self.max_length {
            return Err(AuthError::WeakPassword(format!(
                "Password must be at most {} characters",
                self.max_length
            )));
        }

        Ok(())
    }
}

/// Hash a password using Argon2id with a fresh random salt
pub fn hash_password(password: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::HashingFailed)
}

/// Verify a password against a stored PHC hash
///
/// An unparseable stored hash counts as a failed match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Burn one verification against a fixed hash.
///
/// Called when a login names an unknown email so that the miss costs the
/// same as a wrong password.
pub fn verify_against_dummy(password: &str) {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

    let dummy = DUMMY_HASH.get_or_init(|| hash_password("notekeeper-dummy-credential").ok());
    if let Some(hash) = dummy {
        let _ = verify_password(password, hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_and_verify() {
        let hash = hash_password("secure_password_123").unwrap();

        assert_ne!(hash, "secure_password_123");
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("secure_password_123", &hash));
        assert!(!verify_password("wrong_password", &hash));
    }

    #[test]
    fn test_password_hash_is_salted() {
        let hash1 = hash_password("same_password").unwrap();
        let hash2 = hash_password("same_password").unwrap();

        assert_ne!(hash1, hash2);
        assert!(verify_password("same_password", &hash1));
        assert!(verify_password("same_password", &hash2));
    }

    #[test]
    fn test_garbage_hash_never_verifies() {
        assert!(!verify_password("p1", "p1"));
        assert!(!verify_password("", ""));
    }

    #[test]
    fn test_password_policy() {
        let policy = PasswordPolicy::default();

        assert!(matches!(policy.validate("ab1"), Err(AuthError::WeakPassword(_))));
        assert!(policy.validate("abcdefgh").is_ok());
        assert!(policy.validate("pässwörd").is_ok());
        assert!(policy.validate(&"a1".repeat(100)).is_err());
    }

    #[test]
    fn test_dummy_verification_does_not_panic() {
        verify_against_dummy("anything");
        verify_against_dummy("");
    }
}
