//! # Auth Service
//!
//! Exchanges credentials for session tokens and registers identities.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use super::crypto::{hash_password, verify_against_dummy, verify_password, PasswordPolicy};
use super::errors::{AuthError, AuthResult};
use super::identity::{normalize_email, Identity, IdentityRepository};
use super::token::{IssuedToken, TokenService};

/// Login request body
#[derive(Clone, Deserialize)]
pub struct Credential {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Registration request body
#[derive(Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Auth service combining identity storage and token issuance
pub struct AuthService {
    identities: Arc<dyn IdentityRepository>,
    tokens: Arc<TokenService>,
    password_policy: PasswordPolicy,
}

impl AuthService {
    pub fn new(
        identities: Arc<dyn IdentityRepository>,
        tokens: Arc<TokenService>,
        password_policy: PasswordPolicy,
    ) -> Self {
        Self {
            identities,
            tokens,
            password_policy,
        }
    }

    /// Check a credential and issue a token for its identity
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn authenticate(&self, credential: Credential) -> AuthResult<IssuedToken> {
        let email = normalize_email(&credential.email);
        let identity = self.identities.find_by_email(&email).await?;

        let Some(identity) = identity else {
            let password = credential.password;
            let _ = tokio::task::spawn_blocking(move || verify_against_dummy(&password)).await;
            warn!("login rejected");
            return Err(AuthError::InvalidCredentials);
        };

        let hash = identity.password_hash.clone();
        let matches =
            tokio::task::spawn_blocking(move || verify_password(&credential.password, &hash))
                .await
                .map_err(|_| AuthError::HashingFailed)?;

        if !matches {
            warn!(identity = %identity.id, "login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        info!(identity = %identity.id, "login succeeded");
        self.tokens.issue(identity.id)
    }

    /// Create an identity and issue its first token
    pub async fn register(&self, request: RegisterRequest) -> AuthResult<(Identity, IssuedToken)> {
        if request.username.trim().is_empty() {
            return Err(AuthError::InvalidRegistration(
                "username must not be empty".to_string(),
            ));
        }
        let email = normalize_email(&request.email);
        if !email.contains('@') {
            return Err(AuthError::InvalidRegistration(
                "email must contain '@'".to_string(),
            ));
        }
        self.password_policy.validate(&request.password)?;

        if self.identities.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }

        let password = request.password;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|_| AuthError::HashingFailed)??;

        let identity = Identity::new(&request.username, &email, password_hash);
        self.identities.create(&identity).await?;
        info!(identity = %identity.id, "identity registered");

        let issued = self.tokens.issue(identity.id)?;
        Ok((identity, issued))
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::identity::InMemoryIdentityRepository;
    use crate::auth::token::TokenConfig;

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(InMemoryIdentityRepository::new()),
            Arc::new(TokenService::new(TokenConfig::new(
                "unit_test_secret_unit_test_secret",
            ))),
            PasswordPolicy::default(),
        )
    }

    fn register_request(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: "alice".to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    fn credential(email: &str, password: &str) -> Credential {
        Credential {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_authenticate_yields_verifiable_token() {
        let auth = service();
        let (identity, _) = auth
            .register(register_request("alice@example.com", "password123"))
            .await
            .unwrap();

        let issued = auth
            .authenticate(credential("Alice@Example.com", "password123"))
            .await
            .unwrap();
        assert_eq!(auth.tokens().verify(&issued.token).unwrap(), identity.id);
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_look_the_same() {
        let auth = service();
        auth.register(register_request("alice@example.com", "password123"))
            .await
            .unwrap();

        let wrong = auth
            .authenticate(credential("alice@example.com", "nope-nope"))
            .await
            .unwrap_err();
        let unknown = auth
            .authenticate(credential("ghost@example.com", "password123"))
            .await
            .unwrap_err();

        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates_and_bad_input() {
        let auth = service();
        auth.register(register_request("alice@example.com", "password123"))
            .await
            .unwrap();

        assert!(matches!(
            auth.register(register_request("ALICE@example.com", "password456")).await,
            Err(AuthError::EmailAlreadyExists)
        ));
        assert!(matches!(
            auth.register(register_request("bob@example.com", "short")).await,
            Err(AuthError::WeakPassword(_))
        ));
        assert!(matches!(
            auth.register(register_request("not-an-email", "password123")).await,
            Err(AuthError::InvalidRegistration(_))
        ));
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", credential("a@x.com", "hunter2"));
        assert!(!rendered.contains("hunter2"));
    }
}
