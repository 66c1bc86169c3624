//! # Session Tokens
//!
//! Stateless HS256 JSON Web Tokens binding a subject identity.
//!
//! Tokens are never persisted. Verification checks signature, algorithm,
//! issuer, audience and expiry, and collapses every failure into
//! [`AuthError::InvalidToken`].

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::errors::{AuthError, AuthResult};

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Claims carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (identity ID)
    pub sub: String,

    /// Issued at (Unix epoch seconds)
    pub iat: i64,

    /// Expiration (Unix epoch seconds)
    pub exp: i64,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,
}

/// Token service configuration
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Symmetric signing secret
    pub secret: Secret<String>,

    /// Token lifetime
    pub ttl: Duration,

    pub issuer: String,

    pub audience: String,
}

impl TokenConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: Secret::new(secret.into()),
            ttl: Duration::hours(1),
            issuer: "notekeeper".to_string(),
            audience: "notekeeper".to_string(),
        }
    }
}

/// Issues and verifies session tokens
#[derive(Clone)]
pub struct TokenService {
    ttl: Duration,
    issuer: String,
    audience: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    pub fn new(config: TokenConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();

        Self {
            ttl: config.ttl,
            issuer: config.issuer,
            audience: config.audience,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Issue a token for `subject`, expiring after the configured TTL
    pub fn issue(&self, subject: Uuid) -> AuthResult<IssuedToken> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or(AuthError::TokenGenerationFailed)?;

        let claims = TokenClaims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };

        let token = encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|_| AuthError::TokenGenerationFailed)?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Verify a token and return its subject
    ///
    /// Fails closed: anything other than a well-formed, unexpired HS256 token
    /// signed with our secret for our issuer and audience is `InvalidToken`.
    pub fn verify(&self, token: &str) -> AuthResult<Uuid> {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);

        let data = decode::<TokenClaims>(token, &self.decoding_key, &validation).map_err(|e| {
            debug!(reason = ?e.kind(), "token rejected");
            AuthError::InvalidToken
        })?;

        Uuid::parse_str(&data.claims.sub).map_err(|_| {
            debug!("token subject is not a UUID");
            AuthError::InvalidToken
        })
    }
}

/// A freshly issued token with its expiry
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Token body returned to the client on login/registration
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub expires_at: i64,
}

impl From<IssuedToken> for TokenResponse {
    fn from(issued: IssuedToken) -> Self {
        let expires_in = (issued.expires_at - Utc::now()).num_seconds().max(0);

        Self {
            token: issued.token,
            token_type: "session".to_string(),
            expires_in,
            expires_at: issued.expires_at.timestamp(),
        }
    }
}
