//! # Auth Module
//!
//! Identities, password hashing, session tokens and the login flow.

pub mod crypto;
pub mod errors;
pub mod identity;
pub mod service;
pub mod token;

pub use errors::{AuthError, AuthResult};
pub use identity::{Identity, IdentityRepository, IdentitySummary};
pub use service::{AuthService, Credential, RegisterRequest};
pub use token::{TokenConfig, TokenService};
