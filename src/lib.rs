//! notekeeper - token-authenticated notes service
//!
//! Identities log in for a signed session token; every note operation is
//! scoped to the identity behind that token.

pub mod auth;
pub mod cli;
pub mod config;
pub mod http_server;
pub mod notes;
pub mod storage;
pub mod telemetry;
