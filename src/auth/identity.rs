//! # Identities
//!
//! Who can log in. Identities own notes; their password is an Argon2id hash
//! that never leaves the process.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::{StoreError, StoreResult};

/// Identity model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Identity {
    /// Unique identity identifier
    pub id: Uuid,

    /// Display name, searchable
    pub username: String,

    /// Login email (unique, stored lowercased)
    pub email: String,

    /// Argon2id PHC string (never plaintext)
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub created_at: DateTime<Utc>,
}

impl Identity {
    /// Build a new identity around an already computed password hash
    pub fn new(username: &str, email: &str, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.trim().to_string(),
            email: normalize_email(email),
            password_hash,
            created_at: Utc::now(),
        }
    }

    pub fn summary(&self) -> IdentitySummary {
        IdentitySummary {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}

/// Public projection of an identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct IdentitySummary {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

/// Emails are compared case-insensitively
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Identity repository trait
///
/// Abstracts storage operations for identities.
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    /// Find an identity by its ID
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Identity>>;

    /// Find an identity by its (normalized) email
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Identity>>;

    /// Insert a new identity; a taken email is a `Conflict`
    async fn create(&self, identity: &Identity) -> StoreResult<()>;

    /// Case-insensitive substring match on usernames, ordered by username
    async fn search_by_username(
        &self,
        fragment: &str,
        limit: usize,
    ) -> StoreResult<Vec<IdentitySummary>>;
}

/// In-memory identity repository
#[derive(Debug, Default)]
pub struct InMemoryIdentityRepository {
    identities: RwLock<Vec<Identity>>,
}

impl InMemoryIdentityRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityRepository for InMemoryIdentityRepository {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Identity>> {
        let identities = self.identities.read().map_err(|_| StoreError::Poisoned)?;
        Ok(identities.iter().find(|i| i.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Identity>> {
        let identities = self.identities.read().map_err(|_| StoreError::Poisoned)?;
        Ok(identities.iter().find(|i| i.email == email).cloned())
    }

    async fn create(&self, identity: &Identity) -> StoreResult<()> {
        let mut identities = self.identities.write().map_err(|_| StoreError::Poisoned)?;

        if identities.iter().any(|i| i.email == identity.email) {
            return Err(StoreError::Conflict("identities_email_key".to_string()));
        }

        identities.push(identity.clone());
        Ok(())
    }

    async fn search_by_username(
        &self,
        fragment: &str,
        limit: usize,
    ) -> StoreResult<Vec<IdentitySummary>> {
        let needle = fragment.to_lowercase();
        let identities = self.identities.read().map_err(|_| StoreError::Poisoned)?;

        let mut found: Vec<IdentitySummary> = identities
            .iter()
            .filter(|i| i.username.to_lowercase().contains(&needle))
            .map(Identity::summary)
            .collect();
        // lower(username), then exact username, then id; postgres sorts the same way
        found.sort_by(|a, b| {
            a.username
                .to_lowercase()
                .cmp(&b.username.to_lowercase())
                .then_with(|| a.username.cmp(&b.username))
                .then_with(|| a.id.cmp(&b.id))
        });
        found.truncate(limit);

        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(username: &str, email: &str) -> Identity {
        Identity::new(username, email, "$argon2id$placeholder".to_string())
    }

    #[test]
    fn test_email_is_normalized() {
        let id = identity("Alice", "  Alice@Example.COM ");
        assert_eq!(id.email, "alice@example.com");
    }

    #[test]
    fn test_serialization_omits_password_hash() {
        let id = identity("alice", "alice@example.com");
        let json = serde_json::to_string(&id).unwrap();

        assert!(!json.contains("password_hash"));
        assert!(!json.contains("placeholder"));
    }

    #[tokio::test]
    async fn test_in_memory_repository() {
        let repo = InMemoryIdentityRepository::new();
        let alice = identity("alice", "alice@example.com");
        repo.create(&alice).await.unwrap();

        let found = repo.find_by_id(alice.id).await.unwrap().unwrap();
        assert_eq!(found.email, "alice@example.com");
        assert!(repo.find_by_email("alice@example.com").await.unwrap().is_some());
        assert!(repo.find_by_email("bob@example.com").await.unwrap().is_none());

        let dup = identity("alice2", "alice@example.com");
        assert!(matches!(repo.create(&dup).await, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_and_sorted() {
        let repo = InMemoryIdentityRepository::new();
        for (name, email) in [("Jordan", "j@x.com"), ("bob", "b@x.com"), ("jo", "jo@x.com")] {
            repo.create(&identity(name, email)).await.unwrap();
        }

        let found = repo.search_by_username("JO", 50).await.unwrap();
        let names: Vec<_> = found.iter().map(|s| s.username.as_str()).collect();
        assert_eq!(names, vec!["jo", "Jordan"]);

        let first = repo.search_by_username("o", 1).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].username, "bob");
    }
}
