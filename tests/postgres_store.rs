#![cfg(feature = "pg-tests")]
//! Postgres repository tests.
//!
//! Run with `NOTEKEEPER_TEST_DATABASE_URL=postgres://... cargo test --features pg-tests`.
//! Each test creates its own identities so runs can share one database.

use notekeeper::auth::identity::{Identity, IdentityRepository};
use notekeeper::notes::{NewNote, NoteRepository, NoteUpdate, ShareOutcome};
use notekeeper::storage::postgres::{
    create_pool, migrate, PgIdentityRepository, PgNoteRepository,
};
use notekeeper::storage::StoreError;
use sqlx::PgPool;
use uuid::Uuid;

async fn pool() -> PgPool {
    let url = std::env::var("NOTEKEEPER_TEST_DATABASE_URL")
        .expect("NOTEKEEPER_TEST_DATABASE_URL must be set for pg-tests");
    let pool = create_pool(&url, 5).await.expect("connect");
    migrate(&pool).await.expect("migrate");
    pool
}

async fn identity(repo: &PgIdentityRepository, username: &str) -> Identity {
    let email = format!("{}-{}@example.com", username, Uuid::new_v4());
    let identity = Identity::new(username, &email, "$argon2id$fixture".to_string());
    repo.create(&identity).await.expect("create identity");
    identity
}

#[tokio::test]
async fn identities_round_trip_and_reject_duplicates() {
    let pool = pool().await;
    let repo = PgIdentityRepository::new(pool);

    let alice = identity(&repo, "alice").await;
    let found = repo.find_by_email(&alice.email).await.unwrap().unwrap();
    assert_eq!(found.id, alice.id);
    assert_eq!(found.password_hash, "$argon2id$fixture");

    let dup = Identity::new("alice2", &alice.email, "x".to_string());
    assert!(matches!(repo.create(&dup).await, Err(StoreError::Conflict(_))));
}

#[tokio::test]
async fn search_escapes_wildcards() {
    let pool = pool().await;
    let repo = PgIdentityRepository::new(pool);
    let tag = Uuid::new_v4().simple().to_string();

    identity(&repo, &format!("jo_{}", tag)).await;
    identity(&repo, &format!("joX{}", tag)).await;

    let found = repo
        .search_by_username(&format!("jo_{}", tag), 50)
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
}

#[tokio::test]
async fn search_orders_case_insensitively() {
    let pool = pool().await;
    let repo = PgIdentityRepository::new(pool);
    let tag = Uuid::new_v4().simple().to_string();

    identity(&repo, &format!("Jo{}b", tag)).await;
    identity(&repo, &format!("jo{}a", tag)).await;

    let found = repo.search_by_username(&tag, 50).await.unwrap();
    let names: Vec<_> = found.iter().map(|s| s.username.clone()).collect();
    assert_eq!(names, vec![format!("jo{}a", tag), format!("Jo{}b", tag)]);
}

#[tokio::test]
async fn owner_filter_and_shares() {
    let pool = pool().await;
    let identities = PgIdentityRepository::new(pool.clone());
    let notes = PgNoteRepository::new(pool);

    let owner = identity(&identities, "owner").await;
    let friend = identity(&identities, "friend").await;

    let note = notes
        .create(
            owner.id,
            NewNote {
                title: "Plan".to_string(),
                content: "v1".to_string(),
            },
        )
        .await
        .unwrap();

    assert!(notes.find_owned(note.id, friend.id).await.unwrap().is_none());
    assert!(!notes
        .update_owned(note.id, friend.id, NoteUpdate::default())
        .await
        .unwrap());

    let update = NoteUpdate {
        title: None,
        content: Some("v2".to_string()),
    };
    assert!(notes.update_owned(note.id, owner.id, update).await.unwrap());
    let fetched = notes.find_owned(note.id, owner.id).await.unwrap().unwrap();
    assert_eq!(fetched.title, "Plan");
    assert_eq!(fetched.content, "v2");

    assert_eq!(
        notes.add_share(note.id, owner.id, friend.id).await.unwrap(),
        ShareOutcome::Added
    );
    assert_eq!(
        notes.add_share(note.id, owner.id, friend.id).await.unwrap(),
        ShareOutcome::AlreadyShared
    );
    assert_eq!(
        notes.add_share(note.id, friend.id, owner.id).await.unwrap(),
        ShareOutcome::NoteNotFound
    );
    assert_eq!(notes.list_shared_with(friend.id).await.unwrap().len(), 1);

    assert!(notes.delete_owned(note.id, owner.id).await.unwrap());
    assert!(!notes.delete_owned(note.id, owner.id).await.unwrap());
    assert!(notes.list_shared_with(friend.id).await.unwrap().is_empty());
}
