//! # Postgres Repositories
//!
//! sqlx-backed implementations of the identity and note repositories.
//! Owner filters are part of each statement's `WHERE` clause.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

use super::StoreResult;
use crate::auth::identity::{Identity, IdentityRepository, IdentitySummary};
use crate::notes::model::{NewNote, Note, NoteId, NoteUpdate, ShareOutcome, SharedAccess};
use crate::notes::repository::NoteRepository;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Create a connection pool
pub async fn create_pool(url: &str, max_connections: u32) -> StoreResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .connect(url)
        .await?;
    Ok(pool)
}

/// Apply pending schema migrations
pub async fn migrate(pool: &PgPool) -> StoreResult<()> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Escape `%`, `_` and `\` so user input matches literally inside ILIKE
pub fn escape_like(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub struct PgIdentityRepository {
    pool: PgPool,
}

impl PgIdentityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityRepository for PgIdentityRepository {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Identity>> {
        let row = sqlx::query_as::<_, Identity>(
            "SELECT id, username, email, password_hash, created_at FROM identities WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Identity>> {
        let row = sqlx::query_as::<_, Identity>(
            "SELECT id, username, email, password_hash, created_at FROM identities WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create(&self, identity: &Identity) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO identities (id, username, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(identity.id)
        .bind(&identity.username)
        .bind(&identity.email)
        .bind(&identity.password_hash)
        .bind(identity.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn search_by_username(
        &self,
        fragment: &str,
        limit: usize,
    ) -> StoreResult<Vec<IdentitySummary>> {
        let rows = sqlx::query_as::<_, IdentitySummary>(
            r#"
            SELECT id, username, email
            FROM identities
            WHERE username ILIKE $1 ESCAPE '\'
            ORDER BY lower(username) COLLATE "C", username COLLATE "C", id
            LIMIT $2
            "#,
        )
        .bind(format!("%{}%", escape_like(fragment)))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

pub struct PgNoteRepository {
    pool: PgPool,
}

impl PgNoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn list_owned(&self, owner: Uuid) -> StoreResult<Vec<Note>> {
        let rows = sqlx::query_as::<_, Note>(
            r#"
            SELECT id, title, content, owner_id, created_at, updated_at
            FROM notes
            WHERE owner_id = $1
            ORDER BY id
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_shared_with(&self, identity: Uuid) -> StoreResult<Vec<Note>> {
        let rows = sqlx::query_as::<_, Note>(
            r#"
            SELECT n.id, n.title, n.content, n.owner_id, n.created_at, n.updated_at
            FROM notes n
            JOIN note_shares s ON s.note_id = n.id
            WHERE s.shared_with = $1
            ORDER BY n.id
            "#,
        )
        .bind(identity)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_owned(&self, id: NoteId, owner: Uuid) -> StoreResult<Option<Note>> {
        let row = sqlx::query_as::<_, Note>(
            r#"
            SELECT id, title, content, owner_id, created_at, updated_at
            FROM notes
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create(&self, owner: Uuid, note: NewNote) -> StoreResult<Note> {
        let row = sqlx::query_as::<_, Note>(
            r#"
            INSERT INTO notes (title, content, owner_id)
            VALUES ($1, $2, $3)
            RETURNING id, title, content, owner_id, created_at, updated_at
            "#,
        )
        .bind(note.title)
        .bind(note.content)
        .bind(owner)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_owned(&self, id: NoteId, owner: Uuid, update: NoteUpdate) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE notes
            SET title = COALESCE($3, title),
                content = COALESCE($4, content),
                updated_at = now()
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(update.title)
        .bind(update.content)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_owned(&self, id: NoteId, owner: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_share(
        &self,
        id: NoteId,
        owner: Uuid,
        shared_with: Uuid,
    ) -> StoreResult<ShareOutcome> {
        let (owned, inserted) = sqlx::query_as::<_, (bool, bool)>(
            r#"
            WITH owned AS (
                SELECT id FROM notes WHERE id = $1 AND owner_id = $2
            ), inserted AS (
                INSERT INTO note_shares (note_id, shared_with)
                SELECT id, $3 FROM owned
                ON CONFLICT (note_id, shared_with) DO NOTHING
                RETURNING note_id
            )
            SELECT EXISTS (SELECT 1 FROM owned), EXISTS (SELECT 1 FROM inserted)
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(shared_with)
        .fetch_one(&self.pool)
        .await?;

        Ok(match (owned, inserted) {
            (false, _) => ShareOutcome::NoteNotFound,
            (true, true) => ShareOutcome::Added,
            (true, false) => ShareOutcome::AlreadyShared,
        })
    }

    async fn remove_share(&self, id: NoteId, owner: Uuid, shared_with: Uuid) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM note_shares s
            USING notes n
            WHERE s.note_id = n.id
              AND n.id = $1
              AND n.owner_id = $2
              AND s.shared_with = $3
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(shared_with)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_shares(&self, id: NoteId, owner: Uuid) -> StoreResult<Option<Vec<SharedAccess>>> {
        let owned: Option<(NoteId,)> =
            sqlx::query_as("SELECT id FROM notes WHERE id = $1 AND owner_id = $2")
                .bind(id)
                .bind(owner)
                .fetch_optional(&self.pool)
                .await?;
        if owned.is_none() {
            return Ok(None);
        }

        let rows = sqlx::query_as::<_, SharedAccess>(
            r#"
            SELECT note_id, shared_with, created_at
            FROM note_shares
            WHERE note_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(Some(rows))
    }
}
