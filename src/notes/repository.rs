//! # Note Repository
//!
//! Every method that reads or changes a single note takes the requesting
//! owner and applies the owner filter inside the same operation. A note that
//! exists but belongs to someone else is reported exactly like a missing one.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::model::{NewNote, Note, NoteId, NoteUpdate, ShareOutcome, SharedAccess};
use crate::storage::{StoreError, StoreResult};

#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// All notes owned by `owner`, ordered by id
    async fn list_owned(&self, owner: Uuid) -> StoreResult<Vec<Note>>;

    /// All notes other identities have shared with `identity`, ordered by id
    async fn list_shared_with(&self, identity: Uuid) -> StoreResult<Vec<Note>>;

    async fn find_owned(&self, id: NoteId, owner: Uuid) -> StoreResult<Option<Note>>;

    async fn create(&self, owner: Uuid, note: NewNote) -> StoreResult<Note>;

    /// Returns `false` when no owned note matched
    async fn update_owned(&self, id: NoteId, owner: Uuid, update: NoteUpdate) -> StoreResult<bool>;

    /// Returns `false` when no owned note matched. Shares go with the note.
    async fn delete_owned(&self, id: NoteId, owner: Uuid) -> StoreResult<bool>;

    async fn add_share(&self, id: NoteId, owner: Uuid, shared_with: Uuid)
        -> StoreResult<ShareOutcome>;

    /// Returns `false` when the note is not owned or was not shared
    async fn remove_share(&self, id: NoteId, owner: Uuid, shared_with: Uuid) -> StoreResult<bool>;

    /// `None` when the note is not owned by `owner`
    async fn list_shares(&self, id: NoteId, owner: Uuid) -> StoreResult<Option<Vec<SharedAccess>>>;
}

#[derive(Debug, Default)]
struct NoteTable {
    last_id: NoteId,
    notes: BTreeMap<NoteId, Note>,
    shares: Vec<SharedAccess>,
}

impl NoteTable {
    fn owned_mut(&mut self, id: NoteId, owner: Uuid) -> Option<&mut Note> {
        self.notes.get_mut(&id).filter(|n| n.owner_id == owner)
    }

    fn is_owned(&self, id: NoteId, owner: Uuid) -> bool {
        self.notes.get(&id).is_some_and(|n| n.owner_id == owner)
    }
}

/// In-memory note repository
#[derive(Debug, Default)]
pub struct InMemoryNoteRepository {
    table: RwLock<NoteTable>,
}

impl InMemoryNoteRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NoteRepository for InMemoryNoteRepository {
    async fn list_owned(&self, owner: Uuid) -> StoreResult<Vec<Note>> {
        let table = self.table.read().map_err(|_| StoreError::Poisoned)?;
        Ok(table
            .notes
            .values()
            .filter(|n| n.owner_id == owner)
            .cloned()
            .collect())
    }

    async fn list_shared_with(&self, identity: Uuid) -> StoreResult<Vec<Note>> {
        let table = self.table.read().map_err(|_| StoreError::Poisoned)?;
        Ok(table
            .notes
            .values()
            .filter(|n| {
                table
                    .shares
                    .iter()
                    .any(|s| s.note_id == n.id && s.shared_with == identity)
            })
            .cloned()
            .collect())
    }

    async fn find_owned(&self, id: NoteId, owner: Uuid) -> StoreResult<Option<Note>> {
        let table = self.table.read().map_err(|_| StoreError::Poisoned)?;
        Ok(table.notes.get(&id).filter(|n| n.owner_id == owner).cloned())
    }

    async fn create(&self, owner: Uuid, note: NewNote) -> StoreResult<Note> {
        let mut table = self.table.write().map_err(|_| StoreError::Poisoned)?;
        table.last_id += 1;

        let now = Utc::now();
        let note = Note {
            id: table.last_id,
            title: note.title,
            content: note.content,
            owner_id: owner,
            created_at: now,
            updated_at: now,
        };
        table.notes.insert(note.id, note.clone());

        Ok(note)
    }

    async fn update_owned(&self, id: NoteId, owner: Uuid, update: NoteUpdate) -> StoreResult<bool> {
        let mut table = self.table.write().map_err(|_| StoreError::Poisoned)?;
        match table.owned_mut(id, owner) {
            Some(note) => {
                update.apply(note);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_owned(&self, id: NoteId, owner: Uuid) -> StoreResult<bool> {
        let mut table = self.table.write().map_err(|_| StoreError::Poisoned)?;
        if !table.is_owned(id, owner) {
            return Ok(false);
        }

        table.notes.remove(&id);
        table.shares.retain(|s| s.note_id != id);
        Ok(true)
    }

    async fn add_share(
        &self,
        id: NoteId,
        owner: Uuid,
        shared_with: Uuid,
    ) -> StoreResult<ShareOutcome> {
        let mut table = self.table.write().map_err(|_| StoreError::Poisoned)?;
        if !table.is_owned(id, owner) {
            return Ok(ShareOutcome::NoteNotFound);
        }

        if table
            .shares
            .iter()
            .any(|s| s.note_id == id && s.shared_with == shared_with)
        {
            return Ok(ShareOutcome::AlreadyShared);
        }

        table.shares.push(SharedAccess {
            note_id: id,
            shared_with,
            created_at: Utc::now(),
        });
        Ok(ShareOutcome::Added)
    }

    async fn remove_share(&self, id: NoteId, owner: Uuid, shared_with: Uuid) -> StoreResult<bool> {
        let mut table = self.table.write().map_err(|_| StoreError::Poisoned)?;
        if !table.is_owned(id, owner) {
            return Ok(false);
        }

        let before = table.shares.len();
        table
            .shares
            .retain(|s| !(s.note_id == id && s.shared_with == shared_with));
        Ok(table.shares.len() < before)
    }

    async fn list_shares(&self, id: NoteId, owner: Uuid) -> StoreResult<Option<Vec<SharedAccess>>> {
        let table = self.table.read().map_err(|_| StoreError::Poisoned)?;
        if !table.is_owned(id, owner) {
            return Ok(None);
        }

        Ok(Some(
            table
                .shares
                .iter()
                .filter(|s| s.note_id == id)
                .cloned()
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_note(title: &str) -> NewNote {
        NewNote {
            title: title.to_string(),
            content: format!("{} body", title),
        }
    }

    #[tokio::test]
    async fn test_owner_filter_hides_foreign_notes() {
        let repo = InMemoryNoteRepository::new();
        let alice = Uuid::new_v4();
        let mallory = Uuid::new_v4();

        let note = repo.create(alice, new_note("secret")).await.unwrap();

        assert!(repo.find_owned(note.id, mallory).await.unwrap().is_none());
        assert!(!repo
            .update_owned(note.id, mallory, NoteUpdate::default())
            .await
            .unwrap());
        assert!(!repo.delete_owned(note.id, mallory).await.unwrap());
        assert!(repo.list_owned(mallory).await.unwrap().is_empty());

        let kept = repo.find_owned(note.id, alice).await.unwrap().unwrap();
        assert_eq!(kept.title, "secret");
    }

    #[tokio::test]
    async fn test_ids_are_sequential_and_listing_is_ordered() {
        let repo = InMemoryNoteRepository::new();
        let owner = Uuid::new_v4();

        let first = repo.create(owner, new_note("a")).await.unwrap();
        let second = repo.create(owner, new_note("b")).await.unwrap();
        assert_eq!(second.id, first.id + 1);

        let ids: Vec<_> = repo
            .list_owned(owner)
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn test_repeated_delete_reports_missing() {
        let repo = InMemoryNoteRepository::new();
        let owner = Uuid::new_v4();
        let note = repo.create(owner, new_note("gone")).await.unwrap();

        assert!(repo.delete_owned(note.id, owner).await.unwrap());
        assert!(!repo.delete_owned(note.id, owner).await.unwrap());
    }

    #[tokio::test]
    async fn test_share_lifecycle() {
        let repo = InMemoryNoteRepository::new();
        let owner = Uuid::new_v4();
        let friend = Uuid::new_v4();
        let note = repo.create(owner, new_note("plans")).await.unwrap();

        assert_eq!(
            repo.add_share(note.id, owner, friend).await.unwrap(),
            ShareOutcome::Added
        );
        assert_eq!(
            repo.add_share(note.id, owner, friend).await.unwrap(),
            ShareOutcome::AlreadyShared
        );
        assert_eq!(
            repo.add_share(note.id, friend, owner).await.unwrap(),
            ShareOutcome::NoteNotFound
        );

        let shared = repo.list_shared_with(friend).await.unwrap();
        assert_eq!(shared.len(), 1);
        assert_eq!(shared[0].id, note.id);

        let shares = repo.list_shares(note.id, owner).await.unwrap().unwrap();
        assert_eq!(shares[0].shared_with, friend);
        assert!(repo.list_shares(note.id, friend).await.unwrap().is_none());

        assert!(repo.remove_share(note.id, owner, friend).await.unwrap());
        assert!(!repo.remove_share(note.id, owner, friend).await.unwrap());
        assert!(repo.list_shared_with(friend).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_drops_shares() {
        let repo = InMemoryNoteRepository::new();
        let owner = Uuid::new_v4();
        let friend = Uuid::new_v4();
        let note = repo.create(owner, new_note("temp")).await.unwrap();

        repo.add_share(note.id, owner, friend).await.unwrap();
        repo.delete_owned(note.id, owner).await.unwrap();

        assert!(repo.list_shared_with(friend).await.unwrap().is_empty());
    }
}
