//! # Notes
//!
//! Owner-scoped note records and the many-to-many share relation.

pub mod model;
pub mod repository;

pub use model::{NewNote, Note, NoteId, NoteUpdate, ShareOutcome, SharedAccess};
pub use repository::{InMemoryNoteRepository, NoteRepository};
