//! Storage port: the boundary to the physical document store.
//!
//! The core only loads, saves and tombstones whole documents through this
//! trait. JSON framing, connection handling and retries belong to the
//! implementation behind it.

mod memory;

pub use memory::{MemoryStore, StoreStats};

use crate::{
    document::Document,
    error::EditError,
    types::{EntryId, Revision},
};
use async_trait::async_trait;
use thiserror::Error as ThisError;

///
/// StorageError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum StorageError {
    #[error("entry not found: {entry_id}")]
    NotFound { entry_id: EntryId },

    #[error("write conflict: {message}")]
    Conflict { message: String },

    #[error("storage i/o failure: {message}")]
    Io { message: String },
}

impl StorageError {
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Lift a port failure into the caller-facing taxonomy for `entry_id`.
    #[must_use]
    pub fn into_edit_error(self, entry_id: &EntryId) -> EditError {
        match self {
            Self::NotFound { .. } => EditError::NotFound {
                entry_id: entry_id.clone(),
            },
            Self::Conflict { message } => EditError::Conflict {
                entry_id: entry_id.clone(),
                message,
            },
            Self::Io { message } => EditError::Io {
                entry_id: entry_id.clone(),
                message,
            },
        }
    }
}

///
/// StoredDocument
///
/// A loaded document together with the revision it was read at.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StoredDocument<D> {
    pub document: D,
    pub revision: Revision,
}

///
/// WriteMode
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WriteMode {
    /// Create a new entry; fails with `Conflict` if it exists.
    Insert,

    /// Overwrite an existing entry. With `expected` set, the port must reject
    /// the write with `Conflict` unless the stored revision still matches.
    Update { expected: Option<Revision> },
}

///
/// StoragePort
///

#[async_trait]
pub trait StoragePort<D: Document>: Send + Sync + 'static {
    /// Load the live document stored under `entry_id`.
    ///
    /// Returns `StorageError::NotFound` for unknown and tombstoned entries.
    async fn load(&self, entry_id: &EntryId) -> Result<StoredDocument<D>, StorageError>;

    /// Persist `document`, returning the id it is stored under.
    async fn save(
        &self,
        entry_id: &EntryId,
        document: &D,
        mode: WriteMode,
    ) -> Result<EntryId, StorageError>;

    /// Tombstone an entry.
    ///
    /// Returns `false` if the entry was already removed.
    async fn mark_removed(&self, entry_id: &EntryId) -> Result<bool, StorageError>;
}
