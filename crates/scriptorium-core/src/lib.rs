//! Core of the Scriptorium catalogue: change sets, the commit pipeline,
//! post-commit notification, the storage port and the ambient runtime.

// public exports are one module level down
pub mod change;
pub mod commit;
pub mod config;
pub mod document;
pub mod error;
pub mod notify;
pub mod obs;
pub mod repository;
pub mod runtime;
pub mod storage;
pub mod types;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Vocabulary needed to define document types and write edit commands.
/// Runtime wiring, storage ports and metrics stay in their modules.
///

pub mod prelude {
    pub use crate::{
        change::{ChangeError, ChangeScope, ChangeSet, PartialChangeSet},
        commit::{ActionType, EditCommand},
        document::{Document, Element},
        error::EditError,
        notify::{ChangeEvent, ListenerError, ListenerHandle, UpdateListener},
        repository::Repository,
        types::{Actor, ElementId, EntryId},
    };
}
