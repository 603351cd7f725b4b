//! ## Crate layout
//! - `catalog`: catalogue entry types, their typed edit commands and the
//!   `Catalog` façade.
//! - `core`: change sets, commit pipeline, notification, storage port and
//!   runtime.
//! - `error`: public error type with a stable kind + origin taxonomy.
//!
//! The `prelude` module carries what application code needs to edit entries
//! and listen for changes.

pub use scriptorium_core as core;

pub mod catalog;
pub mod error;

pub use error::Error;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        catalog::{
            Author, AuthorEdit, AuthorRole, Catalog, Lifespan, NameEdit, NameKind, Person,
            PersonEdit, PersonName, Work, WorkEdit,
        },
        error::{Error, ErrorKind},
    };
    pub use scriptorium_core::{
        config::Config,
        notify::{ChangeEvent, ListenerError, ListenerHandle, UpdateListener, from_fn},
        types::{Actor, ElementId, EntryId},
    };
}
