use crate::types::{ElementId, EntryId};
use serde::{Serialize, de::DeserializeOwned};

///
/// Document
///
/// One persisted catalogue entry type (work, person, relationship, ...).
///
/// The core never reads fields. It only deep-copies a document through
/// `Clone`, runs registered change closures against the copy, and hands the
/// result to the storage port, which owns the JSON framing.
///

pub trait Document: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Diagnostic path of the entry type, used in logs, metrics and events.
    const PATH: &'static str;

    /// Build the blank document a CREATE edit starts from.
    fn blank(entry_id: &EntryId) -> Self;
}

///
/// Element
///
/// Member of a keyed collection field.
/// Change scopes locate elements by id at apply time, never by index.
///

pub trait Element: Send + Sync + 'static {
    fn element_id(&self) -> ElementId;
}
