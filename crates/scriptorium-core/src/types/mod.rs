//! Identity vocabulary shared by change sets, commits and notifications.

pub(crate) mod generator;

use derive_more::{Deref, Display};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

///
/// EntryId
///
/// Identifier of one persisted catalogue entry.
/// Opaque to the core; storage ports may normalize it on insert.
///

#[derive(
    Clone, Debug, Deref, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    /// Mint a fresh, time-ordered entry id.
    #[must_use]
    pub fn generate() -> Self {
        Self(generator::generate().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntryId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntryId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&Self> for EntryId {
    fn from(value: &Self) -> Self {
        value.clone()
    }
}

///
/// ElementId
///
/// Stable identifier of one element inside a keyed collection field
/// (author lists, name variants, tree children).
/// Minted before `execute()` so callers can keep editing a new element.
///

#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(transparent)]
pub struct ElementId(Ulid);

impl ElementId {
    #[must_use]
    pub fn generate() -> Self {
        Self(generator::generate())
    }
}

///
/// ActionId
///
/// Opaque token naming one registered change action.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ActionId(Ulid);

impl ActionId {
    #[must_use]
    pub(crate) fn generate() -> Self {
        Self(generator::generate())
    }
}

///
/// UpdateId
///
/// Token minted once per `execute()` call.
///

#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(transparent)]
pub struct UpdateId(Ulid);

impl UpdateId {
    #[must_use]
    pub(crate) fn generate() -> Self {
        Self(generator::generate())
    }
}

///
/// Actor
///
/// Identity of the requester an edit is attributed to.
///

#[derive(Clone, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Actor(String);

impl Actor {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Actor used for edits made by the platform itself (imports, migrations).
    #[must_use]
    pub fn system() -> Self {
        Self("system".to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Actor {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

///
/// Revision
///
/// Storage-assigned version stamp of a persisted document.
/// Only consulted when revision checking is enabled.
///

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(transparent)]
pub struct Revision(u64);

impl Revision {
    pub const INITIAL: Self = Self(1);

    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}
