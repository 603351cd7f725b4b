use crate::types::{Actor, EntryId, Revision, UpdateId};
use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

///
/// ActionType
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    Create,
    Edit,
    Remove,
}

impl ActionType {
    /// Whether the pipeline loads the stored document before generating.
    #[must_use]
    pub const fn loads_original(self) -> bool {
        !matches!(self, Self::Create)
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Create => "CREATE",
            Self::Edit => "EDIT",
            Self::Remove => "REMOVE",
        };
        write!(f, "{label}")
    }
}

///
/// CommitPhase
///
/// Lifecycle of one `execute()` call.
/// `Failed` is reachable from every phase except `Done`.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CommitPhase {
    Init,
    LoadingOriginal,
    Generating,
    Persisting,
    Notifying,
    Done,
    Failed,
}

impl fmt::Display for CommitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Init => "init",
            Self::LoadingOriginal => "loading_original",
            Self::Generating => "generating",
            Self::Persisting => "persisting",
            Self::Notifying => "notifying",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        write!(f, "{label}")
    }
}

///
/// CommitRequest
///
/// Caller-side inputs for one commit.
///

#[derive(Clone, Debug)]
pub struct CommitRequest {
    pub entry_id: EntryId,
    pub action: ActionType,
    pub actor: Actor,
}

impl CommitRequest {
    #[must_use]
    pub fn new(entry_id: impl Into<EntryId>, action: ActionType) -> Self {
        Self {
            entry_id: entry_id.into(),
            action,
            actor: Actor::system(),
        }
    }

    #[must_use]
    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actor = actor;
        self
    }
}

///
/// UpdateContext
///
/// State of one in-flight edit. Owned by the pipeline for the duration of a
/// single `execute()` and dropped afterwards; never persisted.
///

#[derive(Clone, Debug)]
pub struct UpdateContext<D> {
    pub entry_id: EntryId,
    pub update_id: UpdateId,
    pub action: ActionType,
    pub actor: Actor,
    pub timestamp: OffsetDateTime,
    /// Pre-image. Absent for CREATE.
    pub original: Option<D>,
    pub original_revision: Option<Revision>,
    /// Post-image, set once generation succeeds.
    pub modified: Option<D>,
    phase: CommitPhase,
}

impl<D> UpdateContext<D> {
    pub(crate) fn new(request: CommitRequest) -> Self {
        Self {
            entry_id: request.entry_id,
            update_id: UpdateId::generate(),
            action: request.action,
            actor: request.actor,
            timestamp: OffsetDateTime::now_utc(),
            original: None,
            original_revision: None,
            modified: None,
            phase: CommitPhase::Init,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> CommitPhase {
        self.phase
    }

    pub(crate) fn enter(&mut self, phase: CommitPhase) {
        tracing::debug!(from = %self.phase, to = %phase, "commit phase");
        self.phase = phase;
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_context_starts_in_init() {
        let a = UpdateContext::<()>::new(CommitRequest::new("w1", ActionType::Create));
        let b = UpdateContext::<()>::new(CommitRequest::new("w1", ActionType::Create));

        assert_eq!(a.phase(), CommitPhase::Init);
        assert!(a.original.is_none());
        assert!(a.modified.is_none());
        assert_eq!(a.actor, Actor::system());
        assert_ne!(a.update_id, b.update_id);
    }

    #[test]
    fn only_create_skips_loading() {
        assert!(!ActionType::Create.loads_original());
        assert!(ActionType::Edit.loads_original());
        assert!(ActionType::Remove.loads_original());
    }

    #[test]
    fn action_type_serializes_upper_case() {
        let json = serde_json::to_string(&ActionType::Create).unwrap();

        assert_eq!(json, "\"CREATE\"");
        assert_eq!(ActionType::Remove.to_string(), "REMOVE");
    }
}
