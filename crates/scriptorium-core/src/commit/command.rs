use crate::{
    change::{ChangeError, ChangeSet},
    commit::{ActionType, CommitPipeline, CommitRequest, UpdateContext},
    document::Document,
    error::EditError,
    types::{Actor, EntryId},
};
use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

///
/// EditCommand
///
/// One pending edit of one entry. Typed mutators register change actions
/// on `changes()`; nothing touches storage until `execute()`.
///
/// A command executes at most once. Dropping it unexecuted discards the
/// recorded changes.
///

pub struct EditCommand<D: Document> {
    entry_id: EntryId,
    action: ActionType,
    actor: Actor,
    changes: ChangeSet<D>,
    pipeline: Arc<CommitPipeline<D>>,
    executed: AtomicBool,
}

impl<D: Document> EditCommand<D> {
    #[must_use]
    pub fn new(pipeline: Arc<CommitPipeline<D>>, entry_id: EntryId, action: ActionType) -> Self {
        Self {
            entry_id,
            action,
            actor: Actor::system(),
            changes: ChangeSet::new(),
            pipeline,
            executed: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn with_actor(mut self, actor: impl Into<Actor>) -> Self {
        self.actor = actor.into();
        self
    }

    #[must_use]
    pub const fn entry_id(&self) -> &EntryId {
        &self.entry_id
    }

    #[must_use]
    pub const fn action(&self) -> ActionType {
        self.action
    }

    #[must_use]
    pub const fn actor(&self) -> &Actor {
        &self.actor
    }

    /// Recorded changes; mutators register here.
    #[must_use]
    pub const fn changes(&self) -> &ChangeSet<D> {
        &self.changes
    }

    #[must_use]
    pub fn is_executed(&self) -> bool {
        self.executed.load(Ordering::Acquire)
    }

    /// Commit the recorded changes and return the stored entry id.
    ///
    /// A second call fails with `AlreadyExecuted` without touching storage,
    /// whether or not the first call succeeded.
    pub async fn execute(&self) -> Result<EntryId, EditError> {
        if self
            .executed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!(
                entity = D::PATH,
                entry_id = %self.entry_id,
                "edit command executed twice"
            );

            return Err(EditError::AlreadyExecuted {
                entry_id: self.entry_id.clone(),
            });
        }

        let request = CommitRequest::new(self.entry_id.clone(), self.action)
            .with_actor(self.actor.clone());
        let changes = &self.changes;

        self.pipeline
            .run(request, |ctx| generate(changes, ctx))
            .await
    }
}

impl<D: Document> fmt::Debug for EditCommand<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditCommand")
            .field("entity", &D::PATH)
            .field("entry_id", &self.entry_id)
            .field("action", &self.action)
            .field("actor", &self.actor)
            .field("changes", &self.changes)
            .field("executed", &self.is_executed())
            .finish_non_exhaustive()
    }
}

// Copy the pre-image (or start blank for CREATE) and replay the changes.
fn generate<D: Document>(
    changes: &ChangeSet<D>,
    ctx: &UpdateContext<D>,
) -> Result<D, ChangeError> {
    match &ctx.original {
        Some(original) => changes.apply_to_copy(original),
        None => changes.apply(D::blank(&ctx.entry_id)),
    }
}
