use crate::{
    change::ChangeError,
    commit::{ActionType, CommitPhase, CommitRequest, UpdateContext},
    config::ConcurrencyPolicy,
    document::Document,
    error::EditError,
    notify::{ChangeEvent, UpdateNotifier},
    obs::{EditOutcome, MetricsSink, sink::EditSpan},
    storage::{StoragePort, WriteMode},
    types::{EntryId, Revision},
};
use std::{fmt, sync::Arc};
use tracing::Instrument;

///
/// CommitPipeline
///
/// Drives one edit through load, generate, persist and notify.
///
/// The caller's future resolves once persistence has finished; listener
/// delivery happens afterwards on the notification pool and never feeds
/// back into the result.
///

pub struct CommitPipeline<D: Document> {
    storage: Arc<dyn StoragePort<D>>,
    notifier: UpdateNotifier,
    policy: ConcurrencyPolicy,
    metrics: Arc<dyn MetricsSink>,
}

impl<D: Document> CommitPipeline<D> {
    #[must_use]
    pub fn new(
        storage: Arc<dyn StoragePort<D>>,
        notifier: UpdateNotifier,
        policy: ConcurrencyPolicy,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            storage,
            notifier,
            policy,
            metrics,
        }
    }

    #[must_use]
    pub fn storage(&self) -> &Arc<dyn StoragePort<D>> {
        &self.storage
    }

    #[must_use]
    pub const fn notifier(&self) -> &UpdateNotifier {
        &self.notifier
    }

    #[must_use]
    pub const fn policy(&self) -> ConcurrencyPolicy {
        self.policy
    }

    /// Run one commit.
    ///
    /// `generate` receives the context after the original has been loaded
    /// and must return the post-image without doing any I/O. An error from
    /// it aborts the commit before anything is written.
    pub async fn run<G>(&self, request: CommitRequest, generate: G) -> Result<EntryId, EditError>
    where
        G: FnOnce(&UpdateContext<D>) -> Result<D, ChangeError> + Send,
    {
        let mut ctx = UpdateContext::new(request);
        let span = tracing::info_span!(
            "commit",
            entity = D::PATH,
            entry_id = %ctx.entry_id,
            update_id = %ctx.update_id,
            action = %ctx.action,
        );
        let metrics = EditSpan::new(Arc::clone(&self.metrics), ctx.action, D::PATH);

        let result = self.drive(&mut ctx, generate).instrument(span).await;
        match &result {
            Ok(_) => metrics.finish(EditOutcome::Committed),
            Err(err) => metrics.finish(EditOutcome::Failed(err.class())),
        }

        result
    }

    pub(super) async fn drive<G>(
        &self,
        ctx: &mut UpdateContext<D>,
        generate: G,
    ) -> Result<EntryId, EditError>
    where
        G: FnOnce(&UpdateContext<D>) -> Result<D, ChangeError> + Send,
    {
        let result = self.phases(ctx, generate).await;

        if let Err(err) = &result {
            let failed_in = ctx.phase();
            ctx.enter(CommitPhase::Failed);
            tracing::warn!(
                phase = %failed_in,
                class = %err.class(),
                error = %err,
                "commit failed"
            );
        }

        result
    }

    async fn phases<G>(&self, ctx: &mut UpdateContext<D>, generate: G) -> Result<EntryId, EditError>
    where
        G: FnOnce(&UpdateContext<D>) -> Result<D, ChangeError> + Send,
    {
        // load
        if ctx.action.loads_original() {
            ctx.enter(CommitPhase::LoadingOriginal);

            let stored = self
                .storage
                .load(&ctx.entry_id)
                .await
                .map_err(|err| err.into_edit_error(&ctx.entry_id))?;
            ctx.original = Some(stored.document);
            ctx.original_revision = Some(stored.revision);
        }

        // generate
        ctx.enter(CommitPhase::Generating);
        let modified = generate(ctx).map_err(|source| EditError::Apply {
            entry_id: ctx.entry_id.clone(),
            source,
        })?;

        // persist
        ctx.enter(CommitPhase::Persisting);
        let document = &*ctx.modified.insert(modified);
        let (entry_id, publish) = self
            .persist(&ctx.entry_id, ctx.action, ctx.original_revision, document)
            .await?;

        // notify
        if publish {
            ctx.enter(CommitPhase::Notifying);

            let event = ChangeEvent {
                entry_id: entry_id.clone(),
                action: ctx.action,
                timestamp: ctx.timestamp,
                entity_path: D::PATH,
                update_id: ctx.update_id,
            };
            let listeners = self.notifier.publish(&event);
            tracing::debug!(listeners, "change event published");
        } else {
            tracing::debug!("entry already removed; no event published");
        }

        ctx.enter(CommitPhase::Done);

        Ok(entry_id)
    }

    // Exactly one storage write. Returns the stored id and whether the write
    // changed anything worth announcing.
    async fn persist(
        &self,
        entry_id: &EntryId,
        action: ActionType,
        loaded: Option<Revision>,
        document: &D,
    ) -> Result<(EntryId, bool), EditError> {
        let outcome = match action {
            ActionType::Create => self
                .storage
                .save(entry_id, document, WriteMode::Insert)
                .await
                .map(|stored| (stored, true)),

            ActionType::Edit => {
                let expected = match self.policy {
                    ConcurrencyPolicy::LastWriterWins => None,
                    ConcurrencyPolicy::RevisionCheck => loaded,
                };

                self.storage
                    .save(entry_id, document, WriteMode::Update { expected })
                    .await
                    .map(|stored| (stored, true))
            }

            ActionType::Remove => self
                .storage
                .mark_removed(entry_id)
                .await
                .map(|removed| (entry_id.clone(), removed)),
        };

        outcome.map_err(|err| err.into_edit_error(entry_id))
    }
}

impl<D: Document> fmt::Debug for CommitPipeline<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommitPipeline")
            .field("entity", &D::PATH)
            .field("policy", &self.policy)
            .field("notifier", &self.notifier)
            .finish_non_exhaustive()
    }
}
