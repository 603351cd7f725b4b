use crate::{
    commit::{ActionType, CommitPipeline, EditCommand},
    document::Document,
    error::EditError,
    notify::{ListenerHandle, UpdateListener, UpdateNotifier},
    storage::StoredDocument,
    types::EntryId,
};
use std::{fmt, sync::Arc};

///
/// Repository
///
/// Entry point for one document type: hands out edit commands, reads
/// documents back and owns the listener registry for that type.
///
/// Cloning is cheap and every clone shares the same pipeline and listeners.
///

pub struct Repository<D: Document> {
    pipeline: Arc<CommitPipeline<D>>,
}

impl<D: Document> Repository<D> {
    #[must_use]
    pub const fn new(pipeline: Arc<CommitPipeline<D>>) -> Self {
        Self { pipeline }
    }

    // ======================================================================
    // Commands
    // ======================================================================

    /// Start a CREATE under a freshly minted id.
    #[must_use]
    pub fn create(&self) -> EditCommand<D> {
        self.create_with_id(EntryId::generate())
    }

    /// Start a CREATE under a caller-chosen id.
    #[must_use]
    pub fn create_with_id(&self, entry_id: impl Into<EntryId>) -> EditCommand<D> {
        self.command(entry_id.into(), ActionType::Create)
    }

    #[must_use]
    pub fn edit(&self, entry_id: impl Into<EntryId>) -> EditCommand<D> {
        self.command(entry_id.into(), ActionType::Edit)
    }

    #[must_use]
    pub fn remove(&self, entry_id: impl Into<EntryId>) -> EditCommand<D> {
        self.command(entry_id.into(), ActionType::Remove)
    }

    fn command(&self, entry_id: EntryId, action: ActionType) -> EditCommand<D> {
        EditCommand::new(Arc::clone(&self.pipeline), entry_id, action)
    }

    // ======================================================================
    // Reads
    // ======================================================================

    /// Load the current document.
    pub async fn get(&self, entry_id: &EntryId) -> Result<D, EditError> {
        Ok(self.get_stored(entry_id).await?.document)
    }

    /// Load the current document together with its revision.
    pub async fn get_stored(&self, entry_id: &EntryId) -> Result<StoredDocument<D>, EditError> {
        self.pipeline
            .storage()
            .load(entry_id)
            .await
            .map_err(|err| err.into_edit_error(entry_id))
    }

    // ======================================================================
    // Listeners
    // ======================================================================

    /// Register a listener for every committed edit of this document type.
    pub fn on_update<L: UpdateListener>(&self, listener: L) -> ListenerHandle {
        self.notifier().subscribe(listener)
    }

    #[must_use]
    pub fn notifier(&self) -> &UpdateNotifier {
        self.pipeline.notifier()
    }

    /// Drop every listener registration; returns how many were removed.
    pub fn close(&self) -> usize {
        let removed = self.notifier().clear();
        tracing::debug!(entity = D::PATH, removed, "repository closed");

        removed
    }
}

impl<D: Document> Clone for Repository<D> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
        }
    }
}

impl<D: Document> fmt::Debug for Repository<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("entity", &D::PATH)
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use crate::{
        config::Config,
        notify::{ChangeEvent, ListenerError, from_fn},
        runtime::Runtime,
        storage::MemoryStore,
        test_support::Manuscript,
        types::EntryId,
    };
    use std::{sync::Arc, time::Duration};
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn created_entry_is_readable_and_announced() {
        let runtime = Runtime::start(Config::default()).unwrap();
        let store = Arc::new(MemoryStore::<Manuscript>::new());
        let repo = runtime.repository::<Manuscript>(store);
        let (tx, mut rx) = mpsc::unbounded_channel();

        repo.on_update(from_fn(move |event: &ChangeEvent| {
            tx.send(event.entry_id.clone())
                .map_err(|err| ListenerError::new(err.to_string()))
        }));

        let cmd = repo.create();
        cmd.changes().add("title", |doc| doc.title = "Psalter".to_string());
        let entry_id = cmd.execute().await.unwrap();

        let doc = repo.get(&entry_id).await.unwrap();
        assert_eq!(doc.id, entry_id.as_str());
        assert_eq!(doc.title, "Psalter");

        let announced = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap();
        assert_eq!(announced, Some(entry_id));

        assert!(runtime.shutdown().await.drained);
    }

    #[tokio::test]
    async fn get_of_unknown_entry_is_not_found() {
        let runtime = Runtime::start(Config::default()).unwrap();
        let store = Arc::new(MemoryStore::<Manuscript>::new());
        let repo = runtime.repository::<Manuscript>(store);

        let err = repo.get(&EntryId::from("nope")).await.unwrap_err();
        assert!(err.is_not_found());

        assert!(runtime.shutdown().await.drained);
    }

    #[tokio::test]
    async fn clones_share_listeners_and_close_clears_them() {
        let runtime = Runtime::start(Config::default()).unwrap();
        let store = Arc::new(MemoryStore::<Manuscript>::new());
        let repo = runtime.repository::<Manuscript>(store);
        let other = repo.clone();

        let handle = repo.on_update(from_fn(|_: &ChangeEvent| Ok(())));
        assert_eq!(other.notifier().listener_count(), 1);

        assert_eq!(other.close(), 1);
        assert!(!handle.is_registered());
        assert_eq!(repo.notifier().listener_count(), 0);

        assert!(runtime.shutdown().await.drained);
    }
}
