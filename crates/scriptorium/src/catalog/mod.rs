//! Catalogue entry types and the `Catalog` façade over their repositories.

mod person;
mod work;


pub use person::{Lifespan, NameEdit, NameKind, Person, PersonEdit, PersonName};
pub use work::{Author, AuthorEdit, AuthorRole, Work, WorkEdit};

use crate::error::Error;
use scriptorium_core::{
    config::Config,
    notify::{ShutdownReport, UpdateListener},
    obs::MetricsReport,
    prelude::*,
    runtime::Runtime,
    storage::{MemoryStore, StoragePort},
};
use std::sync::Arc;

///
/// Catalog
///
/// One runtime plus one repository per entry type. All repositories share
/// the runtime's notification pool.
///

#[derive(Debug)]
pub struct Catalog {
    runtime: Runtime,
    works: Repository<Work>,
    people: Repository<Person>,
}

impl Catalog {
    /// Start over caller-supplied storage ports.
    ///
    /// Installs the `[log]` subscriber unless one is already set.
    pub fn start(
        config: Config,
        works: Arc<dyn StoragePort<Work>>,
        people: Arc<dyn StoragePort<Person>>,
    ) -> Result<Self, Error> {
        let runtime = Runtime::start(config)?;
        runtime.init_logging();

        Ok(Self {
            works: runtime.repository(works),
            people: runtime.repository(people),
            runtime,
        })
    }

    /// Start over process-local stores.
    pub fn in_memory(config: Config) -> Result<Self, Error> {
        Self::start(
            config,
            Arc::new(MemoryStore::<Work>::new()),
            Arc::new(MemoryStore::<Person>::new()),
        )
    }

    #[must_use]
    pub const fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    #[must_use]
    pub fn metrics(&self) -> Option<MetricsReport> {
        self.runtime.metrics_report()
    }

    // ======================================================================
    // Works
    // ======================================================================

    #[must_use]
    pub const fn works(&self) -> &Repository<Work> {
        &self.works
    }

    #[must_use]
    pub fn create_work(&self) -> WorkEdit {
        WorkEdit::new(self.works.create())
    }

    #[must_use]
    pub fn create_work_with_id(&self, entry_id: impl Into<EntryId>) -> WorkEdit {
        WorkEdit::new(self.works.create_with_id(entry_id))
    }

    #[must_use]
    pub fn edit_work(&self, entry_id: impl Into<EntryId>) -> WorkEdit {
        WorkEdit::new(self.works.edit(entry_id))
    }

    #[must_use]
    pub fn remove_work(&self, entry_id: impl Into<EntryId>) -> WorkEdit {
        WorkEdit::new(self.works.remove(entry_id))
    }

    pub async fn work(&self, entry_id: &EntryId) -> Result<Work, Error> {
        Ok(self.works.get(entry_id).await?)
    }

    pub fn on_work_update<L: UpdateListener>(&self, listener: L) -> ListenerHandle {
        self.works.on_update(listener)
    }

    // ======================================================================
    // People
    // ======================================================================

    #[must_use]
    pub const fn people(&self) -> &Repository<Person> {
        &self.people
    }

    #[must_use]
    pub fn create_person(&self) -> PersonEdit {
        PersonEdit::new(self.people.create())
    }

    #[must_use]
    pub fn create_person_with_id(&self, entry_id: impl Into<EntryId>) -> PersonEdit {
        PersonEdit::new(self.people.create_with_id(entry_id))
    }

    #[must_use]
    pub fn edit_person(&self, entry_id: impl Into<EntryId>) -> PersonEdit {
        PersonEdit::new(self.people.edit(entry_id))
    }

    #[must_use]
    pub fn remove_person(&self, entry_id: impl Into<EntryId>) -> PersonEdit {
        PersonEdit::new(self.people.remove(entry_id))
    }

    pub async fn person(&self, entry_id: &EntryId) -> Result<Person, Error> {
        Ok(self.people.get(entry_id).await?)
    }

    pub fn on_person_update<L: UpdateListener>(&self, listener: L) -> ListenerHandle {
        self.people.on_update(listener)
    }

    // ======================================================================
    // Lifecycle
    // ======================================================================

    /// Drop all listeners and drain the notification pool.
    pub async fn shutdown(&self) -> ShutdownReport {
        let listeners = self.works.close() + self.people.close();
        let report = self.runtime.shutdown().await;

        tracing::info!(
            listeners,
            drained = report.drained,
            dropped = report.dropped,
            "catalog shut down"
        );

        report
    }
}
