//! Post-commit notification.
//!
//! A committed edit produces one `ChangeEvent`. The owning repository's
//! `UpdateNotifier` fans it out to every registered listener as independent
//! jobs on the shared `WorkerPool`, so a slow, failing or panicking listener
//! never affects the commit that produced the event or any other listener.

mod notifier;
mod pool;
mod registry;

#[cfg(test)]
mod tests;

pub use notifier::UpdateNotifier;
pub use pool::{ShutdownReport, SubmitError, WorkerPool};
pub use registry::{ListenerHandle, ListenerId};

use crate::{
    commit::ActionType,
    types::{EntryId, UpdateId},
};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use thiserror::Error as ThisError;
use time::OffsetDateTime;

///
/// ChangeEvent
///
/// Notification of one committed edit. Carries no document content;
/// listeners that need the entry fetch it through the repository.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ChangeEvent {
    pub entry_id: EntryId,
    pub action: ActionType,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub entity_path: &'static str,
    pub update_id: UpdateId,
}

///
/// ListenerError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("{message}")]
pub struct ListenerError {
    message: String,
}

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

///
/// UpdateListener
///

#[async_trait]
pub trait UpdateListener: Send + Sync + 'static {
    async fn on_update(&self, event: &ChangeEvent) -> Result<(), ListenerError>;
}

///
/// FnListener
///
/// Adapter for synchronous closures. Build one with [`from_fn`].
///

pub struct FnListener<F> {
    f: F,
}

impl<F> fmt::Debug for FnListener<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnListener").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> UpdateListener for FnListener<F>
where
    F: Fn(&ChangeEvent) -> Result<(), ListenerError> + Send + Sync + 'static,
{
    async fn on_update(&self, event: &ChangeEvent) -> Result<(), ListenerError> {
        (self.f)(event)
    }
}

/// Wrap a closure as an [`UpdateListener`].
pub const fn from_fn<F>(f: F) -> FnListener<F>
where
    F: Fn(&ChangeEvent) -> Result<(), ListenerError> + Send + Sync + 'static,
{
    FnListener { f }
}
