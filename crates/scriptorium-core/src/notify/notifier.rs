use crate::{
    error::panic_message,
    notify::{
        ChangeEvent, UpdateListener, WorkerPool,
        registry::{ListenerHandle, ListenerRegistry},
    },
    obs::{MetricsEvent, MetricsSink},
};
use futures::FutureExt;
use std::{fmt, panic::AssertUnwindSafe, sync::Arc};

///
/// UpdateNotifier
///
/// Per-repository listener registry plus dispatch onto the shared pool.
/// `publish` never waits for delivery.
///

#[derive(Clone)]
pub struct UpdateNotifier {
    entity_path: &'static str,
    registry: Arc<ListenerRegistry>,
    pool: Arc<WorkerPool>,
    metrics: Arc<dyn MetricsSink>,
}

impl UpdateNotifier {
    #[must_use]
    pub fn new(
        entity_path: &'static str,
        pool: Arc<WorkerPool>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            entity_path,
            registry: Arc::new(ListenerRegistry::new()),
            pool,
            metrics,
        }
    }

    /// Register a listener for every future event of this repository.
    pub fn subscribe<L: UpdateListener>(&self, listener: L) -> ListenerHandle {
        let id = self.registry.insert(Arc::new(listener));
        tracing::debug!(entity = self.entity_path, listener = %id, "listener registered");

        ListenerHandle::new(id, &self.registry)
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.registry.len()
    }

    /// Drop every registration; returns how many were removed.
    pub fn clear(&self) -> usize {
        self.registry.clear()
    }

    /// Queue one delivery job per registered listener.
    ///
    /// Returns the number of jobs accepted by the pool. Listeners registered
    /// or removed while this runs are not affected by it. A delivery that
    /// outlives the pool's listener timeout is abandoned and counted as a
    /// listener failure.
    pub fn publish(&self, event: &ChangeEvent) -> usize {
        let entity_path = self.entity_path;
        let snapshot = self.registry.snapshot();
        let deadline = self.pool.listener_timeout();
        let mut dispatched = 0usize;

        for registered in snapshot.iter() {
            let id = registered.id;
            let listener = Arc::clone(&registered.listener);
            let metrics = Arc::clone(&self.metrics);
            let job_event = event.clone();

            let job = async move {
                let delivery = AssertUnwindSafe(listener.on_update(&job_event)).catch_unwind();
                let Ok(outcome) = tokio::time::timeout(deadline, delivery).await else {
                    metrics.record(MetricsEvent::ListenerFailed { entity_path });
                    tracing::warn!(
                        listener = %id,
                        entry_id = %job_event.entry_id,
                        action = %job_event.action,
                        timeout_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
                        "update listener timed out"
                    );
                    return;
                };

                match outcome {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => {
                        metrics.record(MetricsEvent::ListenerFailed { entity_path });
                        tracing::warn!(
                            listener = %id,
                            entry_id = %job_event.entry_id,
                            action = %job_event.action,
                            error = %err,
                            "update listener failed"
                        );
                    }
                    Err(payload) => {
                        metrics.record(MetricsEvent::ListenerFailed { entity_path });
                        tracing::error!(
                            listener = %id,
                            entry_id = %job_event.entry_id,
                            action = %job_event.action,
                            panic = %panic_message(payload.as_ref()),
                            "update listener panicked"
                        );
                    }
                }
            };

            match self.pool.submit(format!("{entity_path}/{id}"), job) {
                Ok(()) => dispatched += 1,
                Err(err) => {
                    self.metrics
                        .record(MetricsEvent::DispatchRejected { entity_path });
                    tracing::warn!(
                        listener = %id,
                        entry_id = %event.entry_id,
                        error = %err,
                        "update dispatch rejected"
                    );
                }
            }
        }

        self.metrics.record(MetricsEvent::EventPublished {
            entity_path,
            listeners: u64::try_from(dispatched).unwrap_or(u64::MAX),
        });

        dispatched
    }
}

impl fmt::Debug for UpdateNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateNotifier")
            .field("entity_path", &self.entity_path)
            .field("listeners", &self.registry.len())
            .finish_non_exhaustive()
    }
}
