//! Metrics sink boundary.
//!
//! Pipeline and notifier code MUST NOT touch counter state directly.
//! All instrumentation flows through MetricsEvent and MetricsSink, and the
//! sink is injected by the runtime rather than looked up globally.

use crate::{
    commit::ActionType,
    error::ErrorClass,
    obs::metrics::{self, MetricsReport},
};
use std::sync::{Arc, Mutex, PoisonError};

///
/// EditOutcome
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EditOutcome {
    Committed,
    Failed(ErrorClass),
    /// The execute future was dropped before it finished.
    Abandoned,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug)]
pub enum MetricsEvent {
    EditStart {
        action: ActionType,
        entity_path: &'static str,
    },
    EditFinish {
        action: ActionType,
        entity_path: &'static str,
        outcome: EditOutcome,
    },
    EventPublished {
        entity_path: &'static str,
        listeners: u64,
    },
    ListenerFailed {
        entity_path: &'static str,
    },
    DispatchRejected {
        entity_path: &'static str,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink: Send + Sync {
    fn record(&self, event: MetricsEvent);
}

///
/// CounterSink
///
/// Default sink: saturating per-operation and per-entity counters.
///

#[derive(Debug, Default)]
pub struct CounterSink {
    state: Mutex<MetricsReport>,
}

impl CounterSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the current counters.
    #[must_use]
    pub fn report(&self) -> MetricsReport {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Reset all counters.
    pub fn reset(&self) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = MetricsReport::default();
    }
}

impl MetricsSink for CounterSink {
    fn record(&self, event: MetricsEvent) {
        let mut m = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        match event {
            MetricsEvent::EditStart {
                action,
                entity_path,
            } => {
                match action {
                    ActionType::Create => metrics::bump(&mut m.ops.create_calls),
                    ActionType::Edit => metrics::bump(&mut m.ops.edit_calls),
                    ActionType::Remove => metrics::bump(&mut m.ops.remove_calls),
                }
                metrics::bump(&mut m.entity_mut(entity_path).edits);
            }

            MetricsEvent::EditFinish {
                entity_path,
                outcome,
                ..
            } => match outcome {
                EditOutcome::Committed => {
                    metrics::bump(&mut m.ops.committed);
                    metrics::bump(&mut m.entity_mut(entity_path).committed);
                }
                EditOutcome::Failed(class) => {
                    metrics::bump(&mut m.ops.failed);
                    match class {
                        ErrorClass::NotFound => metrics::bump(&mut m.ops.not_found),
                        ErrorClass::Conflict => metrics::bump(&mut m.ops.conflicts),
                        _ => {}
                    }
                    metrics::bump(&mut m.entity_mut(entity_path).failed);
                }
                EditOutcome::Abandoned => metrics::bump(&mut m.ops.abandoned),
            },

            MetricsEvent::EventPublished {
                entity_path,
                listeners,
            } => {
                metrics::bump(&mut m.ops.events_published);
                metrics::add(&mut m.ops.listener_dispatches, listeners);
                metrics::bump(&mut m.entity_mut(entity_path).events_published);
            }

            MetricsEvent::ListenerFailed { entity_path } => {
                metrics::bump(&mut m.ops.listener_failures);
                metrics::bump(&mut m.entity_mut(entity_path).listener_failures);
            }

            MetricsEvent::DispatchRejected { .. } => {
                metrics::bump(&mut m.ops.dispatch_rejected);
            }
        }
    }
}

///
/// EditSpan
/// RAII guard that emits start/finish events for one `execute()` call.
/// A span dropped without `finish` reports the edit as abandoned.
///

pub(crate) struct EditSpan {
    sink: Arc<dyn MetricsSink>,
    action: ActionType,
    entity_path: &'static str,
    finished: bool,
}

impl EditSpan {
    pub(crate) fn new(
        sink: Arc<dyn MetricsSink>,
        action: ActionType,
        entity_path: &'static str,
    ) -> Self {
        sink.record(MetricsEvent::EditStart {
            action,
            entity_path,
        });

        Self {
            sink,
            action,
            entity_path,
            finished: false,
        }
    }

    pub(crate) fn finish(mut self, outcome: EditOutcome) {
        self.record_finish(outcome);
    }

    fn record_finish(&mut self, outcome: EditOutcome) {
        if self.finished {
            return;
        }
        self.finished = true;

        self.sink.record(MetricsEvent::EditFinish {
            action: self.action,
            entity_path: self.entity_path,
            outcome,
        });
    }
}

impl Drop for EditSpan {
    fn drop(&mut self) {
        self.record_finish(EditOutcome::Abandoned);
    }
}

///
/// TESTS
///
