//! Counter state behind [`CounterSink`](crate::obs::CounterSink).

use serde::Serialize;
use std::collections::BTreeMap;

///
/// OpCounters
///
/// Process-wide totals across every entry type.
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct OpCounters {
    pub create_calls: u64,
    pub edit_calls: u64,
    pub remove_calls: u64,
    pub committed: u64,
    pub failed: u64,
    pub abandoned: u64,
    pub not_found: u64,
    pub conflicts: u64,
    pub events_published: u64,
    pub listener_dispatches: u64,
    pub listener_failures: u64,
    pub dispatch_rejected: u64,
}

///
/// EntityCounters
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct EntityCounters {
    pub edits: u64,
    pub committed: u64,
    pub failed: u64,
    pub events_published: u64,
    pub listener_failures: u64,
}

///
/// MetricsReport
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct MetricsReport {
    pub ops: OpCounters,
    pub entities: BTreeMap<String, EntityCounters>,
}

impl MetricsReport {
    pub(crate) fn entity_mut(&mut self, entity_path: &str) -> &mut EntityCounters {
        self.entities.entry(entity_path.to_string()).or_default()
    }
}

pub(crate) fn bump(counter: &mut u64) {
    *counter = counter.saturating_add(1);
}

pub(crate) fn add(counter: &mut u64, delta: u64) {
    *counter = counter.saturating_add(delta);
}
