use crate::{
    commit::ActionType,
    config::NotifyConfig,
    notify::{
        ChangeEvent, ListenerError, ShutdownReport, SubmitError, UpdateListener, UpdateNotifier,
        WorkerPool, from_fn,
    },
    obs::{CounterSink, MetricsSink},
    types::{EntryId, UpdateId},
};
use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::{Notify, mpsc, oneshot};

const WAIT: Duration = Duration::from_secs(2);

fn pool(workers: usize, queue_capacity: usize) -> Arc<WorkerPool> {
    let config = NotifyConfig {
        workers,
        queue_capacity,
        ..NotifyConfig::default()
    };

    Arc::new(WorkerPool::start(&config).unwrap())
}

fn event(entry_id: &str) -> ChangeEvent {
    ChangeEvent {
        entry_id: EntryId::from(entry_id),
        action: ActionType::Edit,
        timestamp: OffsetDateTime::now_utc(),
        entity_path: "test::Manuscript",
        update_id: UpdateId::generate(),
    }
}

fn notifier(pool: &Arc<WorkerPool>) -> (UpdateNotifier, Arc<CounterSink>) {
    let counters = Arc::new(CounterSink::new());
    let sink: Arc<dyn MetricsSink> = counters.clone();

    (
        UpdateNotifier::new("test::Manuscript", Arc::clone(pool), sink),
        counters,
    )
}

///
/// POOL
///

#[tokio::test]
async fn shutdown_drains_accepted_jobs() {
    let pool = pool(2, 16);
    let done = Arc::new(AtomicUsize::new(0));

    for i in 0..5 {
        let done = Arc::clone(&done);
        pool.submit(format!("job-{i}"), async move {
            tokio::task::yield_now().await;
            done.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    }

    let report = pool.shutdown().await;

    assert_eq!(
        report,
        ShutdownReport {
            drained: true,
            dropped: 0
        }
    );
    assert_eq!(done.load(Ordering::SeqCst), 5);
    assert_eq!(pool.pending(), 0);
}

#[tokio::test]
async fn forced_shutdown_reports_dropped_jobs() {
    let pool = pool(1, 8);

    for i in 0..3 {
        pool.submit(format!("stuck-{i}"), std::future::pending::<()>())
            .unwrap();
    }

    let report = pool.shutdown_within(Duration::from_millis(50)).await;

    assert!(!report.drained);
    assert_eq!(report.dropped, 3);
    assert_eq!(pool.pending(), 0);
}

#[tokio::test]
async fn full_queue_rejects_without_waiting() {
    let pool = pool(1, 1);
    let (release, gate) = oneshot::channel::<()>();

    pool.submit("gate", async move {
        let _ = gate.await;
    })
    .unwrap();

    // the single worker has not run yet, so the one queue slot is taken
    let err = pool.submit("overflow", async {}).unwrap_err();
    assert_eq!(err, SubmitError::Full);
    assert_eq!(pool.rejected(), 1);

    release.send(()).unwrap();
    assert!(pool.shutdown().await.drained);
}

#[tokio::test]
async fn submit_after_shutdown_is_closed() {
    let pool = pool(1, 4);

    assert!(pool.shutdown().await.drained);
    assert!(pool.is_closed());
    assert_eq!(pool.submit("late", async {}), Err(SubmitError::Closed));

    // second shutdown is a no-op
    assert!(pool.shutdown().await.drained);
}

#[tokio::test]
async fn panicking_job_does_not_stop_worker() {
    let pool = pool(1, 4);
    let done = Arc::new(AtomicUsize::new(0));

    pool.submit("boom", async {
        panic!("job exploded");
    })
    .unwrap();
    let counter = Arc::clone(&done);
    pool.submit("after", async move {
        counter.fetch_add(1, Ordering::SeqCst);
    })
    .unwrap();

    assert!(pool.shutdown().await.drained);
    assert_eq!(done.load(Ordering::SeqCst), 1);
}

///
/// NOTIFIER
///

#[tokio::test]
async fn failing_listeners_are_isolated() {
    let pool = pool(2, 16);
    let (notifier, counters) = notifier(&pool);
    let (tx, mut rx) = mpsc::unbounded_channel();

    notifier.subscribe(from_fn(|_: &ChangeEvent| -> Result<(), ListenerError> {
        panic!("listener exploded");
    }));
    notifier.subscribe(from_fn(|_: &ChangeEvent| {
        Err(ListenerError::new("index offline"))
    }));
    notifier.subscribe(from_fn(move |event: &ChangeEvent| {
        tx.send(event.entry_id.clone())
            .map_err(|err| ListenerError::new(err.to_string()))
    }));

    assert_eq!(notifier.publish(&event("w1")), 3);

    let received = tokio::time::timeout(WAIT, rx.recv())
        .await
        .unwrap();
    assert_eq!(received, Some(EntryId::from("w1")));

    assert!(pool.shutdown().await.drained);

    let report = counters.report();
    assert_eq!(report.ops.events_published, 1);
    assert_eq!(report.ops.listener_dispatches, 3);
    assert_eq!(report.ops.listener_failures, 2);
}

#[tokio::test]
async fn unregistered_listener_receives_nothing() {
    let pool = pool(1, 16);
    let (notifier, _) = notifier(&pool);
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&calls);
    let handle = notifier.subscribe(from_fn(move |_: &ChangeEvent| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }));

    assert!(handle.is_registered());
    assert!(handle.unregister());
    assert!(!handle.unregister());
    assert!(!handle.is_registered());

    assert_eq!(notifier.publish(&event("w1")), 0);
    assert!(pool.shutdown().await.drained);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn each_listener_gets_each_event_once() {
    let pool = pool(4, 64);
    let (notifier, _) = notifier(&pool);
    let calls = Arc::new(AtomicUsize::new(0));

    for _ in 0..3 {
        let counter = Arc::clone(&calls);
        notifier.subscribe(from_fn(move |_: &ChangeEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));
    }

    notifier.publish(&event("w1"));
    notifier.publish(&event("w2"));

    assert!(pool.shutdown().await.drained);
    assert_eq!(calls.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn handle_outliving_notifier_is_inert() {
    let pool = pool(1, 4);
    let (notifier, _) = notifier(&pool);

    let handle = notifier.subscribe(from_fn(|_: &ChangeEvent| Ok(())));
    assert_eq!(notifier.listener_count(), 1);

    drop(notifier);
    assert!(!handle.unregister());
    assert!(!handle.is_registered());

    assert!(pool.shutdown().await.drained);
}

#[tokio::test]
async fn publish_after_shutdown_counts_rejections() {
    let pool = pool(1, 4);
    let (notifier, counters) = notifier(&pool);
    notifier.subscribe(from_fn(|_: &ChangeEvent| Ok(())));

    assert!(pool.shutdown().await.drained);
    assert_eq!(notifier.publish(&event("w1")), 0);

    let report = counters.report();
    assert_eq!(report.ops.dispatch_rejected, 1);
    assert_eq!(report.ops.listener_dispatches, 0);
}

#[tokio::test]
async fn hung_listener_does_not_starve_siblings() {
    let config = NotifyConfig {
        workers: 2,
        listener_timeout_ms: 50,
        ..NotifyConfig::default()
    };
    let pool = Arc::new(WorkerPool::start(&config).unwrap());
    let (notifier, counters) = notifier(&pool);
    let (tx, mut rx) = mpsc::unbounded_channel();

    notifier.subscribe(Hang);
    notifier.subscribe(from_fn(move |event: &ChangeEvent| {
        tx.send(event.entry_id.clone())
            .map_err(|err| ListenerError::new(err.to_string()))
    }));

    for entry_id in ["w0", "w1", "w2"] {
        assert_eq!(notifier.publish(&event(entry_id)), 2);
    }

    let mut received = Vec::new();
    for _ in 0..3 {
        let entry_id = tokio::time::timeout(WAIT, rx.recv()).await.unwrap();
        received.extend(entry_id);
    }
    received.sort();
    assert_eq!(received, ["w0", "w1", "w2"].map(EntryId::from).to_vec());

    assert!(pool.shutdown().await.drained);
    assert_eq!(counters.report().ops.listener_failures, 3);
}

#[tokio::test]
async fn unregister_during_delivery_allows_at_most_one_call() {
    let pool = pool(1, 16);
    let (notifier, _) = notifier(&pool);
    let (entered_tx, mut entered) = mpsc::unbounded_channel();
    let gate = Arc::new(Notify::new());
    let calls = Arc::new(AtomicUsize::new(0));

    let handle = notifier.subscribe(Gated {
        entered: entered_tx,
        gate: Arc::clone(&gate),
        calls: Arc::clone(&calls),
    });

    assert_eq!(notifier.publish(&event("w1")), 1);
    let first = tokio::time::timeout(WAIT, entered.recv()).await.unwrap();
    assert_eq!(first, Some(EntryId::from("w1")));

    // delivery of w1 is parked at the gate
    assert!(handle.unregister());
    assert_eq!(notifier.publish(&event("w2")), 0);

    gate.notify_one();
    assert!(pool.shutdown().await.drained);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

///
/// Hang
/// Never finishes handling an event.
///

struct Hang;

#[async_trait]
impl UpdateListener for Hang {
    async fn on_update(&self, _: &ChangeEvent) -> Result<(), ListenerError> {
        std::future::pending().await
    }
}

///
/// Gated
/// Reports entry, then waits for the gate before returning.
///

struct Gated {
    entered: mpsc::UnboundedSender<EntryId>,
    gate: Arc<Notify>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl UpdateListener for Gated {
    async fn on_update(&self, event: &ChangeEvent) -> Result<(), ListenerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _ = self.entered.send(event.entry_id.clone());
        self.gate.notified().await;

        Ok(())
    }
}
