use crate::{
    commit::CommitPipeline,
    config::{Config, ConfigError},
    document::Document,
    notify::{ShutdownReport, UpdateNotifier, WorkerPool},
    obs::{self, CounterSink, MetricsReport, MetricsSink},
    repository::Repository,
    storage::StoragePort,
};
use std::{fmt, sync::Arc};
use thiserror::Error as ThisError;
use tokio::runtime::TryCurrentError;

///
/// RuntimeError
///

#[derive(Debug, ThisError)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("scriptorium must be started inside a tokio runtime: {0}")]
    NoReactor(#[from] TryCurrentError),
}

///
/// Runtime
///
/// Process-level owner of the shared notification pool and metrics sink.
/// Every repository built from one runtime dispatches onto the same pool.
///

pub struct Runtime {
    config: Config,
    pool: Arc<WorkerPool>,
    metrics: Arc<dyn MetricsSink>,
    counters: Option<Arc<CounterSink>>,
}

impl Runtime {
    /// Validate `config` and start the pool with the default counter sink.
    pub fn start(config: Config) -> Result<Self, RuntimeError> {
        let counters = Arc::new(CounterSink::new());
        let metrics: Arc<dyn MetricsSink> = counters.clone();

        let mut runtime = Self::with_metrics(config, metrics)?;
        runtime.counters = Some(counters);

        Ok(runtime)
    }

    /// Start with a caller-supplied metrics sink.
    pub fn with_metrics(config: Config, metrics: Arc<dyn MetricsSink>) -> Result<Self, RuntimeError> {
        config.validate()?;
        let pool = Arc::new(WorkerPool::start(&config.notify)?);

        tracing::info!(
            workers = config.notify.workers,
            queue_capacity = config.notify.queue_capacity,
            concurrency = ?config.commit.concurrency,
            "scriptorium runtime started"
        );

        Ok(Self {
            config,
            pool,
            metrics,
            counters: None,
        })
    }

    /// Install the tracing subscriber described by the `[log]` section.
    pub fn init_logging(&self) {
        obs::init_logging(self.config.log.format);
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub const fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }

    /// Counter snapshot, when running with the default sink.
    #[must_use]
    pub fn metrics_report(&self) -> Option<MetricsReport> {
        self.counters.as_ref().map(|counters| counters.report())
    }

    /// Build a repository for `D` over `storage`, with its own listeners.
    pub fn repository<D: Document>(&self, storage: Arc<dyn StoragePort<D>>) -> Repository<D> {
        let notifier =
            UpdateNotifier::new(D::PATH, Arc::clone(&self.pool), Arc::clone(&self.metrics));
        let pipeline = CommitPipeline::new(
            storage,
            notifier,
            self.config.commit.concurrency,
            Arc::clone(&self.metrics),
        );

        Repository::new(Arc::new(pipeline))
    }

    /// Stop the notification pool, waiting at most the configured timeout.
    pub async fn shutdown(&self) -> ShutdownReport {
        self.pool.shutdown().await
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.config)
            .field("pending", &self.pool.pending())
            .finish_non_exhaustive()
    }
}

///
/// TESTS
///
