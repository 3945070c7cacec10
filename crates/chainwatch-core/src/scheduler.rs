//! Fixed-interval job scheduler.
//!
//! Each [`Job`] runs on its own Tokio task and calls its run function once per
//! tick. Errors are logged and the job keeps ticking. A panic inside a run is
//! caught at this boundary so one bad block cannot take a worker down.
//! Shutdown is cooperative: the [`CancellationToken`] is checked between
//! ticks and an in-flight run is always allowed to finish.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::error::WatchError;

type RunFn = Arc<dyn Fn() -> BoxFuture<'static, Result<(), WatchError>> + Send + Sync>;

/// How a single run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RunOutcome {
    Completed,
    Idle,
    Failed,
    Panicked(String),
}

/// A named unit of work invoked on a fixed interval.
pub struct Job {
    name: String,
    interval: Duration,
    run: RunFn,
}

impl Job {
    pub fn new<F, Fut>(name: impl Into<String>, interval: Duration, run: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), WatchError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            // tokio rejects a zero period
            interval: interval.max(Duration::from_millis(1)),
            run: Arc::new(move || run().boxed()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Start ticking on a new task until `cancel` fires.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.tick_loop(cancel))
    }

    async fn tick_loop(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; runs start one period in.
        ticker.tick().await;

        tracing::info!(job = %self.name, interval_ms = self.interval.as_millis() as u64, "Job started");

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            self.run_once().await;
        }

        tracing::info!(job = %self.name, "Job stopped");
    }

    pub(crate) async fn run_once(&self) -> RunOutcome {
        tracing::debug!(job = %self.name, "Run");

        let run = Arc::clone(&self.run);
        let outcome = AssertUnwindSafe(async move { run().await })
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(())) => RunOutcome::Completed,
            Ok(Err(e)) if e.is_idle() || e.is_absence() => {
                tracing::debug!(job = %self.name, reason = %e, "Nothing to do");
                RunOutcome::Idle
            }
            Ok(Err(e)) => {
                tracing::warn!(job = %self.name, error = %e, retryable = e.is_retryable(), "Run failed");
                RunOutcome::Failed
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref()).to_string();
                tracing::error!(job = %self.name, panic = %message, "Run panicked");
                RunOutcome::Panicked(message)
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

// ─── Jobs ─────────────────────────────────────────────────────────────────────

/// A set of jobs started and stopped together.
#[derive(Default)]
pub struct Jobs {
    jobs: Vec<Job>,
}

impl Jobs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, job: Job) {
        self.jobs.push(job);
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Spawn every job. They all stop when `cancel` fires.
    pub fn start(self, cancel: CancellationToken) -> RunningJobs {
        let handles = self
            .jobs
            .into_iter()
            .map(|job| (job.name.clone(), job.spawn(cancel.child_token())))
            .collect();
        RunningJobs { handles }
    }
}

/// Handles of started jobs.
pub struct RunningJobs {
    handles: Vec<(String, JoinHandle<()>)>,
}

impl RunningJobs {
    /// Wait for every job task to exit.
    pub async fn wait(self) {
        for (name, handle) in self.handles {
            if let Err(e) = handle.await {
                tracing::error!(job = %name, error = %e, "Job task aborted");
            }
        }
    }
}
