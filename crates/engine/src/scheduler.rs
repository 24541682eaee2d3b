//! Named job scheduler.
//!
//! Each job owns one timer task. Every firing spawns the job's task on its
//! own, so cancelling or replacing a job stops future firings without
//! interrupting a task that already started.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::AbortHandle;
use thiserror::Error;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

/// Errors returned when a job cannot be scheduled.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Job {0} needs a non-zero interval")]
    ZeroInterval(String),
}

/// Boxed future produced by a task on each firing.
pub type TaskFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Unit of work a job runs.
pub type Task = Arc<dyn Fn() -> TaskFuture + Send + Sync>;

/// Wrap an async closure as a [`Task`].
pub fn task<F, Fut>(f: F) -> Task
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move || Box::pin(f()))
}

/// Kind of a scheduled job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Recurring(Duration),
    Once(Duration),
}

struct JobEntry {
    id: u64,
    kind: JobKind,
    timer: AbortHandle,
}

/// Scheduler owning named recurring and one-shot jobs.
pub struct Scheduler {
    jobs: Arc<DashMap<String, JobEntry>>,
    next_id: AtomicU64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Run `task` every `interval`, first firing one interval from now.
    ///
    /// Replaces any job with the same name. A zero interval is rejected and
    /// leaves any existing job with that name untouched. Must be called
    /// within a tokio runtime.
    pub fn schedule_recurring(
        &self,
        name: &str,
        interval: Duration,
        task: Task,
    ) -> Result<(), ScheduleError> {
        if interval.is_zero() {
            return Err(ScheduleError::ZeroInterval(name.to_string()));
        }
        let kind = JobKind::Recurring(interval);
        self.install(name, kind, |_, _| {
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    tokio::spawn(task());
                }
            })
            .abort_handle()
        });
        Ok(())
    }

    /// Run `task` once after `delay`, then forget the job.
    ///
    /// Replaces any job with the same name. Must be called within a tokio runtime.
    pub fn schedule_once(&self, name: &str, delay: Duration, task: Task) {
        let kind = JobKind::Once(delay);
        let jobs = Arc::clone(&self.jobs);
        self.install(name, kind, move |name, id| {
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                jobs.remove_if(&name, |_, entry| entry.id == id);
                debug!(job = %name, "One-shot job fired");
                tokio::spawn(task());
            })
            .abort_handle()
        });
    }

    /// Stop and remove a job. Returns false if no such job existed.
    pub fn cancel(&self, name: &str) -> bool {
        match self.jobs.remove(name) {
            Some((_, entry)) => {
                entry.timer.abort();
                debug!(job = name, "Cancelled job");
                true
            }
            None => false,
        }
    }

    /// Cancel every job.
    pub fn shutdown(&self) {
        self.jobs.retain(|name, entry| {
            entry.timer.abort();
            debug!(job = %name, "Cancelled job");
            false
        });
    }

    pub fn is_scheduled(&self, name: &str) -> bool {
        self.jobs.contains_key(name)
    }

    /// Kind of the named job, if scheduled.
    pub fn job_kind(&self, name: &str) -> Option<JobKind> {
        self.jobs.get(name).map(|entry| entry.kind)
    }

    /// Names of scheduled jobs, sorted.
    pub fn job_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.jobs.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    // The entry lock is held while the timer is spawned, so a one-shot that
    // fires immediately cannot look for its entry before it is inserted.
    fn install<F>(&self, name: &str, kind: JobKind, spawn: F)
    where
        F: FnOnce(String, u64) -> AbortHandle,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        match self.jobs.entry(name.to_string()) {
            Entry::Occupied(mut occupied) => {
                occupied.get().timer.abort();
                debug!(job = name, "Replacing job");
                let timer = spawn(name.to_string(), id);
                occupied.insert(JobEntry { id, kind, timer });
            }
            Entry::Vacant(vacant) => {
                let timer = spawn(name.to_string(), id);
                vacant.insert(JobEntry { id, kind, timer });
            }
        }
        debug!(job = name, kind = ?kind, "Scheduled job");
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
