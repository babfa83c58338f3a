//! Bounded fan-out/fan-in executor shared by every stalk and scrape.
//!
//! Work is described as a [`TaskGroup`] of independent [`Task`]s. A
//! [`TaskPool`] runs the whole group concurrently, limited by a semaphore
//! shared between all clones of the pool, and returns whatever finished.
//! A failing or panicking task is logged and dropped from the results; its
//! siblings keep running.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Serialize;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, trace};

use crate::error::Result;

pub const DEFAULT_MAX_CONCURRENCY: usize = 20;

tokio::task_local! {
    /// Pool slot held by the task currently running on this tokio task.
    static HELD_SLOT: RefCell<Option<OwnedSemaphorePermit>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Waiting,
    Working,
    Finished,
    Failed,
}

/// A single unit of work: a callable already applied to its arguments.
pub struct Task<T> {
    label: String,
    status: TaskStatus,
    work: BoxFuture<'static, Result<T>>,
}

impl<T> Task<T> {
    /// Apply `func` to `args`; the arguments double as the task's log label.
    pub fn new<A, F, Fut>(func: F, args: A) -> Self
    where
        A: Debug,
        F: FnOnce(A) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let label = format!("{args:?}");
        Self::from_future(label, func(args))
    }

    /// Wrap an already built future under the given log label.
    pub fn from_future<Fut>(label: impl Into<String>, work: Fut) -> Self
    where
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            label: label.into(),
            status: TaskStatus::Waiting,
            work: work.boxed(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }
}

impl<T> Debug for Task<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("label", &self.label)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Tasks dispatched together, labelled for diagnostics.
#[derive(Debug)]
pub struct TaskGroup<T> {
    pub name: String,
    tasks: Vec<Task<T>>,
}

impl<T> TaskGroup<T> {
    pub fn new(name: impl Into<String>, tasks: Vec<Task<T>>) -> Self {
        Self {
            name: name.into(),
            tasks,
        }
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }
}

impl<T> FromIterator<Task<T>> for TaskGroup<T> {
    fn from_iter<I: IntoIterator<Item = Task<T>>>(iter: I) -> Self {
        Self::new("tasks", iter.into_iter().collect())
    }
}

/// A task that ended without a result.
#[derive(Debug, Clone, Serialize)]
pub struct TaskFailure {
    pub label: String,
    pub reason: String,
}

/// Everything a group produced, results in completion order.
#[derive(Debug)]
pub struct GroupOutcome<T> {
    pub results: Vec<T>,
    pub failures: Vec<TaskFailure>,
}

/// Process-wide bounded worker pool.
///
/// Clones share the same slots. A task that submits a nested group hands its
/// slot back while it waits for that group, so nested fan-out never starves
/// the pool.
#[derive(Debug, Clone)]
pub struct TaskPool {
    slots: Arc<Semaphore>,
    max_concurrency: usize,
}

impl TaskPool {
    /// Create a pool running at most `max_concurrency` tasks at once.
    ///
    /// A bound of zero is raised to one.
    pub fn new(max_concurrency: usize) -> Self {
        let max_concurrency = max_concurrency.max(1);
        Self {
            slots: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
        }
    }

    /// Run every task of `group` and return the results that finished.
    pub async fn submit<T: Send + 'static>(&self, group: TaskGroup<T>) -> Vec<T> {
        self.submit_detailed(group).await.results
    }

    /// Like [`TaskPool::submit`], but also report which tasks failed.
    pub async fn submit_detailed<T: Send + 'static>(&self, group: TaskGroup<T>) -> GroupOutcome<T> {
        let TaskGroup { name, tasks } = group;
        let mut remaining = tasks.len();
        debug!(
            group = %name,
            count = remaining,
            slots = self.max_concurrency,
            "tasks have been submitted"
        );

        let parked = park_held_slot();

        let mut set = JoinSet::new();
        let mut labels = HashMap::with_capacity(tasks.len());
        for task in tasks {
            let slots = Arc::clone(&self.slots);
            let label = task.label.clone();
            let handle = set.spawn(HELD_SLOT.scope(RefCell::new(None), run_task(slots, task)));
            labels.insert(handle.id(), label);
        }

        let mut outcome = GroupOutcome {
            results: Vec::with_capacity(remaining),
            failures: Vec::new(),
        };

        while let Some(joined) = set.join_next_with_id().await {
            remaining -= 1;
            match joined {
                Ok((_, (_, TaskStatus::Finished, Ok(value)))) => outcome.results.push(value),
                Ok((_, (label, status, result))) => {
                    let reason = match result {
                        Err(err) => {
                            error!(group = %name, task = %label, %status, "{label} generated an exception: {err}");
                            debug!(task = %label, error = ?err, "task failure detail");
                            err.to_string()
                        }
                        Ok(_) => format!("task ended as {status}"),
                    };
                    outcome.failures.push(TaskFailure { label, reason });
                }
                Err(join_err) => {
                    let label = labels.remove(&join_err.id()).unwrap_or_default();
                    error!(group = %name, task = %label, "{label} panicked: {join_err}");
                    outcome.failures.push(TaskFailure {
                        label,
                        reason: join_err.to_string(),
                    });
                }
            }
            debug!(group = %name, remaining, "tasks remaining");
        }

        if let Some(slots) = parked {
            reclaim_slot(slots).await;
        }

        outcome
    }
}

impl Default for TaskPool {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENCY)
    }
}

async fn run_task<T>(slots: Arc<Semaphore>, task: Task<T>) -> (String, TaskStatus, Result<T>) {
    let Task {
        label,
        status,
        work,
    } = task;

    // The semaphore is never closed, so acquiring only fails if it were.
    let permit = slots.acquire_owned().await.ok();
    HELD_SLOT.with(|slot| *slot.borrow_mut() = permit);

    trace!(task = %label, from = %status, to = %TaskStatus::Working, "task started");

    let result = work.await;

    HELD_SLOT.with(|slot| slot.borrow_mut().take());
    let status = if result.is_ok() {
        TaskStatus::Finished
    } else {
        TaskStatus::Failed
    };
    trace!(task = %label, %status, "task done");

    (label, status, result)
}

/// Release the slot of the calling task, if it runs inside a pool.
fn park_held_slot() -> Option<Arc<Semaphore>> {
    let permit = HELD_SLOT
        .try_with(|slot| slot.borrow_mut().take())
        .ok()
        .flatten()?;
    let slots = Arc::clone(permit.semaphore());
    drop(permit);
    Some(slots)
}

async fn reclaim_slot(slots: Arc<Semaphore>) {
    if let Ok(permit) = slots.acquire_owned().await {
        let _ = HELD_SLOT.try_with(|slot| *slot.borrow_mut() = Some(permit));
    }
}
