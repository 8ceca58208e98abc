//! Bounded concurrent task group.
//!
//! [`TaskGroup`] runs one unit of work per submitted item on a rayon pool sized
//! to the configured concurrency, waits for all of them and reports the first
//! error. Once a unit fails, units that have not started yet are skipped; units
//! already running finish normally.

use crate::config::MAX_CONCURRENCY;
use crate::error::{ExprError, Result};
use rayon::{ScopeFifo, ThreadPool, ThreadPoolBuilder};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Error-collecting group of concurrently executed tasks.
///
/// A positive concurrency creates a dedicated pool with that many threads.
/// Zero or a negative value runs tasks on the global rayon pool, without a
/// group-specific bound.
///
/// # Example
///
/// ```rust
/// use expr_match::task_group::TaskGroup;
///
/// let group = TaskGroup::new(4)?;
/// let outcome: Result<(), String> = group.for_each(0..10, |n| {
///     if n == 7 { Err(format!("task {n} failed")) } else { Ok(()) }
/// });
/// assert_eq!(outcome, Err("task 7 failed".to_string()));
/// # Ok::<(), expr_match::ExprError>(())
/// ```
#[derive(Clone)]
pub struct TaskGroup {
    pool: Option<Arc<ThreadPool>>,
}

impl TaskGroup {
    pub fn new(concurrency: i64) -> Result<Self> {
        Self::with_thread_name(concurrency, "task-group")
    }

    /// Create a group whose worker threads are named `{prefix}-{index}`.
    ///
    /// Fails with `TaskPool` when `concurrency` exceeds [`MAX_CONCURRENCY`].
    pub fn with_thread_name(concurrency: i64, prefix: &str) -> Result<Self> {
        if concurrency <= 0 {
            return Ok(Self::unbounded());
        }
        if concurrency > MAX_CONCURRENCY {
            return Err(ExprError::TaskPool(format!(
                "concurrency {concurrency} exceeds the maximum of {MAX_CONCURRENCY}"
            )));
        }
        let threads = usize::try_from(concurrency).map_err(|err| {
            ExprError::TaskPool(format!("invalid concurrency {concurrency}: {err}"))
        })?;

        let prefix = prefix.to_string();
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(move |index| format!("{prefix}-{index}"))
            .build()?;

        Ok(Self {
            pool: Some(Arc::new(pool)),
        })
    }

    pub fn unbounded() -> Self {
        Self { pool: None }
    }

    /// Maximum number of tasks run at once, `None` when unbounded.
    pub fn concurrency(&self) -> Option<usize> {
        self.pool.as_ref().map(|pool| pool.current_num_threads())
    }

    /// Run `task` once per item and block until every started task finished.
    ///
    /// Tasks start in submission order. The first error is returned; errors
    /// from other tasks are discarded. Panics inside a task propagate to the
    /// caller once the group has drained.
    pub fn for_each<I, F, E>(&self, items: I, task: F) -> std::result::Result<(), E>
    where
        I: IntoIterator,
        I::Item: Send,
        F: Fn(I::Item) -> std::result::Result<(), E> + Sync,
        E: Send,
    {
        let items: Vec<I::Item> = items.into_iter().collect();
        if items.is_empty() {
            return Ok(());
        }

        let state = GroupState {
            failed: AtomicBool::new(false),
            first_error: Mutex::new(None),
        };

        match &self.pool {
            Some(pool) => pool.scope_fifo(|scope| spawn_all(scope, items, &task, &state)),
            None => rayon::scope_fifo(|scope| spawn_all(scope, items, &task, &state)),
        }

        match state
            .first_error
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
        {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for TaskGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskGroup")
            .field("concurrency", &self.concurrency())
            .finish()
    }
}

struct GroupState<E> {
    failed: AtomicBool,
    first_error: Mutex<Option<E>>,
}

impl<E> GroupState<E> {
    fn record(&self, err: E) {
        let mut slot = self
            .first_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(err);
        }
        self.failed.store(true, Ordering::Release);
    }

    fn has_failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }
}

fn spawn_all<'scope, T, F, E>(
    scope: &ScopeFifo<'scope>,
    items: Vec<T>,
    task: &'scope F,
    state: &'scope GroupState<E>,
) where
    T: Send + 'scope,
    F: Fn(T) -> std::result::Result<(), E> + Sync,
    E: Send,
{
    for item in items {
        if state.has_failed() {
            break;
        }
        scope.spawn_fifo(move |_| {
            if state.has_failed() {
                return;
            }
            if let Err(err) = task(item) {
                state.record(err);
            }
        });
    }
}
