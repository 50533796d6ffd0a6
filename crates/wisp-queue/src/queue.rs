/// Keyed single-flight job queue.
///
/// Per key the state machine is `absent -> running -> absent`. There is no
/// failed resting state: a job's key is removed the moment it settles,
/// whatever the outcome, and before any waiter observes the result.
use std::any::Any;
use std::collections::HashMap;
use std::error::Error;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{self, BoxFuture, Either, FutureExt, Shared};
use tokio::sync::oneshot;

use crate::error::JobError;

/// Shareable handle to one running job.
type SharedJob<T> = Shared<BoxFuture<'static, Result<T, JobError>>>;

/// In-flight jobs, type-erased so each call picks its own result type.
type JobIndex = HashMap<String, Box<dyn Any + Send>>;

/// Deduplicates concurrent async work by key.
///
/// Cloning the queue is cheap and every clone shares the same index.
///
/// # Example
/// ```ignore
/// let queue = KeyedJobQueue::new();
/// let first = queue.submit("convo-1", || async { Ok::<_, std::io::Error>(1) });
/// let second = queue.submit("convo-1", || async { Ok::<_, std::io::Error>(2) });
/// assert_eq!(first.await?, 1);
/// assert_eq!(second.await?, 1); // joined the first job
/// ```
#[derive(Clone, Default)]
pub struct KeyedJobQueue {
    jobs: Arc<Mutex<JobIndex>>,
}

impl KeyedJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `work` under `key`, or join the job already running under `key`.
    ///
    /// The job is registered before this returns, so `has(key)` is true
    /// immediately. Work is spawned on the current tokio runtime and runs to
    /// completion even if every caller drops its future. When a job is
    /// already running, `work` is dropped without being called.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn submit<T, E, F, Fut>(
        &self,
        key: impl Into<String>,
        work: F,
    ) -> impl Future<Output = Result<T, JobError>> + Send + 'static
    where
        T: Clone + Send + Sync + 'static,
        E: Into<Box<dyn Error + Send + Sync>>,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let key = key.into();
        // Lookup and registration happen under one lock so two racing
        // submitters can never both start work for the same key.
        let mut jobs = self.lock();

        if let Some(existing) = jobs.get(&key) {
            return match existing.downcast_ref::<SharedJob<T>>() {
                Some(job) => {
                    tracing::debug!(key = %key, "joining in-flight job");
                    Either::Left(job.clone())
                }
                None => {
                    tracing::warn!(key = %key, "in-flight job has a different result type");
                    Either::Right(future::ready(Err(JobError::TypeMismatch { key })))
                }
            };
        }

        let (tx, rx) = oneshot::channel();
        let cancel_key = key.clone();
        let job: SharedJob<T> = async move {
            rx.await
                .unwrap_or_else(|_| Err(JobError::Cancelled { key: cancel_key }))
        }
        .boxed()
        .shared();

        tracing::debug!(key = %key, "job started");
        jobs.insert(key.clone(), Box::new(job.clone()));
        // Spawn only once the index is unlocked: a runtime that is shutting
        // down drops the task in place, and its guard needs the lock.
        drop(jobs);

        let guard = SettleGuard {
            jobs: Arc::clone(&self.jobs),
            key: key.clone(),
        };
        tokio::spawn(async move {
            let outcome = AssertUnwindSafe(async move { work().await })
                .catch_unwind()
                .await;
            let result = match outcome {
                Ok(result) => result.map_err(JobError::failed),
                Err(_) => Err(JobError::Panicked { key }),
            };
            drop(guard);
            let _ = tx.send(result);
        });

        Either::Left(job)
    }

    /// Synchronous flavour of [`submit`](Self::submit).
    ///
    /// Errors and panics from `work` settle the job exactly like their
    /// async counterparts.
    pub fn submit_sync<T, E, F>(
        &self,
        key: impl Into<String>,
        work: F,
    ) -> impl Future<Output = Result<T, JobError>> + Send + 'static
    where
        T: Clone + Send + Sync + 'static,
        E: Into<Box<dyn Error + Send + Sync>> + Send + 'static,
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        self.submit(key, move || future::ready(work()))
    }

    /// Whether a job is currently running under `key`.
    pub fn has(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    /// Number of jobs currently running.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, JobIndex> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for KeyedJobQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyedJobQueue")
            .field("in_flight", &self.len())
            .finish()
    }
}

/// Clears a job's key when its task ends, including on panic or cancellation.
///
/// Dropped inside the spawned task before the result is sent, so the key is
/// gone before any waiter sees the result.
struct SettleGuard {
    jobs: Arc<Mutex<JobIndex>>,
    key: String,
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        let removed = self
            .jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
        drop(removed);
        tracing::trace!(key = %self.key, "job settled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, thiserror::Error)]
    #[error("failed")]
    struct Failed;

    #[tokio::test]
    async fn has_tracks_running_job() {
        let queue = KeyedJobQueue::new();
        assert!(!queue.has("job"));

        let job = queue.submit("job", || async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            Ok::<_, Failed>(())
        });
        assert!(queue.has("job"));

        job.await.expect("job succeeds");
        assert!(!queue.has("job"));
    }

    #[tokio::test]
    async fn returns_result_of_job() {
        let queue = KeyedJobQueue::new();
        let value = queue
            .submit("k", || async { Ok::<_, Failed>("success") })
            .await
            .expect("ok");
        assert_eq!(value, "success");
    }

    #[tokio::test]
    async fn sync_work_settles_like_async_work() {
        let queue = KeyedJobQueue::new();
        let ok = queue.submit_sync("a", || Ok::<_, Failed>(7u32));
        let err = queue.submit_sync("b", || Err::<u32, _>(Failed));

        assert_eq!(ok.await.expect("ok"), 7);
        let err = err.await.expect_err("sync failure");
        assert!(err.failure().is_some());
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn duplicate_submit_does_not_call_work() {
        let queue = KeyedJobQueue::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let c1 = Arc::clone(&calls);
        let first = queue.submit("same", move || async move {
            c1.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok::<_, Failed>(1u8)
        });
        let c2 = Arc::clone(&calls);
        let second = queue.submit("same", move || async move {
            c2.fetch_add(1, Ordering::SeqCst);
            Ok::<_, Failed>(2u8)
        });

        assert_eq!(first.await.expect("first"), 1);
        assert_eq!(second.await.expect("second"), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn mismatched_type_is_rejected() {
        let queue = KeyedJobQueue::new();
        let first = queue.submit("k", || async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok::<_, Failed>(1u32)
        });
        let second = queue.submit("k", || async { Ok::<_, Failed>("text") });

        let err = second.await.expect_err("type mismatch");
        assert!(matches!(err, JobError::TypeMismatch { ref key } if key == "k"));
        assert_eq!(first.await.expect("first"), 1);
    }

    #[tokio::test]
    async fn panicking_work_clears_key() {
        let queue = KeyedJobQueue::new();
        let job = queue.submit_sync("boom", || -> Result<(), Failed> { panic!("bad work") });

        let err = job.await.expect_err("panic surfaces as error");
        assert!(matches!(err, JobError::Panicked { .. }));
        assert!(!queue.has("boom"));
    }

    #[tokio::test]
    async fn job_runs_even_if_caller_drops_future() {
        let queue = KeyedJobQueue::new();
        let (tx, rx) = tokio::sync::oneshot::channel();

        drop(queue.submit("detached", move || async move {
            let _ = tx.send(42u8);
            Ok::<_, Failed>(())
        }));

        assert_eq!(rx.await.expect("work ran"), 42);
    }

    #[tokio::test]
    async fn clones_share_the_index() {
        let queue = KeyedJobQueue::new();
        let other = queue.clone();
        let job = queue.submit("shared", || async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok::<_, Failed>(())
        });
        assert!(other.has("shared"));
        assert_eq!(other.len(), 1);
        job.await.expect("ok");
        assert!(other.is_empty());
    }
}
