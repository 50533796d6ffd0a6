/// Integration tests: KeyedJobQueue concurrency guarantees.
///
/// Uses tokio's paused clock so the timing assertions are deterministic.
use std::time::Duration;

use tokio::time::{sleep, Instant};
use wisp_queue::{JobError, KeyedJobQueue};

#[derive(Debug, thiserror::Error)]
#[error("failed")]
struct Failed;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wisp_queue=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

fn job_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Distinct keys run concurrently: wall time tracks the slowest job,
/// not the sum of all of them.
#[tokio::test(start_paused = true)]
async fn distinct_keys_run_concurrently() {
    init_tracing();
    let queue = KeyedJobQueue::new();

    let delayed = |value: u32, ms: u64| {
        queue.submit(job_id(), move || async move {
            sleep(Duration::from_millis(ms)).await;
            Ok::<_, Failed>(value)
        })
    };

    let start = Instant::now();
    let (a, b, c) = tokio::join!(delayed(10, 10), delayed(20, 8), delayed(30, 2));
    let elapsed = start.elapsed();

    assert_eq!(a.expect("a"), 10);
    assert_eq!(b.expect("b"), 20);
    assert_eq!(c.expect("c"), 30);
    assert!(elapsed >= Duration::from_millis(10), "took {elapsed:?}");
    assert!(elapsed < Duration::from_millis(20), "took {elapsed:?}");
}

/// A second submit under a pending key resolves to the first job's value.
#[tokio::test(start_paused = true)]
async fn same_key_shares_first_result() {
    init_tracing();
    let queue = KeyedJobQueue::new();
    let id = job_id();

    let first = queue.submit(id.clone(), || async {
        sleep(Duration::from_millis(10)).await;
        Ok::<_, Failed>("job1")
    });
    let second = queue.submit_sync(id.clone(), || Ok::<_, Failed>("job2"));

    assert_eq!(first.await.expect("first"), "job1");
    assert_eq!(second.await.expect("second"), "job1");
}

/// `has` is true strictly while running, for success and failure alike.
#[tokio::test(start_paused = true)]
async fn completed_jobs_are_removed() {
    init_tracing();
    let queue = KeyedJobQueue::new();
    let id = job_id();

    let success = queue.submit(id.clone(), || async {
        sleep(Duration::from_millis(10)).await;
        Ok::<_, Failed>(())
    });
    assert!(queue.has(&id));
    success.await.expect("success");
    assert!(!queue.has(&id));

    let failure = queue.submit(id.clone(), || async {
        sleep(Duration::from_millis(10)).await;
        Err::<(), _>(Failed)
    });
    assert!(queue.has(&id));
    let err = failure.await.expect_err("failure");
    assert_eq!(err.to_string(), "job failed: failed");
    assert!(!queue.has(&id));
}

/// Every waiter of a failed job sees the same error, and a retry after
/// the failure runs fresh work instead of replaying the stale error.
#[tokio::test(start_paused = true)]
async fn retry_after_failure_starts_fresh_work() {
    init_tracing();
    let queue = KeyedJobQueue::new();
    let id = job_id();

    let first = queue.submit(id.clone(), || async {
        sleep(Duration::from_millis(5)).await;
        Err::<u8, _>(Failed)
    });
    let joined = queue.submit(id.clone(), || async { Ok::<u8, Failed>(99) });

    let (first, joined) = tokio::join!(first, joined);
    let first = first.expect_err("first fails");
    let joined = joined.expect_err("joined waiter sees the same failure");
    let (JobError::Failed(a), JobError::Failed(b)) = (&first, &joined) else {
        panic!("expected Failed, got {first:?} / {joined:?}");
    };
    assert!(std::sync::Arc::ptr_eq(a, b));

    let retry = queue.submit(id.clone(), || async { Ok::<u8, Failed>(7) });
    assert_eq!(retry.await.expect("retry"), 7);
}

/// The key is already gone by the time a waiter observes the result.
#[tokio::test(start_paused = true)]
async fn key_cleared_before_result_delivered() {
    init_tracing();
    let queue = KeyedJobQueue::new();
    let observer = queue.clone();

    let job = queue.submit("observed", || async {
        sleep(Duration::from_millis(3)).await;
        Ok::<_, Failed>(())
    });
    job.await.expect("ok");
    assert!(!observer.has("observed"));
    assert!(observer.is_empty());
}

/// Many concurrent submitters on one key still execute the work once.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_submitters_execute_once() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    init_tracing();
    let queue = KeyedJobQueue::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let (release_tx, release_rx) = tokio::sync::watch::channel(false);
    let (submitted_tx, mut submitted_rx) = tokio::sync::mpsc::channel(32);
    let mut tasks = Vec::new();

    for _ in 0..32 {
        let queue = queue.clone();
        let calls = Arc::clone(&calls);
        let mut release = release_rx.clone();
        let submitted = submitted_tx.clone();
        tasks.push(tokio::spawn(async move {
            let job = queue.submit("hot-key", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                let _ = release.wait_for(|open| *open).await;
                Ok::<_, Failed>(1u8)
            });
            let _ = submitted.send(()).await;
            job.await
        }));
    }

    // Hold the job open until every task has submitted.
    for _ in 0..32 {
        submitted_rx.recv().await.expect("task submitted");
    }
    release_tx.send(true).expect("release");

    for task in tasks {
        assert_eq!(task.await.expect("join").expect("job"), 1);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(queue.is_empty());
}

type SlotJob = futures::future::BoxFuture<'static, Result<u32, JobError>>;

/// Submits a job from its destructor, i.e. while the runtime tears down
/// the task that owns it.
struct SubmitOnDrop {
    queue: KeyedJobQueue,
    slot: std::sync::Arc<std::sync::Mutex<Option<SlotJob>>>,
}

impl Drop for SubmitOnDrop {
    fn drop(&mut self) {
        use futures::FutureExt;
        let job = self.queue.submit_sync("late", || Ok::<_, Failed>(1u32));
        *self.slot.lock().unwrap() = Some(job.boxed());
    }
}

/// A submit racing runtime shutdown returns, clears its key, and reports
/// the job as cancelled.
#[test]
fn submit_during_runtime_shutdown_is_cancelled() {
    init_tracing();
    let queue = KeyedJobQueue::new();
    let slot = std::sync::Arc::new(std::sync::Mutex::new(None));
    let (done_tx, done_rx) = std::sync::mpsc::channel();

    {
        let queue = queue.clone();
        let slot = std::sync::Arc::clone(&slot);
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("runtime");
            let holder = SubmitOnDrop { queue, slot };
            runtime.spawn(async move {
                let _holder = holder;
                std::future::pending::<()>().await;
            });
            runtime.block_on(tokio::task::yield_now());
            drop(runtime);
            let _ = done_tx.send(());
        });
    }

    done_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("runtime shutdown completes");
    assert!(queue.is_empty());

    let job = slot.lock().unwrap().take().expect("submitted during shutdown");
    let err = futures::executor::block_on(job).expect_err("job never ran");
    assert!(matches!(err, JobError::Cancelled { ref key } if key == "late"));
}
