//! Fixed-size worker pool for one batch of jobs.
//!
//! Workers are scoped threads, so jobs may borrow anything that outlives the enclosing
//! [`std::thread::scope`]: the descriptor table, the shared file and the outcome
//! collector are lent to workers instead of being reference counted.
//!
//! ```text
//!  dispatch thread                        workers (N, named chunk-worker-{i})
//!  ───────────────                        ───────────────────────────────────
//!  submit(job) ──pending += 1──> [ unbounded queue ] ──recv──> run job
//!                                                               │ (panics caught)
//!  wait() <──── condvar ─────── pending -= 1 (after the job) <──┘
//!  shutdown(): close queue, join all
//! ```

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, Scope, ScopedJoinHandle};

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::{Condvar, Mutex};
use thiserror::Error;

/// A unit of work executed by a pool worker.
pub trait Job: Send {
    /// Runs the job to completion on the calling worker thread.
    fn run(self);
}

/// Worker pool lifecycle failures.
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("worker count must be at least 1")]
    NoWorkers,

    #[error("failed to spawn worker {worker}: {source}")]
    Spawn {
        /// Index of the worker that could not be started
        worker: usize,
        #[source]
        source: io::Error,
    },

    #[error("{count} worker thread(s) could not be joined")]
    Join {
        /// Number of workers whose join failed
        count: usize,
    },

    #[error("the work queue is closed")]
    Closed,
}

/// Counters reported when the pool shuts down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub workers: usize,
    /// Jobs that returned normally
    pub completed: u64,
    /// Jobs that panicked
    pub panicked: u64,
}

#[derive(Default)]
struct Shared {
    /// Jobs submitted but not yet finished (queued or running).
    pending: Mutex<usize>,
    idle: Condvar,
    completed: AtomicU64,
    panicked: AtomicU64,
}

impl Shared {
    fn finish_one(&self) {
        let mut pending = self.pending.lock();
        *pending -= 1;
        if *pending == 0 {
            self.idle.notify_all();
        }
    }
}

/// A fixed set of worker threads draining one job queue.
pub struct WorkerPool<'scope, J: Job + 'scope> {
    sender: Option<Sender<J>>,
    workers: Vec<ScopedJoinHandle<'scope, ()>>,
    shared: Arc<Shared>,
}

impl<'scope, J: Job + 'scope> WorkerPool<'scope, J> {
    /// Starts `workers` threads inside `scope`.
    pub fn new<'env>(scope: &'scope Scope<'scope, 'env>, workers: usize) -> Result<Self, PoolError> {
        if workers == 0 {
            return Err(PoolError::NoWorkers);
        }

        let (sender, receiver) = unbounded::<J>();
        let shared = Arc::new(Shared::default());

        let mut handles = Vec::with_capacity(workers);
        for worker in 0..workers {
            let receiver = receiver.clone();
            let shared = Arc::clone(&shared);
            let handle = thread::Builder::new()
                .name(format!("chunk-worker-{worker}"))
                .spawn_scoped(scope, move || worker_loop(&receiver, &shared))
                .map_err(|source| PoolError::Spawn { worker, source })?;
            handles.push(handle);
        }

        log::debug!("Started {workers} worker threads");
        Ok(Self { sender: Some(sender), workers: handles, shared })
    }

    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Queues `job` without blocking.
    pub fn submit(&self, job: J) -> Result<(), PoolError> {
        let sender = self.sender.as_ref().ok_or(PoolError::Closed)?;
        *self.shared.pending.lock() += 1;
        if sender.send(job).is_err() {
            self.shared.finish_one();
            return Err(PoolError::Closed);
        }
        Ok(())
    }

    /// Blocks until every submitted job has finished running.
    pub fn wait(&self) {
        let mut pending = self.shared.pending.lock();
        while *pending > 0 {
            self.shared.idle.wait(&mut pending);
        }
    }

    /// Closes the queue, lets the workers drain it and joins every worker.
    pub fn shutdown(mut self) -> Result<PoolStats, PoolError> {
        drop(self.sender.take());

        let workers = self.workers.len();
        let failed = std::mem::take(&mut self.workers)
            .into_iter()
            .map(ScopedJoinHandle::join)
            .filter(Result::is_err)
            .count();
        if failed > 0 {
            return Err(PoolError::Join { count: failed });
        }

        let stats = PoolStats {
            workers,
            completed: self.shared.completed.load(Ordering::Relaxed),
            panicked: self.shared.panicked.load(Ordering::Relaxed),
        };
        log::debug!(
            "Worker pool shut down: {} jobs completed, {} panicked",
            stats.completed,
            stats.panicked
        );
        Ok(stats)
    }
}

fn worker_loop<J: Job>(receiver: &Receiver<J>, shared: &Shared) {
    while let Ok(job) = receiver.recv() {
        match panic::catch_unwind(AssertUnwindSafe(|| job.run())) {
            Ok(()) => {
                shared.completed.fetch_add(1, Ordering::Relaxed);
            }
            Err(payload) => {
                log::error!(
                    "Job panicked on {}: {}",
                    thread::current().name().unwrap_or("unnamed worker"),
                    panic_message(payload.as_ref())
                );
                shared.panicked.fetch_add(1, Ordering::Relaxed);
            }
        }
        shared.finish_one();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashSet;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    struct CountJob<'a> {
        counter: &'a AtomicUsize,
        delay: Duration,
    }

    impl Job for CountJob<'_> {
        fn run(self) {
            thread::sleep(self.delay);
            self.counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    enum MaybePanic<'a> {
        Count(&'a AtomicUsize),
        Panic,
    }

    impl Job for MaybePanic<'_> {
        fn run(self) {
            match self {
                Self::Count(counter) => {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
                Self::Panic => panic!("boom"),
            }
        }
    }

    struct NameJob<'a> {
        names: &'a Mutex<HashSet<String>>,
    }

    impl Job for NameJob<'_> {
        fn run(self) {
            let name = thread::current().name().unwrap_or_default().to_string();
            thread::sleep(Duration::from_millis(5));
            self.names.lock().insert(name);
        }
    }

    #[rstest]
    #[case::one_worker(1)]
    #[case::four_workers(4)]
    #[case::more_workers_than_jobs(64)]
    fn test_wait_returns_after_every_job(#[case] workers: usize) {
        let counter = AtomicUsize::new(0);
        thread::scope(|scope| {
            let pool = WorkerPool::new(scope, workers).unwrap();
            for _ in 0..32 {
                pool.submit(CountJob { counter: &counter, delay: Duration::from_millis(1) }).unwrap();
            }
            pool.wait();
            assert_eq!(counter.load(Ordering::SeqCst), 32);

            let stats = pool.shutdown().unwrap();
            assert_eq!(stats, PoolStats { workers, completed: 32, panicked: 0 });
        });
    }

    #[test]
    fn test_wait_with_nothing_submitted() {
        thread::scope(|scope| {
            let pool: WorkerPool<'_, CountJob<'_>> = WorkerPool::new(scope, 2).unwrap();
            pool.wait();
            assert_eq!(pool.shutdown().unwrap().completed, 0);
        });
    }

    #[test]
    fn test_pool_reusable_after_wait() {
        let counter = AtomicUsize::new(0);
        thread::scope(|scope| {
            let pool = WorkerPool::new(scope, 3).unwrap();
            for round in 1..=3 {
                for _ in 0..10 {
                    pool.submit(CountJob { counter: &counter, delay: Duration::ZERO }).unwrap();
                }
                pool.wait();
                assert_eq!(counter.load(Ordering::SeqCst), round * 10);
            }
            pool.shutdown().unwrap();
        });
    }

    #[test]
    fn test_panicking_job_is_isolated() {
        let counter = AtomicUsize::new(0);
        thread::scope(|scope| {
            let pool = WorkerPool::new(scope, 2).unwrap();
            for i in 0..20 {
                let job = if i % 5 == 0 { MaybePanic::Panic } else { MaybePanic::Count(&counter) };
                pool.submit(job).unwrap();
            }
            pool.wait();
            assert_eq!(counter.load(Ordering::SeqCst), 16);

            let stats = pool.shutdown().unwrap();
            assert_eq!(stats.completed, 16);
            assert_eq!(stats.panicked, 4);
        });
    }

    #[test]
    fn test_zero_workers_rejected() {
        thread::scope(|scope| {
            let result: Result<WorkerPool<'_, CountJob<'_>>, _> = WorkerPool::new(scope, 0);
            assert!(matches!(result, Err(PoolError::NoWorkers)));
        });
    }

    #[test]
    fn test_workers_are_named() {
        let names = Mutex::new(HashSet::new());
        thread::scope(|scope| {
            let pool = WorkerPool::new(scope, 2).unwrap();
            assert_eq!(pool.worker_count(), 2);
            for _ in 0..16 {
                pool.submit(NameJob { names: &names }).unwrap();
            }
            pool.wait();
            pool.shutdown().unwrap();
        });
        let names = names.into_inner();
        assert!(!names.is_empty());
        assert!(names.iter().all(|n| n.starts_with("chunk-worker-")));
    }

    #[test]
    fn test_shutdown_drains_queue() {
        let counter = AtomicUsize::new(0);
        thread::scope(|scope| {
            let pool = WorkerPool::new(scope, 2).unwrap();
            for _ in 0..50 {
                pool.submit(CountJob { counter: &counter, delay: Duration::ZERO }).unwrap();
            }
            let stats = pool.shutdown().unwrap();
            assert_eq!(stats.completed, 50);
        });
        assert_eq!(counter.load(Ordering::SeqCst), 50);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(payload.as_ref()), "static message");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(panic_message(payload.as_ref()), "owned message");
        let payload: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
