//! Bounded worker pool for layer jobs.
//!
//! Jobs run on a fixed set of OS threads; each job occupies one worker
//! for its full duration, since backend calls block on network I/O. The
//! pool drives every job through the [`ResilientJobRunner`], so queued
//! work gets the same validation, breaker gate and fallback as direct
//! calls. Results travel through the jobs' lifecycle notifications; the
//! pool only logs them.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::{debug, info, warn};

use crate::job::{LayerJob, ResilientJobRunner};

/// Fixed-size pool of worker threads pulling jobs from a shared queue.
pub struct WorkerPool {
    sender: Option<mpsc::Sender<Box<dyn LayerJob>>>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `size` workers (at least one) executing through `runner`.
    pub fn new(size: usize, runner: Arc<ResilientJobRunner>) -> Self {
        let size = size.max(1);
        let (sender, receiver) = mpsc::channel::<Box<dyn LayerJob>>();
        let receiver = Arc::new(Mutex::new(receiver));

        let mut workers = Vec::with_capacity(size);
        for worker_id in 0..size {
            let receiver = Arc::clone(&receiver);
            let runner = Arc::clone(&runner);
            workers.push(thread::spawn(move || {
                loop {
                    // Hold the receiver lock only while dequeuing, never
                    // while the job runs.
                    let job = {
                        let guard = receiver.lock().unwrap();
                        guard.recv()
                    };
                    let Ok(job) = job else {
                        debug!(worker_id, "job channel closed, worker exiting");
                        break;
                    };

                    let key = job.key();
                    match runner.execute(job.as_ref()) {
                        Ok(_) => debug!(worker_id, job_id = %key, "job finished"),
                        Err(err) => {
                            warn!(worker_id, job_id = %key, error = %err, "job failed")
                        }
                    }
                }
            }));
        }

        info!(workers = size, "worker pool started");
        Self {
            sender: Some(sender),
            workers,
        }
    }

    /// Queue a job for execution. Returns `false` if the pool is already
    /// shut down.
    pub fn submit(&self, job: Box<dyn LayerJob>) -> bool {
        match &self.sender {
            Some(sender) => sender.send(job).is_ok(),
            None => false,
        }
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Close the intake and wait for queued and in-flight jobs to finish.
    pub fn shutdown(mut self) {
        self.shutdown_inner();
    }

    fn shutdown_inner(&mut self) {
        if self.sender.take().is_some() {
            info!("worker pool shutting down");
        }
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!("worker thread panicked");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown_inner();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breaker::CircuitBreakerRegistry;
    use crate::job::{AllowAllValidator, JobError, ResilientJobRunner};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingJob {
        completed: Arc<AtomicUsize>,
    }

    impl LayerJob for CountingJob {
        fn layer_id(&self) -> &str {
            "42"
        }
        fn job_type(&self) -> &str {
            "normal"
        }
        fn run(&self) -> Result<String, JobError> {
            thread::sleep(Duration::from_millis(5));
            Ok("done".to_string())
        }
        fn terminate(&self) {}
        fn notify_start(&self) {}
        fn notify_completed(&self, success: bool) {
            if success {
                self.completed.fetch_add(1, Ordering::SeqCst);
            }
        }
        fn notify_error(&self) {}
    }

    fn test_runner() -> Arc<ResilientJobRunner> {
        Arc::new(ResilientJobRunner::new(
            Arc::new(AllowAllValidator),
            Arc::new(CircuitBreakerRegistry::with_defaults()),
        ))
    }

    #[test]
    fn test_pool_runs_submitted_jobs() {
        let pool = WorkerPool::new(2, test_runner());
        let completed = Arc::new(AtomicUsize::new(0));

        for _ in 0..8 {
            let accepted = pool.submit(Box::new(CountingJob {
                completed: Arc::clone(&completed),
            }));
            assert!(accepted);
        }
        pool.shutdown();

        assert_eq!(completed.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn test_pool_minimum_one_worker() {
        let pool = WorkerPool::new(0, test_runner());
        assert_eq!(pool.worker_count(), 1);
    }

    #[test]
    fn test_drop_joins_workers() {
        let completed = Arc::new(AtomicUsize::new(0));
        {
            let pool = WorkerPool::new(3, test_runner());
            for _ in 0..6 {
                pool.submit(Box::new(CountingJob {
                    completed: Arc::clone(&completed),
                }));
            }
            // Dropped here without an explicit shutdown.
        }
        assert_eq!(completed.load(Ordering::SeqCst), 6);
    }
}
