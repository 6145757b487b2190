//! Worker pool dispatch: W fixed workers pull jobs from a closable channel
//! and push exactly one result per job into a sink that a completion
//! watcher closes exactly once, after every worker has terminated.
//!
//! The close protocol is the channel-native one: a source or sink is
//! "closed" when its last sender is dropped, and a receive loop keeps
//! draining in-flight items after closure before it observes disconnect.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam::channel::{bounded, unbounded, Receiver, Sender};

use crate::error::PoolError;
use crate::job::{Job, JobId, JobResult, Outcome};

/// Everything one worker needs, handed over by value at spawn time so no
/// loop variable is ever captured by accident.
struct WorkerContext<T, R, E, F> {
    index: usize,
    jobs: Receiver<Job<T>>,
    results: Sender<JobResult<R, E>>,
    task: Arc<F>,
}

impl<T, R, E, F> WorkerContext<T, R, E, F>
where
    F: Fn(&T) -> Result<R, E>,
{
    /// Worker loop: pull, run, push, repeat. Terminates once the job
    /// source is closed and drained. A task panic is contained and
    /// reported as that job's outcome.
    fn run(self) {
        tracing::debug!(worker = self.index, "worker started");

        for job in self.jobs.iter() {
            tracing::trace!(worker = self.index, job = %job.id, "job taken");
            let started = Instant::now();
            let task = self.task.as_ref();
            let outcome =
                match panic::catch_unwind(AssertUnwindSafe(|| task(&job.payload))) {
                    Ok(Ok(value)) => Outcome::Success(value),
                    Ok(Err(err)) => Outcome::Failure(err),
                    Err(payload) => Outcome::Panicked(panic_message(&payload)),
                };

            let result = JobResult {
                job_id: job.id,
                outcome,
                elapsed: started.elapsed(),
            };

            // Fails only if the collector is gone; nothing left to do then.
            if self.results.send(result).is_err() {
                break;
            }
        }

        tracing::debug!(worker = self.index, "worker shut down");
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked".to_string()
    }
}

/// A fixed-size pool of worker threads behind a job channel.
///
/// Submit payloads with [`submit`](WorkerPool::submit), then call
/// [`finish`](WorkerPool::finish) to close the job source and iterate the
/// results. Exactly one [`JobResult`] comes back per submitted job, in
/// unspecified order; pair them up via [`JobId`].
///
/// The pool size is fixed at construction and never resized. Dropping the
/// pool without calling `finish` also shuts the workers down cleanly; any
/// undelivered results are discarded with it.
pub struct WorkerPool<T, R, E> {
    jobs: Sender<Job<T>>,
    results: Receiver<JobResult<R, E>>,
    watcher: JoinHandle<()>,
    next_id: u64,
}

impl<T, R, E> WorkerPool<T, R, E>
where
    T: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
{
    /// Starts `workers` threads over an unbounded job channel.
    pub fn start<F>(workers: usize, task: F) -> Result<Self, PoolError>
    where
        F: Fn(&T) -> Result<R, E> + Send + Sync + 'static,
    {
        let (job_tx, job_rx) = unbounded();
        Self::build(workers, task, job_tx, job_rx)
    }

    /// Starts `workers` threads over a job channel holding at most
    /// `capacity` queued jobs; `submit` blocks once the buffer is full.
    pub fn start_bounded<F>(workers: usize, capacity: usize, task: F) -> Result<Self, PoolError>
    where
        F: Fn(&T) -> Result<R, E> + Send + Sync + 'static,
    {
        let (job_tx, job_rx) = bounded(capacity);
        Self::build(workers, task, job_tx, job_rx)
    }

    fn build<F>(
        workers: usize,
        task: F,
        job_tx: Sender<Job<T>>,
        job_rx: Receiver<Job<T>>,
    ) -> Result<Self, PoolError>
    where
        F: Fn(&T) -> Result<R, E> + Send + Sync + 'static,
    {
        if workers == 0 {
            return Err(PoolError::InvalidWorkerCount(workers));
        }

        let (result_tx, result_rx) = unbounded();
        let task = Arc::new(task);

        let mut handles = Vec::with_capacity(workers);
        for index in 0..workers {
            let ctx = WorkerContext {
                index,
                jobs: job_rx.clone(),
                results: result_tx.clone(),
                task: Arc::clone(&task),
            };
            let handle = thread::Builder::new()
                .name(format!("fanout-worker-{index}"))
                .spawn(move || ctx.run())?;
            handles.push(handle);
        }

        // Completion watcher: waits for every worker to terminate, then
        // drops the last result sender so the sink closes exactly once.
        // Runs alongside collection, so a collector draining the sink is
        // what lets the final workers push their last results.
        let watcher = thread::Builder::new()
            .name("fanout-watcher".to_string())
            .spawn(move || {
                for handle in handles {
                    if handle.join().is_err() {
                        tracing::error!("worker thread died outside a job");
                    }
                }
                tracing::debug!("all workers terminated, closing result sink");
                drop(result_tx);
            })?;

        Ok(Self {
            jobs: job_tx,
            results: result_rx,
            watcher,
            next_id: 0,
        })
    }

    /// Enqueues one payload and returns the id its result will carry.
    /// Blocks when the pool was started with a bounded job buffer and the
    /// buffer is full.
    pub fn submit(&mut self, payload: T) -> Result<JobId, PoolError> {
        let id = JobId(self.next_id);
        self.next_id += 1;
        self.jobs
            .send(Job { id, payload })
            .map_err(|_| PoolError::Disconnected)?;
        Ok(id)
    }

    /// Closes the job source and hands back the result stream.
    ///
    /// Every job submitted before this call is still delivered: closing
    /// means closed-and-drained, workers keep pulling until the channel is
    /// empty. The returned iterator ends once the watcher has closed the
    /// sink and the last in-flight result has been received.
    pub fn finish(self) -> Results<R, E> {
        drop(self.jobs);
        Results {
            results: self.results,
            watcher: Some(self.watcher),
        }
    }
}

/// Iterator over a finished pool's results; see [`WorkerPool::finish`].
pub struct Results<R, E> {
    results: Receiver<JobResult<R, E>>,
    watcher: Option<JoinHandle<()>>,
}

impl<R, E> Iterator for Results<R, E> {
    type Item = JobResult<R, E>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.results.recv() {
            Ok(result) => Some(result),
            Err(_) => {
                // Sink closed and drained; reap the watcher thread.
                if let Some(watcher) = self.watcher.take() {
                    let _ = watcher.join();
                }
                None
            }
        }
    }
}

/// Batch form of the pool: feeds every job, waits for full completion, and
/// returns all results (order unspecified).
///
/// Produces exactly as many results as there were jobs. A failing task
/// invocation is captured in its [`JobResult`] and never aborts the batch.
pub fn run_pool<T, R, E, F, I>(jobs: I, workers: usize, task: F) -> Result<Vec<JobResult<R, E>>, PoolError>
where
    T: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
    F: Fn(&T) -> Result<R, E> + Send + Sync + 'static,
    I: IntoIterator<Item = T>,
{
    let mut pool = WorkerPool::start(workers, task)?;
    for payload in jobs {
        pool.submit(payload)?;
    }
    Ok(pool.finish().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    fn double(n: &u64) -> Result<u64, String> {
        Ok(n * 2)
    }

    #[test]
    fn every_job_yields_exactly_one_result() {
        for jobs in [0u64, 8, 100] {
            let results = run_pool(0..jobs, 4, double).unwrap();
            assert_eq!(results.len(), jobs as usize);

            let ids: HashSet<JobId> = results.iter().map(|r| r.job_id).collect();
            assert_eq!(ids.len(), jobs as usize, "result ids must be distinct");
        }
    }

    #[test]
    fn results_pair_with_their_jobs() {
        // Submit ids are sequential, so job k carried payload k.
        let results = run_pool(0u64..50, 3, double).unwrap();
        for result in results {
            let input = result.job_id.as_u64();
            assert_eq!(result.into_success(), Some(input * 2));
        }
    }

    #[test]
    fn no_job_is_processed_twice() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);

        let results = run_pool(0u64..200, 8, move |n: &u64| {
            recorder.lock().unwrap().push(*n);
            Ok::<u64, String>(*n)
        })
        .unwrap();
        assert_eq!(results.len(), 200);

        let mut inputs = seen.lock().unwrap().clone();
        inputs.sort_unstable();
        let expected: Vec<u64> = (0..200).collect();
        assert_eq!(inputs, expected, "each job must be run exactly once");
    }

    #[test]
    fn one_failure_does_not_stop_the_pool() {
        let results = run_pool(0u64..40, 4, |n: &u64| {
            if *n == 17 {
                Err(format!("job {n} refused"))
            } else {
                Ok(*n)
            }
        })
        .unwrap();

        assert_eq!(results.len(), 40);
        let failed: Vec<_> = results.iter().filter(|r| !r.is_success()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].job_id.as_u64(), 17);
    }

    #[test]
    fn panicking_task_is_contained() {
        let results = run_pool(0u64..10, 2, |n: &u64| {
            if *n == 5 {
                panic!("job five exploded");
            }
            Ok::<u64, String>(*n)
        })
        .unwrap();

        assert_eq!(results.len(), 10);
        let panicked: Vec<_> = results
            .iter()
            .filter(|r| matches!(&r.outcome, Outcome::Panicked(_)))
            .collect();
        assert_eq!(panicked.len(), 1);
        match &panicked[0].outcome {
            Outcome::Panicked(msg) => assert!(msg.contains("exploded")),
            _ => unreachable!(),
        }
    }

    #[test]
    fn pool_size_does_not_change_the_result_multiset() {
        let collect_sorted = |workers: usize| -> Vec<u64> {
            let mut values: Vec<u64> = run_pool(0u64..100, workers, double)
                .unwrap()
                .into_iter()
                .map(|r| r.into_success().unwrap())
                .collect();
            values.sort_unstable();
            values
        };

        assert_eq!(collect_sorted(1), collect_sorted(10));
    }

    #[test]
    fn more_workers_than_jobs_terminates_cleanly() {
        // 8 jobs across 10 workers: the idle workers must exit on the
        // empty-and-closed source without holding the sink open.
        let results = run_pool(0u64..8, 10, double).unwrap();
        assert_eq!(results.len(), 8);
    }

    #[test]
    fn zero_workers_fails_fast() {
        let err = run_pool(0u64..8, 0, double).unwrap_err();
        assert!(matches!(err, PoolError::InvalidWorkerCount(0)));
    }

    #[test]
    fn finish_delivers_everything_already_submitted() {
        let mut pool = WorkerPool::start(3, double).unwrap();
        for n in 0u64..5 {
            pool.submit(n).unwrap();
        }
        // Closing the source here must never drop the 5 in-flight jobs.
        let delivered: Vec<_> = pool.finish().collect();
        assert_eq!(delivered.len(), 5);
    }

    #[test]
    fn bounded_job_buffer_still_completes() {
        let mut pool = WorkerPool::start_bounded(2, 1, |n: &u64| {
            std::thread::sleep(Duration::from_millis(1));
            Ok::<u64, String>(*n)
        })
        .unwrap();
        for n in 0u64..20 {
            pool.submit(n).unwrap();
        }
        assert_eq!(pool.finish().count(), 20);
    }

    #[test]
    fn elapsed_covers_the_task_invocation() {
        let results = run_pool(0u64..1, 1, |n: &u64| {
            std::thread::sleep(Duration::from_millis(20));
            Ok::<u64, String>(*n)
        })
        .unwrap();
        assert!(results[0].elapsed >= Duration::from_millis(20));
    }

    #[test]
    fn every_submission_reaches_the_task() {
        let running = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&running);

        let mut pool = WorkerPool::start(4, move |n: &u64| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<u64, String>(*n)
        })
        .unwrap();

        for n in 0u64..10 {
            pool.submit(n).unwrap();
        }
        let results: Vec<_> = pool.finish().collect();
        assert_eq!(results.len(), 10);
        assert_eq!(running.load(Ordering::SeqCst), 10);
    }
}
