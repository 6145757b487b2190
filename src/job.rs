use std::fmt;
use std::time::Duration;

/// Identity of one enqueued job, assigned sequentially at submit time.
///
/// Result order is unspecified, so the id is the only reliable way to pair
/// a [`JobResult`] back with the job that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub(crate) u64);

impl JobId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job#{}", self.0)
    }
}

/// One unit of work: an opaque payload plus its identity.
///
/// Created by the producer, consumed exactly once by a single worker,
/// then discarded. The payload is moved into the pool and lent to the
/// task invocation; it is never shared between workers.
#[derive(Debug)]
pub struct Job<T> {
    pub(crate) id: JobId,
    pub(crate) payload: T,
}

impl<T> Job<T> {
    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn payload(&self) -> &T {
        &self.payload
    }
}

/// What happened when the task unit ran one job.
///
/// A panic inside the task unit is contained by the worker and reported
/// here, so one misbehaving job can never wedge the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<R, E> {
    Success(R),
    Failure(E),
    Panicked(String),
}

impl<R, E> Outcome<R, E> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn success(&self) -> Option<&R> {
        match self {
            Outcome::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&E> {
        match self {
            Outcome::Failure(err) => Some(err),
            _ => None,
        }
    }
}

/// The outcome of processing one job, tagged with the originating job's
/// identity and how long the task invocation took.
#[derive(Debug, Clone)]
pub struct JobResult<R, E> {
    pub job_id: JobId,
    pub outcome: Outcome<R, E>,
    pub elapsed: Duration,
}

impl<R, E> JobResult<R, E> {
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    /// Consumes the result, yielding the success value if there was one.
    pub fn into_success(self) -> Option<R> {
        match self.outcome {
            Outcome::Success(value) => Some(value),
            _ => None,
        }
    }
}
