use thiserror::Error;

/// Errors surfaced by the dispatch operations themselves.
///
/// A failing task unit is never a `PoolError`: inside the worker pool a
/// task failure is recorded in that job's [`JobResult`](crate::JobResult)
/// and the pool keeps running. The variants here cover caller mistakes
/// (caught before any thread starts) and the fatal cases of the
/// split/join variant, where a partial aggregate is meaningless.
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("worker count must be at least 1, got {0}")]
    InvalidWorkerCount(usize),

    #[error("partition count must be at least 1, got {0}")]
    InvalidPartitionCount(usize),

    #[error("partition task failed: {0}")]
    Partition(String),

    #[error("pool channel disconnected before completion")]
    Disconnected,

    #[error("failed to spawn pool thread: {0}")]
    Spawn(#[from] std::io::Error),
}
