//! Bounded concurrent dispatch: fan a batch of independent jobs out over a
//! fixed set of workers and fan the results back in, each job observed
//! exactly once.
//!
//! Two surfaces, one pattern:
//!
//! - [`split_join`] — the input is known upfront: partition it into K
//!   contiguous pieces, aggregate each on its own thread, join at a
//!   rendezvous and combine.
//! - [`WorkerPool`] / [`run_pool`] — jobs arrive as a stream larger than
//!   the worker count: W fixed workers pull from a closable channel and a
//!   completion watcher closes the result sink exactly once, after the
//!   last worker terminates.
//!
//! A task failure is data, not a crash: it lands in that job's
//! [`JobResult`] and the rest of the pool keeps going. [`health`] ships a
//! ready-made I/O-bound task unit (URL health checks with per-request
//! deadlines) for the common case.
//!
//! ```no_run
//! use fanout::{run_pool, split_join};
//! use std::convert::Infallible;
//!
//! let input: Vec<u64> = (1..=1_000).collect();
//! let total = split_join(
//!     &input,
//!     2,
//!     |piece: &[u64]| Ok::<u64, Infallible>(piece.iter().sum()),
//!     |a, b| a + b,
//! )?;
//! assert_eq!(total, 500_500);
//!
//! let results = run_pool(1u64..=100, 10, |n: &u64| Ok::<u64, String>(n * n))?;
//! assert_eq!(results.len(), 100);
//! # Ok::<(), fanout::PoolError>(())
//! ```

pub mod error;
pub mod health;
pub mod job;
pub mod pool;
pub mod split_join;

pub use error::PoolError;
pub use health::{HealthCheck, HealthError, HealthReport};
pub use job::{Job, JobId, JobResult, Outcome};
pub use pool::{run_pool, Results, WorkerPool};
pub use split_join::split_join;
