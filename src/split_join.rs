//! Split/join dispatch: partition a known input into K contiguous pieces,
//! compute each piece's aggregate on its own thread, and join the K
//! sub-results through a rendezvous channel.
//!
//! Arrival order at the join point is unspecified, so `combine` must be
//! associative (and should be commutative). A single failing branch aborts
//! the whole call: no partial aggregate is meaningful.

use std::fmt::Display;
use std::thread;

use crossbeam::channel::bounded;

use crate::error::PoolError;

/// Contiguous partition of `input` into exactly `k` disjoint slices whose
/// union is the whole input. Lengths differ by at most one: the first
/// `len % k` partitions each take one extra element. When `k` exceeds the
/// input length the surplus partitions are empty.
fn partitions<T>(input: &[T], k: usize) -> Vec<&[T]> {
    let base = input.len() / k;
    let extra = input.len() % k;

    let mut pieces = Vec::with_capacity(k);
    let mut start = 0;
    for index in 0..k {
        let len = if index < extra { base + 1 } else { base };
        pieces.push(&input[start..start + len]);
        start += len;
    }
    pieces
}

/// Runs `task` over `k` contiguous partitions of `input` concurrently and
/// folds the sub-results with `combine`.
///
/// Each branch delivers its aggregate through an unbuffered rendezvous
/// channel; the orchestrator performs exactly `k` blocking receives, which
/// is also the join barrier. No shutdown signal is needed: a branch
/// terminates after its single send.
///
/// Fails fast with [`PoolError::InvalidPartitionCount`] for `k == 0`, and
/// with [`PoolError::Partition`] as soon as any branch reports an error.
pub fn split_join<T, R, E, F, C>(
    input: &[T],
    k: usize,
    task: F,
    combine: C,
) -> Result<R, PoolError>
where
    T: Sync,
    R: Send,
    E: Display + Send,
    F: Fn(&[T]) -> Result<R, E> + Sync,
    C: Fn(R, R) -> R,
{
    if k == 0 {
        return Err(PoolError::InvalidPartitionCount(k));
    }

    // Rendezvous handoff: each branch's send blocks until the join loop
    // below receives it, exactly like an unbuffered channel.
    let (tx, rx) = bounded::<Result<R, E>>(0);
    let task = &task;

    thread::scope(|scope| {
        for piece in partitions(input, k) {
            let tx = tx.clone();
            scope.spawn(move || {
                // The receiver is dropped early on a branch failure;
                // remaining sends then fail and the branch just exits.
                let _ = tx.send(task(piece));
            });
        }
        drop(tx);

        let mut acc: Option<R> = None;
        for _ in 0..k {
            match rx.recv() {
                Ok(Ok(value)) => {
                    acc = Some(match acc {
                        Some(prev) => combine(prev, value),
                        None => value,
                    });
                }
                Ok(Err(err)) => {
                    // Unblock the branches still waiting to send.
                    drop(rx);
                    return Err(PoolError::Partition(err.to_string()));
                }
                Err(_) => return Err(PoolError::Disconnected),
            }
        }

        // k >= 1 receives succeeded, so the accumulator is populated.
        acc.ok_or(PoolError::Disconnected)
    })
}
