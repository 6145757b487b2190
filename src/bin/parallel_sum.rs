//! Split/join demo: sum the integers 1..=N across K concurrent branches.
//!
//! Run with: cargo run --release --bin parallel_sum [N] [K]

use std::convert::Infallible;
use std::time::Instant;

use colored::Colorize;
use fanout::{split_join, PoolError};

const DEFAULT_ELEMENTS: u64 = 100_000_000;
const DEFAULT_BRANCHES: usize = 2;

fn main() -> Result<(), PoolError> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let mut args = std::env::args().skip(1);
    let elements: u64 = args
        .next()
        .and_then(|a| a.parse().ok())
        .unwrap_or(DEFAULT_ELEMENTS);
    let branches: usize = args
        .next()
        .and_then(|a| a.parse().ok())
        .unwrap_or(DEFAULT_BRANCHES);

    println!("Preparing input with {elements} elements...");
    let input: Vec<u64> = (1..=elements).collect();
    println!("Input ready.");

    let start = Instant::now();
    let total = split_join(
        &input,
        branches,
        |piece: &[u64]| Ok::<u64, Infallible>(piece.iter().sum()),
        |a, b| a + b,
    )?;
    let elapsed = start.elapsed();

    println!("\n--- Split/Join Results ---");
    println!("Branches:   {branches}");
    println!("Total Sum:  {}", total.to_string().green().bold());
    println!("Total Time: {elapsed:?}");

    Ok(())
}
