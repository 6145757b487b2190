//! Worker-pool demo: health-check a list of URLs through a fixed pool.
//!
//! Run with: cargo run --release --bin health_check [WORKERS]
//! Passing 0 (or nothing) sizes the pool to the CPU count.

use colored::Colorize;
use fanout::{run_pool, HealthCheck, Outcome};

const SEED_URLS: [&str; 8] = [
    "http://google.com",
    "http://github.com",
    "http://fastapi.tiangolo.com",
    "http://golang.org",
    "http://rust-lang.org",
    "http://typescriptlang.org",
    "http://bad-url-1234567.com",
    "http://example.com/status",
];

const SAMPLE_LIMIT: usize = 20;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let workers: usize = std::env::args()
        .nth(1)
        .and_then(|a| a.parse().ok())
        .filter(|&w| w > 0)
        .unwrap_or_else(num_cpus::get);

    // Duplicate the seed list four times over, as the original batch did.
    let mut urls: Vec<String> = SEED_URLS.iter().map(|u| u.to_string()).collect();
    for _ in 0..4 {
        urls.extend(urls.clone());
    }
    println!("Total jobs to process: {} ({workers} workers)", urls.len());

    let checker = HealthCheck::with_default_timeout()?;
    let results = run_pool(urls, workers, move |url: &String| checker.check(url))?;

    println!("\n--- Results (first {SAMPLE_LIMIT}) ---");
    for result in results.iter().take(SAMPLE_LIMIT) {
        match &result.outcome {
            Outcome::Success(report) => println!(
                "{} {} ({:?})",
                "ok ".green(),
                report.url,
                result.elapsed
            ),
            Outcome::Failure(err) => {
                println!("{} {} ({:?})", "err".red(), err, result.elapsed)
            }
            Outcome::Panicked(msg) => println!("{} {msg}", "???".red().bold()),
        }
    }

    let healthy = results.iter().filter(|r| r.is_success()).count();
    println!("\n--- Summary ---");
    println!("Total URLs checked: {}", results.len());
    println!(
        "Healthy: {}  Unhealthy: {}",
        healthy.to_string().green(),
        (results.len() - healthy).to_string().red()
    );

    Ok(())
}
