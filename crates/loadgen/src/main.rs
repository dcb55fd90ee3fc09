//! Synthetic access-log generator
//!
//! Emulates a writer appending to an access log in real time, for manually
//! exercising the monitor. Per-second request counts are drawn from a
//! normal distribution centered on the target rate.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::thread::sleep;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::ThreadRng;
use rand::seq::IndexedRandom;
use rand::Rng;
use rand_distr::{Distribution, Normal};

const HOSTS: &[&str] = &["10.0.0.1", "10.0.0.4", "127.0.0.1"];
const METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE"];
const PATHS: &[&str] = &["/api/user", "/report", "/test", "/help/me"];
const HEADER: &str = r#""remotehost","rfc931","authuser","date","request","status","bytes""#;

/// Synthetic access-log generator
#[derive(Parser)]
#[command(name = "loadgen")]
#[command(author, version, about = "Synthetic access-log generator", long_about = None)]
struct Cli {
    /// File to write to
    #[arg(long, default_value = "./logs/access.csv")]
    file: PathBuf,

    /// Number of write rounds
    #[arg(long, default_value_t = 100)]
    rounds: usize,

    /// Lines per round
    #[arg(long, default_value_t = 100)]
    batch_size: usize,

    /// Target requests per second
    #[arg(long, default_value_t = 10)]
    rate: u32,

    /// Epoch second the generated traffic starts at
    #[arg(long, default_value_t = 1_549_574_332)]
    start_time: i64,

    /// Longest pause between rounds in seconds (0 writes back to back)
    #[arg(long, default_value_t = 30)]
    max_pause: u64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let rows = generate_rows(cli.start_time, cli.rounds * cli.batch_size, cli.rate)?;

    // Start from a fresh file; the monitor expects a single header line.
    if cli.file.exists() {
        std::fs::remove_file(&cli.file)
            .with_context(|| format!("failed to remove {}", cli.file.display()))?;
    }

    let mut rng = rand::rng();
    for (round, batch) in rows.chunks(cli.batch_size.max(1)).enumerate() {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&cli.file)
            .with_context(|| format!("failed to open {}", cli.file.display()))?;
        if round == 0 {
            writeln!(file, "{HEADER}")?;
        }
        for row in batch {
            writeln!(file, "{row}")?;
        }
        println!("round {}/{}: wrote {} lines", round + 1, cli.rounds, batch.len());

        if cli.max_pause > 0 && round + 1 < cli.rounds {
            sleep(Duration::from_secs(rng.random_range(1..=cli.max_pause)));
        }
    }

    Ok(())
}

/// Generate `n_rows` CSV rows of second-bucketed traffic.
fn generate_rows(start_time: i64, n_rows: usize, rate: u32) -> Result<Vec<String>> {
    let mut rng = rand::rng();
    let per_second = Normal::new(f64::from(rate), (f64::from(rate) * 0.25).max(1.0))?;

    let mut rows = Vec::with_capacity(n_rows);
    let mut timestamp = start_time;
    while rows.len() < n_rows {
        timestamp += 1;
        let count = per_second.sample(&mut rng).round().max(0.0) as usize;
        for _ in 0..count {
            if rows.len() >= n_rows {
                break;
            }
            rows.push(generate_row(&mut rng, timestamp));
        }
    }
    Ok(rows)
}

fn generate_row(rng: &mut ThreadRng, timestamp: i64) -> String {
    let host = HOSTS.choose(rng).unwrap_or(&"127.0.0.1");
    let method = METHODS.choose(rng).unwrap_or(&"GET");
    let path = PATHS.choose(rng).unwrap_or(&"/");
    let status = rng.random_range(200..600);
    let bytes = rng.random_range(1000..4000);
    format!(r#""{host}","-","apache",{timestamp},"{method} {path} HTTP/1.0",{status},{bytes}"#)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_rows_count_and_shape() {
        let rows = generate_rows(1000, 50, 10).unwrap();
        assert_eq!(rows.len(), 50);
        for row in &rows {
            assert_eq!(row.matches(',').count(), 6, "row: {row}");
            assert!(row.contains("HTTP/1.0"));
        }
    }

    #[test]
    fn test_generated_timestamps_are_non_decreasing() {
        let rows = generate_rows(2000, 100, 5).unwrap();
        let stamps: Vec<i64> = rows
            .iter()
            .map(|row| {
                row.split(',')
                    .nth(3)
                    .and_then(|field| field.parse().ok())
                    .unwrap()
            })
            .collect();
        assert!(stamps.windows(2).all(|pair| pair[0] <= pair[1]));
    }
}
