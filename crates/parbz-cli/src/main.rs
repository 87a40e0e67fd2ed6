use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use parbz_core::{
    Compressor, CompressorConfig, EngineKind, MemoryStrategy, ParbzError, ProgressSnapshot,
    RunStats,
};

#[derive(Parser)]
#[command(
    name = "parbz",
    version,
    about = "Parallel block compressor",
    long_about = "Split a file into fixed-size blocks, compress them in parallel, \
                  and concatenate the per-block streams into one output file."
)]
struct Cli {
    /// File to compress.
    input: PathBuf,

    /// Destination file (defaults to <input> plus the engine extension).
    output: Option<PathBuf>,

    /// Block size (supports suffixes K/M/G, e.g. 512K, 1M).
    #[arg(short, long, default_value = "900K", value_parser = parse_size)]
    block_size: usize,

    /// Number of worker threads (defaults to CPU count).
    #[arg(short, long, default_value_t = num_cpus::get())]
    workers: usize,

    /// Compression engine.
    #[arg(long, value_enum, default_value_t = EngineArg::Bzip2)]
    engine: EngineArg,

    /// Compression level 1-9 (defaults to the engine's preset).
    #[arg(short, long)]
    level: Option<u32>,

    /// Read blocks on demand instead of mapping the whole input.
    #[arg(long, default_value_t = false)]
    low_memory: bool,

    /// Progress refresh interval in milliseconds.
    #[arg(long, default_value_t = 250)]
    stats_interval_ms: u64,

    /// Suppress the progress line and summary.
    #[arg(short, long, default_value_t = false)]
    quiet: bool,

    /// Print the final report as JSON on stdout.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EngineArg {
    Bzip2,
    Gzip,
}

impl From<EngineArg> for EngineKind {
    fn from(value: EngineArg) -> Self {
        match value {
            EngineArg::Bzip2 => EngineKind::Bzip2,
            EngineArg::Gzip => EngineKind::Gzip,
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    input: &'a Path,
    output: &'a Path,
    engine: &'a str,
    block_size: usize,
    workers: usize,
    #[serde(flatten)]
    stats: &'a RunStats,
    ratio_percent: f64,
    throughput_bps: f64,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(exit_code_for(&error))
        }
    }
}

fn run(cli: Cli) -> Result<(), ParbzError> {
    let engine: EngineKind = cli.engine.into();
    let config = CompressorConfig {
        block_size: cli.block_size,
        workers: cli.workers,
        strategy: if cli.low_memory {
            MemoryStrategy::Streaming
        } else {
            MemoryStrategy::WholeFile
        },
        engine,
        level: cli.level.unwrap_or_else(|| engine.default_level()),
    };

    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.input, engine));

    let compressor = Compressor::new(config)?;
    let progress_interval = Duration::from_millis(cli.stats_interval_ms.max(50));
    let show_progress = !cli.quiet && io::stderr().is_terminal();

    let stats = compressor.compress_file_with_progress(
        &cli.input,
        &output_path,
        progress_interval,
        |snapshot: ProgressSnapshot| {
            if show_progress {
                print_progress(&snapshot);
            }
        },
    )?;

    if show_progress {
        eprintln!();
    }
    if cli.json {
        let report = JsonReport {
            input: &cli.input,
            output: &output_path,
            engine: engine_name(engine),
            block_size: cli.block_size,
            workers: cli.workers,
            stats: &stats,
            ratio_percent: stats.space_saving_percent(),
            throughput_bps: stats.throughput_bps(),
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).map_err(|e| ParbzError::Other(e.into()))?
        );
    } else if !cli.quiet {
        print_summary(&cli.input, &output_path, engine, &stats);
    }

    Ok(())
}

fn print_progress(snapshot: &ProgressSnapshot) {
    let percent = if snapshot.blocks_total > 0 {
        snapshot.blocks_completed as f64 / snapshot.blocks_total as f64 * 100.0
    } else {
        100.0
    };
    let rate = snapshot.bytes_completed as f64 / snapshot.elapsed.as_secs_f64().max(1e-6);
    let line = format!(
        "\r\x1b[2K[{percent:6.2}%] blocks {}/{} | data {} | {}/s | elapsed {}",
        snapshot.blocks_completed,
        snapshot.blocks_total,
        format_bytes(snapshot.bytes_completed),
        format_rate(rate),
        format_duration(snapshot.elapsed),
    );
    eprint!("{line}");
    let _ = io::stderr().flush();
}

fn print_summary(input: &Path, output: &Path, engine: EngineKind, stats: &RunStats) {
    let ratio = stats.space_saving_percent();
    println!("compression complete");
    println!("  input: {}", input.display());
    println!("  output: {}", output.display());
    println!("  engine: {}", engine_name(engine));
    println!("  original size: {}", format_bytes(stats.input_bytes));
    println!("  compressed size: {}", format_bytes(stats.output_bytes));
    if ratio.is_nan() {
        println!("  ratio: n/a (empty input)");
    } else {
        println!("  ratio: {ratio:.2}% saved");
    }
    println!("  blocks: {}", stats.blocks_total);
    println!("  time: {}", format_duration(stats.elapsed));
    println!("  throughput: {}/s", format_rate(stats.throughput_bps()));

    let max_tasks = stats
        .workers
        .iter()
        .map(|worker| worker.blocks_completed)
        .max()
        .unwrap_or(0);
    let min_tasks = stats
        .workers
        .iter()
        .map(|worker| worker.blocks_completed)
        .min()
        .unwrap_or(0);
    println!(
        "  workers: {} | task balance min/max {min_tasks}/{max_tasks}",
        stats.workers.len()
    );
}

fn engine_name(engine: EngineKind) -> &'static str {
    match engine {
        EngineKind::Bzip2 => "bzip2",
        EngineKind::Gzip => "gzip",
    }
}

fn default_output_path(input: &Path, engine: EngineKind) -> PathBuf {
    let mut out = input.as_os_str().to_os_string();
    out.push(".");
    out.push(engine.extension());
    PathBuf::from(out)
}

fn exit_code_for(error: &ParbzError) -> u8 {
    match error {
        ParbzError::InvalidConfig(_) => 2,
        ParbzError::InputLoad(_) | ParbzError::BlockFetch { .. } => 3,
        ParbzError::Compression { .. } | ParbzError::BlocksFailed { .. } => 4,
        ParbzError::OutputWrite(_) => 5,
        _ => 1,
    }
}

fn parse_size(value: &str) -> Result<usize, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("size cannot be empty".to_string());
    }

    let split_at = trimmed
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (num_part, suffix_part) = trimmed.split_at(split_at);
    if num_part.is_empty() {
        return Err(format!("invalid size: {value}"));
    }

    let base: usize = num_part
        .parse()
        .map_err(|_| format!("invalid size number: {value}"))?;

    let multiplier = match suffix_part.trim().to_ascii_lowercase().as_str() {
        "" | "b" => 1usize,
        "k" | "kb" => 1024usize,
        "m" | "mb" => 1024usize * 1024usize,
        "g" | "gb" => 1024usize * 1024usize * 1024usize,
        other => {
            return Err(format!("invalid size suffix '{other}' in '{value}'"));
        }
    };

    base.checked_mul(multiplier)
        .ok_or_else(|| format!("size overflow: {value}"))
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0usize;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} {}", UNITS[unit])
    } else {
        format!("{value:.2} {}", UNITS[unit])
    }
}

fn format_rate(bytes_per_second: f64) -> String {
    if !bytes_per_second.is_finite() || bytes_per_second <= 0.0 {
        return "0 B".to_string();
    }

    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes_per_second;
    let mut unit = 0usize;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{value:.0} {}", UNITS[unit])
    } else {
        format!("{value:.2} {}", UNITS[unit])
    }
}

fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let millis = duration.subsec_millis();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else if minutes > 0 {
        format!("{minutes:02}:{seconds:02}")
    } else {
        format!("{seconds}.{millis:03}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_size_accepts_suffixes() {
        assert_eq!(parse_size("900K").unwrap(), 900 * 1024);
        assert_eq!(parse_size("1m").unwrap(), 1024 * 1024);
        assert_eq!(parse_size("2GB").unwrap(), 2 * 1024 * 1024 * 1024);
        assert_eq!(parse_size("512").unwrap(), 512);
        assert!(parse_size("12X").is_err());
        assert!(parse_size("").is_err());
    }

    #[test]
    fn exit_codes_follow_failure_category() {
        assert_eq!(
            exit_code_for(&ParbzError::InvalidConfig("block size must be positive")),
            2
        );
        assert_eq!(
            exit_code_for(&ParbzError::InputLoad(std::io::Error::from(
                std::io::ErrorKind::NotFound
            ))),
            3
        );
        assert_eq!(
            exit_code_for(&ParbzError::BlocksFailed {
                failed: 1,
                total: 4
            }),
            4
        );
        assert_eq!(
            exit_code_for(&ParbzError::OutputWrite(std::io::Error::from(
                std::io::ErrorKind::PermissionDenied
            ))),
            5
        );
    }

    #[test]
    fn default_output_appends_engine_extension() {
        assert_eq!(
            default_output_path(Path::new("data.tar"), EngineKind::Bzip2),
            PathBuf::from("data.tar.bz2")
        );
        assert_eq!(
            default_output_path(Path::new("data.tar"), EngineKind::Gzip),
            PathBuf::from("data.tar.gz")
        );
    }
}
