use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::core::{ErrorAggregator, ProgressSnapshot, WorkerPool, WorkerRunSummary};
use crate::engine::{CompressionEngine, EngineKind};
use crate::error::ParbzError;
use crate::io::{InputAccessor, StreamingInput, WholeFileInput};
use crate::output::OutputAssembler;
use crate::planner::BlockPlanner;
use crate::stats::RunStats;
use crate::types::{CompressedBlock, Result};

/// Default block size, matching the 900 KiB the original tool ships with.
pub const DEFAULT_BLOCK_SIZE: usize = 900 * 1024;

/// How block bytes reach the workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MemoryStrategy {
    /// Map the whole input once and share it read-only; peak memory tracks
    /// the input size, input I/O happens once.
    WholeFile,
    /// Each block is read from disk on demand; peak memory stays near
    /// `block_size * workers` at the cost of per-block open/seek.
    Streaming,
}

impl MemoryStrategy {
    fn label(self) -> &'static str {
        match self {
            Self::WholeFile => "whole-file",
            Self::Streaming => "streaming",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompressorConfig {
    pub block_size: usize,
    pub workers: usize,
    pub strategy: MemoryStrategy,
    pub engine: EngineKind,
    pub level: u32,
}

impl Default for CompressorConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            workers: std::thread::available_parallelism()
                .map(|count| count.get())
                .unwrap_or(1),
            strategy: MemoryStrategy::WholeFile,
            engine: EngineKind::Bzip2,
            level: EngineKind::Bzip2.default_level(),
        }
    }
}

impl CompressorConfig {
    /// Rejects unusable settings before any I/O is attempted.
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(ParbzError::InvalidConfig("block size must be positive"));
        }
        if self.workers == 0 {
            return Err(ParbzError::InvalidConfig("worker count must be positive"));
        }
        if self.level == 0 || self.level > 9 {
            return Err(ParbzError::InvalidConfig(
                "compression level must be between 1 and 9",
            ));
        }
        Ok(())
    }
}

/// End-to-end orchestrator: plan blocks, compress them concurrently, gate on
/// failures, assemble the multi-stream output, report stats.
pub struct Compressor {
    config: CompressorConfig,
    engine: Arc<dyn CompressionEngine>,
}

impl Compressor {
    pub fn new(config: CompressorConfig) -> Result<Self> {
        config.validate()?;
        let engine = config.engine.build(config.level);
        Ok(Self { config, engine })
    }

    /// Builds a compressor around a caller-supplied engine, bypassing
    /// [`EngineKind`]. The configured `engine`/`level` fields are ignored.
    pub fn with_engine(config: CompressorConfig, engine: Arc<dyn CompressionEngine>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, engine })
    }

    pub fn config(&self) -> &CompressorConfig {
        &self.config
    }

    pub fn engine(&self) -> &dyn CompressionEngine {
        self.engine.as_ref()
    }

    /// Compresses `input` into `output` with no progress reporting.
    pub fn compress_file(&self, input: &Path, output: &Path) -> Result<RunStats> {
        self.compress_file_with_progress(input, output, Duration::from_secs(3600), |_| {})
    }

    /// Compresses `input` into `output`, emitting advisory progress
    /// snapshots roughly every `progress_interval`.
    ///
    /// If any block fails, every allocated payload is released, nothing is
    /// written, and the run reports [`ParbzError::BlocksFailed`] after
    /// logging each per-block cause. A zero-byte input succeeds with an
    /// empty output file.
    pub fn compress_file_with_progress<F>(
        &self,
        input: &Path,
        output: &Path,
        progress_interval: Duration,
        on_progress: F,
    ) -> Result<RunStats>
    where
        F: FnMut(ProgressSnapshot),
    {
        let run = self.run_parallel(input, progress_interval, on_progress)?;
        let output_bytes = OutputAssembler.assemble_to_path(output, &run.blocks)?;
        Ok(run.into_stats(output_bytes))
    }

    /// Compresses `input` into an arbitrary writer. Test and library
    /// surface; the failure gate behaves exactly like the file path.
    pub fn compress_to_writer<W: Write>(&self, input: &Path, writer: &mut W) -> Result<RunStats> {
        let run = self.run_parallel(input, Duration::from_secs(3600), |_| {})?;
        let output_bytes = OutputAssembler.assemble(writer, &run.blocks)?;
        Ok(run.into_stats(output_bytes))
    }

    fn run_parallel<F>(
        &self,
        input: &Path,
        progress_interval: Duration,
        on_progress: F,
    ) -> Result<FinishedRun>
    where
        F: FnMut(ProgressSnapshot),
    {
        let started_at = Instant::now();
        let file_size = fs::metadata(input).map_err(ParbzError::InputLoad)?.len();
        let descriptors = BlockPlanner::new(self.config.block_size)?.plan(file_size);
        let blocks_total = descriptors.len();

        tracing::info!(
            input = %input.display(),
            file_size,
            blocks = blocks_total,
            block_size = self.config.block_size,
            workers = self.config.workers,
            strategy = self.config.strategy.label(),
            engine = self.engine.name(),
            "starting compression run"
        );

        let accessor: Arc<dyn InputAccessor> = match self.config.strategy {
            MemoryStrategy::WholeFile => Arc::new(WholeFileInput::open(input)?),
            MemoryStrategy::Streaming => Arc::new(StreamingInput::new(input)),
        };

        let aggregator = Arc::new(ErrorAggregator::new());
        let pool = WorkerPool::new(self.config.workers);
        let (blocks, workers) = pool.run(
            descriptors,
            accessor,
            Arc::clone(&self.engine),
            Arc::clone(&aggregator),
            progress_interval,
            on_progress,
        )?;

        if aggregator.has_failures() {
            let failed = aggregator.count();
            for error in aggregator.take_failures() {
                tracing::error!(block = ?error.block_index(), error = %error, "block failure");
            }
            // Release every payload buffer before escalating; no output is
            // written for a partially failed run.
            drop(blocks);
            return Err(ParbzError::BlocksFailed {
                failed,
                total: blocks_total,
            });
        }

        Ok(FinishedRun {
            blocks,
            workers,
            input_bytes: file_size,
            started_at,
        })
    }
}

struct FinishedRun {
    blocks: Vec<CompressedBlock>,
    workers: Vec<WorkerRunSummary>,
    input_bytes: u64,
    started_at: Instant,
}

impl FinishedRun {
    fn into_stats(self, output_bytes: u64) -> RunStats {
        let stats = RunStats {
            input_bytes: self.input_bytes,
            output_bytes,
            blocks_total: self.blocks.len(),
            elapsed: self.started_at.elapsed(),
            workers: self.workers,
        };
        tracing::info!(
            input_bytes = stats.input_bytes,
            output_bytes = stats.output_bytes,
            blocks = stats.blocks_total,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "compression run finished"
        );
        stats
    }
}
