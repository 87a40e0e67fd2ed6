pub mod core;
pub mod engine;
pub mod error;
pub mod io;
pub mod output;
pub mod pipeline;
pub mod planner;
pub mod stats;
pub mod types;

pub use crate::core::{ErrorAggregator, ProgressSnapshot, WorkerPool, WorkerRunSummary};
pub use engine::{Bzip2Engine, CompressionEngine, EngineKind, GzipEngine};
pub use error::ParbzError;
pub use io::{InputAccessor, StreamingInput, WholeFileInput};
pub use output::OutputAssembler;
pub use pipeline::{Compressor, CompressorConfig, MemoryStrategy, DEFAULT_BLOCK_SIZE};
pub use planner::{plan_blocks, BlockPlanner};
pub use stats::RunStats;
pub use types::{BlockData, BlockDescriptor, BlockStatus, CompressedBlock, Result};
