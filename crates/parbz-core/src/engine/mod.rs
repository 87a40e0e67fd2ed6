use std::sync::Arc;

use serde::{Deserialize, Serialize};

mod bzip2;
mod gzip;

pub use self::bzip2::Bzip2Engine;
pub use self::gzip::GzipEngine;

/// Opaque compression capability.
///
/// Each `compress` call must emit one complete, independently decodable
/// stream, so that payloads concatenated in block order form a valid
/// multi-stream file. `decompress` must accept such a concatenation; the
/// orchestrator never calls it, but tests and downstream consumers do.
///
/// Engine errors carry no block attribution; the worker that invoked the
/// engine attaches the block index.
pub trait CompressionEngine: Send + Sync {
    fn name(&self) -> &'static str;
    fn compress(&self, input: &[u8]) -> anyhow::Result<Vec<u8>>;
    fn decompress(&self, input: &[u8]) -> anyhow::Result<Vec<u8>>;
}

/// Available engine implementations, selected at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Bzip2,
    Gzip,
}

impl EngineKind {
    /// Builds the engine at the requested compression level.
    pub fn build(self, level: u32) -> Arc<dyn CompressionEngine> {
        match self {
            Self::Bzip2 => Arc::new(Bzip2Engine::new(level)),
            Self::Gzip => Arc::new(GzipEngine::new(level)),
        }
    }

    pub fn default_level(self) -> u32 {
        match self {
            Self::Bzip2 => 9,
            Self::Gzip => 6,
        }
    }

    /// Conventional file extension for this engine's output.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Bzip2 => "bz2",
            Self::Gzip => "gz",
        }
    }
}

/// Worst-case output capacity for a block of `input_len` bytes.
///
/// Incompressible data can expand slightly; 1% plus a constant covers the
/// stream framing overhead of the supported engines.
pub(crate) fn output_capacity_hint(input_len: usize) -> usize {
    input_len + input_len / 100 + 600
}
