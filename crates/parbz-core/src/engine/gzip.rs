use std::io::Read;

use anyhow::Context;
use flate2::read::{GzEncoder, MultiGzDecoder};
use flate2::Compression;

use crate::engine::{output_capacity_hint, CompressionEngine};

/// gzip engine via flate2. Each payload is one gzip member; concatenating
/// members is valid gzip, so the assembled output decodes as a whole.
#[derive(Debug, Clone, Copy)]
pub struct GzipEngine {
    level: u32,
}

impl GzipEngine {
    /// Levels outside 0..=9 are clamped.
    pub fn new(level: u32) -> Self {
        Self {
            level: level.min(9),
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }
}

impl Default for GzipEngine {
    fn default() -> Self {
        Self::new(6)
    }
}

impl CompressionEngine for GzipEngine {
    fn name(&self) -> &'static str {
        "gzip"
    }

    fn compress(&self, input: &[u8]) -> anyhow::Result<Vec<u8>> {
        let mut output = Vec::with_capacity(output_capacity_hint(input.len()));
        let mut encoder = GzEncoder::new(input, Compression::new(self.level));
        encoder
            .read_to_end(&mut output)
            .context("gzip member encode failed")?;
        output.shrink_to_fit();
        Ok(output)
    }

    fn decompress(&self, input: &[u8]) -> anyhow::Result<Vec<u8>> {
        let mut output = Vec::new();
        MultiGzDecoder::new(input)
            .read_to_end(&mut output)
            .context("gzip multi-member decode failed")?;
        Ok(output)
    }
}
