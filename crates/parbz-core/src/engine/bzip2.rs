use std::io::Read;

use anyhow::Context;
use bzip2::read::{BzEncoder, MultiBzDecoder};
use bzip2::Compression;

use crate::engine::{output_capacity_hint, CompressionEngine};

/// bzip2 engine. Concatenated payloads form a valid multi-stream .bz2 file
/// that stock decompressors accept.
#[derive(Debug, Clone, Copy)]
pub struct Bzip2Engine {
    level: u32,
}

impl Bzip2Engine {
    /// Levels outside 1..=9 are clamped.
    pub fn new(level: u32) -> Self {
        Self {
            level: level.clamp(1, 9),
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }
}

impl Default for Bzip2Engine {
    fn default() -> Self {
        Self::new(9)
    }
}

impl CompressionEngine for Bzip2Engine {
    fn name(&self) -> &'static str {
        "bzip2"
    }

    fn compress(&self, input: &[u8]) -> anyhow::Result<Vec<u8>> {
        let mut output = Vec::with_capacity(output_capacity_hint(input.len()));
        let mut encoder = BzEncoder::new(input, Compression::new(self.level));
        encoder
            .read_to_end(&mut output)
            .context("bzip2 stream encode failed")?;
        output.shrink_to_fit();
        Ok(output)
    }

    fn decompress(&self, input: &[u8]) -> anyhow::Result<Vec<u8>> {
        let mut output = Vec::new();
        MultiBzDecoder::new(input)
            .read_to_end(&mut output)
            .context("bzip2 multi-stream decode failed")?;
        Ok(output)
    }
}
