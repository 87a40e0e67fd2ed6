use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::ParbzError;
use crate::types::{BlockStatus, CompressedBlock, Result};

/// Writes compressed payloads strictly in ascending block-index order.
///
/// The output is a bare concatenation of independent streams; index order is
/// the correctness-critical invariant that makes the decoded concatenation
/// reproduce the original byte order. The assembler runs on a single thread,
/// after the join barrier, and refuses to emit anything if any slot is not
/// `Compressed` or fails its checksum.
#[derive(Debug, Default, Clone, Copy)]
pub struct OutputAssembler;

impl OutputAssembler {
    /// Streams every payload into `writer` in index order; returns the byte
    /// count written. A short or failed write aborts immediately and the
    /// destination must be discarded by the caller.
    pub fn assemble<W: Write>(&self, writer: &mut W, blocks: &[CompressedBlock]) -> Result<u64> {
        let failed = blocks
            .iter()
            .filter(|block| block.status != BlockStatus::Compressed)
            .count();
        if failed > 0 {
            return Err(ParbzError::BlocksFailed {
                failed,
                total: blocks.len(),
            });
        }

        let mut written = 0u64;
        for (position, block) in blocks.iter().enumerate() {
            if block.index != position {
                return Err(ParbzError::Other(anyhow::anyhow!(
                    "slot {position} holds block {}; slots must be index-ordered",
                    block.index
                )));
            }
            if !block.verify_crc32() {
                return Err(ParbzError::CorruptPayload { index: block.index });
            }

            writer
                .write_all(&block.payload)
                .map_err(ParbzError::OutputWrite)?;
            written += block.compressed_size() as u64;
        }

        writer.flush().map_err(ParbzError::OutputWrite)?;
        Ok(written)
    }

    /// Creates (or truncates) `path` and assembles into it. On any failure
    /// the incomplete destination is removed before the error is returned.
    pub fn assemble_to_path(&self, path: &Path, blocks: &[CompressedBlock]) -> Result<u64> {
        let result = self.write_file(path, blocks);
        if result.is_err() {
            let _ = fs::remove_file(path);
        }
        result
    }

    fn write_file(&self, path: &Path, blocks: &[CompressedBlock]) -> Result<u64> {
        let file = File::create(path).map_err(ParbzError::OutputWrite)?;
        let mut writer = BufWriter::new(file);
        let written = self.assemble(&mut writer, blocks)?;
        writer
            .into_inner()
            .map_err(|error| ParbzError::OutputWrite(error.into_error()))?;

        tracing::debug!(path = %path.display(), written, blocks = blocks.len(), "output assembled");
        Ok(written)
    }
}
