use crate::error::ParbzError;
use crate::types::{BlockDescriptor, Result};

/// Pure tiling of a known input size into fixed-size block descriptors.
///
/// Produces `ceil(file_size / block_size)` descriptors that cover
/// `[0, file_size)` with no gaps and no overlaps; only the last block may be
/// shorter than the configured block size. A zero-byte input plans to zero
/// blocks, which downstream turns into an empty, still-valid output.
#[derive(Debug, Clone, Copy)]
pub struct BlockPlanner {
    block_size: usize,
}

impl BlockPlanner {
    pub fn new(block_size: usize) -> Result<Self> {
        if block_size == 0 {
            return Err(ParbzError::InvalidConfig("block size must be positive"));
        }
        Ok(Self { block_size })
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Computes the ordered block list for an input of `file_size` bytes.
    pub fn plan(&self, file_size: u64) -> Vec<BlockDescriptor> {
        let block_size = self.block_size as u64;
        let count = file_size.div_ceil(block_size) as usize;

        let mut blocks = Vec::with_capacity(count);
        let mut offset = 0u64;
        for index in 0..count {
            let length = (file_size - offset).min(block_size) as usize;
            blocks.push(BlockDescriptor::new(index, offset, length));
            offset += length as u64;
        }

        debug_assert_eq!(offset, file_size);
        blocks
    }
}

/// One-shot convenience over [`BlockPlanner`].
pub fn plan_blocks(file_size: u64, block_size: usize) -> Result<Vec<BlockDescriptor>> {
    Ok(BlockPlanner::new(block_size)?.plan(file_size))
}
