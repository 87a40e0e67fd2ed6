use std::sync::Arc;

use bytes::Bytes;
use memmap2::Mmap;

use crate::error::ParbzError;

pub type Result<T> = std::result::Result<T, ParbzError>;

/// One contiguous byte range of the input, the unit of parallel compression.
///
/// Descriptors are produced by the planner and exactly tile the input:
/// every block is `block_size` bytes except possibly the last one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockDescriptor {
    /// Ordinal position, 0-based. Defines output order.
    pub index: usize,
    /// Byte offset into the input file.
    pub offset: u64,
    /// Byte count of this block.
    pub length: usize,
}

impl BlockDescriptor {
    pub fn new(index: usize, offset: u64, length: usize) -> Self {
        Self {
            index,
            offset,
            length,
        }
    }

    /// Exclusive end offset of this block.
    pub fn end(&self) -> u64 {
        self.offset + self.length as u64
    }
}

/// Raw input bytes fetched for one block.
///
/// Either an owned buffer (streaming strategy) or a window into the shared
/// read-only map of the whole input (whole-file strategy). Workers only ever
/// read through `as_slice`, so the two fetch strategies are interchangeable.
#[derive(Debug, Clone)]
pub enum BlockData {
    Owned(Bytes),
    Mapped {
        map: Arc<Mmap>,
        start: usize,
        end: usize,
    },
}

impl BlockData {
    pub fn len(&self) -> usize {
        match self {
            Self::Owned(data) => data.len(),
            Self::Mapped { start, end, .. } => end - start,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        match self {
            Self::Owned(data) => &data[..],
            Self::Mapped { map, start, end } => &map[*start..*end],
        }
    }
}

/// Lifecycle state of a block record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStatus {
    /// Allocated, not yet processed by any worker.
    Pending,
    /// Compressed payload is present and valid.
    Compressed,
    /// Fetch or compression failed; the failure is recorded separately.
    Failed,
}

/// Compressed representation of one input block.
///
/// Written exactly once, by the worker that processed the block; read only
/// after the join barrier. `crc32` covers the payload and is re-verified by
/// the output assembler before the bytes hit the destination.
#[derive(Debug, Clone)]
pub struct CompressedBlock {
    pub index: usize,
    pub payload: Vec<u8>,
    pub original_size: u64,
    pub status: BlockStatus,
    pub crc32: u32,
}

impl CompressedBlock {
    /// Placeholder slot created when the block list is built.
    pub fn pending(index: usize) -> Self {
        Self {
            index,
            payload: Vec::new(),
            original_size: 0,
            status: BlockStatus::Pending,
            crc32: 0,
        }
    }

    /// Successful result with an auto-computed payload checksum.
    pub fn compressed(index: usize, payload: Vec<u8>, original_size: u64) -> Self {
        let crc32 = crc32fast::hash(&payload);
        Self {
            index,
            payload,
            original_size,
            status: BlockStatus::Compressed,
            crc32,
        }
    }

    /// Failed result. Carries no payload; the cause lives in the aggregator.
    pub fn failed(index: usize, original_size: u64) -> Self {
        Self {
            index,
            payload: Vec::new(),
            original_size,
            status: BlockStatus::Failed,
            crc32: 0,
        }
    }

    /// Bytes of `payload` actually used.
    pub fn compressed_size(&self) -> usize {
        self.payload.len()
    }

    pub fn verify_crc32(&self) -> bool {
        crc32fast::hash(&self.payload) == self.crc32
    }
}
