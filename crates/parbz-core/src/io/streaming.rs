use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::error::ParbzError;
use crate::io::InputAccessor;
use crate::types::{BlockData, BlockDescriptor, Result};

/// Streaming strategy: each fetch independently opens the input, seeks to the
/// block's offset, and reads exactly its length.
///
/// Peak memory stays near `block_size * worker_count` at the cost of one
/// open/seek per block. A failed open, seek, or short read becomes a
/// [`ParbzError::BlockFetch`] for that block alone and never disturbs
/// sibling blocks.
#[derive(Debug, Clone)]
pub struct StreamingInput {
    path: PathBuf,
}

impl StreamingInput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_block(&self, descriptor: &BlockDescriptor) -> std::io::Result<Bytes> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(descriptor.offset))?;

        let mut buffer = vec![0u8; descriptor.length];
        file.read_exact(&mut buffer)?;
        Ok(Bytes::from(buffer))
    }
}

impl InputAccessor for StreamingInput {
    fn fetch(&self, descriptor: &BlockDescriptor) -> Result<BlockData> {
        self.read_block(descriptor)
            .map(BlockData::Owned)
            .map_err(|source| ParbzError::BlockFetch {
                index: descriptor.index,
                source,
            })
    }
}
