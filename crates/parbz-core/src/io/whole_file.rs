use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use memmap2::{Mmap, MmapOptions};

use crate::error::ParbzError;
use crate::io::InputAccessor;
use crate::types::{BlockData, BlockDescriptor, Result};

/// Whole-file strategy: the input is mapped once, up front, and shared
/// read-only across workers; `fetch` is a bounds-checked zero-copy window.
///
/// Open or map failures surface here as [`ParbzError::InputLoad`], before the
/// parallel phase starts, so workers never observe a read failure. The
/// trade-off is peak memory proportional to the input size in exchange for a
/// single pass of input I/O.
#[derive(Debug, Clone)]
pub struct WholeFileInput {
    map: Option<Arc<Mmap>>,
    path: PathBuf,
    len: u64,
}

impl WholeFileInput {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(ParbzError::InputLoad)?;
        let len = file.metadata().map_err(ParbzError::InputLoad)?.len();

        let map = if len == 0 {
            None
        } else {
            let map = unsafe { MmapOptions::new().map(&file) }.map_err(ParbzError::InputLoad)?;
            Some(Arc::new(map))
        };

        tracing::debug!(path = %path.display(), len, "mapped input file");
        Ok(Self {
            map,
            path: path.to_path_buf(),
            len,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len_u64(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn out_of_range(&self, descriptor: &BlockDescriptor) -> ParbzError {
        ParbzError::BlockFetch {
            index: descriptor.index,
            source: io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "block range {}..{} exceeds mapped input of {} bytes",
                    descriptor.offset,
                    descriptor.end(),
                    self.len
                ),
            ),
        }
    }
}

impl InputAccessor for WholeFileInput {
    fn fetch(&self, descriptor: &BlockDescriptor) -> Result<BlockData> {
        if descriptor.end() > self.len {
            return Err(self.out_of_range(descriptor));
        }

        let Some(map) = &self.map else {
            // Only the degenerate empty descriptor is valid on an empty file.
            return if descriptor.length == 0 {
                Ok(BlockData::Owned(Bytes::new()))
            } else {
                Err(self.out_of_range(descriptor))
            };
        };

        let start = usize::try_from(descriptor.offset).map_err(|_| self.out_of_range(descriptor))?;
        let end = start
            .checked_add(descriptor.length)
            .ok_or_else(|| self.out_of_range(descriptor))?;

        Ok(BlockData::Mapped {
            map: Arc::clone(map),
            start,
            end,
        })
    }
}
