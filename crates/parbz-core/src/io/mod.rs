mod streaming;
mod whole_file;

pub use streaming::StreamingInput;
pub use whole_file::WholeFileInput;

use crate::types::{BlockData, BlockDescriptor, Result};

/// Capability to supply the raw bytes for a block descriptor.
///
/// The worker pool and output assembler are written against this trait only;
/// which concrete strategy is active is a configuration decision. Both
/// strategies must return byte-identical data for the same descriptor.
pub trait InputAccessor: Send + Sync {
    /// Returns exactly `descriptor.length` bytes starting at
    /// `descriptor.offset`, or a failure attributable to that block alone.
    fn fetch(&self, descriptor: &BlockDescriptor) -> Result<BlockData>;
}
