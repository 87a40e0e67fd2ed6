use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParbzError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    #[error("input load failed: {0}")]
    InputLoad(#[source] std::io::Error),
    #[error("block {index} fetch failed: {source}")]
    BlockFetch {
        index: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("block {index} compression failed: {message}")]
    Compression { index: usize, message: String },
    #[error("output write failed: {0}")]
    OutputWrite(#[source] std::io::Error),
    #[error("{failed} of {total} blocks failed; no output written")]
    BlocksFailed { failed: usize, total: usize },
    #[error("block {index} payload checksum mismatch")]
    CorruptPayload { index: usize },
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl ParbzError {
    /// Block index the failure is attributable to, when there is one.
    pub fn block_index(&self) -> Option<usize> {
        match self {
            Self::BlockFetch { index, .. }
            | Self::Compression { index, .. }
            | Self::CorruptPayload { index } => Some(*index),
            _ => None,
        }
    }

    /// True for failures that abort the whole run rather than one block.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig(_)
                | Self::InputLoad(_)
                | Self::OutputWrite(_)
                | Self::BlocksFailed { .. }
        )
    }
}
