mod aggregator;
mod worker_pool;

pub use aggregator::ErrorAggregator;
pub use worker_pool::{ProgressSnapshot, WorkerPool, WorkerRunSummary};
