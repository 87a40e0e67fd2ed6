use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::anyhow;
use crossbeam_channel::{unbounded, RecvTimeoutError};
use serde::{Deserialize, Serialize};

use crate::core::ErrorAggregator;
use crate::engine::CompressionEngine;
use crate::error::ParbzError;
use crate::io::InputAccessor;
use crate::types::{BlockDescriptor, CompressedBlock, Result};

/// Advisory view of an in-flight run, emitted to the progress callback.
///
/// Snapshots are informational only: they never influence scheduling,
/// ordering, or the failure gate.
#[derive(Debug, Clone)]
pub struct ProgressSnapshot {
    pub blocks_total: usize,
    pub blocks_completed: usize,
    pub blocks_failed: usize,
    pub bytes_completed: u64,
    pub elapsed: Duration,
}

/// Per-worker completion count, captured after the join barrier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRunSummary {
    pub worker_id: usize,
    pub blocks_completed: usize,
}

/// Bounded pool of compression workers with dynamic block assignment.
///
/// All descriptors are pushed into a shared queue up front; each worker pops
/// the next unclaimed block as soon as it finishes its current one, so uneven
/// per-block cost (a truncated last block, data-dependent engine time) never
/// leaves a worker idle while another is backlogged. No two workers ever hold
/// the same block, and no worker ever waits on another worker's block.
pub struct WorkerPool {
    num_workers: usize,
}

impl WorkerPool {
    pub fn new(num_workers: usize) -> Self {
        Self {
            num_workers: num_workers.max(1),
        }
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Compresses every descriptor exactly once and returns the block records
    /// as a slot array indexed by block index, plus per-worker task counts.
    ///
    /// Completion order across blocks is arbitrary; the returned array is
    /// always index-ordered because each result lands in its own slot. The
    /// join barrier is total: no slot is read for output until every worker
    /// thread has exited. Fetch and compression failures are recovered
    /// locally into `aggregator`; only worker panics and spawn failures
    /// surface as an `Err` here.
    pub fn run<F>(
        &self,
        descriptors: Vec<BlockDescriptor>,
        accessor: Arc<dyn InputAccessor>,
        engine: Arc<dyn CompressionEngine>,
        aggregator: Arc<ErrorAggregator>,
        progress_interval: Duration,
        mut on_progress: F,
    ) -> Result<(Vec<CompressedBlock>, Vec<WorkerRunSummary>)>
    where
        F: FnMut(ProgressSnapshot),
    {
        let total = descriptors.len();
        let mut slots: Vec<CompressedBlock> = (0..total).map(CompressedBlock::pending).collect();
        if total == 0 {
            return Ok((slots, Vec::new()));
        }

        let (work_tx, work_rx) = unbounded::<BlockDescriptor>();
        let (results_tx, results_rx) = unbounded::<CompressedBlock>();

        // The whole block list is known up front; queue it all and drop the
        // sender so workers drain until the channel disconnects.
        for descriptor in descriptors {
            let _ = work_tx.send(descriptor);
        }
        drop(work_tx);

        let started_at = Instant::now();
        let completed = Arc::new(AtomicUsize::new(0));
        let completed_bytes = Arc::new(AtomicU64::new(0));

        let mut handles = Vec::with_capacity(self.num_workers);
        for worker_id in 0..self.num_workers {
            let work_rx = work_rx.clone();
            let results_tx = results_tx.clone();
            let accessor = Arc::clone(&accessor);
            let engine = Arc::clone(&engine);
            let aggregator = Arc::clone(&aggregator);
            let completed = Arc::clone(&completed);
            let completed_bytes = Arc::clone(&completed_bytes);

            let handle = thread::Builder::new()
                .name(format!("parbz-worker-{worker_id}"))
                .spawn(move || {
                    let mut blocks_done = 0usize;
                    while let Ok(descriptor) = work_rx.recv() {
                        let block = process_block(
                            &descriptor,
                            accessor.as_ref(),
                            engine.as_ref(),
                            &aggregator,
                        );
                        completed_bytes.fetch_add(descriptor.length as u64, Ordering::AcqRel);
                        completed.fetch_add(1, Ordering::AcqRel);
                        blocks_done += 1;
                        if results_tx.send(block).is_err() {
                            break;
                        }
                    }
                    blocks_done
                })
                .map_err(|error| ParbzError::Other(error.into()))?;
            handles.push(handle);
        }
        drop(results_tx);
        drop(work_rx);

        // Collect unordered completions into index slots while emitting
        // advisory progress snapshots.
        let emit_every = progress_interval.max(Duration::from_millis(50));
        let mut last_emit = Instant::now();
        let mut received = 0usize;
        while received < total {
            match results_rx.recv_timeout(Duration::from_millis(50)) {
                Ok(block) => {
                    let index = block.index;
                    slots[index] = block;
                    received += 1;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            if last_emit.elapsed() >= emit_every || received == total {
                on_progress(ProgressSnapshot {
                    blocks_total: total,
                    blocks_completed: completed.load(Ordering::Acquire),
                    blocks_failed: aggregator.count(),
                    bytes_completed: completed_bytes.load(Ordering::Acquire),
                    elapsed: started_at.elapsed(),
                });
                last_emit = Instant::now();
            }
        }

        // Join barrier: results are only trusted once every worker exited.
        let mut workers = Vec::with_capacity(handles.len());
        for (worker_id, handle) in handles.into_iter().enumerate() {
            let blocks_completed = handle.join().map_err(|payload| {
                ParbzError::Other(anyhow!("worker {worker_id} panicked: {}", panic_message(&payload)))
            })?;
            workers.push(WorkerRunSummary {
                worker_id,
                blocks_completed,
            });
        }

        if received != total {
            return Err(ParbzError::Other(anyhow!(
                "worker pool delivered {received} of {total} block results"
            )));
        }

        Ok((slots, workers))
    }
}

/// Runs one block to its terminal status. Fetch and compression failures are
/// recorded and contained; a panic inside the engine is downgraded to a
/// failed block so sibling tasks keep running.
fn process_block(
    descriptor: &BlockDescriptor,
    accessor: &dyn InputAccessor,
    engine: &dyn CompressionEngine,
    aggregator: &ErrorAggregator,
) -> CompressedBlock {
    let original_size = descriptor.length as u64;

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let data = match accessor.fetch(descriptor) {
            Ok(data) => data,
            Err(error) => {
                aggregator.record(error);
                return CompressedBlock::failed(descriptor.index, original_size);
            }
        };

        match engine.compress(data.as_slice()) {
            Ok(payload) => {
                tracing::trace!(
                    block = descriptor.index,
                    original = descriptor.length,
                    compressed = payload.len(),
                    "block compressed"
                );
                CompressedBlock::compressed(descriptor.index, payload, original_size)
            }
            Err(error) => {
                aggregator.record(ParbzError::Compression {
                    index: descriptor.index,
                    message: error.to_string(),
                });
                CompressedBlock::failed(descriptor.index, original_size)
            }
        }
    }));

    match outcome {
        Ok(block) => block,
        Err(_) => {
            aggregator.record(ParbzError::Compression {
                index: descriptor.index,
                message: "worker task panicked while processing block".to_string(),
            });
            CompressedBlock::failed(descriptor.index, original_size)
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
