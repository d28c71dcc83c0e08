//! Worker-pool batch prefetching.
//!
//! Spreads batch assembly over threads so tokenized windows are flattened
//! while the consumer is busy with the previous batch. Workers claim batch
//! indices round-robin and send flat batches tagged with their index over a
//! bounded channel; the consumer re-sequences them, so for any worker count
//! the stream of batches is identical to the synchronous path.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use candle_core::{Device, Tensor};
use crossbeam_channel::{bounded, Receiver, Sender};

use crate::config::LoaderConfig;
use crate::data::dataset::Dataset;
use crate::data::loader::{assemble_flat, FlatBatch};
use crate::error::{DataError, DataResult};

type TaggedBatch = (usize, DataResult<FlatBatch>);

/// Prefetching iterator over the batches of one pass.
///
/// Created by [`DataLoader::prefetch_iter`](crate::data::loader::DataLoader::prefetch_iter).
pub struct PrefetchBatches {
    rx: Receiver<TaggedBatch>,
    /// Batches that arrived ahead of their turn, keyed by batch index.
    /// Bounded by channel capacity + worker count.
    pending: HashMap<usize, DataResult<FlatBatch>>,
    next_batch: usize,
    n_batches: usize,
    device: Device,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl PrefetchBatches {
    pub(crate) fn new(
        dataset: Arc<dyn Dataset>,
        indices: Vec<usize>,
        config: LoaderConfig,
        n_batches: usize,
        device: Device,
    ) -> Self {
        let n_workers = config.num_workers.max(1);
        let (tx, rx) = bounded::<TaggedBatch>(config.prefetch_size.max(1));
        let shutdown = Arc::new(AtomicBool::new(false));
        let indices = Arc::new(indices);

        let mut workers = Vec::with_capacity(n_workers);
        for worker_id in 0..n_workers {
            let dataset = Arc::clone(&dataset);
            let indices = Arc::clone(&indices);
            let tx = tx.clone();
            let shutdown = Arc::clone(&shutdown);
            let batch_size = config.batch_size;

            workers.push(thread::spawn(move || {
                worker_loop(
                    worker_id, n_workers, dataset, indices, batch_size, n_batches, tx, shutdown,
                );
            }));
        }
        // Close the channel once the last worker is done
        drop(tx);

        Self {
            rx,
            pending: HashMap::new(),
            next_batch: 0,
            n_batches,
            device,
            workers,
            shutdown,
        }
    }

    /// Receive until the next in-order batch is available.
    fn next_flat(&mut self) -> Option<DataResult<FlatBatch>> {
        if self.next_batch >= self.n_batches {
            return None;
        }
        loop {
            if let Some(flat) = self.pending.remove(&self.next_batch) {
                self.next_batch += 1;
                return Some(flat);
            }
            match self.rx.recv() {
                Ok((idx, flat)) => {
                    self.pending.insert(idx, flat);
                }
                Err(_) => {
                    // All senders gone with batches still owed
                    self.next_batch = self.n_batches;
                    return Some(Err(DataError::Channel(
                        "workers exited before delivering all batches".to_string(),
                    )));
                }
            }
        }
    }

    /// Batches remaining in this pass.
    pub fn remaining(&self) -> usize {
        self.n_batches - self.next_batch
    }
}

#[allow(clippy::too_many_arguments)]
fn worker_loop(
    worker_id: usize,
    n_workers: usize,
    dataset: Arc<dyn Dataset>,
    indices: Arc<Vec<usize>>,
    batch_size: usize,
    n_batches: usize,
    tx: Sender<TaggedBatch>,
    shutdown: Arc<AtomicBool>,
) {
    for batch_idx in (worker_id..n_batches).step_by(n_workers) {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }
        let start = batch_idx * batch_size;
        let end = (start + batch_size).min(indices.len());
        let flat = assemble_flat(dataset.as_ref(), &indices[start..end]);

        // Blocks while the prefetch queue is full
        if tx.send((batch_idx, flat)).is_err() {
            break; // receiver dropped
        }
    }
}

impl Iterator for PrefetchBatches {
    type Item = DataResult<(Tensor, Tensor)>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_flat()? {
            Ok(flat) => Some(flat.to_tensors(&self.device)),
            Err(e) => Some(Err(e)),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining(), Some(self.remaining()))
    }
}

impl ExactSizeIterator for PrefetchBatches {}

impl Drop for PrefetchBatches {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);

        // Drain until every worker has observed the flag and dropped its
        // sender; a one-shot try_recv sweep could leave a sender blocked on
        // a full queue forever when workers outnumber queue slots.
        while self.rx.recv().is_ok() {}

        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}
