//! Batched iteration over a dataset: shuffling, grouping, tensor assembly.

use std::sync::Arc;

use candle_core::{Device, Tensor};
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::config::{LoaderConfig, WindowConfig};
use crate::data::dataset::{Dataset, WindowedDataset};
use crate::data::tokenizer::TextTokenizer;
use crate::error::DataResult;
use crate::logging::log_dataset_summary;

/// Build the index ordering for one pass over `len` samples.
///
/// Shuffling draws from an RNG seeded by `seed + epoch`, so every pass gets
/// a fresh permutation while staying reproducible for a given pair. No
/// global RNG state is touched.
fn epoch_indices(len: usize, shuffle: bool, seed: u64, epoch: u64) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..len).collect();
    if shuffle {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed.wrapping_add(epoch));
        indices.shuffle(&mut rng);
    }
    indices
}

/// One assembled batch, still as flat CPU buffers.
///
/// Kept separate from tensor creation so worker threads can do the
/// flattening while the consumer owns the device handle.
pub(crate) struct FlatBatch {
    pub input_ids: Vec<u32>,
    pub target_ids: Vec<u32>,
    pub batch_size: usize,
    pub seq_len: usize,
}

impl FlatBatch {
    pub(crate) fn to_tensors(&self, device: &Device) -> DataResult<(Tensor, Tensor)> {
        let inputs = Tensor::from_vec(
            self.input_ids.clone(),
            (self.batch_size, self.seq_len),
            device,
        )?;
        let targets = Tensor::from_vec(
            self.target_ids.clone(),
            (self.batch_size, self.seq_len),
            device,
        )?;
        Ok((inputs, targets))
    }
}

/// Look up each index and stack the windows into two flat parallel buffers.
pub(crate) fn assemble_flat(dataset: &dyn Dataset, indices: &[usize]) -> DataResult<FlatBatch> {
    let mut input_ids = Vec::new();
    let mut target_ids = Vec::new();
    let mut seq_len = 0;

    for (i, &idx) in indices.iter().enumerate() {
        let (input, target) = dataset.get(idx)?;
        if i == 0 {
            seq_len = input.len();
            input_ids.reserve(indices.len() * seq_len);
            target_ids.reserve(indices.len() * seq_len);
        }
        input_ids.extend_from_slice(&input);
        target_ids.extend_from_slice(&target);
    }

    Ok(FlatBatch {
        input_ids,
        target_ids,
        batch_size: indices.len(),
        seq_len,
    })
}

/// Batched data iterator over a [`Dataset`].
///
/// Holds a shared read-only handle to the dataset, the iteration policy, a
/// caller-supplied seed, and the device batches are created on. Each call to
/// [`iter`](DataLoader::iter) (or [`prefetch_iter`](DataLoader::prefetch_iter))
/// starts an independent pass; nothing carries over between passes.
pub struct DataLoader {
    dataset: Arc<dyn Dataset>,
    config: LoaderConfig,
    seed: u64,
    device: Device,
}

impl std::fmt::Debug for DataLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataLoader")
            .field("len", &self.dataset.len())
            .field("config", &self.config)
            .field("seed", &self.seed)
            .field("device", &self.device)
            .finish()
    }
}

impl DataLoader {
    pub fn new(
        dataset: Arc<dyn Dataset>,
        config: LoaderConfig,
        seed: u64,
        device: &Device,
    ) -> DataResult<Self> {
        config.validate()?;
        Ok(Self {
            dataset,
            config,
            seed,
            device: device.clone(),
        })
    }

    /// Tokenize, window, and wrap in one step.
    pub fn from_text(
        text: &str,
        tokenizer: &dyn TextTokenizer,
        window: &WindowConfig,
        config: LoaderConfig,
        seed: u64,
        device: &Device,
    ) -> DataResult<Self> {
        let dataset = WindowedDataset::from_text(text, tokenizer, window)?;
        log_dataset_summary(dataset.n_tokens(), dataset.len(), window);
        Self::new(Arc::new(dataset), config, seed, device)
    }

    pub fn dataset(&self) -> &dyn Dataset {
        self.dataset.as_ref()
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Number of batches per pass.
    pub fn n_batches(&self) -> usize {
        let len = self.dataset.len();
        if self.config.drop_last {
            len / self.config.batch_size
        } else {
            len.div_ceil(self.config.batch_size)
        }
    }

    /// Start a synchronous pass. An empty dataset yields zero batches.
    pub fn iter(&self, epoch: u64) -> Batches<'_> {
        let indices = epoch_indices(
            self.dataset.len(),
            self.config.shuffle,
            self.seed,
            epoch,
        );
        Batches {
            loader: self,
            indices,
            batch_idx: 0,
            n_batches: self.n_batches(),
        }
    }

    /// Start a pass with batch assembly spread over worker threads.
    ///
    /// Produces exactly the batches `iter(epoch)` would, in the same order;
    /// only wall-clock throughput changes. `num_workers == 0` still runs one
    /// worker.
    pub fn prefetch_iter(&self, epoch: u64) -> crate::data::async_loader::PrefetchBatches {
        let indices = epoch_indices(
            self.dataset.len(),
            self.config.shuffle,
            self.seed,
            epoch,
        );
        crate::data::async_loader::PrefetchBatches::new(
            Arc::clone(&self.dataset),
            indices,
            self.config,
            self.n_batches(),
            self.device.clone(),
        )
    }

    pub(crate) fn device(&self) -> &Device {
        &self.device
    }
}

/// Synchronous iterator over the batches of one pass.
pub struct Batches<'a> {
    loader: &'a DataLoader,
    indices: Vec<usize>,
    batch_idx: usize,
    n_batches: usize,
}

impl Batches<'_> {
    fn advance(&mut self) -> DataResult<Option<(Tensor, Tensor)>> {
        if self.batch_idx >= self.n_batches {
            return Ok(None);
        }
        let batch_size = self.loader.config.batch_size;
        let start = self.batch_idx * batch_size;
        let end = (start + batch_size).min(self.indices.len());
        self.batch_idx += 1;

        let flat = assemble_flat(self.loader.dataset.as_ref(), &self.indices[start..end])?;
        flat.to_tensors(self.loader.device()).map(Some)
    }
}

impl Iterator for Batches<'_> {
    type Item = DataResult<(Tensor, Tensor)>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(Some(batch)) => Some(Ok(batch)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.n_batches - self.batch_idx;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Batches<'_> {}
