//! Windowing and loader configuration.

use serde::{Deserialize, Serialize};

use crate::error::{config_error, DataResult};

fn default_max_length() -> usize {
    256
}

fn default_stride() -> usize {
    128 // half-window overlap between consecutive samples
}

fn default_batch_size() -> usize {
    4
}

fn default_num_workers() -> usize {
    0 // synchronous batch assembly
}

fn default_prefetch_size() -> usize {
    8 // prefetch 8 batches (smooths variance, low memory overhead)
}

fn default_true() -> bool {
    true
}

/// Sliding-window sampling parameters.
///
/// `max_length` is the sequence length of every (input, target) pair;
/// `stride` is the offset step between consecutive window starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    #[serde(default = "default_stride")]
    pub stride: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            max_length: default_max_length(),
            stride: default_stride(),
        }
    }
}

impl WindowConfig {
    pub fn new(max_length: usize, stride: usize) -> Self {
        Self { max_length, stride }
    }

    /// Reject degenerate window shapes. Never clamps.
    pub fn validate(&self) -> DataResult<()> {
        if self.max_length == 0 {
            return Err(config_error("max_length must be > 0"));
        }
        if self.stride == 0 {
            return Err(config_error("stride must be > 0"));
        }
        Ok(())
    }
}

/// Batch iteration parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Number of windows per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Permute window order each pass
    #[serde(default = "default_true")]
    pub shuffle: bool,
    /// Discard a final batch shorter than `batch_size`
    #[serde(default = "default_true")]
    pub drop_last: bool,
    /// Worker threads for batch assembly (0 = synchronous).
    /// A throughput knob only: batch contents and order are unaffected.
    #[serde(default = "default_num_workers")]
    pub num_workers: usize,
    /// Bound on batches assembled ahead of the consumer (workers only)
    #[serde(default = "default_prefetch_size")]
    pub prefetch_size: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            shuffle: true,
            drop_last: true,
            num_workers: default_num_workers(),
            prefetch_size: default_prefetch_size(),
        }
    }
}

impl LoaderConfig {
    /// Unshuffled, keep-everything iteration. Useful for evaluation passes
    /// and for inspecting the sliding-window layout in order.
    pub fn sequential() -> Self {
        Self {
            shuffle: false,
            drop_last: false,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> DataResult<()> {
        if self.batch_size == 0 {
            return Err(config_error("batch_size must be > 0"));
        }
        Ok(())
    }
}
