//! # tokenbatch
//!
//! Sliding-window token datasets and batched loaders for next-token-prediction
//! training.
//!
//! ## Pipeline
//!
//! raw text → BPE token IDs → overlapping (input, target) windows → shuffled
//! `[batch, seq]` tensor batches:
//!
//! - **Tokenizers**: GPT-2 BPE (tiktoken `r50k_base`) or any HuggingFace
//!   `tokenizer.json`, behind the [`TextTokenizer`](data::TextTokenizer) trait
//! - **Windowing**: fixed `max_length` windows every `stride` tokens, targets
//!   shifted right by one, derived lazily from a single owned token sequence
//! - **Batching**: deterministic per-epoch shuffling from a caller seed,
//!   optional short-batch dropping, optional worker-thread prefetching that
//!   never changes batch contents or order
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use candle_core::Device;
//! use tokenbatch::config::{LoaderConfig, WindowConfig};
//! use tokenbatch::data::{load_text, DataLoader, Gpt2Tokenizer};
//!
//! # fn main() -> anyhow::Result<()> {
//! let text = load_text(std::path::Path::new("the-verdict.txt"))?;
//! let tokenizer = Gpt2Tokenizer::new()?;
//! let loader = DataLoader::from_text(
//!     &text,
//!     &tokenizer,
//!     &WindowConfig::new(256, 128),
//!     LoaderConfig::default(),
//!     42,
//!     &Device::Cpu,
//! )?;
//!
//! for batch in loader.iter(0) {
//!     let (inputs, targets) = batch?;
//!     // inputs, targets: [batch_size, max_length] u32 tensors
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod logging;

pub use config::{LoaderConfig, WindowConfig};
pub use data::{DataLoader, Dataset, Gpt2Tokenizer, HfTokenizer, TextTokenizer, WindowedDataset};
pub use error::{DataError, DataResult};
