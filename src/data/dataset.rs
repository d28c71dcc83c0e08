//! Dataset trait and the sliding-window sampler.

use std::path::Path;

use crate::config::WindowConfig;
use crate::data::tokenizer::TextTokenizer;
use crate::error::{DataError, DataResult, IoResultExt};

/// An indexable dataset of (input_ids, target_ids) pairs.
pub trait Dataset: Send + Sync {
    /// Number of samples in the dataset.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get a single sample by index. Fails with `OutOfRange` past the end.
    fn get(&self, idx: usize) -> DataResult<(Vec<u32>, Vec<u32>)>;
}

/// Overlapping fixed-length training pairs cut from one token sequence.
///
/// Window `k` starts at `k * stride`: the input is `max_length` tokens from
/// there, the target the same span shifted right by one, so the model learns
/// "predict the next token at every position". Windows whose target would
/// run past the end of the sequence are never emitted; a sequence of
/// `max_length` tokens or fewer yields a valid, empty dataset.
///
/// Only the flat token sequence is stored. Both slices of a window are
/// derived on access, so overlapping windows share one copy of the tokens.
#[derive(Debug)]
pub struct WindowedDataset {
    tokens: Vec<u32>,
    max_length: usize,
    stride: usize,
    n_windows: usize,
}

impl WindowedDataset {
    pub fn new(tokens: Vec<u32>, window: &WindowConfig) -> DataResult<Self> {
        window.validate()?;
        // Last valid start offset must satisfy off + max_length + 1 <= len
        let n_windows = if tokens.len() > window.max_length {
            (tokens.len() - window.max_length - 1) / window.stride + 1
        } else {
            0
        };
        Ok(Self {
            tokens,
            max_length: window.max_length,
            stride: window.stride,
            n_windows,
        })
    }

    /// Tokenize `text` and window the resulting sequence.
    pub fn from_text(
        text: &str,
        tokenizer: &dyn TextTokenizer,
        window: &WindowConfig,
    ) -> DataResult<Self> {
        let tokens = tokenizer.encode(text)?;
        Self::new(tokens, window)
    }

    /// Window a pre-tokenized corpus stored as little-endian u32 values.
    pub fn from_binary_file(path: &Path, window: &WindowConfig) -> DataResult<Self> {
        if !path.exists() {
            return Err(DataError::MissingSource {
                path: path.display().to_string(),
            });
        }
        let data = std::fs::read(path).with_path(path)?;
        if data.len() % 4 != 0 {
            return Err(DataError::Io {
                message: format!("{} bytes is not a multiple of 4", data.len()),
                path: path.display().to_string(),
            });
        }
        let tokens: Vec<u32> = data
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Self::new(tokens, window)
    }

    /// Length of the underlying token sequence.
    pub fn n_tokens(&self) -> usize {
        self.tokens.len()
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn stride(&self) -> usize {
        self.stride
    }
}

impl Dataset for WindowedDataset {
    fn len(&self) -> usize {
        self.n_windows
    }

    fn get(&self, idx: usize) -> DataResult<(Vec<u32>, Vec<u32>)> {
        if idx >= self.n_windows {
            return Err(DataError::OutOfRange {
                index: idx,
                len: self.n_windows,
            });
        }
        let start = idx * self.stride;
        let end = start + self.max_length;
        let input = self.tokens[start..end].to_vec();
        let target = self.tokens[start + 1..end + 1].to_vec();
        Ok((input, target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(max_length: usize, stride: usize) -> WindowConfig {
        WindowConfig::new(max_length, stride)
    }

    #[test]
    fn test_sliding_windows_stride_one() {
        let ds = WindowedDataset::new(vec![1, 2, 3, 4, 5, 6, 7, 8], &window(4, 1)).unwrap();
        assert_eq!(ds.len(), 4);

        let expected = [
            (vec![1, 2, 3, 4], vec![2, 3, 4, 5]),
            (vec![2, 3, 4, 5], vec![3, 4, 5, 6]),
            (vec![3, 4, 5, 6], vec![4, 5, 6, 7]),
            (vec![4, 5, 6, 7], vec![5, 6, 7, 8]),
        ];
        for (idx, (input, target)) in expected.iter().enumerate() {
            let (i, t) = ds.get(idx).unwrap();
            assert_eq!(&i, input);
            assert_eq!(&t, target);
        }
    }

    #[test]
    fn test_target_is_input_shifted() {
        let tokens: Vec<u32> = (0..50).collect();
        let ds = WindowedDataset::new(tokens.clone(), &window(8, 3)).unwrap();
        assert_eq!(ds.len(), 1 + (50 - 8 - 1) / 3);

        for k in 0..ds.len() {
            let off = k * 3;
            let (input, target) = ds.get(k).unwrap();
            for j in 0..7 {
                assert_eq!(target[j], input[j + 1]);
            }
            assert_eq!(target[7], tokens[off + 8]);
        }
    }

    #[test]
    fn test_short_sequence_is_empty_not_error() {
        // len == max_length: the target of window 0 would need one more token
        let ds = WindowedDataset::new(vec![1, 2, 3, 4], &window(4, 1)).unwrap();
        assert_eq!(ds.len(), 0);
        assert!(ds.is_empty());

        let ds = WindowedDataset::new(vec![1], &window(4, 1)).unwrap();
        assert_eq!(ds.len(), 0);

        // One extra token is exactly one window
        let ds = WindowedDataset::new(vec![1, 2, 3, 4, 5], &window(4, 1)).unwrap();
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn test_out_of_range() {
        let ds = WindowedDataset::new(vec![1, 2, 3, 4, 5, 6, 7, 8], &window(4, 1)).unwrap();
        let err = ds.get(ds.len()).unwrap_err();
        assert!(matches!(err, DataError::OutOfRange { index: 4, len: 4 }));
        assert!(ds.get(usize::MAX).is_err());
    }

    #[test]
    fn test_invalid_window_config() {
        assert!(WindowedDataset::new(vec![1, 2, 3], &window(0, 1)).is_err());
        assert!(WindowedDataset::new(vec![1, 2, 3], &window(2, 0)).is_err());
    }

    #[test]
    fn test_construction_is_idempotent() {
        let tokens: Vec<u32> = (0..100).map(|i| i * 7 % 41).collect();
        let a = WindowedDataset::new(tokens.clone(), &window(16, 5)).unwrap();
        let b = WindowedDataset::new(tokens, &window(16, 5)).unwrap();
        assert_eq!(a.len(), b.len());
        for k in 0..a.len() {
            assert_eq!(a.get(k).unwrap(), b.get(k).unwrap());
        }
    }

    #[test]
    fn test_from_binary_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.bin");
        let tokens: Vec<u32> = (10..30).collect();
        let bytes: Vec<u8> = tokens.iter().flat_map(|t| t.to_le_bytes()).collect();
        std::fs::write(&path, bytes).unwrap();

        let ds = WindowedDataset::from_binary_file(&path, &window(4, 2)).unwrap();
        assert_eq!(ds.n_tokens(), 20);
        let (input, _) = ds.get(1).unwrap();
        assert_eq!(input, vec![12, 13, 14, 15]);
    }

    #[test]
    fn test_from_binary_file_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("absent.bin");
        let err = WindowedDataset::from_binary_file(&missing, &window(4, 1)).unwrap_err();
        assert!(matches!(err, DataError::MissingSource { .. }));

        let truncated = dir.path().join("truncated.bin");
        std::fs::write(&truncated, [1u8, 2, 3]).unwrap();
        let err = WindowedDataset::from_binary_file(&truncated, &window(4, 1)).unwrap_err();
        assert!(matches!(err, DataError::Io { .. }));
    }
}
