//! Tokenizer adapters: the BPE encode/decode seam.
//!
//! Tokenization is an external capability as far as windowing is concerned.
//! Everything downstream of `encode` works on plain token IDs, so any
//! implementation of [`TextTokenizer`] can feed the dataset.

use std::path::Path;

use tiktoken_rs::CoreBPE;

use crate::error::{DataError, DataResult};

/// Capability interface over a BPE tokenizer.
///
/// The vocabulary and the special-token policy belong to the adapter;
/// callers only see ordered token IDs.
pub trait TextTokenizer {
    /// Encode text to token IDs.
    fn encode(&self, text: &str) -> DataResult<Vec<u32>>;

    /// Decode token IDs back to text.
    fn decode(&self, ids: &[u32]) -> DataResult<String>;

    /// Total vocabulary size, special tokens included.
    fn vocab_size(&self) -> usize;
}

/// GPT-2 BPE tokenizer (50257 vocab) backed by tiktoken's `r50k_base`.
pub struct Gpt2Tokenizer {
    bpe: CoreBPE,
    allow_special: bool,
}

const GPT2_VOCAB_SIZE: usize = 50257;

impl Gpt2Tokenizer {
    /// GPT-2 encoding with the registered special tokens (`<|endoftext|>`)
    /// recognized in the input text.
    pub fn new() -> DataResult<Self> {
        let bpe = tiktoken_rs::r50k_base()
            .map_err(|e| DataError::Tokenizer(format!("Failed to load r50k_base: {}", e)))?;
        Ok(Self {
            bpe,
            allow_special: true,
        })
    }

    /// GPT-2 encoding with no special tokens allowed: special-token text in
    /// the input is encoded as ordinary text.
    pub fn without_special_tokens() -> DataResult<Self> {
        let mut tok = Self::new()?;
        tok.allow_special = false;
        Ok(tok)
    }
}

impl TextTokenizer for Gpt2Tokenizer {
    fn encode(&self, text: &str) -> DataResult<Vec<u32>> {
        let ids = if self.allow_special {
            self.bpe.encode_with_special_tokens(text)
        } else {
            self.bpe.encode_ordinary(text)
        };
        Ok(ids)
    }

    fn decode(&self, ids: &[u32]) -> DataResult<String> {
        self.bpe
            .decode(ids.to_vec())
            .map_err(|e| DataError::Tokenizer(format!("Decoding error: {}", e)))
    }

    fn vocab_size(&self) -> usize {
        GPT2_VOCAB_SIZE
    }
}

/// Tokenizer loaded from a HuggingFace `tokenizer.json` file.
///
/// Lets a corpus prepared with a custom-trained BPE vocabulary flow through
/// the same windowing pipeline as the stock GPT-2 encoding.
pub struct HfTokenizer {
    inner: tokenizers::Tokenizer,
    vocab_size: usize,
}

impl HfTokenizer {
    /// Load from a local tokenizer.json file.
    pub fn from_file(path: &Path) -> DataResult<Self> {
        let inner = tokenizers::Tokenizer::from_file(path).map_err(|e| {
            DataError::Tokenizer(format!("Failed to load tokenizer from {:?}: {}", path, e))
        })?;
        let vocab_size = inner.get_vocab_size(true);
        Ok(Self { inner, vocab_size })
    }

    /// Load from raw bytes (e.g. an embedded tokenizer.json).
    pub fn from_bytes(bytes: &[u8]) -> DataResult<Self> {
        let inner = tokenizers::Tokenizer::from_bytes(bytes)
            .map_err(|e| DataError::Tokenizer(format!("Failed to load tokenizer: {}", e)))?;
        let vocab_size = inner.get_vocab_size(true);
        Ok(Self { inner, vocab_size })
    }
}

impl TextTokenizer for HfTokenizer {
    fn encode(&self, text: &str) -> DataResult<Vec<u32>> {
        let encoding = self
            .inner
            .encode(text, false)
            .map_err(|e| DataError::Tokenizer(format!("Encoding error: {}", e)))?;
        Ok(encoding.get_ids().to_vec())
    }

    fn decode(&self, ids: &[u32]) -> DataResult<String> {
        self.inner
            .decode(ids, true)
            .map_err(|e| DataError::Tokenizer(format!("Decoding error: {}", e)))
    }

    fn vocab_size(&self) -> usize {
        self.vocab_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_gpt2_encode_decode() {
        let tok = Gpt2Tokenizer::new().unwrap();
        let ids = tok.encode("Hello, world.").unwrap();
        assert!(!ids.is_empty());
        assert_eq!(tok.decode(&ids).unwrap(), "Hello, world.");
        assert_eq!(tok.vocab_size(), 50257);
    }

    #[test]
    fn test_gpt2_special_token_policy() {
        let with = Gpt2Tokenizer::new().unwrap();
        let without = Gpt2Tokenizer::without_special_tokens().unwrap();

        let text = "one<|endoftext|>two";
        let a = with.encode(text).unwrap();
        let b = without.encode(text).unwrap();
        // Allowed: the marker collapses to a single id. Disallowed: it is
        // split into ordinary subwords.
        assert!(a.contains(&50256));
        assert!(!b.contains(&50256));
        assert!(b.len() > a.len());
    }

    #[test]
    fn test_hf_tokenizer_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokenizer.json");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "{{}}").unwrap();
        // Empty JSON is not a valid tokenizer; the API should error, not panic
        assert!(HfTokenizer::from_file(&path).is_err());
        assert!(HfTokenizer::from_bytes(b"not json").is_err());
    }
}
