//! Text → tokens → windows → batches.

pub mod async_loader;
pub mod dataset;
pub mod loader;
pub mod tokenizer;

pub use async_loader::PrefetchBatches;
pub use dataset::{Dataset, WindowedDataset};
pub use loader::{Batches, DataLoader};
pub use tokenizer::{Gpt2Tokenizer, HfTokenizer, TextTokenizer};

use std::path::Path;

use crate::error::{DataError, DataResult, IoResultExt};

/// Read a UTF-8 source text file.
///
/// A missing file is a user-visible `MissingSource` error, not a panic;
/// other IO failures carry the path.
pub fn load_text(path: &Path) -> DataResult<String> {
    if !path.exists() {
        return Err(DataError::MissingSource {
            path: path.display().to_string(),
        });
    }
    std::fs::read_to_string(path).with_path(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_text_reads_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("the-verdict.txt");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(f, "I had always thought Jack Gisburn rather a cheap genius").unwrap();

        let text = load_text(&path).unwrap();
        assert!(text.starts_with("I had always"));
    }

    #[test]
    fn test_load_text_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.txt");
        let err = load_text(&path).unwrap_err();
        assert!(matches!(err, DataError::MissingSource { .. }));
        assert_eq!(err.path(), Some(path.display().to_string().as_str()));
    }
}
