//! Custom error types for the data pipeline
//!
//! Provides structured error handling with context and user-friendly
//! error messages.

use thiserror::Error;

/// Main error type for dataset and loader operations
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum DataError {
    /// Source text file does not exist
    #[error("Missing source text: '{path}'")]
    MissingSource { path: String },

    /// Configuration validation failures
    #[error("Configuration error: {0}")]
    Config(String),

    /// Dataset index lookup beyond bounds
    #[error("Index {index} out of range for dataset of {len} windows")]
    OutOfRange { index: usize, len: usize },

    /// Tokenizer encode/decode failures
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// Errors from the Candle tensor library
    #[error("Tensor error: {0}")]
    Tensor(String),

    /// I/O errors with path context
    #[error("IO error at '{path}': {message}")]
    Io { message: String, path: String },

    /// Async channel errors from the prefetching loader
    #[error("Channel error: {0}")]
    Channel(String),
}

/// Result type alias for dataset and loader operations
pub type DataResult<T> = std::result::Result<T, DataError>;

impl DataError {
    /// Get the path associated with this error (if any)
    pub fn path(&self) -> Option<&str> {
        match self {
            DataError::MissingSource { path } => Some(path),
            DataError::Io { path, .. } => Some(path),
            _ => None,
        }
    }
}

impl From<candle_core::Error> for DataError {
    fn from(err: candle_core::Error) -> Self {
        DataError::Tensor(err.to_string())
    }
}

impl From<std::io::Error> for DataError {
    fn from(err: std::io::Error) -> Self {
        DataError::Io {
            message: err.to_string(),
            path: String::new(),
        }
    }
}

/// Helper trait for adding path context to IO operations
pub trait IoResultExt<T> {
    fn with_path<P: AsRef<std::path::Path>>(self, path: P) -> DataResult<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path<P: AsRef<std::path::Path>>(self, path: P) -> DataResult<T> {
        self.map_err(|e| DataError::Io {
            message: e.to_string(),
            path: path.as_ref().display().to_string(),
        })
    }
}

/// Helper for creating config errors
pub fn config_error(message: impl Into<String>) -> DataError {
    DataError::Config(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_extraction() {
        let err = DataError::MissingSource {
            path: "/tmp/the-verdict.txt".to_string(),
        };
        assert_eq!(err.path(), Some("/tmp/the-verdict.txt"));

        let io_err = DataError::Io {
            message: "failed".to_string(),
            path: "/tmp/data".to_string(),
        };
        assert_eq!(io_err.path(), Some("/tmp/data"));

        let other = DataError::Config("bad stride".to_string());
        assert_eq!(other.path(), None);
    }

    #[test]
    fn test_io_with_path() {
        let result: std::io::Result<()> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "permission denied",
        ));
        let data_result: DataResult<()> = result.with_path("/tmp/locked.txt");

        match data_result {
            Err(DataError::Io { path, .. }) => assert_eq!(path, "/tmp/locked.txt"),
            _ => panic!("Expected IO error with path"),
        }
    }

    #[test]
    fn test_out_of_range_message() {
        let err = DataError::OutOfRange { index: 7, len: 4 };
        assert_eq!(
            err.to_string(),
            "Index 7 out of range for dataset of 4 windows"
        );
    }
}
