use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("library file {path} is not a valid citation list: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize library '{library}': {source}")]
    Serialize {
        library: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid library name '{0}'")]
    InvalidLibraryName(String),

    #[error("library '{library}' has no citation at position {index}")]
    NoSuchRecord { library: String, index: usize },
}

impl StorageError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
