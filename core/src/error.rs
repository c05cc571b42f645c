use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("corpus directory not found: {path}")]
    CorpusNotFound { path: PathBuf },

    #[error("malformed document in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("matrix stream encoding: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("corrupt matrix stream: {0}")]
    Corrupt(String),

    /// Persisted matrix shape disagrees with the shape derived from the corpus.
    #[error("dimension mismatch: expected {expected:?} (docs, terms), found {found:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// Persisted matrix was weighted differently from what the engine is
    /// configured to build.
    #[error("weighting mismatch: engine uses {expected}, persisted matrix uses {found}")]
    WeightingMismatch { expected: String, found: String },

    #[error("persisted vocabulary differs from corpus vocabulary at column {column}")]
    VocabularyMismatch { column: usize },
}
