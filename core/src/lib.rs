//! BM25 term-document index over a JSON corpus, with a reusable on-disk cache.

pub mod bm25;
pub mod cache;
pub mod config;
pub mod corpus;
pub mod document;
pub mod error;
pub mod index;
pub mod matrix;
pub mod persist;
pub mod search;
pub mod tokenizer;

pub use bm25::Bm25;
pub use cache::{open_or_build, IndexCache, IndexCacheRecord, IndexSource};
pub use config::{Bm25Params, EngineConfig, ParsePolicy, SearchConfig, Weighting};
pub use document::{Corpus, Document, RowId, TermId};
pub use error::{Error, Result};
pub use persist::IndexPaths;
pub use search::ScoredDoc;
