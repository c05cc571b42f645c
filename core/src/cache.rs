//! Decides whether a saved matrix can be reused for the current corpus.
//!
//! The record on disk describes the corpus the saved matrix was built from.
//! It is removed before a rebuilt matrix is written and only rewritten after
//! that write succeeds, so an interrupted run leaves no record that points at
//! a half-written or foreign matrix.

use crate::bm25::Bm25;
use crate::config::EngineConfig;
use crate::document::Corpus;
use crate::error::Result;
use crate::persist::{load_json, remove_if_exists, save_json, write_atomic, IndexPaths};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

const RECORD_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexCacheRecord {
    pub num_docs: usize,
    pub fingerprint: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub version: u32,
}

impl IndexCacheRecord {
    pub fn for_corpus(corpus: &Corpus) -> Self {
        Self {
            num_docs: corpus.len(),
            fingerprint: corpus.fingerprint.clone(),
            created_at: OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default(),
            version: RECORD_VERSION,
        }
    }

    /// Valid only for a non-empty corpus of the same size and a non-empty,
    /// equal fingerprint.
    pub fn matches(&self, corpus: &Corpus) -> bool {
        !self.fingerprint.is_empty()
            && self.fingerprint == corpus.fingerprint
            && self.num_docs > 0
            && self.num_docs == corpus.len()
    }
}

/// The cache record file and the record read from it at startup.
#[derive(Debug)]
pub struct IndexCache {
    path: PathBuf,
    record: Option<IndexCacheRecord>,
}

impl IndexCache {
    /// Reads the record at `path`. Missing or unreadable records mean "no cache".
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let record = match load_json::<IndexCacheRecord>(&path) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "ignoring unreadable cache record"
                );
                None
            }
        };
        Self { path, record }
    }

    pub fn record(&self) -> Option<&IndexCacheRecord> { self.record.as_ref() }

    pub fn is_valid_for(&self, corpus: &Corpus) -> bool {
        self.record.as_ref().is_some_and(|r| r.matches(corpus))
    }

    /// Forgets the record, in memory and on disk.
    pub fn invalidate(&mut self) -> Result<()> {
        self.record = None;
        remove_if_exists(&self.path)
    }

    pub fn store(&mut self, corpus: &Corpus) -> Result<()> {
        let record = IndexCacheRecord::for_corpus(corpus);
        save_json(&self.path, &record)?;
        self.record = Some(record);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexSource {
    /// Loaded from the saved matrix.
    Cache,
    /// Built from the corpus; `persisted` is false when the save failed.
    Rebuilt { persisted: bool },
}

/// Loads the saved matrix when the cache record matches `corpus`, otherwise
/// rebuilds, saves and records. Any load failure (including a matrix weighted
/// under a different config) falls back to a rebuild and any save failure is
/// logged; the returned engine is always ready.
pub fn open_or_build(
    paths: &IndexPaths,
    corpus: &Corpus,
    config: EngineConfig,
    use_cache: bool,
) -> (Bm25, IndexSource) {
    let mut cache = IndexCache::open(&paths.record);
    let mut engine = Bm25::new(config);

    if use_cache && cache.is_valid_for(corpus) && paths.matrix.exists() {
        let start = Instant::now();
        match load_matrix_file(&mut engine, &paths.matrix, corpus) {
            Ok(()) => {
                tracing::info!(
                    path = %paths.matrix.display(),
                    took_s = start.elapsed().as_secs_f64(),
                    "loaded search index"
                );
                return (engine, IndexSource::Cache);
            }
            Err(e) => tracing::warn!(
                path = %paths.matrix.display(),
                error = %e,
                "saved index unusable, rebuilding"
            ),
        }
    }

    let start = Instant::now();
    engine.build(&corpus.documents);
    tracing::info!(
        num_docs = corpus.len(),
        took_s = start.elapsed().as_secs_f64(),
        "built search index"
    );

    let persisted = match persist(&mut cache, &engine, paths, corpus) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "could not persist search index");
            false
        }
    };
    (engine, IndexSource::Rebuilt { persisted })
}

fn persist(
    cache: &mut IndexCache,
    engine: &Bm25,
    paths: &IndexPaths,
    corpus: &Corpus,
) -> Result<()> {
    cache.invalidate()?;
    let start = Instant::now();
    save_matrix_file(engine, &paths.matrix)?;
    tracing::info!(
        path = %paths.matrix.display(),
        took_s = start.elapsed().as_secs_f64(),
        "saved search index"
    );
    cache.store(corpus)
}

pub fn save_matrix_file(engine: &Bm25, path: &Path) -> Result<()> {
    let mut bytes = Vec::new();
    engine.save(&mut bytes)?;
    write_atomic(path, &bytes)
}

pub fn load_matrix_file(engine: &mut Bm25, path: &Path, corpus: &Corpus) -> Result<()> {
    let reader = BufReader::new(File::open(path)?);
    engine.load(reader, &corpus.documents)
}
