//! Runtime configuration for building, caching and querying an index.
//!
//! Loaded from a camelCase JSON file; every field has a default so a partial
//! (or empty) file is valid.

use crate::error::{Error, Result};
use crate::tokenizer::{Analyzing, Splitter, Whitespace};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// BM25 saturation (`k`) and length normalization (`b`) parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    pub k: f64,
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k: default_k(), b: default_b() }
    }
}

/// Value stored in each matrix cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Weighting {
    #[default]
    Bm25,
    /// Raw term frequency; useful to compare rankings against plain tf.
    RawTf,
}

/// What to do with a document file that fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParsePolicy {
    /// Abort the whole corpus load on the first malformed document.
    #[default]
    FailFast,
    SkipAndLog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SplitterKind {
    #[default]
    Whitespace,
    Analyzing,
}

impl SplitterKind {
    pub fn build(self) -> Box<dyn Splitter> {
        match self {
            SplitterKind::Whitespace => Box::new(Whitespace),
            SplitterKind::Analyzing => Box::new(Analyzing::default()),
        }
    }
}

/// Per-engine settings. Weighting lives here rather than in any shared state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub params: Bm25Params,
    pub weighting: Weighting,
    pub max_results: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            params: Bm25Params::default(),
            weighting: Weighting::Bm25,
            max_results: default_max_results(),
        }
    }
}

impl EngineConfig {
    /// Whether a matrix weighted with `weighting` and `params` holds the same
    /// cell values this config would build. `k` and `b` only matter for BM25.
    pub fn weights_match(&self, weighting: Weighting, params: Bm25Params) -> bool {
        match (self.weighting, weighting) {
            (Weighting::RawTf, Weighting::RawTf) => true,
            (Weighting::Bm25, Weighting::Bm25) => self.params == params,
            _ => false,
        }
    }

    pub(crate) fn weights_label(weighting: Weighting, params: Bm25Params) -> String {
        match weighting {
            Weighting::RawTf => "rawTf".into(),
            Weighting::Bm25 => format!("bm25(k={}, b={})", params.k, params.b),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchConfig {
    pub data_dir: PathBuf,
    pub model_dir: PathBuf,
    pub model_name: String,
    pub state_dir: PathBuf,
    pub use_cache: bool,
    pub k: f64,
    pub b: f64,
    pub weighting: Weighting,
    pub max_results: usize,
    pub parse_policy: ParsePolicy,
    pub splitter: SplitterKind,
}

fn default_k() -> f64 { 1.75 }
fn default_b() -> f64 { 0.75 }
fn default_max_results() -> usize { 10 }

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            model_dir: PathBuf::from("./.data/model"),
            model_name: "bm25.bin".into(),
            state_dir: PathBuf::from("./.data/state"),
            use_cache: true,
            k: default_k(),
            b: default_b(),
            weighting: Weighting::Bm25,
            max_results: default_max_results(),
            parse_policy: ParsePolicy::FailFast,
            splitter: SplitterKind::Whitespace,
        }
    }
}

impl SearchConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        serde_json::from_reader(reader)
            .map_err(|source| Error::Config { path: path.to_path_buf(), source })
    }

    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            params: Bm25Params { k: self.k, b: self.b },
            weighting: self.weighting,
            max_results: self.max_results,
        }
    }

    pub fn matrix_path(&self) -> PathBuf { self.model_dir.join(&self.model_name) }

    pub fn state_path(&self) -> PathBuf { self.state_dir.join("app_state.json") }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let cfg: SearchConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.max_results, 10);
        assert_eq!(cfg.k, 1.75);
        assert_eq!(cfg.b, 0.75);
        assert_eq!(cfg.weighting, Weighting::Bm25);
        assert_eq!(cfg.parse_policy, ParsePolicy::FailFast);
        assert!(cfg.use_cache);
    }

    #[test]
    fn camel_case_keys() {
        let cfg: SearchConfig = serde_json::from_str(
            r#"{"dataDir":"docs","modelName":"m.bin","weighting":"rawTf",
                "parsePolicy":"skipAndLog","maxResults":3}"#,
        )
        .unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("docs"));
        assert_eq!(cfg.matrix_path(), PathBuf::from("./.data/model/m.bin"));
        assert_eq!(cfg.weighting, Weighting::RawTf);
        assert_eq!(cfg.parse_policy, ParsePolicy::SkipAndLog);
        assert_eq!(cfg.engine().max_results, 3);
    }

    #[test]
    fn weights_match_ignores_params_for_raw_tf() {
        let bm25 = EngineConfig::default();
        let raw = EngineConfig { weighting: Weighting::RawTf, ..bm25 };
        let other = Bm25Params { k: 0.0, b: 0.5 };

        assert!(bm25.weights_match(Weighting::Bm25, Bm25Params::default()));
        assert!(!bm25.weights_match(Weighting::Bm25, other));
        assert!(!bm25.weights_match(Weighting::RawTf, Bm25Params::default()));
        assert!(raw.weights_match(Weighting::RawTf, other));
        assert!(!raw.weights_match(Weighting::Bm25, Bm25Params::default()));
    }
}
