//! Reads a document directory into a [`Corpus`].
//!
//! `.json` files hold one document object or an array of them, `.jsonl` files
//! one object per non-empty line. Files are visited in file-name order so row
//! assignment is reproducible.

use crate::config::ParsePolicy;
use crate::document::{Corpus, Document};
use crate::error::{Error, Result};
use crate::tokenizer::Splitter;
use serde::Deserialize;
use sha1::{Digest, Sha1};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Body {
    Fragments(Vec<String>),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct InputDoc {
    id: String,
    body: Body,
}

impl InputDoc {
    fn into_document(self, row: usize, splitter: &dyn Splitter) -> Document {
        match self.body {
            Body::Fragments(parts) => Document::from_body(self.id, &parts, row, splitter),
            Body::Text(text) => Document::new(self.id, splitter.split(&text), row),
        }
    }
}

/// Documents plus fingerprint. A fingerprint failure is logged and leaves the
/// fingerprint empty, which never matches a cache record.
pub fn load_corpus<P: AsRef<Path>>(
    dir: P,
    policy: ParsePolicy,
    splitter: &dyn Splitter,
) -> Result<Corpus> {
    let dir = dir.as_ref();
    let documents = read_documents(dir, policy, splitter)?;
    let fingerprint = fingerprint(dir).unwrap_or_else(|e| {
        tracing::warn!(path = %dir.display(), error = %e, "could not fingerprint corpus");
        String::new()
    });
    Ok(Corpus::new(documents, fingerprint))
}

pub fn read_documents(
    dir: &Path,
    policy: ParsePolicy,
    splitter: &dyn Splitter,
) -> Result<Vec<Document>> {
    if !dir.exists() {
        return Err(Error::CorpusNotFound { path: dir.to_path_buf() });
    }
    let mut documents = Vec::new();
    for path in document_files(dir)? {
        for parsed in parse_file(&path)? {
            match parsed {
                Ok(doc) => {
                    let row = documents.len();
                    documents.push(doc.into_document(row, splitter));
                }
                Err(e) if policy == ParsePolicy::SkipAndLog => {
                    tracing::warn!(error = %e, "skipping malformed document");
                }
                Err(e) => return Err(e),
            }
        }
    }
    tracing::info!(num_docs = documents.len(), path = %dir.display(), "read corpus");
    Ok(documents)
}

fn document_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        let p = entry.path();
        let ext = p.extension().and_then(|s| s.to_str());
        if entry.file_type().is_file() && matches!(ext, Some("json" | "jsonl")) {
            files.push(p.to_path_buf());
        }
    }
    Ok(files)
}

/// Only I/O failures are returned as `Err`; undecodable content, including
/// invalid UTF-8, comes back as per-document `Error::Parse` for the policy.
fn parse_file(path: &Path) -> Result<Vec<Result<InputDoc>>> {
    let bytes = fs::read(path)?;
    let parse_err = |source: serde_json::Error| Error::Parse { path: path.to_path_buf(), source };

    if path.extension().and_then(|s| s.to_str()) == Some("jsonl") {
        return Ok(bytes
            .split(|&b| b == b'\n')
            .filter(|l| !l.iter().all(u8::is_ascii_whitespace))
            .map(|l| serde_json::from_slice(l).map_err(parse_err))
            .collect());
    }
    let docs: Vec<Result<InputDoc>> = match serde_json::from_slice::<serde_json::Value>(&bytes) {
        Ok(serde_json::Value::Array(items)) => {
            items.into_iter().map(|v| serde_json::from_value(v).map_err(parse_err)).collect()
        }
        Ok(v) => vec![serde_json::from_value(v).map_err(parse_err)],
        Err(e) => vec![Err(parse_err(e))],
    };
    Ok(docs)
}

/// Content hash of every regular file under `dir`: SHA-1 per file, then
/// SHA-1 over the `"<hex>  <relative path>\n"` lines sorted by path.
pub fn fingerprint<P: AsRef<Path>>(dir: P) -> Result<String> {
    let dir = dir.as_ref();
    let mut lines = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(dir).unwrap_or(entry.path());
        let rel = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let digest = Sha1::digest(fs::read(entry.path())?);
        lines.push((rel, format!("{digest:x}")));
    }
    lines.sort();
    let mut summary = Sha1::new();
    for (rel, hex) in &lines {
        summary.update(format!("{hex}  {rel}\n").as_bytes());
    }
    let summary = summary.finalize();
    Ok(format!("sha1:{summary:x}"))
}
