//! On-disk artifacts: the weight matrix stream and the cache record file.
//!
//! Matrix stream layout:
//! `[magic "BM25MAT\0"][bincode MatrixFile][CRC32 of the bincode bytes, u32 BE]`.
//! The payload records the weighting and BM25 parameters the cells were
//! computed with. Values are stored as f64 bit patterns so a save/load round trip is exact.
//! Files are written to a `.tmp` sibling and renamed into place.

use crate::config::{Bm25Params, Weighting};
use crate::error::{Error, Result};
use crate::index::Vocabulary;
use crate::matrix::WeightMatrix;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

const MATRIX_MAGIC: &[u8; 8] = b"BM25MAT\0";
const FORMAT_VERSION: u32 = 2;
const CRC_LEN: usize = 4;

/// Where the matrix and the cache record live.
#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub matrix: PathBuf,
    pub record: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(matrix: P, record: Q) -> Self {
        Self { matrix: matrix.as_ref().to_path_buf(), record: record.as_ref().to_path_buf() }
    }

    /// Both files under one directory, e.g. for tests.
    pub fn in_dir<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        Self::new(root.join("bm25.bin"), root.join("app_state.json"))
    }
}

#[derive(Serialize)]
struct MatrixFileRef<'a> {
    version: u32,
    weighting: Weighting,
    k: f64,
    b: f64,
    rows: u64,
    cols: u64,
    vocabulary: &'a [String],
    triplets: Vec<(u32, u32, f64)>,
}

/// Decoded matrix stream, not yet validated against a corpus.
#[derive(Debug, Deserialize)]
pub struct MatrixFile {
    pub version: u32,
    pub weighting: Weighting,
    pub k: f64,
    pub b: f64,
    pub rows: u64,
    pub cols: u64,
    pub vocabulary: Vec<String>,
    pub triplets: Vec<(u32, u32, f64)>,
}

impl MatrixFile {
    pub fn params(&self) -> Bm25Params {
        Bm25Params { k: self.k, b: self.b }
    }
}

fn to_u32(n: usize) -> Result<u32> {
    u32::try_from(n)
        .map_err(|_| Error::Corrupt(format!("index {n} does not fit the stream format")))
}

pub fn write_matrix<W: Write>(
    mut w: W,
    vocabulary: &Vocabulary,
    matrix: &WeightMatrix,
    weighting: Weighting,
    params: Bm25Params,
) -> Result<()> {
    let triplets = matrix
        .triplets()
        .map(|(r, c, v)| -> Result<(u32, u32, f64)> { Ok((to_u32(r)?, to_u32(c)?, v)) })
        .collect::<Result<Vec<_>>>()?;
    let file = MatrixFileRef {
        version: FORMAT_VERSION,
        weighting,
        k: params.k,
        b: params.b,
        rows: matrix.rows() as u64,
        cols: matrix.cols() as u64,
        vocabulary: vocabulary.terms(),
        triplets,
    };
    let payload = bincode::serialize(&file)?;
    let crc = crc32fast::hash(&payload);
    w.write_all(MATRIX_MAGIC)?;
    w.write_all(&payload)?;
    w.write_all(&crc.to_be_bytes())?;
    w.flush()?;
    Ok(())
}

pub fn read_matrix<R: Read>(mut r: R) -> Result<MatrixFile> {
    let mut raw = Vec::new();
    r.read_to_end(&mut raw)?;
    if raw.len() < MATRIX_MAGIC.len() + CRC_LEN || &raw[..MATRIX_MAGIC.len()] != MATRIX_MAGIC {
        return Err(Error::Corrupt("missing matrix header".into()));
    }
    let (body, footer) = raw.split_at(raw.len() - CRC_LEN);
    let payload = &body[MATRIX_MAGIC.len()..];
    let stored = u32::from_be_bytes([footer[0], footer[1], footer[2], footer[3]]);
    let computed = crc32fast::hash(payload);
    if stored != computed {
        return Err(Error::Corrupt(format!(
            "crc mismatch: stored {stored:#010x}, computed {computed:#010x}"
        )));
    }
    let file: MatrixFile = bincode::deserialize(payload)?;
    if file.version != FORMAT_VERSION {
        return Err(Error::Corrupt(format!("unsupported format version {}", file.version)));
    }
    tracing::debug!(
        rows = file.rows,
        cols = file.cols,
        nnz = file.triplets.len(),
        "decoded matrix stream"
    );
    Ok(file)
}

/// Writes `bytes` to `path` via a temporary sibling and a rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Removes `path`; a file that is already gone is not an error.
pub fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value).map_err(io::Error::from)?;
    write_atomic(path, &json)
}

/// `Ok(None)` when the file does not exist.
pub fn load_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Option<T>> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let value = serde_json::from_slice(&bytes).map_err(io::Error::from)?;
    Ok(Some(value))
}
