//! BM25 weighting and the search engine built on it.

use crate::config::{Bm25Params, EngineConfig, Weighting};
use crate::document::{Document, RowId};
use crate::error::{Error, Result};
use crate::index::{InvertedIndex, Vocabulary};
use crate::matrix::{MatrixBuilder, WeightMatrix};
use crate::persist::{read_matrix, write_matrix};
use crate::search::{query_vector, top_k, ScoredDoc};
use crate::tokenizer::{Splitter, Whitespace};
use std::io::{Read, Write};

/// BM25 weight of one (term, document) cell.
///
/// `tf` is the term's count in the document, `doc_len` the document's token
/// count, `df` the number of documents containing the term and `n` the corpus
/// size. With `k <= 0` term frequency saturates immediately (normTf = 1).
pub fn bm25_weight(
    params: Bm25Params,
    tf: f64,
    doc_len: f64,
    avg_len: f64,
    n: f64,
    df: f64,
) -> f64 {
    let alpha = (1.0 - params.b) + params.b * (doc_len / avg_len);
    let norm_tf = if params.k > 0.0 {
        tf * (1.0 + 1.0 / params.k) / (alpha + tf / params.k)
    } else {
        1.0
    };
    norm_tf * idf(n, df)
}

pub fn idf(n: f64, df: f64) -> f64 { (n / df).log2() }

#[derive(Debug, Clone)]
struct Index {
    vocabulary: Vocabulary,
    matrix: WeightMatrix,
}

/// Holds at most one weight matrix, produced by [`Bm25::build`] or
/// [`Bm25::load`]. Build and load take `&mut self`; searching takes `&self`
/// so a finished engine can be shared between reader threads.
#[derive(Debug, Clone)]
pub struct Bm25 {
    config: EngineConfig,
    index: Option<Index>,
}

impl Bm25 {
    pub fn new(config: EngineConfig) -> Self { Self { config, index: None } }

    pub fn config(&self) -> &EngineConfig { &self.config }

    pub fn is_ready(&self) -> bool { self.index.is_some() }

    pub fn matrix(&self) -> Option<&WeightMatrix> { self.index.as_ref().map(|i| &i.matrix) }

    pub fn vocabulary(&self) -> Option<&Vocabulary> { self.index.as_ref().map(|i| &i.vocabulary) }

    /// Builds vocabulary, postings and the weight matrix from scratch.
    /// `documents[i].row` must equal `i`.
    pub fn build(&mut self, documents: &[Document]) {
        debug_assert!(
            documents.iter().enumerate().all(|(i, d)| d.row == i),
            "rows must be dense and ordered"
        );
        let postings = InvertedIndex::build(documents);
        let n = documents.len() as f64;
        let avg_len = documents.iter().map(Document::len).sum::<usize>() as f64 / n.max(1.0);
        let nnz = postings.postings.iter().map(Vec::len).sum();
        let mut builder =
            MatrixBuilder::with_capacity(documents.len(), postings.vocabulary.len(), nnz);

        for (col, list) in postings.postings.iter().enumerate() {
            let df = list.len() as f64;
            for p in list {
                let tf = f64::from(p.tf);
                let value = match self.config.weighting {
                    Weighting::RawTf => tf,
                    Weighting::Bm25 => {
                        let doc_len = documents[p.row].len() as f64;
                        bm25_weight(self.config.params, tf, doc_len, avg_len, n, df)
                    }
                };
                builder.set(p.row, col, value);
            }
        }

        let matrix = builder.build();
        tracing::debug!(
            num_docs = documents.len(),
            num_terms = postings.vocabulary.len(),
            nnz = matrix.nnz(),
            "built weight matrix"
        );
        self.index = Some(Index { vocabulary: postings.into_vocabulary(), matrix });
    }

    /// Writes the current matrix, its vocabulary and the weighting it was
    /// built with.
    ///
    /// # Panics
    /// If the engine has neither built nor loaded an index.
    pub fn save<W: Write>(&self, writer: W) -> Result<()> {
        let index = self.ready_index();
        write_matrix(
            writer,
            &index.vocabulary,
            &index.matrix,
            self.config.weighting,
            self.config.params,
        )
    }

    /// Reads a matrix saved by [`Bm25::save`] and validates it against this
    /// engine's weighting and the vocabulary re-derived from `documents`. The
    /// engine is left untouched on any error.
    pub fn load<R: Read>(&mut self, reader: R, documents: &[Document]) -> Result<()> {
        let vocabulary = InvertedIndex::build(documents).into_vocabulary();
        let file = read_matrix(reader)?;

        if !self.config.weights_match(file.weighting, file.params()) {
            return Err(Error::WeightingMismatch {
                expected: EngineConfig::weights_label(self.config.weighting, self.config.params),
                found: EngineConfig::weights_label(file.weighting, file.params()),
            });
        }

        let expected = (documents.len(), vocabulary.len());
        let found = (file.rows as usize, file.cols as usize);
        if expected != found {
            return Err(Error::DimensionMismatch { expected, found });
        }
        if let Some(column) = first_difference(vocabulary.terms(), &file.vocabulary) {
            return Err(Error::VocabularyMismatch { column });
        }

        let mut builder = MatrixBuilder::with_capacity(found.0, found.1, file.triplets.len());
        for (row, col, value) in file.triplets {
            let (row, col) = (row as usize, col as usize);
            if row >= found.0 || col >= found.1 {
                return Err(Error::Corrupt(format!("cell ({row}, {col}) outside {found:?}")));
            }
            builder.set(row, col, value);
        }
        self.index = Some(Index { vocabulary, matrix: builder.build() });
        Ok(())
    }

    /// Splits `query` on whitespace and returns the best rows, best first.
    pub fn search(&self, query: &str) -> Vec<RowId> {
        self.search_with(query, &Whitespace)
    }

    /// Like [`Bm25::search`], keeping each row's score.
    pub fn search_scored(&self, query: &str) -> Vec<ScoredDoc> {
        self.search_terms(&Whitespace.split(query))
    }

    pub fn search_with(&self, query: &str, splitter: &dyn Splitter) -> Vec<RowId> {
        self.search_terms(&splitter.split(query)).into_iter().map(|d| d.row).collect()
    }

    /// Scores every row against the query terms and keeps the top
    /// `max_results` nonzero scores.
    ///
    /// # Panics
    /// If the engine has neither built nor loaded an index.
    pub fn search_terms<S: AsRef<str>>(&self, terms: &[S]) -> Vec<ScoredDoc> {
        let index = self.ready_index();
        let Some(query) = query_vector(&index.vocabulary, terms) else {
            return Vec::new();
        };
        let scores = index.matrix.mul_vec(&query);
        top_k(scores.iter().map(|(row, &score)| (row, score)), self.config.max_results)
    }

    fn ready_index(&self) -> &Index {
        match &self.index {
            Some(index) => index,
            None => panic!("Bm25 engine used before an index was built or loaded"),
        }
    }
}

fn first_difference(a: &[String], b: &[String]) -> Option<usize> {
    a.iter()
        .zip(b)
        .position(|(x, y)| x != y)
        .or_else(|| (a.len() != b.len()).then(|| a.len().min(b.len())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(texts: &[&str]) -> Vec<Document> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let terms = t.split_whitespace().map(str::to_string).collect();
                Document::new(format!("d{}", i + 1), terms, i)
            })
            .collect()
    }

    fn engine(weighting: Weighting) -> Bm25 {
        Bm25::new(EngineConfig { weighting, ..EngineConfig::default() })
    }

    #[test]
    fn weight_matches_formula() {
        let p = Bm25Params { k: 1.75, b: 0.75 };
        let alpha = 0.25 + 0.75 * (3.0 / 2.5);
        let expected = 2.0 * (1.0 + 1.0 / 1.75) / (alpha + 2.0 / 1.75) * (4.0f64 / 1.0).log2();
        assert!((bm25_weight(p, 2.0, 3.0, 2.5, 4.0, 1.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn non_positive_k_saturates() {
        let p = Bm25Params { k: 0.0, b: 0.75 };
        assert_eq!(bm25_weight(p, 7.0, 3.0, 2.0, 8.0, 2.0), 2.0);
    }

    #[test]
    fn idf_shrinks_as_df_grows() {
        assert!(idf(10.0, 1.0) > idf(10.0, 2.0));
        assert!(idf(10.0, 2.0) > idf(10.0, 5.0));
        assert_eq!(idf(10.0, 10.0), 0.0);
    }

    #[test]
    fn matrix_shape_is_docs_by_terms() {
        let mut e = engine(Weighting::Bm25);
        e.build(&docs(&["hello world", "hello hello test"]));
        assert_eq!(e.matrix().unwrap().shape(), (2, 3));
    }

    #[test]
    fn raw_tf_mode_stores_counts() {
        let mut e = engine(Weighting::RawTf);
        e.build(&docs(&["hello world", "hello hello test"]));
        let m = e.matrix().unwrap();
        assert_eq!(m.get(0, 0), 1.0);
        assert_eq!(m.get(1, 0), 2.0);
        assert_eq!(m.get(0, 2), 0.0);
        let rows = e.search("hello");
        assert_eq!(rows, vec![1, 0]);
    }

    #[test]
    fn both_documents_score_for_shared_term() {
        let mut e = engine(Weighting::Bm25);
        e.build(&docs(&["hello world", "hello hello test", "other words"]));
        let hits = e.search_terms(&["hello"]);
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.score > 0.0));
        assert_eq!(hits[0].row, 1);
    }

    #[test]
    fn unknown_terms_give_no_results() {
        let mut e = engine(Weighting::Bm25);
        e.build(&docs(&["alpha beta", "gamma"]));
        assert!(e.search("zeta").is_empty());
        assert!(e.search("").is_empty());
    }

    #[test]
    fn max_results_bounds_output() {
        let mut e = Bm25::new(EngineConfig { max_results: 2, ..EngineConfig::default() });
        e.build(&docs(&["x a", "x b", "x c", "x d", "y"]));
        assert_eq!(e.search("x").len(), 2);
    }

    #[test]
    #[should_panic(expected = "before an index was built or loaded")]
    fn search_without_index_panics() {
        engine(Weighting::Bm25).search("anything");
    }

    #[test]
    fn load_rejects_other_corpus() {
        let mut e = engine(Weighting::Bm25);
        e.build(&docs(&["a b", "c"]));
        let mut buf = Vec::new();
        e.save(&mut buf).unwrap();

        let mut fresh = engine(Weighting::Bm25);
        let err = fresh.load(buf.as_slice(), &docs(&["a b", "c", "d"])).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { expected: (3, 4), found: (2, 3) }));
        assert!(!fresh.is_ready());

        let err = fresh.load(buf.as_slice(), &docs(&["a b", "z"])).unwrap_err();
        assert!(matches!(err, Error::VocabularyMismatch { column: 2 }));
    }

    #[test]
    fn load_rejects_other_weighting() {
        let corpus = docs(&["hello world", "hello hello test", "other words"]);
        let mut e = engine(Weighting::Bm25);
        e.build(&corpus);
        let mut buf = Vec::new();
        e.save(&mut buf).unwrap();

        let mut raw = engine(Weighting::RawTf);
        let err = raw.load(buf.as_slice(), &corpus).unwrap_err();
        assert!(matches!(err, Error::WeightingMismatch { .. }));
        assert!(!raw.is_ready());

        let params = Bm25Params { k: 0.0, b: 0.75 };
        let mut saturated = Bm25::new(EngineConfig { params, ..EngineConfig::default() });
        let err = saturated.load(buf.as_slice(), &corpus).unwrap_err();
        assert!(matches!(err, Error::WeightingMismatch { .. }));

        let mut same = engine(Weighting::Bm25);
        same.load(buf.as_slice(), &corpus).unwrap();
        assert_eq!(same.search("hello"), e.search("hello"));
    }

    #[test]
    fn scored_search_keeps_scores() {
        let mut e = engine(Weighting::RawTf);
        e.build(&docs(&["hello world", "hello hello test"]));
        let hits = e.search_scored("Hello");
        assert_eq!(hits, vec![ScoredDoc { row: 1, score: 2.0 }, ScoredDoc { row: 0, score: 1.0 }]);
        assert_eq!(e.search("hello"), vec![1, 0]);
    }

    #[test]
    fn first_difference_reports_column() {
        let v = |s: &[&str]| s.iter().map(|x| x.to_string()).collect::<Vec<_>>();
        assert_eq!(first_difference(&v(&["a", "b"]), &v(&["a", "b"])), None);
        assert_eq!(first_difference(&v(&["a", "b"]), &v(&["a", "c"])), Some(1));
        assert_eq!(first_difference(&v(&["a"]), &v(&["a", "b"])), Some(1));
    }
}
