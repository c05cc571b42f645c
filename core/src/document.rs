use crate::tokenizer::Splitter;

pub type RowId = usize;
pub type TermId = usize;

/// One corpus document, already split into raw (not yet case-folded) terms.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub terms: Vec<String>,
    /// Dense row index, 0..N-1, stable for one build.
    pub row: RowId,
}

impl Document {
    pub fn new(id: impl Into<String>, terms: Vec<String>, row: RowId) -> Self {
        Self { id: id.into(), terms, row }
    }

    /// Joins body fragments with single spaces and splits the result.
    pub fn from_body<S: AsRef<str>>(
        id: impl Into<String>,
        body: &[S],
        row: RowId,
        splitter: &dyn Splitter,
    ) -> Self {
        let parts: Vec<&str> = body.iter().map(|s| s.as_ref()).collect();
        let text = parts.join(" ");
        Self::new(id, splitter.split(&text), row)
    }

    pub fn len(&self) -> usize { self.terms.len() }

    pub fn is_empty(&self) -> bool { self.terms.is_empty() }
}

/// Ordered documents plus an opaque change-detection fingerprint.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub documents: Vec<Document>,
    pub fingerprint: String,
}

impl Corpus {
    pub fn new(documents: Vec<Document>, fingerprint: impl Into<String>) -> Self {
        Self { documents, fingerprint: fingerprint.into() }
    }

    pub fn len(&self) -> usize { self.documents.len() }

    pub fn is_empty(&self) -> bool { self.documents.is_empty() }

    pub fn id(&self, row: RowId) -> Option<&str> {
        self.documents.get(row).map(|d| d.id.as_str())
    }

    pub fn average_len(&self) -> f64 {
        if self.documents.is_empty() {
            return 0.0;
        }
        let total: usize = self.documents.iter().map(Document::len).sum();
        total as f64 / self.documents.len() as f64
    }
}
