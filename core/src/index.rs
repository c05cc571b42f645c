use crate::document::{Document, RowId, TermId};
use std::collections::HashMap;

/// Case-folded terms in first-occurrence order; a term's position is its column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vocabulary {
    terms: Vec<String>,
    columns: HashMap<String, TermId>,
}

impl Vocabulary {
    pub fn from_terms(terms: Vec<String>) -> Self {
        let columns = terms.iter().enumerate().map(|(i, t)| (t.clone(), i)).collect();
        Self { terms, columns }
    }

    /// Returns the term's column, registering it at the next free column if new.
    fn intern(&mut self, term: String) -> (TermId, bool) {
        if let Some(&col) = self.columns.get(&term) {
            return (col, false);
        }
        let col = self.terms.len();
        self.columns.insert(term.clone(), col);
        self.terms.push(term);
        (col, true)
    }

    pub fn column(&self, term: &str) -> Option<TermId> { self.columns.get(term).copied() }

    pub fn terms(&self) -> &[String] { &self.terms }

    pub fn len(&self) -> usize { self.terms.len() }

    pub fn is_empty(&self) -> bool { self.terms.is_empty() }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub row: RowId,
    pub tf: u32,
}

/// Vocabulary plus one posting list per column, built in a single pass.
#[derive(Debug, Default)]
pub struct InvertedIndex {
    pub vocabulary: Vocabulary,
    /// Indexed by column; postings are in row order.
    pub postings: Vec<Vec<Posting>>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    /// Indexes documents in order. Each document's terms are consumed fully
    /// before the next one starts, which keeps one posting per (term, row).
    pub fn build(documents: &[Document]) -> Self {
        let mut index = Self::new();
        for doc in documents {
            index.add_document(doc);
        }
        index
    }

    fn add_document(&mut self, doc: &Document) {
        for raw in &doc.terms {
            let (col, fresh) = self.vocabulary.intern(raw.to_lowercase());
            if fresh {
                self.postings.push(vec![Posting { row: doc.row, tf: 1 }]);
                continue;
            }
            let list = &mut self.postings[col];
            match list.last_mut() {
                Some(last) if last.row == doc.row => last.tf += 1,
                _ => list.push(Posting { row: doc.row, tf: 1 }),
            }
        }
    }

    /// Document frequency of a column.
    pub fn df(&self, column: TermId) -> usize {
        self.postings.get(column).map_or(0, Vec::len)
    }

    pub fn into_vocabulary(self) -> Vocabulary { self.vocabulary }
}
