use crate::document::RowId;
use crate::index::Vocabulary;
use ordered_float::OrderedFloat;
use sprs::CsVec;
use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredDoc {
    pub row: RowId,
    pub score: f64,
}

/// Binary query vector over the vocabulary: 1.0 for every column named by a
/// (case-folded, deduplicated) query term. Returns `None` when nothing matches.
pub fn query_vector<S: AsRef<str>>(vocabulary: &Vocabulary, terms: &[S]) -> Option<CsVec<f64>> {
    let columns: BTreeSet<usize> = terms
        .iter()
        .filter_map(|t| {
            let t: &str = t.as_ref();
            vocabulary.column(&t.to_lowercase())
        })
        .collect();
    if columns.is_empty() {
        return None;
    }
    let values = vec![1.0; columns.len()];
    Some(CsVec::new(vocabulary.len(), columns.into_iter().collect(), values))
}

// Larger is better: higher score first, then lower row.
type RankKey = (OrderedFloat<f64>, Reverse<RowId>);

/// Keeps the `k` best nonzero scores with a bounded min-heap, O(n log k).
/// Equal scores are ordered by ascending row.
pub fn top_k<I>(scores: I, k: usize) -> Vec<ScoredDoc>
where
    I: IntoIterator<Item = (RowId, f64)>,
{
    if k == 0 {
        return Vec::new();
    }
    let mut heap: BinaryHeap<Reverse<RankKey>> = BinaryHeap::with_capacity(k + 1);
    for (row, score) in scores {
        if score == 0.0 {
            continue;
        }
        heap.push(Reverse((OrderedFloat(score), Reverse(row))));
        if heap.len() > k {
            heap.pop();
        }
    }
    let mut best: Vec<RankKey> = heap.into_iter().map(|Reverse(key)| key).collect();
    best.sort_unstable_by(|a, b| b.cmp(a));
    best.into_iter()
        .map(|(score, Reverse(row))| ScoredDoc { row, score: score.into_inner() })
        .collect()
}

/// Pairs results with 1-based ranks.
pub fn rank<T: Copy>(results: &[T]) -> Vec<(usize, T)> {
    results.iter().enumerate().map(|(i, &r)| (i + 1, r)).collect()
}
