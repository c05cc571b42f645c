use bm25_core::tokenizer::Whitespace;
use bm25_core::{Bm25, Document, EngineConfig};

fn docs(bodies: &[&[&str]]) -> Vec<Document> {
    bodies
        .iter()
        .enumerate()
        .map(|(i, body)| Document::from_body(format!("d{}", i + 1), *body, i, &Whitespace))
        .collect()
}

fn engine(bodies: &[&[&str]], max_results: usize) -> Bm25 {
    let mut e = Bm25::new(EngineConfig { max_results, ..EngineConfig::default() });
    e.build(&docs(bodies));
    e
}

#[test]
fn every_document_with_the_term_is_returned() {
    // A third document keeps log2(N/df) above zero for "hello".
    let e = engine(&[&["hello", "world"], &["hello", "hello", "test"], &["unrelated"]], 10);
    let hits = e.search_terms(&["hello"]);
    let rows: Vec<_> = hits.iter().map(|h| h.row).collect();
    assert_eq!(rows.len(), 2);
    assert!(rows.contains(&0) && rows.contains(&1));
    assert!(hits.iter().all(|h| h.score > 0.0));
}

#[test]
fn term_in_every_document_carries_no_weight() {
    let e = engine(&[&["hello", "world"], &["hello", "hello", "test"]], 10);
    let m = e.matrix().unwrap();
    assert_eq!(m.get(0, 0), 0.0);
    assert_eq!(m.get(1, 0), 0.0);
    assert!(e.search("hello").is_empty());
    assert_eq!(e.search("world"), vec![0]);
}

#[test]
fn case_is_ignored_in_corpus_and_query() {
    let upper = engine(&[&["Hello WORLD"], &["other text"]], 10);
    let lower = engine(&[&["hello world"], &["other text"]], 10);
    assert_eq!(upper.vocabulary(), lower.vocabulary());
    assert_eq!(upper.search("HELLO"), lower.search("hello"));
    assert_eq!(upper.search_terms(&["World"]), lower.search_terms(&["world"]));
}

#[test]
fn result_length_is_min_of_k_and_matches() {
    let bodies: Vec<Vec<&str>> = (0..8)
        .map(|i| if i % 2 == 0 { vec!["common", "x"] } else { vec!["rare"] })
        .collect();
    let bodies: Vec<&[&str]> = bodies.iter().map(Vec::as_slice).collect();
    assert_eq!(engine(&bodies, 2).search("common").len(), 2);
    assert_eq!(engine(&bodies, 10).search("common").len(), 4);
    assert_eq!(engine(&bodies, 10).search("common rare").len(), 8);
    assert!(engine(&bodies, 10).search("absent").is_empty());
}

#[test]
fn repeated_queries_give_identical_order() {
    let e = engine(&[&["a b c"], &["a a b"], &["c c c d"], &["d e"], &["a"]], 10);
    let first = e.search("a c d");
    for _ in 0..5 {
        assert_eq!(e.search("a c d"), first);
    }
}

#[test]
fn duplicate_query_terms_count_once() {
    let e = engine(&[&["a b"], &["b c"], &["c d"]], 10);
    assert_eq!(e.search_terms(&["a"]), e.search_terms(&["a", "A", "a"]));
}

#[test]
fn engine_is_shareable_across_threads() {
    let e = std::sync::Arc::new(engine(&[&["a b"], &["b c"], &["c d"]], 10));
    let expected = e.search("b");
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let e = std::sync::Arc::clone(&e);
            std::thread::spawn(move || e.search("b"))
        })
        .collect();
    for h in handles {
        assert_eq!(h.join().unwrap(), expected);
    }
}
