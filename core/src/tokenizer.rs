use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"(?u)\p{L}[\p{L}\p{N}_']*").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
}

/// Splits raw text into terms. Case folding happens later, in the indexer and
/// the query engine, so every splitter sees identical folding.
pub trait Splitter: Send + Sync {
    fn split(&self, text: &str) -> Vec<String>;
}

/// Splits on Unicode whitespace. Never yields empty tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct Whitespace;

impl Splitter for Whitespace {
    fn split(&self, text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }
}

/// NFKC-normalizes, extracts word tokens and optionally stems them.
#[derive(Debug, Clone, Copy)]
pub struct Analyzing {
    pub stem: bool,
}

impl Default for Analyzing {
    fn default() -> Self { Self { stem: true } }
}

impl Splitter for Analyzing {
    fn split(&self, text: &str) -> Vec<String> {
        let normalized = text.nfkc().collect::<String>().to_lowercase();
        WORD.find_iter(&normalized)
            .map(|m| {
                if self.stem {
                    STEMMER.stem(m.as_str()).into_owned()
                } else {
                    m.as_str().to_string()
                }
            })
            .collect()
    }
}

impl<F> Splitter for F
where
    F: Fn(&str) -> Vec<String> + Send + Sync,
{
    fn split(&self, text: &str) -> Vec<String> { self(text) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_skips_runs_of_blanks() {
        let t = Whitespace.split("  Hello \t WORLD\n");
        assert_eq!(t, vec!["Hello", "WORLD"]);
    }

    #[test]
    fn analyzing_stems_and_strips_punctuation() {
        let t = Analyzing::default().split("Running, runner's run!");
        assert!(t.iter().all(|w| w == "run" || w.starts_with("runner")));
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn closures_are_splitters() {
        let comma = |s: &str| s.split(',').map(str::to_string).collect::<Vec<_>>();
        assert_eq!(comma.split("a,b"), vec!["a", "b"]);
    }
}
