use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    static ref RE: Regex = Regex::new(r"[a-z0-9]+").expect("valid regex");

    // Bilingual list applied when building field indices.
    static ref INDEXING_STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "le", "la", "les", "un", "une", "des", "de", "du", "d", "et", "ou", "à", "a",
            "the", "an", "and", "or", "to", "of", "in", "for", "with", "on", "at",
        ];
        words.iter().copied().collect()
    };

    // English list applied to query tokens before the AND filter.
    static ref QUERY_STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "the", "a", "an", "and", "or", "of", "to", "in", "on", "for", "with",
            "is", "are", "was", "were", "be", "this", "that", "it", "as", "by",
        ];
        words.iter().copied().collect()
    };
}

/// A fixed stopword set. The indexing and query sets are deliberately kept
/// apart: they shape two different vocabularies.
#[derive(Clone, Copy)]
pub struct Stopwords {
    words: &'static HashSet<&'static str>,
}

impl Stopwords {
    pub fn indexing() -> Self {
        Self { words: &INDEXING_STOPWORDS }
    }

    pub fn query() -> Self {
        Self { words: &QUERY_STOPWORDS }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }
}

/// Lowercase the text and return every maximal `[a-z0-9]+` run.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    RE.find_iter(&lowered).map(|m| m.as_str().to_string()).collect()
}

/// Tokenize keeping each token's offset in the unfiltered token sequence.
pub fn tokenize_with_positions(text: &str) -> Vec<(String, u32)> {
    tokenize(text)
        .into_iter()
        .enumerate()
        .map(|(pos, tok)| (tok, pos as u32))
        .collect()
}

pub fn remove_stopwords(tokens: &[String], stopwords: Stopwords) -> Vec<String> {
    tokens.iter().filter(|t| !stopwords.contains(t)).cloned().collect()
}

/// Indexing pipeline: positions are taken before stopwords are dropped, so
/// surviving tokens keep their original offsets.
pub fn index_terms(text: &str) -> Vec<(String, u32)> {
    let stopwords = Stopwords::indexing();
    tokenize_with_positions(text)
        .into_iter()
        .filter(|(tok, _)| !stopwords.contains(tok))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t = tokenize("Running-Shoes, size 42!");
        assert_eq!(t, vec!["running", "shoes", "size", "42"]);
    }

    #[test]
    fn non_ascii_letters_split_tokens() {
        assert_eq!(tokenize("Café crème"), vec!["caf", "cr", "me"]);
    }

    #[test]
    fn index_terms_keep_gaps() {
        let t = index_terms("The shoes of the year");
        assert_eq!(t, vec![("shoes".to_string(), 1), ("year".to_string(), 4)]);
    }

    #[test]
    fn stopword_sets_differ() {
        assert!(Stopwords::indexing().contains("le"));
        assert!(!Stopwords::query().contains("le"));
        assert!(Stopwords::query().contains("is"));
        assert!(!Stopwords::indexing().contains("is"));
    }
}
