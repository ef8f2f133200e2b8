//! Query engine: synonym expansion, AND-then-OR candidate filtering,
//! multi-field BM25 with heuristic bonuses, and canonical-URL dedup.

use crate::config::SearchConfig;
use crate::document::load_products;
use crate::error::Result;
use crate::persist::{load_json, load_meta, IndexPaths};
use crate::postings::FieldIndex;
use crate::ranking::Bm25;
use crate::store::{CorpusStats, DocumentStore, Field};
use crate::synonyms::SynonymMap;
use crate::tokenizer::{remove_stopwords, tokenize, Stopwords};
use crate::url::canonicalize;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

/// The four field indices consulted at query time.
#[derive(Debug, Clone, Default)]
pub struct SearchIndexes {
    pub title: FieldIndex,
    pub description: FieldIndex,
    pub origin: FieldIndex,
    pub brand: FieldIndex,
}

impl SearchIndexes {
    /// Title and description prefer their positional files, which carry real
    /// term frequencies, and fall back to the compact inverted files. A
    /// missing file leaves that field empty.
    pub fn load(paths: &IndexPaths) -> Result<Self> {
        Ok(Self {
            title: load_first(&[paths.title_positional(), paths.title()])?,
            description: load_first(&[paths.description_positional(), paths.description()])?,
            origin: load_first(&[paths.origin()])?,
            brand: load_first(&[paths.brand()])?,
        })
    }

    pub fn field(&self, field: Field) -> &FieldIndex {
        match field {
            Field::Title => &self.title,
            Field::Description => &self.description,
            Field::Origin => &self.origin,
            Field::Brand => &self.brand,
        }
    }
}

fn load_first(candidates: &[std::path::PathBuf]) -> Result<FieldIndex> {
    for path in candidates {
        if path.is_file() {
            let value: Value = load_json(path)?;
            let index = FieldIndex::from_value(&value);
            tracing::info!(path = %path.display(), terms = index.len(), "loaded field index");
            return Ok(index);
        }
    }
    tracing::warn!(?candidates, "no index file found, using an empty field index");
    Ok(FieldIndex::new())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultMetadata {
    pub origin: String,
    pub brand: String,
    pub avg_rating: f64,
    pub review_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub description: String,
    pub score: f64,
    pub metadata: ResultMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub total_documents: usize,
    pub documents_filtered: usize,
    pub results_returned: usize,
    pub documents: Vec<SearchHit>,
}

/// Union of a token's doc ids across all given indices.
fn docs_with_token<'a>(token: &str, indexes: &[&'a FieldIndex]) -> HashSet<&'a str> {
    indexes.iter().flat_map(|&idx| idx.docs_for(token)).collect()
}

/// Documents containing every token in at least one of the indices. Empty
/// for an empty token list.
pub fn filter_all<'a>(tokens: &[String], indexes: &[&'a FieldIndex]) -> BTreeSet<&'a str> {
    if tokens.is_empty() {
        return BTreeSet::new();
    }
    let mut sets: Vec<HashSet<&'a str>> =
        tokens.iter().map(|t| docs_with_token(t, indexes)).collect();
    sets.sort_by_key(HashSet::len);
    let mut iter = sets.into_iter();
    let mut result = iter.next().unwrap_or_default();
    for s in iter {
        if result.is_empty() {
            break;
        }
        result.retain(|doc| s.contains(doc));
    }
    result.into_iter().collect()
}

/// Documents containing any token in any of the indices.
pub fn filter_any<'a>(tokens: &[String], indexes: &[&'a FieldIndex]) -> BTreeSet<&'a str> {
    tokens
        .iter()
        .flat_map(|t| docs_with_token(t, indexes))
        .collect()
}

/// Keeps the first entry per canonical URL. `scored` must already be sorted
/// best first.
pub fn dedup_by_canonical<T, F>(scored: Vec<T>, url_of: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    let mut seen = HashSet::new();
    scored
        .into_iter()
        .filter(|item| seen.insert(canonicalize(url_of(item))))
        .collect()
}

/// Read-only after construction; share it behind an `Arc` across threads.
pub struct SearchEngine {
    store: DocumentStore,
    indexes: SearchIndexes,
    synonyms: SynonymMap,
    stopwords: Stopwords,
    config: SearchConfig,
    bm25: Bm25,
    // The store never changes, so per-field statistics are computed once.
    stats: HashMap<Field, CorpusStats>,
}

impl SearchEngine {
    pub fn new(
        store: DocumentStore,
        indexes: SearchIndexes,
        synonyms: SynonymMap,
        config: SearchConfig,
    ) -> Self {
        let stats = Field::ALL.iter().map(|&f| (f, store.field_stats(f))).collect();
        Self {
            store,
            indexes,
            synonyms,
            stopwords: Stopwords::query(),
            bm25: Bm25::new(config.k1, config.b),
            config,
            stats,
        }
    }

    /// Load every input from disk: index directory, products JSONL and an
    /// optional synonyms file.
    pub fn open(
        index_dir: &Path,
        products: &Path,
        synonyms: Option<&Path>,
        config: SearchConfig,
    ) -> Result<Self> {
        let paths = IndexPaths::new(index_dir);
        if paths.meta().is_file() {
            let meta = load_meta(&paths)?;
            tracing::info!(num_docs = meta.num_docs, created_at = %meta.created_at, "opening index");
        }
        let indexes = SearchIndexes::load(&paths)?;
        let store = DocumentStore::from_products(&load_products(products)?);
        let synonyms = match synonyms {
            Some(p) => SynonymMap::load(p)?,
            None => SynonymMap::new(),
        };
        tracing::info!(documents = store.len(), "search engine ready");
        Ok(Self::new(store, indexes, synonyms, config))
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    fn all_indexes(&self) -> [&FieldIndex; 4] {
        Field::ALL.map(|f| self.indexes.field(f))
    }

    /// Expanded tokens and their stopword-filtered variant.
    pub fn query_tokens(&self, query: &str) -> (Vec<String>, Vec<String>) {
        let expanded = self.synonyms.expand(&tokenize(query));
        let filtered = remove_stopwords(&expanded, self.stopwords);
        (expanded, filtered)
    }

    /// AND over the filtered tokens; when that is empty, OR over the full
    /// expanded tokens.
    pub fn candidates(&self, tokens: &[String], tokens_ns: &[String]) -> BTreeSet<&str> {
        let indexes = self.all_indexes();
        let strict = filter_all(tokens_ns, &indexes);
        if !strict.is_empty() {
            return strict;
        }
        filter_any(tokens, &indexes)
    }

    fn score(&self, doc_id: &str, query_lower: &str, tokens: &[String]) -> Option<f64> {
        let doc = self.store.get(doc_id)?;
        let cfg = &self.config;

        let mut score: f64 = Field::ALL
            .iter()
            .map(|&f| {
                cfg.weights.get(f)
                    * self.bm25.field_score(doc_id, tokens, self.indexes.field(f), &self.stats[&f])
            })
            .sum();

        if doc.title.to_lowercase().contains(query_lower) {
            score += cfg.title_phrase_bonus;
        }
        let origin_tokens = tokenize(&doc.origin);
        if tokens.iter().any(|t| origin_tokens.contains(t)) {
            score += cfg.origin_match_bonus;
        }
        score += cfg.rating_weight * (doc.avg_rating / 5.0);
        score += cfg.review_count_weight * (1.0 + doc.review_count as f64).ln();
        Some(score)
    }

    pub fn search(&self, query: &str, top_k: usize) -> SearchResponse {
        let (tokens, tokens_ns) = self.query_tokens(query);
        let candidates = self.candidates(&tokens, &tokens_ns);
        let query_lower = query.to_lowercase();

        let mut scored: Vec<(&str, f64)> = candidates
            .iter()
            .filter_map(|&id| self.score(id, &query_lower, &tokens).map(|s| (id, s)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let documents: Vec<SearchHit> = dedup_by_canonical(scored, |(id, _)| *id)
            .into_iter()
            .take(top_k)
            .filter_map(|(id, score)| self.store.get(id).map(|d| (d, score)))
            .map(|(d, score)| SearchHit {
                title: d.title.clone(),
                url: d.url.clone(),
                description: d.description.clone(),
                score,
                metadata: ResultMetadata {
                    origin: d.origin.clone(),
                    brand: d.brand.clone(),
                    avg_rating: d.avg_rating,
                    review_count: d.review_count,
                },
            })
            .collect();

        tracing::debug!(
            query,
            tokens = tokens.len(),
            candidates = candidates.len(),
            returned = documents.len(),
            "search complete"
        );

        SearchResponse {
            query: query.to_string(),
            total_documents: self.store.len(),
            documents_filtered: candidates.len(),
            results_returned: documents.len(),
            documents,
        }
    }
}
