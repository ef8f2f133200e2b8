//! Index construction from crawled product documents.
//!
//! Every builder makes a single pass over the documents. Postings are kept in
//! ordered maps and sets, so serialized output is sorted by URL and identical
//! for identical input.

use crate::document::{extract_feature, Feature, RawProduct};
use crate::tokenizer::index_terms;
use crate::url::{product_id, variant};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// token → sorted URLs
pub type InvertedIndex = BTreeMap<String, BTreeSet<String>>;
/// token → URL → positions
pub type PositionalIndex = BTreeMap<String, BTreeMap<String, Vec<u32>>>;

/// A crawled page prepared for indexing.
#[derive(Debug, Clone)]
pub struct IndexDocument {
    pub url: String,
    pub title: String,
    pub description: String,
    pub links: Vec<Value>,
    pub product_features: serde_json::Map<String, Value>,
    pub product_reviews: Vec<Value>,
    pub product_id: Option<String>,
    pub variant: Option<String>,
}

impl IndexDocument {
    pub fn from_raw(raw: RawProduct) -> Option<Self> {
        if raw.url.is_empty() {
            return None;
        }
        Some(Self {
            product_id: product_id(&raw.url),
            variant: variant(&raw.url),
            url: raw.url,
            title: raw.title,
            description: raw.description,
            links: raw.links,
            product_features: raw.product_features,
            product_reviews: raw.product_reviews,
        })
    }

    /// A canonical product page: has a product id and is not a variant.
    pub fn is_canonical_product(&self) -> bool {
        self.product_id.is_some() && self.variant.is_none()
    }

    fn field(&self, field: TextField) -> &str {
        match field {
            TextField::Title => &self.title,
            TextField::Description => &self.description,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Title,
    Description,
}

/// Drop URL-less records and keep the first occurrence of each URL.
pub fn prepare_documents(raw: Vec<RawProduct>) -> Vec<IndexDocument> {
    let mut seen = HashSet::new();
    raw.into_iter()
        .filter_map(IndexDocument::from_raw)
        .filter(|d| seen.insert(d.url.clone()))
        .collect()
}

pub fn build_inverted_index(docs: &[IndexDocument], field: TextField) -> InvertedIndex {
    let mut index = InvertedIndex::new();
    for doc in docs {
        for (tok, _) in index_terms(doc.field(field)) {
            index.entry(tok).or_default().insert(doc.url.clone());
        }
    }
    index
}

pub fn build_positional_index(docs: &[IndexDocument], field: TextField) -> PositionalIndex {
    let mut index = PositionalIndex::new();
    for doc in docs {
        for (tok, pos) in index_terms(doc.field(field)) {
            index
                .entry(tok)
                .or_default()
                .entry(doc.url.clone())
                .or_default()
                .push(pos);
        }
    }
    index
}

/// Only canonical product pages contribute; variants get their features
/// through store inheritance instead.
pub fn build_feature_index(docs: &[IndexDocument], feature: Feature) -> InvertedIndex {
    let mut index = InvertedIndex::new();
    for doc in docs.iter().filter(|d| d.is_canonical_product()) {
        let value = extract_feature(&doc.product_features, feature);
        for (tok, _) in index_terms(&value) {
            index.entry(tok).or_default().insert(doc.url.clone());
        }
    }
    index
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewStats {
    pub total_reviews: usize,
    pub avg_rating: Option<f64>,
    pub last_rating: Option<f64>,
}

impl ReviewStats {
    pub fn from_reviews(reviews: &[Value]) -> Self {
        if reviews.is_empty() {
            return Self { total_reviews: 0, avg_rating: None, last_rating: None };
        }
        let ratings: Vec<f64> = reviews
            .iter()
            .filter_map(|r| r.get("rating").and_then(Value::as_f64))
            .collect();
        let avg_rating =
            (!ratings.is_empty()).then(|| ratings.iter().sum::<f64>() / ratings.len() as f64);

        let date = |r: &Value| r.get("date").and_then(Value::as_str).unwrap_or("").to_string();
        let mut by_date: Vec<&Value> = reviews.iter().collect();
        // Stable: among equal dates the later entry stays last.
        by_date.sort_by_key(|r| date(*r));
        let last_rating = by_date
            .last()
            .and_then(|r| r.get("rating"))
            .and_then(Value::as_f64);

        Self { total_reviews: reviews.len(), avg_rating, last_rating }
    }
}

pub fn build_review_stats(docs: &[IndexDocument]) -> BTreeMap<String, ReviewStats> {
    docs.iter()
        .map(|d| (d.url.clone(), ReviewStats::from_reviews(&d.product_reviews)))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentEntry {
    pub product_id: Option<String>,
    pub variant: Option<String>,
    pub links: Vec<Value>,
}

pub fn build_documents_section(docs: &[IndexDocument]) -> BTreeMap<String, DocumentEntry> {
    docs.iter()
        .map(|d| {
            let entry = DocumentEntry {
                product_id: d.product_id.clone(),
                variant: d.variant.clone(),
                links: d.links.clone(),
            };
            (d.url.clone(), entry)
        })
        .collect()
}

/// Everything `indexer build` writes.
#[derive(Debug, Clone, Default)]
pub struct IndexArtifacts {
    pub title_inverted: InvertedIndex,
    pub title_positional: PositionalIndex,
    pub description_inverted: InvertedIndex,
    pub description_positional: PositionalIndex,
    pub brand: InvertedIndex,
    pub origin: InvertedIndex,
    pub reviews: BTreeMap<String, ReviewStats>,
    pub documents: BTreeMap<String, DocumentEntry>,
}

impl IndexArtifacts {
    pub fn build(docs: &[IndexDocument]) -> Self {
        let artifacts = Self {
            title_inverted: build_inverted_index(docs, TextField::Title),
            title_positional: build_positional_index(docs, TextField::Title),
            description_inverted: build_inverted_index(docs, TextField::Description),
            description_positional: build_positional_index(docs, TextField::Description),
            brand: build_feature_index(docs, Feature::Brand),
            origin: build_feature_index(docs, Feature::Origin),
            reviews: build_review_stats(docs),
            documents: build_documents_section(docs),
        };
        tracing::info!(
            docs = docs.len(),
            title_terms = artifacts.title_inverted.len(),
            description_terms = artifacts.description_inverted.len(),
            brand_terms = artifacts.brand.len(),
            origin_terms = artifacts.origin.len(),
            "built index artifacts"
        );
        artifacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn docs(values: Vec<Value>) -> Vec<IndexDocument> {
        prepare_documents(
            values.into_iter().map(|v| serde_json::from_value(v).unwrap()).collect(),
        )
    }

    #[test]
    fn first_url_occurrence_wins() {
        let d = docs(vec![
            json!({"url": "http://x/a", "title": "first"}),
            json!({"url": "http://x/a", "title": "second"}),
            json!({"title": "no url"}),
        ]);
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].title, "first");
    }

    #[test]
    fn inverted_postings_sorted_and_stopwords_dropped() {
        let d = docs(vec![
            json!({"url": "http://x/b", "title": "The red shoe"}),
            json!({"url": "http://x/a", "title": "Red boots and a hat"}),
        ]);
        let idx = build_inverted_index(&d, TextField::Title);
        let red: Vec<&String> = idx["red"].iter().collect();
        assert_eq!(red, vec!["http://x/a", "http://x/b"]);
        assert!(!idx.contains_key("the"));
        assert!(!idx.contains_key("and"));
    }

    #[test]
    fn positional_offsets() {
        let d = docs(vec![json!({"url": "u", "title": "shoe of the shoe"})]);
        let idx = build_positional_index(&d, TextField::Title);
        assert_eq!(idx["shoe"]["u"], vec![0, 3]);
    }

    #[test]
    fn feature_index_skips_variants_and_non_products() {
        let d = docs(vec![
            json!({"url": "https://x/product/1", "product_features": {"brand": "Acme Co"}}),
            json!({"url": "https://x/product/1?variant=2", "product_features": {"brand": "Acme"}}),
            json!({"url": "https://x/about", "product_features": {"brand": "Acme"}}),
            json!({"url": "https://x/product/2", "product_features": {"Made In": "USA"}}),
        ]);
        let brand = build_feature_index(&d, Feature::Brand);
        assert_eq!(brand["acme"].len(), 1);
        assert!(brand["acme"].contains("https://x/product/1"));
        let origin = build_feature_index(&d, Feature::Origin);
        assert!(origin["usa"].contains("https://x/product/2"));
    }

    #[test]
    fn review_stats_last_rating_by_date() {
        let stats = ReviewStats::from_reviews(&[
            json!({"rating": 5, "date": "2024-03-01"}),
            json!({"rating": 2, "date": "2024-05-01"}),
            json!({"rating": 4}),
        ]);
        assert_eq!(stats.total_reviews, 3);
        assert_eq!(stats.last_rating, Some(2.0));
        assert!((stats.avg_rating.unwrap() - 11.0 / 3.0).abs() < 1e-12);

        let empty = ReviewStats::from_reviews(&[]);
        assert_eq!(empty, ReviewStats { total_reviews: 0, avg_rating: None, last_rating: None });

        let no_numeric = ReviewStats::from_reviews(&[json!({"rating": "good"})]);
        assert_eq!(no_numeric.avg_rating, None);
        assert_eq!(no_numeric.total_reviews, 1);
    }
}
