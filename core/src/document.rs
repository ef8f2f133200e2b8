//! Raw crawl records and their normalization into document fields.

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One line of crawler output. Every field is optional and a field of the
/// wrong JSON type reads as its empty value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawProduct {
    #[serde(deserialize_with = "lenient::string")]
    pub url: String,
    #[serde(deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(deserialize_with = "lenient::string")]
    pub description: String,
    #[serde(deserialize_with = "lenient::object")]
    pub product_features: Map<String, Value>,
    #[serde(deserialize_with = "lenient::array")]
    pub product_reviews: Vec<Value>,
    #[serde(deserialize_with = "lenient::array")]
    pub links: Vec<Value>,
}

mod lenient {
    use super::*;

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => s,
            _ => String::new(),
        })
    }

    pub fn object<'de, D: Deserializer<'de>>(
        d: D,
    ) -> std::result::Result<Map<String, Value>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Object(m) => m,
            _ => Map::new(),
        })
    }

    pub fn array<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Vec<Value>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(a) => a,
            _ => Vec::new(),
        })
    }
}

/// Product feature looked up in `product_features`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Brand,
    Origin,
}

impl Feature {
    /// Candidate keys in priority order, compared case-insensitively.
    pub fn keys(self) -> &'static [&'static str] {
        match self {
            Feature::Brand => &["brand"],
            Feature::Origin => &["made in", "made_in", "origin"],
        }
    }
}

/// First non-empty scalar value among the feature's keys. Null, arrays and
/// objects count as absent.
pub fn extract_feature(features: &Map<String, Value>, feature: Feature) -> String {
    for key in feature.keys() {
        let found = features
            .iter()
            .filter(|(k, _)| k.to_lowercase() == *key)
            .find_map(|(_, v)| scalar_text(v));
        if let Some(text) = found {
            return text;
        }
    }
    String::new()
}

fn scalar_text(v: &Value) -> Option<String> {
    let text = match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        // `true` renders as "True"; `false` counts as absent.
        Value::Bool(true) => "True".to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// `(avg_rating, review_count)`. An object entry without `rating` counts as a
/// zero rating; non-numeric ratings are skipped. When nothing numeric is left
/// the average is 0 but the count is still the number of entries.
pub fn review_summary(reviews: &[Value]) -> (f64, usize) {
    if reviews.is_empty() {
        return (0.0, 0);
    }
    let ratings: Vec<f64> = reviews
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|r| match r.get("rating") {
            None => Some(0.0),
            Some(v) => v.as_f64(),
        })
        .collect();
    if ratings.is_empty() {
        return (0.0, reviews.len());
    }
    let avg = ratings.iter().sum::<f64>() / ratings.len() as f64;
    (avg, reviews.len())
}

/// A normalized record of the document store, keyed by its URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocRecord {
    pub doc_id: String,
    pub url: String,
    pub title: String,
    pub description: String,
    pub origin: String,
    pub brand: String,
    pub avg_rating: f64,
    pub review_count: usize,
}

impl DocRecord {
    /// `None` when the record has no URL.
    pub fn from_raw(raw: &RawProduct) -> Option<Self> {
        if raw.url.is_empty() {
            return None;
        }
        let (avg_rating, review_count) = review_summary(&raw.product_reviews);
        Some(Self {
            doc_id: raw.url.clone(),
            url: raw.url.clone(),
            title: raw.title.clone(),
            description: raw.description.clone(),
            origin: extract_feature(&raw.product_features, Feature::Origin),
            brand: extract_feature(&raw.product_features, Feature::Brand),
            avg_rating,
            review_count,
        })
    }
}

/// Read a JSON Lines file of raw products. Blank lines are skipped; an invalid
/// line aborts the load with its line number.
pub fn load_products(path: impl AsRef<Path>) -> Result<Vec<RawProduct>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let reader = BufReader::new(file);
    let mut products = Vec::new();
    // Byte lines: invalid UTF-8 surfaces as a malformed line, not an I/O error.
    for (idx, line) in reader.split(b'\n').enumerate() {
        let line = line.map_err(|e| Error::io(path, e))?;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        let product = serde_json::from_slice(&line).map_err(|source| Error::InvalidJsonLine {
            path: path.to_path_buf(),
            line: idx + 1,
            source,
        })?;
        products.push(product);
    }
    tracing::info!(path = %path.display(), count = products.len(), "loaded products");
    Ok(products)
}
