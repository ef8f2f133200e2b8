use crate::error::Result;
use crate::persist::load_json;
use crate::store::Field;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct FieldWeights {
    pub title: f64,
    pub description: f64,
    pub origin: f64,
    pub brand: f64,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self { title: 2.2, description: 1.0, origin: 0.8, brand: 0.9 }
    }
}

impl FieldWeights {
    pub fn get(&self, field: Field) -> f64 {
        match field {
            Field::Title => self.title,
            Field::Description => self.description,
            Field::Origin => self.origin,
            Field::Brand => self.brand,
        }
    }
}

/// Ranking constants. A config file may override any subset of them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub k1: f64,
    pub b: f64,
    pub weights: FieldWeights,
    /// Added when the whole query string occurs in the title.
    pub title_phrase_bonus: f64,
    /// Added when a query token is one of the origin tokens.
    pub origin_match_bonus: f64,
    /// Multiplies `avg_rating / 5`.
    pub rating_weight: f64,
    /// Multiplies `ln(1 + review_count)`.
    pub review_count_weight: f64,
    pub default_top_k: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            k1: 1.2,
            b: 0.75,
            weights: FieldWeights::default(),
            title_phrase_bonus: 1.2,
            origin_match_bonus: 0.8,
            rating_weight: 0.7,
            review_count_weight: 0.2,
            default_top_k: 10,
        }
    }
}

impl SearchConfig {
    pub fn load(path: &Path) -> Result<Self> {
        load_json(path)
    }
}
