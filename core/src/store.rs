//! URL-keyed document store with cross-variant attribute inheritance.
//!
//! Built in two stages: [`build_base_records`] normalizes raw products into
//! a map, then [`inherit_from_canonical`] derives the final map in which a
//! variant URL (`...?variant=2`) picks up `origin`/`brand` from the record at
//! its canonical URL when its own value is empty. The second stage needs the
//! complete base map, so the stages never interleave.

use crate::document::{DocRecord, RawProduct};
use crate::tokenizer::tokenize;
use crate::url::canonicalize;
use std::collections::BTreeMap;

/// Fields scored by the query engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Description,
    Origin,
    Brand,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Title, Field::Description, Field::Origin, Field::Brand];

    pub fn text(self, rec: &DocRecord) -> &str {
        match self {
            Field::Title => &rec.title,
            Field::Description => &rec.description,
            Field::Origin => &rec.origin,
            Field::Brand => &rec.brand,
        }
    }
}

/// Per-field corpus statistics for BM25 length normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorpusStats {
    pub n: usize,
    pub avgdl: f64,
    pub dl: BTreeMap<String, usize>,
}

impl CorpusStats {
    pub fn doc_len(&self, doc_id: &str) -> usize {
        self.dl.get(doc_id).copied().unwrap_or(0)
    }
}

/// Stage one. Records without a URL are dropped; repeated URLs keep the last
/// record.
pub fn build_base_records<'a, I>(products: I) -> BTreeMap<String, DocRecord>
where
    I: IntoIterator<Item = &'a RawProduct>,
{
    products
        .into_iter()
        .filter_map(DocRecord::from_raw)
        .map(|rec| (rec.url.clone(), rec))
        .collect()
}

/// Stage two. Returns a new map; `base` is left untouched.
pub fn inherit_from_canonical(base: &BTreeMap<String, DocRecord>) -> BTreeMap<String, DocRecord> {
    let mut inherited = 0usize;
    let out = base
        .iter()
        .map(|(url, rec)| {
            let canon = canonicalize(url);
            let parent = (canon != *url).then(|| base.get(&canon)).flatten();
            let Some(parent) = parent else {
                return (url.clone(), rec.clone());
            };
            let mut rec = rec.clone();
            if rec.origin.is_empty() && !parent.origin.is_empty() {
                rec.origin = parent.origin.clone();
                inherited += 1;
            }
            if rec.brand.is_empty() && !parent.brand.is_empty() {
                rec.brand = parent.brand.clone();
                inherited += 1;
            }
            (url.clone(), rec)
        })
        .collect();
    tracing::debug!(inherited, "backfilled attributes from canonical records");
    out
}

/// Immutable after construction; safe to share across query threads.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    records: BTreeMap<String, DocRecord>,
}

impl DocumentStore {
    pub fn from_products(products: &[RawProduct]) -> Self {
        let base = build_base_records(products);
        Self { records: inherit_from_canonical(&base) }
    }

    pub fn get(&self, url: &str) -> Option<&DocRecord> {
        self.records.get(url)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DocRecord> {
        self.records.values()
    }

    /// Field lengths use the plain tokenizer, stopwords included.
    pub fn field_stats(&self, field: Field) -> CorpusStats {
        let dl: BTreeMap<String, usize> = self
            .records
            .iter()
            .map(|(id, rec)| (id.clone(), tokenize(field.text(rec)).len()))
            .collect();
        let n = dl.len();
        let avgdl = if n == 0 { 0.0 } else { dl.values().sum::<usize>() as f64 / n as f64 };
        CorpusStats { n, avgdl, dl }
    }
}
