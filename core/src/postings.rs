//! Query-side field indices.
//!
//! Index files come in several shapes (compact URL lists, positional maps,
//! lists of posting objects). They are normalized into [`FieldIndex`] once
//! at load time so lookups never re-inspect JSON.

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Posting {
    Count(u32),
    Positions(Vec<u32>),
    Detailed { tf: u32, pos: Vec<u32> },
}

impl Posting {
    pub fn tf(&self) -> u32 {
        match self {
            Posting::Count(n) => *n,
            Posting::Positions(p) => p.len() as u32,
            Posting::Detailed { tf, .. } => *tf,
        }
    }

    /// Unrecognized shapes become a zero-frequency posting.
    pub fn from_value(v: &Value) -> Self {
        match v {
            Value::Number(_) => Posting::Count(as_u32(v).unwrap_or(0)),
            Value::Array(_) => match positions(v) {
                Some(p) => Posting::Positions(p),
                None => Posting::Count(0),
            },
            Value::Object(obj) => {
                let pos = obj.get("pos").and_then(positions);
                match (obj.get("tf").and_then(as_u32), pos) {
                    (Some(tf), pos) => Posting::Detailed { tf, pos: pos.unwrap_or_default() },
                    (None, Some(pos)) => Posting::Detailed { tf: pos.len() as u32, pos },
                    (None, None) => Posting::Count(0),
                }
            }
            _ => Posting::Count(0),
        }
    }
}

fn as_u32(v: &Value) -> Option<u32> {
    v.as_u64().and_then(|n| u32::try_from(n).ok())
}

fn positions(v: &Value) -> Option<Vec<u32>> {
    v.as_array()?.iter().map(as_u32).collect()
}

/// Postings for one token: doc id → posting, ordered by doc id.
pub type PostingMap = BTreeMap<String, Posting>;

#[derive(Debug, Clone, Default)]
pub struct FieldIndex {
    terms: HashMap<String, PostingMap>,
}

impl FieldIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts a JSON object of token → postings. Any other top-level value
    /// yields an empty index.
    pub fn from_value(v: &Value) -> Self {
        let terms = v
            .as_object()
            .map(|obj| {
                obj.iter()
                    .map(|(tok, postings)| (tok.clone(), normalize_postings(postings)))
                    .filter(|(_, postings)| !postings.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        Self { terms }
    }

    pub fn insert(&mut self, token: impl Into<String>, postings: PostingMap) {
        self.terms.insert(token.into(), postings);
    }

    pub fn postings(&self, token: &str) -> Option<&PostingMap> {
        self.terms.get(token)
    }

    pub fn doc_frequency(&self, token: &str) -> usize {
        self.postings(token).map_or(0, BTreeMap::len)
    }

    pub fn term_frequency(&self, token: &str, doc_id: &str) -> u32 {
        self.postings(token)
            .and_then(|p| p.get(doc_id))
            .map_or(0, Posting::tf)
    }

    pub fn docs_for<'a>(&'a self, token: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.postings(token)
            .into_iter()
            .flat_map(|p| p.keys().map(String::as_str))
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// The value stored for one token:
/// - object: doc id → posting value
/// - array: posting objects with a string `doc_id`, or bare doc id strings
///   (compact form, frequency 1)
fn normalize_postings(v: &Value) -> PostingMap {
    match v {
        Value::Object(obj) => obj
            .iter()
            .map(|(doc, p)| (doc.clone(), Posting::from_value(p)))
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(doc) => Some((doc.clone(), Posting::Count(1))),
                Value::Object(obj) => {
                    let doc = obj.get("doc_id")?.as_str()?;
                    Some((doc.to_string(), Posting::from_value(item)))
                }
                _ => None,
            })
            .collect(),
        _ => PostingMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn posting_shapes() {
        assert_eq!(Posting::from_value(&json!(3)).tf(), 3);
        assert_eq!(Posting::from_value(&json!([0, 4, 9])).tf(), 3);
        assert_eq!(Posting::from_value(&json!({"tf": 2})).tf(), 2);
        assert_eq!(Posting::from_value(&json!({"pos": [1, 2, 3, 4]})).tf(), 4);
        assert_eq!(Posting::from_value(&json!({"tf": "x"})), Posting::Count(0));
        assert_eq!(Posting::from_value(&json!("weird")).tf(), 0);
        assert_eq!(Posting::from_value(&json!(["a"])).tf(), 0);
    }

    #[test]
    fn compact_positional_and_object_lists() {
        let idx = FieldIndex::from_value(&json!({
            "shoes": ["u1", "u2"],
            "red": {"u1": [0, 3]},
            "blue": [{"doc_id": "u3", "tf": 5}, {"no_id": true}, 7],
            "nothing": "oops",
        }));
        assert_eq!(idx.doc_frequency("shoes"), 2);
        assert_eq!(idx.term_frequency("shoes", "u2"), 1);
        assert_eq!(idx.term_frequency("red", "u1"), 2);
        assert_eq!(idx.term_frequency("blue", "u3"), 5);
        assert_eq!(idx.doc_frequency("blue"), 1);
        assert!(idx.postings("nothing").is_none());
        assert_eq!(idx.term_frequency("missing", "u1"), 0);
    }

    #[test]
    fn non_object_root_is_empty() {
        assert!(FieldIndex::from_value(&json!([1, 2])).is_empty());
    }
}
