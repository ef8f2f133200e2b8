use crate::error::Result;
use crate::persist::load_json;
use crate::tokenizer::tokenize;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

/// token → synonyms, all lower-cased. Read once, never modified.
#[derive(Debug, Clone, Default)]
pub struct SynonymMap {
    map: HashMap<String, BTreeSet<String>>,
}

impl SynonymMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a JSON object of `term -> [synonym, ...]`.
    pub fn load(path: &Path) -> Result<Self> {
        let raw: HashMap<String, Vec<String>> = load_json(path)?;
        let syn = Self::from_pairs(raw);
        tracing::info!(path = %path.display(), terms = syn.map.len(), "loaded synonyms");
        Ok(syn)
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: IntoIterator,
        V::Item: AsRef<str>,
    {
        let mut map: HashMap<String, BTreeSet<String>> = HashMap::new();
        for (k, vals) in pairs {
            map.entry(k.as_ref().to_lowercase())
                .or_default()
                .extend(vals.into_iter().map(|v| v.as_ref().to_lowercase()));
        }
        Self { map }
    }

    pub fn get(&self, token: &str) -> Option<&BTreeSet<String>> {
        self.map.get(token)
    }

    /// Original tokens first, then the tokenized synonyms of each original
    /// token in order. Expansion is one level deep.
    pub fn expand(&self, tokens: &[String]) -> Vec<String> {
        let mut expanded = tokens.to_vec();
        for tok in tokens {
            if let Some(syns) = self.get(tok) {
                for syn in syns {
                    expanded.extend(tokenize(syn));
                }
            }
        }
        expanded
    }
}
