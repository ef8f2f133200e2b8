//! Product search core: tokenization, index building, the URL-keyed document
//! store and the BM25 query engine.

pub mod builder;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod persist;
pub mod postings;
pub mod ranking;
pub mod store;
pub mod synonyms;
pub mod tokenizer;
pub mod url;

pub use builder::{IndexArtifacts, IndexDocument};
pub use config::SearchConfig;
pub use document::{DocRecord, Feature, RawProduct};
pub use engine::{SearchEngine, SearchHit, SearchIndexes, SearchResponse};
pub use error::{Error, Result};
pub use postings::{FieldIndex, Posting};
pub use store::{CorpusStats, DocumentStore, Field};
pub use synonyms::SynonymMap;
