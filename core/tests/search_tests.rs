use search_core::builder::{prepare_documents, IndexArtifacts};
use search_core::engine::{dedup_by_canonical, filter_all, filter_any};
use search_core::persist::{save_artifacts, save_json, IndexPaths};
use search_core::url::canonicalize;
use search_core::{
    DocumentStore, FieldIndex, RawProduct, SearchConfig, SearchEngine, SearchIndexes, SynonymMap,
};
use serde_json::{json, Value};
use std::collections::HashSet;

fn raw(values: &[Value]) -> Vec<RawProduct> {
    values.iter().map(|v| serde_json::from_value(v.clone()).unwrap()).collect()
}

fn field(v: &impl serde::Serialize) -> FieldIndex {
    FieldIndex::from_value(&serde_json::to_value(v).unwrap())
}

fn engine_with(values: &[Value], synonyms: SynonymMap) -> SearchEngine {
    let products = raw(values);
    let artifacts = IndexArtifacts::build(&prepare_documents(products.clone()));
    let indexes = SearchIndexes {
        title: field(&artifacts.title_positional),
        description: field(&artifacts.description_positional),
        origin: field(&artifacts.origin),
        brand: field(&artifacts.brand),
    };
    SearchEngine::new(
        DocumentStore::from_products(&products),
        indexes,
        synonyms,
        SearchConfig::default(),
    )
}

fn engine(values: &[Value]) -> SearchEngine {
    engine_with(values, SynonymMap::new())
}

fn catalog() -> Vec<Value> {
    vec![
        json!({"url": "http://x/product/1", "title": "Red shoes", "description": "Comfortable sneakers"}),
        json!({
            "url": "http://x/product/1?variant=2",
            "title": "Red shoes",
            "description": "Comfortable sneakers",
            "product_reviews": [{"rating": 5}, {"rating": 5}, {"rating": 5}]
        }),
        json!({"url": "http://x/product/2", "title": "Blue shoes", "description": "Canvas"}),
        json!({
            "url": "http://x/product/3",
            "title": "Leather boots",
            "description": "Waterproof hiking boots",
            "product_features": {"made in": "United States", "brand": "Trailco"}
        }),
    ]
}

#[test]
fn unique_token_is_sole_and_candidate() {
    let e = engine(&catalog());
    let (tokens, tokens_ns) = e.query_tokens("canvas");
    let candidates: Vec<&str> = e.candidates(&tokens, &tokens_ns).into_iter().collect();
    assert_eq!(candidates, vec!["http://x/product/2"]);
}

#[test]
fn and_filter_is_subset_of_or_filter() {
    let products = raw(&catalog());
    let artifacts = IndexArtifacts::build(&prepare_documents(products));
    let title = field(&artifacts.title_positional);
    let description = field(&artifacts.description_positional);
    let indexes = [&title, &description];
    for query in [vec!["red", "shoes"], vec!["shoes"], vec!["boots", "hiking"], vec!["red", "boots"]] {
        let tokens: Vec<String> = query.iter().map(|s| s.to_string()).collect();
        let all = filter_all(&tokens, &indexes);
        let any = filter_any(&tokens, &indexes);
        assert!(all.is_subset(&any), "{query:?}");
    }
}

#[test]
fn falls_back_to_or_when_and_is_empty() {
    let e = engine(&catalog());
    let res = e.search("red boots", 10);
    assert_eq!(res.documents_filtered, 3);
    let urls: HashSet<&str> = res.documents.iter().map(|d| d.url.as_str()).collect();
    assert!(urls.contains("http://x/product/3"));
}

#[test]
fn dedup_keeps_best_variant_only() {
    let e = engine(&catalog());
    let res = e.search("shoes", 10);
    assert_eq!(res.total_documents, 4);
    assert_eq!(res.documents_filtered, 3);
    assert_eq!(res.results_returned, 2);
    assert_eq!(res.documents[0].url, "http://x/product/1?variant=2");
    assert_eq!(res.documents[1].url, "http://x/product/2");

    let canon: HashSet<String> = res.documents.iter().map(|d| canonicalize(&d.url)).collect();
    assert_eq!(canon.len(), res.documents.len());
}

#[test]
fn dedup_by_canonical_keeps_first_of_group() {
    let scored = vec![
        ("http://x/product/1?variant=3", 9.0),
        ("http://x/product/2", 5.0),
        ("http://x/product/1", 4.0),
        ("http://x/product/1?variant=2#top", 1.0),
    ];
    let out = dedup_by_canonical(scored, |(url, _)| *url);
    assert_eq!(out, vec![("http://x/product/1?variant=3", 9.0), ("http://x/product/2", 5.0)]);
}

#[test]
fn empty_query_returns_nothing() {
    let e = engine(&catalog());
    for q in ["", "   ", "?!"] {
        let res = e.search(q, 10);
        assert_eq!(res.results_returned, 0);
        assert_eq!(res.documents_filtered, 0);
        assert_eq!(res.total_documents, 4);
    }
}

#[test]
fn stopword_only_query_uses_or_fallback() {
    let e = engine(&[
        json!({"url": "http://x/a", "title": "This is it"}),
        json!({"url": "http://x/b", "title": "Something else"}),
    ]);
    // "this" and "is" are query stopwords but not indexing stopwords.
    let res = e.search("this is", 10);
    assert_eq!(res.documents_filtered, 1);
    assert_eq!(res.documents[0].url, "http://x/a");
}

#[test]
fn synonyms_reach_origin_field() {
    let synonyms = SynonymMap::from_pairs([("usa", vec!["United States"])]);
    let e = engine_with(&catalog(), synonyms);
    let res = e.search("usa", 10);
    assert_eq!(res.results_returned, 1);
    let hit = &res.documents[0];
    assert_eq!(hit.url, "http://x/product/3");
    assert_eq!(hit.metadata.origin, "United States");
    assert_eq!(hit.metadata.brand, "Trailco");
    // origin bonus applies on top of BM25
    assert!(hit.score > 0.8);
}

#[test]
fn equal_scores_break_ties_by_url() {
    let e = engine(&[
        json!({"url": "http://x/b", "title": "lamp"}),
        json!({"url": "http://x/c", "title": "lamp"}),
        json!({"url": "http://x/a", "title": "lamp"}),
    ]);
    let res = e.search("lamp", 10);
    let urls: Vec<&str> = res.documents.iter().map(|d| d.url.as_str()).collect();
    assert_eq!(urls, vec!["http://x/a", "http://x/b", "http://x/c"]);
    assert_eq!(res.documents[0].score, res.documents[2].score);
}

#[test]
fn top_k_truncates_after_dedup() {
    let e = engine(&catalog());
    let res = e.search("shoes", 1);
    assert_eq!(res.results_returned, 1);
    assert_eq!(res.documents_filtered, 3);
}

#[test]
fn ratings_stay_in_bounds() {
    let e = engine(&[
        json!({"url": "http://x/a", "product_reviews": [{"rating": 0}, {"rating": 5}, {"rating": 3.5}]}),
        json!({"url": "http://x/b", "product_reviews": [{"rating": "n/a"}, {}]}),
        json!({"url": "http://x/c"}),
    ]);
    for rec in e.store().iter() {
        assert!((0.0..=5.0).contains(&rec.avg_rating), "{}", rec.url);
    }
    assert_eq!(e.store().get("http://x/b").unwrap().review_count, 2);
}

#[test]
fn loads_saved_artifacts_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let products = raw(&catalog());
    let paths = IndexPaths::new(dir.path().join("index"));
    save_artifacts(&paths, &IndexArtifacts::build(&prepare_documents(products))).unwrap();

    let products_path = dir.path().join("products.jsonl");
    let lines: Vec<String> = catalog().iter().map(Value::to_string).collect();
    std::fs::write(&products_path, lines.join("\n")).unwrap();
    let syn_path = dir.path().join("synonyms.json");
    save_json(&syn_path, &json!({"USA": ["United States"]})).unwrap();

    let e = SearchEngine::open(&paths.root, &products_path, Some(syn_path.as_path()), SearchConfig::default())
        .unwrap();
    assert_eq!(e.search("shoes", 10).results_returned, 2);
    assert_eq!(e.search("usa", 10).documents[0].url, "http://x/product/3");
}

#[test]
fn missing_index_files_give_empty_fields() {
    let dir = tempfile::tempdir().unwrap();
    let indexes = SearchIndexes::load(&IndexPaths::new(dir.path())).unwrap();
    assert!(indexes.title.is_empty());
    assert!(indexes.brand.is_empty());
}
