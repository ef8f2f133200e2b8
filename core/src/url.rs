//! The two URL identities used across the pipeline.
//!
//! [`canonicalize`] drops both query and fragment: variants of one product
//! page collapse to the same key for attribute inheritance and result
//! deduplication. [`crawl_key`] keeps the query (with sorted parameters) and
//! only drops the fragment; it is the crawler's visited-set identity. The two
//! must not be used interchangeably.

use lazy_static::lazy_static;
use regex::Regex;
use ::url::Url;

lazy_static! {
    static ref PRODUCT_PATH: Regex = Regex::new(r"^/product/(\d+)/?$").expect("valid regex");
}

/// Scheme, host and path only, byte-for-byte as written. Store keys are raw
/// URLs, so the canonical form must not re-encode or re-case anything.
pub fn canonicalize(raw: &str) -> String {
    split_off(raw, &['#', '?']).to_string()
}

/// Fragment removed, query parameters sorted by key then value.
pub fn crawl_key(raw: &str) -> String {
    let Ok(mut u) = Url::parse(raw) else {
        return split_off(raw, &['#']).to_string();
    };
    u.set_fragment(None);
    let mut pairs: Vec<(String, String)> = u
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if pairs.is_empty() {
        u.set_query(None);
        return u.to_string();
    }
    pairs.sort();
    u.query_pairs_mut().clear().extend_pairs(pairs);
    u.to_string()
}

/// Numeric product id from a `/product/<id>` path.
pub fn product_id(raw: &str) -> Option<String> {
    let u = Url::parse(raw).ok()?;
    PRODUCT_PATH
        .captures(u.path())
        .map(|caps| caps[1].to_string())
}

/// First non-empty `variant` query parameter.
pub fn variant(raw: &str) -> Option<String> {
    let u = Url::parse(raw).ok()?;
    u.query_pairs()
        .find(|(k, v)| k == "variant" && !v.is_empty())
        .map(|(_, v)| v.into_owned())
}

fn split_off<'a>(raw: &'a str, stops: &[char]) -> &'a str {
    match raw.find(stops) {
        Some(idx) => &raw[..idx],
        None => raw,
    }
}
