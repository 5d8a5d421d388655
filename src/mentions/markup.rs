//! Extraction of entity references from transcript markup.
//!
//! Transcripts embed entity anchors as `<span>` and `<date>` elements.
//! The reference id lives in a `data-entity-id` attribute, with a plain
//! `id` attribute as fallback (date anchors often carry only that).

use once_cell::sync::Lazy;
use regex::Regex;

static ENTITY_ANCHOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(?:span|date)\b[^>]*>").expect("valid anchor pattern"));

static DATA_ENTITY_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"data-entity-id\s*=\s*["']([^"']+)["']"#).expect("valid attribute pattern")
});

static PLAIN_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\sid\s*=\s*["']([^"']+)["']"#).expect("valid attribute pattern"));

/// Returns the referenced entity ids in the order they appear in the
/// markup. References without either attribute are skipped; whether an
/// id resolves to structured data is the indexer's concern, not ours.
pub fn ordered_entity_refs(markup: &str) -> Vec<String> {
    ENTITY_ANCHOR
        .find_iter(markup)
        .filter_map(|anchor| {
            let tag = anchor.as_str();
            DATA_ENTITY_ID
                .captures(tag)
                .or_else(|| PLAIN_ID.captures(tag))
                .map(|captures| captures[1].to_string())
        })
        .collect()
}
