//! Sort-index construction over a document's mentioned entities.
//!
//! One pass over the transcript's ordered references produces per-entity
//! mention counts, first-appearance ordinals and three independent sort
//! indices: alphabetic by title, by order of appearance, and by mention
//! frequency (most-mentioned first). Numeric keys are zero-padded so
//! lexical comparison sorts them correctly.

use std::collections::HashMap;

use crate::model::{Document, EntityKind};

use super::markup::ordered_entity_refs;

/// Width numeric keys are padded to before lexical comparison.
pub const NUMERIC_KEY_PAD: usize = 4;

/// The available sort orders, with the wire names panels exchange over
/// the `entity-sort` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    Appearance,
    Frequency,
    Title,
}

impl SortKey {
    pub fn wire_name(&self) -> &'static str {
        match self {
            SortKey::Appearance => "data-appearance",
            SortKey::Frequency => "data-mention",
            SortKey::Title => "data-title",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "data-appearance" | "appearance" => Some(SortKey::Appearance),
            "data-mention" | "frequency" => Some(SortKey::Frequency),
            "data-title" | "title" => Some(SortKey::Title),
            _ => None,
        }
    }
}

/// Display-side entity filter, exchanged over the `entity-filter`
/// attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityFilter {
    All,
    Kind(EntityKind),
}

impl EntityFilter {
    pub fn wire_value(&self) -> String {
        match self {
            EntityFilter::All => "all".to_string(),
            EntityFilter::Kind(kind) => kind.to_string(),
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("all") {
            return Some(EntityFilter::All);
        }
        EntityKind::parse(s).map(EntityFilter::Kind)
    }

    pub fn admits(&self, kind: EntityKind) -> bool {
        match self {
            EntityFilter::All => true,
            EntityFilter::Kind(wanted) => *wanted == kind,
        }
    }
}

/// One entry of a sort index: the derived key and the entity it ranks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortEntry {
    pub key: String,
    pub entity_id: String,
}

/// Display record for one mentioned entity.
#[derive(Debug, Clone, PartialEq)]
pub struct MentionRecord {
    pub entity_id: String,
    pub title: String,
    pub kind: EntityKind,
    /// 1-based ordinal of the entity's first mention.
    pub first_appearance: usize,
    /// Total mentions observed in the pass.
    pub mention_count: u32,
}

/// The derived indices for one document. Owns only derivations; the
/// entities themselves stay in the multi-document store.
#[derive(Debug, Clone, Default)]
pub struct MentionIndex {
    sort_indices: HashMap<SortKey, Vec<SortEntry>>,
    pub mention_counts: HashMap<String, u32>,
    /// Unique mention keys in order of first appearance.
    pub ordered_entity_ids: Vec<String>,
    pub records: HashMap<String, MentionRecord>,
}

impl MentionIndex {
    pub fn entries(&self, sort: SortKey) -> &[SortEntry] {
        self.sort_indices.get(&sort).map_or(&[], Vec::as_slice)
    }

    /// Entries of one index narrowed to a display filter.
    pub fn filtered_entries(&self, sort: SortKey, filter: EntityFilter) -> Vec<&SortEntry> {
        self.entries(sort)
            .iter()
            .filter(|entry| {
                self.records
                    .get(&entry.entity_id)
                    .is_some_and(|record| filter.admits(record.kind))
            })
            .collect()
    }

    /// Known occurrence count for an entity; zero when never mentioned.
    pub fn occurrence_count(&self, entity_id: &str) -> u32 {
        self.mention_counts.get(entity_id).copied().unwrap_or(0)
    }
}

fn pad_numeric(value: usize) -> String {
    format!("{:0width$}", value, width = NUMERIC_KEY_PAD)
}

/// Appends an entry unless its key is already present (keep-first).
fn push_unique(index: &mut Vec<SortEntry>, key: String, entity_id: &str) {
    if index.iter().any(|entry| entry.key == key) {
        return;
    }
    index.push(SortEntry {
        key,
        entity_id: entity_id.to_string(),
    });
}

/// Registers a frequency observation; only the highest count seen for an
/// entity survives, so mid-walk counts are replaced rather than appended.
fn upsert_frequency(index: &mut Vec<SortEntry>, count: u32, entity_id: &str) {
    let key = pad_numeric(count as usize);
    match index.iter_mut().find(|entry| entry.entity_id == entity_id) {
        Some(entry) => entry.key = key,
        None => index.push(SortEntry {
            key,
            entity_id: entity_id.to_string(),
        }),
    }
}

/// Indexes one document's transcript. Deterministic for identical
/// markup: re-running yields identical ordering and counts.
pub fn index(document: &Document) -> MentionIndex {
    let table = document.mentioned_entities();

    let mut counts: HashMap<String, u32> = HashMap::new();
    let mut first_seen: HashMap<String, usize> = HashMap::new();
    let mut ordered_ids: Vec<String> = Vec::new();
    let mut records: HashMap<String, MentionRecord> = HashMap::new();

    let mut title_index: Vec<SortEntry> = Vec::new();
    let mut appearance_index: Vec<SortEntry> = Vec::new();
    let mut frequency_index: Vec<SortEntry> = Vec::new();

    let mut ordinal = 0usize;

    for reference in ordered_entity_refs(&document.transcript) {
        // Raw transcript references without matching structured data are
        // legitimate; skip them.
        let Some(entity) = table.get(reference.as_str()) else {
            continue;
        };

        let key = entity.mention_key().to_string();
        let count = {
            let slot = counts.entry(key.clone()).or_insert(0);
            *slot += 1;
            *slot
        };

        ordinal += 1;
        let first = *first_seen.entry(key.clone()).or_insert(ordinal);
        if count == 1 {
            ordered_ids.push(key.clone());
        }

        records.insert(
            key.clone(),
            MentionRecord {
                entity_id: key.clone(),
                title: entity.title().to_string(),
                kind: entity.kind(),
                first_appearance: first,
                mention_count: count,
            },
        );

        push_unique(&mut title_index, entity.title().to_string(), &key);
        push_unique(&mut appearance_index, pad_numeric(first), &key);
        upsert_frequency(&mut frequency_index, count, &key);
    }

    title_index.sort_by(|a, b| a.key.cmp(&b.key));
    appearance_index.sort_by(|a, b| a.key.cmp(&b.key));
    // Most-mentioned first.
    frequency_index.sort_by(|a, b| b.key.cmp(&a.key));

    let mut sort_indices = HashMap::new();
    sort_indices.insert(SortKey::Title, title_index);
    sort_indices.insert(SortKey::Appearance, appearance_index);
    sort_indices.insert(SortKey::Frequency, frequency_index);

    MentionIndex {
        sort_indices,
        mention_counts: counts,
        ordered_entity_ids: ordered_ids,
        records,
    }
}
