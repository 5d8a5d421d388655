//! Mention indexing: walks a transcript's markup in document order,
//! counts entity mentions, and builds the sort indices the entity
//! browser renders from.

pub mod index;
pub mod markup;

pub use index::{index, EntityFilter, MentionIndex, MentionRecord, SortEntry, SortKey};
pub use markup::ordered_entity_refs;
