//! The shared multi-document store.
//!
//! Documents are keyed by id, so concurrent fan-out writes never
//! conflict. A generation counter guards against logical races: two
//! overlapping active-id changes can interleave their async
//! continuations, and the store refuses writes from any pass that has
//! been superseded.

use dashmap::mapref::one::Ref;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{ChronicleError, Result};
use crate::model::Document;

#[derive(Debug, Default)]
pub struct MultiDocumentStore {
    documents: DashMap<String, Document>,
    generation: AtomicU64,
}

impl MultiDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new aggregation pass, invalidating all earlier ones.
    pub fn begin_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.documents.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<Ref<'_, String, Document>> {
        self.documents.get(id)
    }

    /// Inserts a document on behalf of an aggregation pass. Rejected when
    /// a newer pass has started, so stale results never overwrite newer
    /// ones.
    pub fn insert_if_current(&self, generation: u64, document: Document) -> Result<()> {
        if self.current_generation() != generation {
            return Err(ChronicleError::Superseded { generation });
        }
        self.documents.insert(document.id.clone(), document);
        Ok(())
    }

    /// Display colors already assigned to a document, if any. Presence
    /// here is what makes colors stable across re-aggregations of the
    /// same id.
    pub fn display_colors(&self, id: &str) -> Option<(String, String)> {
        self.documents.get(id).map(|doc| {
            (
                doc.display_color.clone(),
                doc.display_border_color.clone(),
            )
        })
    }

    /// Drops documents whose ids are no longer active, on behalf of an
    /// aggregation pass. Removals carry the same generation guard as
    /// inserts: a superseded pass must not prune documents a newer pass
    /// keeps. All state is transient and rebuilt per active-transcript
    /// selection.
    pub fn retain_active(&self, generation: u64, active_ids: &[String]) -> Result<()> {
        if self.current_generation() != generation {
            return Err(ChronicleError::Superseded { generation });
        }
        self.documents
            .retain(|id, _| active_ids.iter().any(|active| active == id));
        Ok(())
    }

    pub fn ids(&self) -> Vec<String> {
        self.documents.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
