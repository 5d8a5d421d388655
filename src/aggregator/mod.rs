//! Concurrent retrieval and merging of per-document entity data into the
//! shared multi-document store.
//!
//! For each newly active id the aggregator fetches the document's base
//! record and all five entity-kind listings concurrently, assigns a
//! display color pair, and inserts the result keyed by id. Fan-out is
//! unordered; every fetch carries its own deadline; a batch settles
//! completely before the pass reports its outcome.

pub mod color;
pub mod store;

pub use store::MultiDocumentStore;

use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::client::RepositoryClient;
use crate::error::{ChronicleError, Result};
use crate::model::{Document, Entity, EntityKind};
use crate::TARGET_AGGREGATE;

use color::{random_color, shade_color, BORDER_SHADE_PERCENT};

/// Outcome of one aggregation pass.
#[derive(Debug, Clone)]
pub struct AggregateSummary {
    pub generation: u64,
    /// Ids fetched and inserted by this pass.
    pub loaded: Vec<String>,
    /// Ids that were already present and were left untouched (their
    /// display colors are preserved).
    pub already_present: Vec<String>,
}

pub struct EntityAggregator {
    repository: RepositoryClient,
    store: Arc<MultiDocumentStore>,
}

impl EntityAggregator {
    pub fn new(repository: RepositoryClient, store: Arc<MultiDocumentStore>) -> Self {
        Self { repository, store }
    }

    pub fn store(&self) -> &Arc<MultiDocumentStore> {
        &self.store
    }

    /// Aggregates the given document ids into the store.
    ///
    /// Partial failure is never swallowed: if any id fails while others
    /// succeed, the successes stay in the store and the pass returns
    /// `BatchPartialFailure` naming the failed ids. A pass overtaken by
    /// a newer one stops at the first rejected write and returns
    /// `Superseded`.
    pub async fn aggregate(&self, ids: &[String]) -> Result<AggregateSummary> {
        let generation = self.store.begin_generation();
        self.aggregate_generation(ids, generation).await
    }

    /// Aggregation body for an externally started generation; used by
    /// the engine so the generation spans the whole activation flow.
    pub async fn aggregate_generation(
        &self,
        ids: &[String],
        generation: u64,
    ) -> Result<AggregateSummary> {
        let mut pending = Vec::new();
        let mut already_present = Vec::new();
        for id in ids {
            if self.store.contains(id) {
                already_present.push(id.clone());
            } else {
                pending.push(id.clone());
            }
        }

        debug!(
            target: TARGET_AGGREGATE,
            "generation {generation}: {} to fetch, {} already present",
            pending.len(),
            already_present.len()
        );

        let results = join_all(pending.iter().map(|id| self.load_document(id))).await;

        let mut loaded = Vec::new();
        let mut failures = Vec::new();
        for (id, result) in pending.into_iter().zip(results) {
            match result {
                Ok(document) => {
                    // A newer pass invalidates this one wholesale.
                    self.store.insert_if_current(generation, document)?;
                    loaded.push(id);
                }
                Err(err) => failures.push((id, err.to_string())),
            }
        }

        if !failures.is_empty() {
            return Err(ChronicleError::BatchPartialFailure {
                failures,
                succeeded: loaded,
            });
        }

        info!(
            target: TARGET_AGGREGATE,
            "generation {generation}: loaded {} documents",
            loaded.len()
        );

        Ok(AggregateSummary {
            generation,
            loaded,
            already_present,
        })
    }

    /// Fetches one document's base record and entity slate concurrently.
    async fn load_document(&self, id: &str) -> Result<Document> {
        let slates = join_all(
            EntityKind::ALL
                .iter()
                .map(|kind| self.repository.fetch_item_entities(id, *kind)),
        );
        let (base, slates) = tokio::join!(self.repository.fetch_item(id), slates);
        let base = base?;

        let mut entities: BTreeMap<EntityKind, Vec<Entity>> = BTreeMap::new();
        for (kind, slate) in EntityKind::ALL.iter().zip(slates) {
            let resolved = slate?
                .into_iter()
                .filter_map(|raw| raw.into_entity(*kind))
                .collect();
            entities.insert(*kind, resolved);
        }

        let (display_color, display_border_color) = match self.store.display_colors(id) {
            Some(colors) => colors,
            None => {
                let color = random_color();
                let border = shade_color(&color, BORDER_SHADE_PERCENT);
                (color, border)
            }
        };

        Ok(Document {
            id: id.to_string(),
            title: base.title,
            transcript: base.transcript,
            tei_uri: base.tei_uri,
            uri: base.uri,
            entities,
            display_color,
            display_border_color,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn document(id: &str) -> Document {
        Document {
            id: id.to_string(),
            title: format!("Interview {id}"),
            transcript: String::new(),
            tei_uri: None,
            uri: None,
            entities: BTreeMap::new(),
            display_color: "#336699".to_string(),
            display_border_color: "#264c72".to_string(),
        }
    }

    fn aggregator(store: &Arc<MultiDocumentStore>) -> EntityAggregator {
        let repository =
            RepositoryClient::new(&EngineConfig::new("https://repo.example.org")).unwrap();
        EntityAggregator::new(repository, Arc::clone(store))
    }

    #[tokio::test]
    async fn already_present_documents_keep_their_colors() {
        let store = Arc::new(MultiDocumentStore::new());
        let generation = store.begin_generation();
        store.insert_if_current(generation, document("12")).unwrap();

        // The id is already present, so no fetch happens and the color
        // assignment is untouched.
        let summary = aggregator(&store)
            .aggregate(&["12".to_string()])
            .await
            .unwrap();

        assert_eq!(summary.already_present, vec!["12".to_string()]);
        assert!(summary.loaded.is_empty());
        let (color, border) = store.display_colors("12").unwrap();
        assert_eq!(color, "#336699");
        assert_eq!(border, "#264c72");
    }

    #[tokio::test]
    async fn empty_activation_settles_without_fetching() {
        let store = Arc::new(MultiDocumentStore::new());
        let summary = aggregator(&store).aggregate(&[]).await.unwrap();
        assert!(summary.loaded.is_empty());
        assert!(store.is_empty());
    }
}
