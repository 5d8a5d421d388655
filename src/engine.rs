//! The viewer-facing facade: wires the clients, the store, the indexer,
//! the resolver and the bus into the per-activation data flow.
//!
//! A document-selection change enters as an id list: the aggregator
//! fetches and merges entity data per id, the mention indexer derives
//! sort indices and counts per document, the event-date resolver
//! enriches event entities with chronological keys, and the resulting
//! activation report is handed to presentation surfaces. Everything is
//! rebuilt per activation; nothing is persisted.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::aggregator::{EntityAggregator, MultiDocumentStore};
use crate::bus::{Attribute, PropagationBus, RootViewer, Selection, ATTR_SELECTED_ENTITY};
use crate::chronology::{ChronologyRecord, EventDateResolver};
use crate::client::{KnowledgeClient, RepositoryClient};
use crate::config::EngineConfig;
use crate::dates::{expand_to_range, DateNormalizer, DisplayDate};
use crate::error::Result;
use crate::mentions::{self, MentionIndex};
use crate::model::EntityKind;
use crate::TARGET_AGGREGATE;

/// Everything one activation derives: per-document mention indices and
/// the chronology records for the active event entities.
#[derive(Debug, Default)]
pub struct ActivationReport {
    pub generation: u64,
    pub indices: HashMap<String, MentionIndex>,
    pub chronology: HashMap<String, ChronologyRecord>,
}

pub struct ChronicleEngine {
    store: Arc<MultiDocumentStore>,
    aggregator: EntityAggregator,
    resolver: EventDateResolver,
    normalizer: DateNormalizer,
    bus: PropagationBus,
    root: Arc<RootViewer>,
}

impl ChronicleEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let store = Arc::new(MultiDocumentStore::new());
        let aggregator =
            EntityAggregator::new(RepositoryClient::new(&config)?, Arc::clone(&store));
        let resolver = EventDateResolver::new(KnowledgeClient::new(&config)?);
        let normalizer = DateNormalizer::new(config.date_corrections.clone());

        let root = Arc::new(RootViewer::new());
        let mut bus = PropagationBus::new();
        bus.set_root(Arc::clone(&root) as Arc<dyn crate::bus::Surface>);

        Ok(Self {
            store,
            aggregator,
            resolver,
            normalizer,
            bus,
            root,
        })
    }

    pub fn store(&self) -> &Arc<MultiDocumentStore> {
        &self.store
    }

    pub fn bus(&self) -> &PropagationBus {
        &self.bus
    }

    /// Surface registration happens before the first activation.
    pub fn bus_mut(&mut self) -> &mut PropagationBus {
        &mut self.bus
    }

    pub fn selection(&self) -> Selection {
        self.root.selection()
    }

    pub fn normalizer(&self) -> &DateNormalizer {
        &self.normalizer
    }

    /// Normalizes a raw date claim for display against the active
    /// correction policy.
    pub fn display_date(&self, raw: &str, entity_title: &str) -> Result<DisplayDate> {
        self.normalizer.parse(raw, entity_title)
    }

    /// Activates a set of document ids: aggregates their entity data,
    /// rebuilds the mention indices and chronology, updates the shared
    /// occurrence counts, and announces the new active set on the bus.
    ///
    /// A partial batch failure propagates after the successful documents
    /// are in the store, so the caller can choose between presenting a
    /// partial result and an explicit no-data state.
    pub async fn activate(&self, ids: Vec<String>) -> Result<ActivationReport> {
        let generation = self.store.begin_generation();
        info!(
            target: TARGET_AGGREGATE,
            "activating {} documents (generation {generation})",
            ids.len()
        );

        self.store.retain_active(generation, &ids)?;
        let summary = self.aggregator.aggregate_generation(&ids, generation).await?;

        let mut indices = HashMap::new();
        let mut merged_counts: HashMap<String, u32> = HashMap::new();
        let mut event_ids = Vec::new();
        let mut chronology: HashMap<String, ChronologyRecord> = HashMap::new();

        for id in &ids {
            let Some(document) = self.store.get(id) else {
                continue;
            };
            let index = mentions::index(&document);
            for (key, count) in &index.mention_counts {
                *merged_counts.entry(key.clone()).or_insert(0) += count;
            }
            event_ids.extend(document.event_ids());

            // Date literals order themselves; no knowledge lookup needed.
            for entity in document.entities.get(&EntityKind::Date).into_iter().flatten() {
                if let Some((start, end)) = expand_to_range(entity.title()) {
                    chronology.insert(
                        entity.mention_key().to_string(),
                        ChronologyRecord {
                            start_date: Some(start.clone()),
                            end_date: Some(end.clone()),
                            point_in_time: None,
                            sort_date_start: Some(start),
                            sort_date_end: Some(end),
                        },
                    );
                }
            }

            indices.insert(id.clone(), index);
        }

        event_ids.sort();
        event_ids.dedup();
        chronology.extend(self.resolver.resolve_event_dates(&event_ids).await?);

        self.root.set_occurrence_counts(merged_counts);
        self.bus.propagate(&Attribute::ActiveIds(ids));

        Ok(ActivationReport {
            generation: summary.generation,
            indices,
            chronology,
        })
    }

    /// Entity selection re-entering from a presentation surface.
    pub fn select_entity(&self, entity_id: &str) {
        self.bus
            .propagate(&Attribute::SelectedEntity(entity_id.to_string()));
    }

    /// Steps between repeated mentions of the selected entity.
    pub fn select_occurrence(&self, index: usize) {
        self.bus.propagate(&Attribute::EntityIndex(index));
    }

    pub fn clear_selection(&self) {
        self.bus.clear(ATTR_SELECTED_ENTITY);
    }
}
