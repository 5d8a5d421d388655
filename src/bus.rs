//! The attribute-propagation bus: the sole sanctioned channel for
//! inter-panel communication.
//!
//! A propagated attribute is broadcast to four fixed subscriber groups
//! in order: visualization panels, information panels, surfaces opted
//! into propagation, and the root viewer itself. The broadcast is flat
//! and direct: no topic filtering, no priority, no acknowledgment.
//! Subscribers must be idempotent on receiving the same value twice,
//! and must never hold direct references to one another.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::mentions::{EntityFilter, SortKey};
use crate::TARGET_BUS;

pub const ATTR_SELECTED_ENTITY: &str = "selected-entity";
pub const ATTR_ENTITY_INDEX: &str = "data-entity-index";
pub const ATTR_ACTIVE_IDS: &str = "ddhi-active-id";
pub const ATTR_ENTITY_SORT: &str = "entity-sort";
pub const ATTR_ENTITY_FILTER: &str = "entity-filter";

/// A typed attribute value. Each variant knows the wire name and value
/// encoding panels exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    SelectedEntity(String),
    EntityIndex(usize),
    ActiveIds(Vec<String>),
    EntitySort(SortKey),
    EntityFilter(EntityFilter),
}

impl Attribute {
    pub fn name(&self) -> &'static str {
        match self {
            Attribute::SelectedEntity(_) => ATTR_SELECTED_ENTITY,
            Attribute::EntityIndex(_) => ATTR_ENTITY_INDEX,
            Attribute::ActiveIds(_) => ATTR_ACTIVE_IDS,
            Attribute::EntitySort(_) => ATTR_ENTITY_SORT,
            Attribute::EntityFilter(_) => ATTR_ENTITY_FILTER,
        }
    }

    pub fn wire_value(&self) -> String {
        match self {
            Attribute::SelectedEntity(id) => id.clone(),
            Attribute::EntityIndex(index) => index.to_string(),
            Attribute::ActiveIds(ids) => ids.join(","),
            Attribute::EntitySort(sort) => sort.wire_name().to_string(),
            Attribute::EntityFilter(filter) => filter.wire_value(),
        }
    }

    /// Parses the comma-separated `ddhi-active-id` wire format.
    pub fn parse_active_ids(value: &str) -> Vec<String> {
        value
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// A display surface registered on the bus.
pub trait Surface: Send + Sync {
    fn attribute_changed(&self, attribute: &Attribute);
    fn attribute_cleared(&self, name: &str);
}

/// Broadcasts attribute changes to every registered surface.
#[derive(Default)]
pub struct PropagationBus {
    visualizations: Vec<Arc<dyn Surface>>,
    info_panels: Vec<Arc<dyn Surface>>,
    opt_ins: Vec<Arc<dyn Surface>>,
    root: Option<Arc<dyn Surface>>,
}

impl PropagationBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_visualization(&mut self, surface: Arc<dyn Surface>) {
        self.visualizations.push(surface);
    }

    pub fn register_info_panel(&mut self, surface: Arc<dyn Surface>) {
        self.info_panels.push(surface);
    }

    pub fn register_opt_in(&mut self, surface: Arc<dyn Surface>) {
        self.opt_ins.push(surface);
    }

    pub fn set_root(&mut self, surface: Arc<dyn Surface>) {
        self.root = Some(surface);
    }

    fn surfaces(&self) -> impl Iterator<Item = &Arc<dyn Surface>> {
        self.visualizations
            .iter()
            .chain(self.info_panels.iter())
            .chain(self.opt_ins.iter())
            .chain(self.root.iter())
    }

    /// Broadcasts a named attribute value to all four subscriber groups
    /// in their fixed order.
    pub fn propagate(&self, attribute: &Attribute) {
        debug!(
            target: TARGET_BUS,
            "propagate {}={}",
            attribute.name(),
            attribute.wire_value()
        );
        for surface in self.surfaces() {
            surface.attribute_changed(attribute);
        }
    }

    /// Removes the named attribute from the same four groups.
    pub fn clear(&self, name: &str) {
        debug!(target: TARGET_BUS, "clear {name}");
        for surface in self.surfaces() {
            surface.attribute_cleared(name);
        }
    }
}

/// Selection lifecycle. There is no other reachable state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    Unselected,
    Selected {
        entity_id: String,
        /// Zero-based index stepping between repeated mentions.
        occurrence: usize,
    },
}

/// The canonical selection state: the selected entity (or absence
/// thereof) plus the occurrence index into its known mentions. Versioned
/// so observers can detect staleness instead of consulting ambient
/// globals.
#[derive(Debug, Default)]
pub struct SelectionState {
    selection: Selection,
    occurrence_counts: HashMap<String, u32>,
    version: u64,
}

impl SelectionState {
    /// Installs the occurrence counts from the latest mention-indexing
    /// pass; the occurrence index wraps modulo these.
    pub fn set_occurrence_counts(&mut self, counts: HashMap<String, u32>) {
        self.occurrence_counts = counts;
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    fn count_for(&self, entity_id: &str) -> usize {
        self.occurrence_counts
            .get(entity_id)
            .copied()
            .unwrap_or(0)
            .max(1) as usize
    }

    /// Applies one propagated attribute. Selecting an entity resets the
    /// occurrence index; an index change wraps modulo the entity's known
    /// occurrence count; anything else leaves the selection alone.
    pub fn apply(&mut self, attribute: &Attribute) {
        match attribute {
            Attribute::SelectedEntity(id) => {
                self.selection = Selection::Selected {
                    entity_id: id.clone(),
                    occurrence: 0,
                };
                self.version += 1;
            }
            Attribute::EntityIndex(index) => {
                if let Selection::Selected { entity_id, .. } = self.selection.clone() {
                    let count = self.count_for(&entity_id);
                    self.selection = Selection::Selected {
                        entity_id,
                        occurrence: index % count,
                    };
                    self.version += 1;
                }
            }
            _ => {}
        }
    }

    pub fn clear(&mut self, name: &str) {
        if name == ATTR_SELECTED_ENTITY && self.selection != Selection::Unselected {
            self.selection = Selection::Unselected;
            self.version += 1;
        }
    }

    /// Advances to the next mention of the selected entity, wrapping.
    pub fn step_next(&mut self) {
        if let Selection::Selected {
            entity_id,
            occurrence,
        } = self.selection.clone()
        {
            let count = self.count_for(&entity_id);
            self.selection = Selection::Selected {
                entity_id,
                occurrence: (occurrence + 1) % count,
            };
            self.version += 1;
        }
    }

    /// Steps back to the previous mention, wrapping.
    pub fn step_previous(&mut self) {
        if let Selection::Selected {
            entity_id,
            occurrence,
        } = self.selection.clone()
        {
            let count = self.count_for(&entity_id);
            self.selection = Selection::Selected {
                entity_id,
                occurrence: (occurrence + count - 1) % count,
            };
            self.version += 1;
        }
    }
}

/// The root viewer surface. Owns the canonical selection state; all
/// mutation flows through the bus.
#[derive(Default)]
pub struct RootViewer {
    state: RwLock<SelectionState>,
}

impl RootViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> Selection {
        self.state.read().expect("selection lock").selection().clone()
    }

    pub fn selection_version(&self) -> u64 {
        self.state.read().expect("selection lock").version()
    }

    pub fn set_occurrence_counts(&self, counts: HashMap<String, u32>) {
        self.state
            .write()
            .expect("selection lock")
            .set_occurrence_counts(counts);
    }

    pub fn step_next(&self) {
        self.state.write().expect("selection lock").step_next();
    }

    pub fn step_previous(&self) {
        self.state.write().expect("selection lock").step_previous();
    }
}

impl Surface for RootViewer {
    fn attribute_changed(&self, attribute: &Attribute) {
        self.state.write().expect("selection lock").apply(attribute);
    }

    fn attribute_cleared(&self, name: &str) {
        self.state.write().expect("selection lock").clear(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSurface {
        log: Mutex<Vec<String>>,
    }

    impl RecordingSurface {
        fn log(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    impl Surface for RecordingSurface {
        fn attribute_changed(&self, attribute: &Attribute) {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}={}", attribute.name(), attribute.wire_value()));
        }

        fn attribute_cleared(&self, name: &str) {
            self.log.lock().unwrap().push(format!("clear {name}"));
        }
    }

    fn counts(pairs: &[(&str, u32)]) -> HashMap<String, u32> {
        pairs
            .iter()
            .map(|(id, count)| (id.to_string(), *count))
            .collect()
    }

    #[test]
    fn selection_lifecycle_select_index_clear() {
        let mut state = SelectionState::default();
        state.set_occurrence_counts(counts(&[("Q123", 5)]));

        state.apply(&Attribute::SelectedEntity("Q123".to_string()));
        state.apply(&Attribute::EntityIndex(2));
        assert_eq!(
            *state.selection(),
            Selection::Selected {
                entity_id: "Q123".to_string(),
                occurrence: 2,
            }
        );

        state.clear(ATTR_SELECTED_ENTITY);
        assert_eq!(*state.selection(), Selection::Unselected);
    }

    #[test]
    fn occurrence_index_wraps_modulo_known_count() {
        let mut state = SelectionState::default();
        state.set_occurrence_counts(counts(&[("Q1", 3)]));

        state.apply(&Attribute::SelectedEntity("Q1".to_string()));
        state.apply(&Attribute::EntityIndex(7));
        assert_eq!(
            *state.selection(),
            Selection::Selected {
                entity_id: "Q1".to_string(),
                occurrence: 1,
            }
        );
    }

    #[test]
    fn index_change_without_selection_is_ignored() {
        let mut state = SelectionState::default();
        state.apply(&Attribute::EntityIndex(4));
        assert_eq!(*state.selection(), Selection::Unselected);
        assert_eq!(state.version(), 0);
    }

    #[test]
    fn stepping_wraps_in_both_directions() {
        let mut state = SelectionState::default();
        state.set_occurrence_counts(counts(&[("Q1", 2)]));
        state.apply(&Attribute::SelectedEntity("Q1".to_string()));

        state.step_next();
        assert!(matches!(
            state.selection(),
            Selection::Selected { occurrence: 1, .. }
        ));
        state.step_next();
        assert!(matches!(
            state.selection(),
            Selection::Selected { occurrence: 0, .. }
        ));
        state.step_previous();
        assert!(matches!(
            state.selection(),
            Selection::Selected { occurrence: 1, .. }
        ));
    }

    #[test]
    fn broadcast_reaches_all_groups_in_order() {
        let viz = Arc::new(RecordingSurface::default());
        let info = Arc::new(RecordingSurface::default());
        let opt_in = Arc::new(RecordingSurface::default());
        let root = Arc::new(RootViewer::new());

        let mut bus = PropagationBus::new();
        bus.register_visualization(viz.clone());
        bus.register_info_panel(info.clone());
        bus.register_opt_in(opt_in.clone());
        bus.set_root(root.clone());

        bus.propagate(&Attribute::SelectedEntity("Q123".to_string()));
        bus.propagate(&Attribute::EntityIndex(2));

        for surface in [&viz, &info, &opt_in] {
            assert_eq!(
                surface.log(),
                vec!["selected-entity=Q123", "data-entity-index=2"]
            );
        }
        // Root applied both: selected with occurrence wrapped by an
        // unknown count (treated as a single occurrence).
        assert!(matches!(root.selection(), Selection::Selected { .. }));

        bus.clear(ATTR_SELECTED_ENTITY);
        assert_eq!(root.selection(), Selection::Unselected);
        assert_eq!(
            viz.log().last().map(String::as_str),
            Some("clear selected-entity")
        );
    }

    #[test]
    fn root_scenario_with_known_counts() {
        let root = Arc::new(RootViewer::new());
        root.set_occurrence_counts(counts(&[("Q123", 4)]));

        let mut bus = PropagationBus::new();
        bus.set_root(root.clone());

        bus.propagate(&Attribute::SelectedEntity("Q123".to_string()));
        bus.propagate(&Attribute::EntityIndex(2));
        assert_eq!(
            root.selection(),
            Selection::Selected {
                entity_id: "Q123".to_string(),
                occurrence: 2,
            }
        );

        bus.clear(ATTR_SELECTED_ENTITY);
        assert_eq!(root.selection(), Selection::Unselected);
    }

    #[test]
    fn active_ids_round_trip_their_wire_format() {
        let attribute = Attribute::ActiveIds(vec!["12".to_string(), "15".to_string()]);
        assert_eq!(attribute.name(), ATTR_ACTIVE_IDS);
        assert_eq!(attribute.wire_value(), "12,15");
        assert_eq!(
            Attribute::parse_active_ids("12, 15,"),
            vec!["12".to_string(), "15".to_string()]
        );
    }
}
