//! Core data model: documents (transcripts) and the entities mentioned in
//! them. Entities are immutable snapshots of the repository's
//! associated-entities listings; identity is by id, or by the literal
//! `when` value for date entities that lack a stable id.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Entity type enumeration. Mirrors the fixed set of per-type listings
/// the repository exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Event,
    Person,
    Place,
    Organization,
    Date,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Event,
        EntityKind::Person,
        EntityKind::Place,
        EntityKind::Organization,
        EntityKind::Date,
    ];

    /// Path segment used by the repository's per-type listing endpoint.
    pub fn wire_tag(&self) -> &'static str {
        match self {
            EntityKind::Event => "events",
            EntityKind::Person => "persons",
            EntityKind::Place => "places",
            EntityKind::Organization => "organizations",
            EntityKind::Date => "dates",
        }
    }

    /// Parses either the plural wire tag or the singular `resource_type`
    /// value carried on entity records.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "event" | "events" => Some(EntityKind::Event),
            "person" | "persons" => Some(EntityKind::Person),
            "place" | "places" => Some(EntityKind::Place),
            "organization" | "organizations" => Some(EntityKind::Organization),
            "date" | "dates" => Some(EntityKind::Date),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Event => write!(f, "event"),
            EntityKind::Person => write!(f, "person"),
            EntityKind::Place => write!(f, "place"),
            EntityKind::Organization => write!(f, "organization"),
            EntityKind::Date => write!(f, "date"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// A mentionable item within a document. Each variant carries only the
/// fields its kind needs: only places have coordinates, only dates carry
/// a literal `when` value (and may lack a stable id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Entity {
    Event {
        id: String,
        title: String,
    },
    Person {
        id: String,
        title: String,
    },
    Place {
        id: String,
        title: String,
        location: Option<GeoPoint>,
    },
    Organization {
        id: String,
        title: String,
    },
    Date {
        id: Option<String>,
        when: String,
    },
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Event { .. } => EntityKind::Event,
            Entity::Person { .. } => EntityKind::Person,
            Entity::Place { .. } => EntityKind::Place,
            Entity::Organization { .. } => EntityKind::Organization,
            Entity::Date { .. } => EntityKind::Date,
        }
    }

    /// The key mentions are counted and deduplicated by: the entity id,
    /// or the literal date value for dates without one.
    pub fn mention_key(&self) -> &str {
        match self {
            Entity::Event { id, .. }
            | Entity::Person { id, .. }
            | Entity::Place { id, .. }
            | Entity::Organization { id, .. } => id,
            Entity::Date { id, when } => id.as_deref().unwrap_or(when),
        }
    }

    /// Display title; dates display their literal value.
    pub fn title(&self) -> &str {
        match self {
            Entity::Event { title, .. }
            | Entity::Person { title, .. }
            | Entity::Place { title, .. }
            | Entity::Organization { title, .. } => title,
            Entity::Date { when, .. } => when,
        }
    }

    pub fn location(&self) -> Option<GeoPoint> {
        match self {
            Entity::Place { location, .. } => *location,
            _ => None,
        }
    }
}

/// Raw entity record as returned by `items/{id}/{kind}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEntity {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub when: Option<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

impl RawEntity {
    /// Resolves a raw record fetched from the listing of `kind`.
    ///
    /// Records without a title but with a `when` value are date literals
    /// regardless of the listing they arrived in. Records with neither a
    /// usable title nor a date are dropped.
    pub fn into_entity(self, kind: EntityKind) -> Option<Entity> {
        let kind = self
            .resource_type
            .as_deref()
            .and_then(EntityKind::parse)
            .unwrap_or(kind);

        if self.title.is_none() || kind == EntityKind::Date {
            let when = self.when?;
            return Some(Entity::Date { id: self.id, when });
        }

        let id = self.id?;
        let title = self.title?;
        Some(match kind {
            EntityKind::Event => Entity::Event { id, title },
            EntityKind::Person => Entity::Person { id, title },
            EntityKind::Place => Entity::Place {
                id,
                title,
                location: match (self.lat, self.lng) {
                    (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
                    _ => None,
                },
            },
            EntityKind::Organization => Entity::Organization { id, title },
            EntityKind::Date => unreachable!("dates resolved above"),
        })
    }
}

/// Base document record as returned by `items/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDocument {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub tei_uri: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
}

/// One transcript with its entity slate and its assigned display colors.
/// Created when a document id becomes active, dropped when it no longer
/// is; nothing here is persisted.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub transcript: String,
    pub tei_uri: Option<String>,
    pub uri: Option<String>,
    pub entities: BTreeMap<EntityKind, Vec<Entity>>,
    pub display_color: String,
    pub display_border_color: String,
}

impl Document {
    /// Flat lookup table over the document's resolved entities, keyed by
    /// mention key. Later duplicates of a key win, matching the order the
    /// slate listings are applied in.
    pub fn mentioned_entities(&self) -> HashMap<&str, &Entity> {
        let mut table = HashMap::new();
        for entities in self.entities.values() {
            for entity in entities {
                table.insert(entity.mention_key(), entity);
            }
        }
        table
    }

    /// Ids of all event entities in this document, for chronology lookup.
    pub fn event_ids(&self) -> Vec<String> {
        self.entities
            .get(&EntityKind::Event)
            .map(|events| {
                events
                    .iter()
                    .map(|entity| entity.mention_key().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }
}
