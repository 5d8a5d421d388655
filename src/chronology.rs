//! Chronological metadata for event entities, sourced from the external
//! knowledge service.
//!
//! Each entity's claims structure may carry a start date, an end date
//! and a point-in-time in three distinct property slots; any or all may
//! be absent. Sortable endpoints fall back to the point-in-time, and an
//! entity with none of the three is unorderable: its sort fields stay
//! `None` and chronological views exclude it rather than crash.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::client::KnowledgeClient;
use crate::error::Result;
use crate::TARGET_KNOWLEDGE;

/// Claim slot for the start of a range.
pub const PROP_START_DATE: &str = "P580";
/// Claim slot for the end of a range.
pub const PROP_END_DATE: &str = "P582";
/// Claim slot for a single point-in-time.
pub const PROP_POINT_IN_TIME: &str = "P585";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChronologyRecord {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub point_in_time: Option<String>,
    pub sort_date_start: Option<String>,
    pub sort_date_end: Option<String>,
}

impl ChronologyRecord {
    /// An entity with no usable claim cannot be placed on a timeline.
    pub fn is_orderable(&self) -> bool {
        self.sort_date_start.is_some() || self.sort_date_end.is_some()
    }
}

fn claim_time(claims: &Value, property: &str) -> Option<String> {
    claims
        .get(property)?
        .get(0)?
        .pointer("/mainsnak/datavalue/value/time")?
        .as_str()
        .map(str::to_string)
}

/// Derives the sortable endpoints: start/end, each falling back to the
/// point-in-time when absent. Idempotent over the same raw claims.
pub fn derive_sort_dates(record: &mut ChronologyRecord) {
    record.sort_date_start = record
        .start_date
        .clone()
        .or_else(|| record.point_in_time.clone());
    record.sort_date_end = record
        .end_date
        .clone()
        .or_else(|| record.point_in_time.clone());
}

/// Builds a record from one entity's claims structure.
pub fn claims_to_record(claims: &Value) -> ChronologyRecord {
    let mut record = ChronologyRecord {
        start_date: claim_time(claims, PROP_START_DATE),
        end_date: claim_time(claims, PROP_END_DATE),
        point_in_time: claim_time(claims, PROP_POINT_IN_TIME),
        ..ChronologyRecord::default()
    };
    derive_sort_dates(&mut record);
    record
}

pub struct EventDateResolver {
    knowledge: KnowledgeClient,
}

impl EventDateResolver {
    pub fn new(knowledge: KnowledgeClient) -> Self {
        Self { knowledge }
    }

    /// Resolves chronology records for the given event entity ids,
    /// batching knowledge-service calls under the id cap.
    pub async fn resolve_event_dates(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, ChronologyRecord>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let claims = self.knowledge.fetch_claims(ids, &["claims"]).await?;
        debug!(
            target: TARGET_KNOWLEDGE,
            "resolved claims for {} of {} event ids",
            claims.len(),
            ids.len()
        );

        Ok(claims
            .iter()
            .map(|(id, entity_claims)| (id.clone(), claims_to_record(entity_claims)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claim(time: &str) -> Value {
        json!([{ "mainsnak": { "datavalue": { "value": { "time": time } } } }])
    }

    #[test]
    fn point_in_time_fills_both_sort_endpoints() {
        let claims = json!({ PROP_POINT_IN_TIME: claim("1944-06-06") });
        let record = claims_to_record(&claims);

        assert_eq!(record.point_in_time.as_deref(), Some("1944-06-06"));
        assert_eq!(record.sort_date_start.as_deref(), Some("1944-06-06"));
        assert_eq!(record.sort_date_end.as_deref(), Some("1944-06-06"));
        assert!(record.is_orderable());
    }

    #[test]
    fn explicit_range_beats_point_in_time() {
        let claims = json!({
            PROP_START_DATE: claim("+1939-09-01T00:00:00Z"),
            PROP_END_DATE: claim("+1945-09-02T00:00:00Z"),
            PROP_POINT_IN_TIME: claim("+1941-12-07T00:00:00Z"),
        });
        let record = claims_to_record(&claims);

        assert_eq!(record.sort_date_start.as_deref(), Some("+1939-09-01T00:00:00Z"));
        assert_eq!(record.sort_date_end.as_deref(), Some("+1945-09-02T00:00:00Z"));
    }

    #[test]
    fn absent_claims_leave_the_record_unorderable() {
        let record = claims_to_record(&json!({}));
        assert_eq!(record.sort_date_start, None);
        assert_eq!(record.sort_date_end, None);
        assert!(!record.is_orderable());
    }

    #[test]
    fn derivation_is_idempotent() {
        let claims = json!({
            PROP_START_DATE: claim("1950-06-25"),
            PROP_POINT_IN_TIME: claim("1950-06-25"),
        });
        let mut record = claims_to_record(&claims);
        let first = record.clone();
        derive_sort_dates(&mut record);
        assert_eq!(record, first);
    }

    #[test]
    fn malformed_claim_shapes_are_tolerated() {
        let claims = json!({ PROP_START_DATE: [{ "mainsnak": {} }] });
        let record = claims_to_record(&claims);
        assert_eq!(record.start_date, None);
        assert!(!record.is_orderable());
    }
}
