//! Batched claim lookup against the external structured-knowledge
//! service (wbgetentities-compatible).
//!
//! The service accepts at most [`MAX_BATCH_IDS`] identifiers per call.
//! The cap is an enforced contract: depending on policy an oversized
//! request is either split into capped chunks or rejected, never
//! silently truncated.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;
use tracing::warn;

use super::http::{create_http_client, fetch_json, parse_url};
use super::MAX_BATCH_IDS;
use crate::config::{BatchPolicy, EngineConfig};
use crate::error::{ChronicleError, Result};
use crate::TARGET_KNOWLEDGE;

const QUERY_BASE: &str = "action=wbgetentities&format=json&languages=en&sitefilter=enwiki&origin=*";

#[derive(Debug, Clone)]
pub struct KnowledgeClient {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
    policy: BatchPolicy,
}

impl KnowledgeClient {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        Ok(Self {
            client: create_http_client()?,
            endpoint: config.knowledge_url.trim_end_matches('/').to_string(),
            timeout: config.request_timeout,
            policy: config.batch_policy,
        })
    }

    /// Splits an id list into cap-respecting chunks, or rejects it,
    /// per policy.
    pub fn plan_batches(ids: &[String], policy: BatchPolicy) -> Result<Vec<Vec<String>>> {
        if ids.len() > MAX_BATCH_IDS {
            match policy {
                BatchPolicy::Reject => {
                    return Err(ChronicleError::IdLimitExceeded {
                        requested: ids.len(),
                        max: MAX_BATCH_IDS,
                    });
                }
                BatchPolicy::Split => {
                    warn!(
                        target: TARGET_KNOWLEDGE,
                        "splitting {} ids into {} capped batches",
                        ids.len(),
                        ids.len().div_ceil(MAX_BATCH_IDS)
                    );
                }
            }
        }
        Ok(ids.chunks(MAX_BATCH_IDS).map(<[String]>::to_vec).collect())
    }

    /// Retrieves the claims structure for each id, merged across as many
    /// calls as the cap requires. Ids the service does not know are
    /// simply absent from the result.
    pub async fn fetch_claims(
        &self,
        ids: &[String],
        props: &[&str],
    ) -> Result<HashMap<String, Value>> {
        let mut merged = HashMap::new();
        if ids.is_empty() {
            return Ok(merged);
        }

        for batch in Self::plan_batches(ids, self.policy)? {
            let url = parse_url(&format!(
                "{}?{}&props={}&ids={}",
                self.endpoint,
                QUERY_BASE,
                props.join("|"),
                batch.join("|"),
            ))?;
            let value = fetch_json(&self.client, url, self.timeout).await?;

            if let Some(entities) = value.get("entities").and_then(Value::as_object) {
                for (id, entity) in entities {
                    if let Some(claims) = entity.get("claims") {
                        merged.insert(id.clone(), claims.clone());
                    }
                }
            }
        }

        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("Q{i}")).collect()
    }

    #[test]
    fn oversized_batch_is_rejected_under_reject_policy() {
        let result = KnowledgeClient::plan_batches(&ids(51), BatchPolicy::Reject);
        assert!(matches!(
            result,
            Err(ChronicleError::IdLimitExceeded {
                requested: 51,
                max: MAX_BATCH_IDS
            })
        ));
    }

    #[test]
    fn oversized_batch_splits_without_dropping_ids() {
        let batches = KnowledgeClient::plan_batches(&ids(51), BatchPolicy::Split).unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].len(), 50);
        assert_eq!(batches[1], vec!["Q50".to_string()]);
    }

    #[test]
    fn capped_batch_stays_whole_under_either_policy() {
        for policy in [BatchPolicy::Split, BatchPolicy::Reject] {
            let batches = KnowledgeClient::plan_batches(&ids(50), policy).unwrap();
            assert_eq!(batches.len(), 1);
            assert_eq!(batches[0].len(), 50);
        }
    }
}
