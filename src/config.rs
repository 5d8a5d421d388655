//! Engine configuration: the two network boundaries, the per-call
//! deadline, the batch-cap policy and the date-correction table.

use std::env;
use std::time::Duration;

use crate::dates::{default_corrections, DateCorrection};

pub const REPOSITORY_URL_ENV: &str = "CHRONICLE_REPOSITORY_URL";
pub const KNOWLEDGE_URL_ENV: &str = "CHRONICLE_KNOWLEDGE_URL";

/// Default knowledge-service endpoint (wbgetentities-compatible).
pub const DEFAULT_KNOWLEDGE_URL: &str = "https://www.wikidata.org/w/api.php";

/// Every external call is bounded by this deadline unless configured
/// otherwise; a hung call must never stall an aggregation batch forever.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// What to do when a batch lookup exceeds the service's id cap: split it
/// into capped chunks, or reject the call outright. Either way no id is
/// silently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPolicy {
    Split,
    Reject,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Base URL of the content repository (the `/items/...` endpoints
    /// live under `{repository_url}/ddhi-api`).
    pub repository_url: String,
    /// Base URL of the external structured-knowledge service.
    pub knowledge_url: String,
    pub request_timeout: Duration,
    pub batch_policy: BatchPolicy,
    pub date_corrections: Vec<DateCorrection>,
}

impl EngineConfig {
    pub fn new(repository_url: impl Into<String>) -> Self {
        Self {
            repository_url: repository_url.into(),
            knowledge_url: DEFAULT_KNOWLEDGE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            batch_policy: BatchPolicy::Split,
            date_corrections: default_corrections(),
        }
    }

    /// Builds a configuration from the environment, with defaults for
    /// everything but the repository URL.
    pub fn from_env() -> Self {
        let repository_url = env::var(REPOSITORY_URL_ENV).unwrap_or_default();
        let mut config = Self::new(repository_url);
        if let Ok(knowledge_url) = env::var(KNOWLEDGE_URL_ENV) {
            if !knowledge_url.trim().is_empty() {
                config.knowledge_url = knowledge_url;
            }
        }
        config
    }

    pub fn with_batch_policy(mut self, batch_policy: BatchPolicy) -> Self {
        self.batch_policy = batch_policy;
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn with_date_corrections(mut self, date_corrections: Vec<DateCorrection>) -> Self {
        self.date_corrections = date_corrections;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_the_known_correction() {
        let config = EngineConfig::new("https://repo.example.org");
        assert_eq!(config.batch_policy, BatchPolicy::Split);
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(config.date_corrections.len(), 1);
        assert!(config.date_corrections[0].applies_to("Korean War"));
    }
}
