//! Read access to the content repository: document base records and
//! per-kind associated-entity listings.

use std::time::Duration;

use serde_json::Value;

use super::http::{create_http_client, fetch_json, parse_url};
use crate::config::EngineConfig;
use crate::error::{ChronicleError, Result};
use crate::model::{EntityKind, RawDocument, RawEntity};

#[derive(Debug, Clone)]
pub struct RepositoryClient {
    client: reqwest::Client,
    api_base: String,
    timeout: Duration,
}

impl RepositoryClient {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let api_base = format!(
            "{}/ddhi-api",
            config.repository_url.trim_end_matches('/')
        );
        Ok(Self {
            client: create_http_client()?,
            api_base,
            timeout: config.request_timeout,
        })
    }

    async fn fetch_resource(&self, path: &str) -> Result<Value> {
        let url = parse_url(&format!("{}/{}?_format=json", self.api_base, path))?;
        fetch_json(&self.client, url, self.timeout).await
    }

    /// Fetches the base record for one document id.
    pub async fn fetch_item(&self, id: &str) -> Result<RawDocument> {
        let value = self.fetch_resource(&format!("items/{id}")).await?;
        serde_json::from_value(value).map_err(|err| ChronicleError::Malformed {
            url: format!("{}/items/{id}", self.api_base),
            message: err.to_string(),
        })
    }

    /// Fetches all entities of one kind associated with a document.
    pub async fn fetch_item_entities(
        &self,
        id: &str,
        kind: EntityKind,
    ) -> Result<Vec<RawEntity>> {
        let path = format!("items/{id}/{}", kind.wire_tag());
        let value = self.fetch_resource(&path).await?;
        serde_json::from_value(value).map_err(|err| ChronicleError::Malformed {
            url: format!("{}/{path}", self.api_base),
            message: err.to_string(),
        })
    }
}
