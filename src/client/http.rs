//! HTTP client creation and JSON fetches with bounded deadlines.

use std::time::Duration;

use serde_json::Value;
use tokio::time::timeout;
use tracing::debug;
use url::Url;

use crate::error::{ChronicleError, Result};
use crate::TARGET_WEB_REQUEST;

/// Create the client shared by the repository and knowledge boundaries.
pub fn create_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .gzip(true)
        .redirect(reqwest::redirect::Policy::default())
        .build()
        .map_err(ChronicleError::ClientBuild)
}

pub fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|_| ChronicleError::InvalidUrl(raw.to_string()))
}

/// Fetches a JSON resource. Non-success statuses become `Fetch` errors
/// carrying the numeric code; an elapsed deadline becomes `Timeout`.
/// There are no retries: a failure propagates to the caller that
/// requested the operation.
pub async fn fetch_json(client: &reqwest::Client, url: Url, limit: Duration) -> Result<Value> {
    debug!(target: TARGET_WEB_REQUEST, "GET {}", url);

    let response = timeout(limit, client.get(url.clone()).send())
        .await
        .map_err(|_| ChronicleError::Timeout {
            url: url.to_string(),
            limit,
        })?
        .map_err(|source| ChronicleError::Transport {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ChronicleError::Fetch {
            status: status.as_u16(),
            url: url.to_string(),
            message: status
                .canonical_reason()
                .unwrap_or("non-success status")
                .to_string(),
        });
    }

    timeout(limit, response.json::<Value>())
        .await
        .map_err(|_| ChronicleError::Timeout {
            url: url.to_string(),
            limit,
        })?
        .map_err(|source| ChronicleError::Transport {
            url: url.to_string(),
            source,
        })
}
