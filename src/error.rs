use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChronicleError>;

/// Everything that can go wrong while aggregating, indexing or resolving
/// transcript data. Transport and parse errors are never retried; they
/// surface to whoever requested the operation.
#[derive(Debug, Error)]
pub enum ChronicleError {
    /// The transport reported a non-success status.
    #[error("request to {url} failed with status {status}: {message}")]
    Fetch {
        status: u16,
        url: String,
        message: String,
    },

    /// The request never produced a usable response (connect, TLS, decode).
    #[error("transport failure for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The per-call deadline elapsed.
    #[error("request to {url} timed out after {limit:?}")]
    Timeout { url: String, limit: Duration },

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(reqwest::Error),

    #[error("invalid endpoint url: {0}")]
    InvalidUrl(String),

    /// A payload arrived with a shape we cannot decode.
    #[error("malformed payload from {url}: {message}")]
    Malformed { url: String, message: String },

    /// One or more ids in a concurrent fan-out failed while others
    /// succeeded. The successes are kept; callers decide whether to
    /// present a partial result or abort.
    #[error("{} document fetches failed in a concurrent batch", .failures.len())]
    BatchPartialFailure {
        failures: Vec<(String, String)>,
        succeeded: Vec<String>,
    },

    /// A date string could not be parsed and had no usable substring
    /// fallback.
    #[error("cannot derive a date from {raw:?}")]
    UnresolvableDate { raw: String },

    /// A batch lookup requested more identifiers than the service accepts.
    #[error("batch lookup accepts at most {max} ids, got {requested}")]
    IdLimitExceeded { requested: usize, max: usize },

    /// An aggregation pass was overtaken by a newer active-id change and
    /// its results were discarded.
    #[error("aggregation generation {generation} was superseded")]
    Superseded { generation: u64 },
}
