//! Network boundaries: the content repository's read endpoints and the
//! external structured-knowledge batch lookup.

pub mod http;
pub mod knowledge;
pub mod repository;

pub use knowledge::KnowledgeClient;
pub use repository::RepositoryClient;

/// The knowledge service accepts at most this many identifiers per call.
pub const MAX_BATCH_IDS: usize = 50;
