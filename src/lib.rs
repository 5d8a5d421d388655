pub mod aggregator;
pub mod bus;
pub mod chronology;
pub mod client;
pub mod config;
pub mod dates;
pub mod engine;
pub mod error;
pub mod logging;
pub mod mentions;
pub mod model;

pub const TARGET_WEB_REQUEST: &str = "web_request";
pub const TARGET_KNOWLEDGE: &str = "knowledge";
pub const TARGET_AGGREGATE: &str = "aggregate";
pub const TARGET_BUS: &str = "bus";

pub use engine::ChronicleEngine;
pub use error::{ChronicleError, Result};
