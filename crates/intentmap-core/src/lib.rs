//! # intentmap-core
//!
//! Leaf types for the intentmap collector: session identity, event records,
//! page context, configuration, and the delivery error taxonomy.
//!
//! Everything here serializes with camelCase field names to match the
//! ingestion endpoint's JSON wire format exactly.

#![deny(unsafe_code)]

pub mod config;
pub mod errors;
pub mod events;
pub mod ids;
pub mod page;

pub use config::CollectorConfig;
pub use errors::DeliveryError;
pub use events::{EventDetail, EventRecord, EventType, InteractionPoint};
pub use ids::SessionId;
pub use page::{origin_of, pathname_of, PageContext, Viewport};

/// Current time as epoch milliseconds — the wire timestamp unit.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
