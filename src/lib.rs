//! # intentmap
//!
//! Client-side behavioral telemetry: feed raw interaction signals in, get
//! batched event delivery to an ingestion endpoint out.
//!
//! The host wires a [`Collector`] to its page, forwards clicks, scrolls,
//! pointer moves, resizes and visibility changes, and the collector handles
//! the rest: session identity (persisted per origin, 30-minute inactivity
//! expiry), normalization, size- and time-based flushing, and bounded
//! retry-by-requeue on delivery failure. Telemetry is best-effort by design —
//! failures are absorbed and logged, never surfaced to the host.
//!
//! ```no_run
//! use intentmap::{Collector, CollectorConfig, PageContext, Viewport};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = CollectorConfig {
//!         api_endpoint: "https://collect.example.com/api".into(),
//!         ..Default::default()
//!     };
//!     intentmap::init_logging(config.debug);
//!
//!     let page = PageContext::new(
//!         "https://example.com/pricing",
//!         Some("https://google.com/".into()),
//!         Viewport::new(1280, 720),
//!         2400.0,
//!     );
//!     let collector = Collector::new(config, page);
//!
//!     collector.record_click(140.0, 250.0, Some("button"));
//!     collector.record_scroll(0.0, 800.0);
//!
//!     // Drain in-flight deliveries before the process exits.
//!     collector.shutdown().await;
//! }
//! ```

#![deny(unsafe_code)]

pub use intentmap_collector::{init_logging, Collector};
pub use intentmap_core::{
    origin_of, pathname_of, CollectorConfig, DeliveryError, EventDetail, EventRecord, EventType,
    InteractionPoint, PageContext, SessionId, Viewport,
};
pub use intentmap_store::{
    MemoryStorage, SessionStorage, SessionStore, SqliteStorage, StorageError, SESSION_TTL,
};
pub use intentmap_transport::{DeliveryBatch, HttpTransport, MockTransport, Transport};
