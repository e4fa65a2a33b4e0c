//! # intentmap-collector
//!
//! The event batching and delivery pipeline, and the [`Collector`] lifecycle
//! controller that fronts it.
//!
//! Raw interaction signals flow in through `Collector::record_*`, are
//! filtered and throttled per configuration, normalized by the event
//! factory, buffered by the pipeline, and shipped in batches by the
//! transport. Delivery failures are absorbed by a bounded requeue; nothing
//! here returns an error to the host.

#![deny(unsafe_code)]

pub mod collector;
pub mod factory;
pub mod logging;
pub mod pipeline;
pub(crate) mod signals;

pub use collector::Collector;
pub use factory::EventFactory;
pub use logging::init_logging;
pub use pipeline::Pipeline;
