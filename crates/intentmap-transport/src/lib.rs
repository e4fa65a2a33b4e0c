//! # intentmap-transport
//!
//! Network delivery for event batches.
//!
//! [`DeliveryBatch`] owns the wire-shaping rule: one event goes to the
//! singular `/track` path as a bare object, two or more go to `/track/bulk`
//! wrapped as `{"events": [...]}`. [`Transport`] is the seam the pipeline
//! sends through; [`HttpTransport`] is the production implementation and
//! [`MockTransport`] the scripted test double.

#![deny(unsafe_code)]

pub mod delivery;
pub mod http;
pub mod mock;

pub use delivery::{DeliveryBatch, Transport};
pub use http::HttpTransport;
pub use mock::{MockOutcome, MockTransport};
