use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use intentmap_core::{DeliveryError, EventRecord};

use crate::delivery::{DeliveryBatch, Transport};

/// Pre-programmed delivery outcomes for deterministic pipeline tests.
pub enum MockOutcome {
    Ok,
    Err(DeliveryError),
    /// Wait a duration, then resolve to the inner outcome.
    Delay(Duration, Box<MockOutcome>),
}

impl MockOutcome {
    pub fn server_error() -> Self {
        Self::Err(DeliveryError::Status { status: 500, body: "internal".into() })
    }

    pub fn network_error() -> Self {
        Self::Err(DeliveryError::Network("connection refused".into()))
    }

    pub fn delayed_ok(delay: Duration) -> Self {
        Self::Delay(delay, Box::new(Self::Ok))
    }
}

/// Transport double that consumes scripted outcomes in order and records
/// every batch it is handed. Once the script runs dry, deliveries succeed.
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<MockOutcome>>,
    delivered: Mutex<Vec<Vec<EventRecord>>>,
    calls: AtomicUsize,
}

impl MockTransport {
    pub fn new(script: Vec<MockOutcome>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            delivered: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// A transport where every delivery succeeds.
    pub fn healthy() -> Self {
        Self::new(Vec::new())
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// Every batch handed to `deliver`, in call order, including failed ones.
    pub fn batches(&self) -> Vec<Vec<EventRecord>> {
        self.delivered.lock().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn deliver(&self, batch: &DeliveryBatch) -> Result<(), DeliveryError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.delivered.lock().push(batch.events().to_vec());

        let mut outcome = match self.script.lock().pop_front() {
            Some(outcome) => outcome,
            None => return Ok(()),
        };

        loop {
            match outcome {
                MockOutcome::Ok => return Ok(()),
                MockOutcome::Err(e) => return Err(e),
                MockOutcome::Delay(duration, inner) => {
                    tokio::time::sleep(duration).await;
                    outcome = *inner;
                }
            }
        }
    }
}
