use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use intentmap_core::{CollectorConfig, EventRecord};
use intentmap_transport::{DeliveryBatch, Transport};

/// The event queue and flush scheduler.
///
/// Invariants:
/// - the queue is detached into a batch synchronously, under the lock,
///   before any send begins — events arriving during an in-flight request
///   start a fresh batch;
/// - a failed batch is re-inserted at the front of the queue, ahead of
///   anything enqueued since, unless that would push the queue past
///   `2 × batch_size`, in which case the batch is dropped;
/// - the idle-flush timer is logically cancelled (generation bump) whenever
///   a flush happens for any other reason. Timers are never aborted, so a
///   detached batch can never be cancelled mid-delivery.
#[derive(Clone)]
pub struct Pipeline {
    inner: Arc<Inner>,
}

struct Inner {
    transport: Arc<dyn Transport>,
    batch_size: usize,
    flush_interval: Duration,
    tracking_enabled: bool,
    active: AtomicBool,
    state: Mutex<State>,
    deliveries: TaskTracker,
}

#[derive(Default)]
struct State {
    pending: Vec<EventRecord>,
    timer_armed: bool,
    /// Bumped on every cancellation; a timer only fires if its generation
    /// is still current when it wakes.
    timer_generation: u64,
}

impl Pipeline {
    pub fn new(transport: Arc<dyn Transport>, config: &CollectorConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                batch_size: config.batch_size,
                flush_interval: Duration::from_millis(config.flush_interval_ms),
                tracking_enabled: config.tracking_enabled,
                active: AtomicBool::new(false),
                state: Mutex::new(State::default()),
                deliveries: TaskTracker::new(),
            }),
        }
    }

    /// Gate opened by `start()` and closed by `stop()`.
    pub fn set_active(&self, active: bool) {
        self.inner.active.store(active, Ordering::Release);
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.load(Ordering::Acquire)
    }

    pub fn pending_len(&self) -> usize {
        self.inner.state.lock().pending.len()
    }

    pub(crate) fn snapshot_pending(&self) -> Vec<EventRecord> {
        self.inner.state.lock().pending.clone()
    }

    /// Append an event. Flushes immediately once the queue reaches
    /// `batch_size`; otherwise arms the idle timer if none is armed.
    /// Dropped silently while tracking is disabled or stopped.
    pub fn enqueue(&self, event: EventRecord) {
        if !self.inner.tracking_enabled || !self.is_active() {
            return;
        }

        let batch = {
            let mut state = self.inner.state.lock();
            state.pending.push(event);
            debug!(pending = state.pending.len(), "event queued");

            if state.pending.len() >= self.inner.batch_size {
                Some(self.detach(&mut state))
            } else {
                if !state.timer_armed {
                    state.timer_armed = true;
                    self.spawn_timer(state.timer_generation);
                }
                None
            }
        };

        if let Some(batch) = batch {
            self.spawn_delivery(batch);
        }
    }

    /// Detach the entire queue into a batch and deliver it, awaiting the
    /// outcome (including any requeue). No-op when the queue is empty.
    pub async fn flush(&self) {
        let batch = {
            let mut state = self.inner.state.lock();
            if state.pending.is_empty() {
                return;
            }
            Some(self.detach(&mut state))
        };
        if let Some(batch) = batch {
            self.deliver(batch).await;
        }
    }

    /// Wait until every spawned delivery has completed. The teardown
    /// equivalent of the browser's unload-surviving request.
    pub async fn wait_idle(&self) {
        self.inner.deliveries.close();
        self.inner.deliveries.wait().await;
        self.inner.deliveries.reopen();
    }

    /// Take the queue contents and cancel the timer. Must run under the lock.
    fn detach(&self, state: &mut State) -> DeliveryBatch {
        state.timer_armed = false;
        state.timer_generation += 1;
        DeliveryBatch::new(std::mem::take(&mut state.pending))
    }

    fn spawn_timer(&self, generation: u64) {
        let pipeline = self.clone();
        let interval = self.inner.flush_interval;
        let _ = tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            pipeline.timer_fired(generation);
        });
    }

    fn timer_fired(&self, generation: u64) {
        let batch = {
            let mut state = self.inner.state.lock();
            if state.timer_generation != generation {
                return; // cancelled by a flush in the meantime
            }
            if state.pending.is_empty() {
                state.timer_armed = false;
                return;
            }
            self.detach(&mut state)
        };
        // Delivered through the tracker so teardown can drain it
        self.spawn_delivery(batch);
    }

    fn spawn_delivery(&self, batch: DeliveryBatch) {
        let pipeline = self.clone();
        let _ = self
            .inner
            .deliveries
            .spawn(async move { pipeline.deliver(batch).await });
    }

    async fn deliver(&self, batch: DeliveryBatch) {
        let len = batch.len();
        match self.inner.transport.deliver(&batch).await {
            Ok(()) => {
                debug!(events = len, "batch delivered");
            }
            Err(e) => {
                let mut state = self.inner.state.lock();
                if state.pending.len() + len <= self.inner.batch_size * 2 {
                    debug!(
                        error = %e,
                        kind = e.error_kind(),
                        events = len,
                        "delivery failed, requeueing batch"
                    );
                    let _ = state.pending.splice(0..0, batch.into_events());
                    // No re-flush here: the next size or timer trigger
                    // picks the requeued events up.
                } else {
                    warn!(
                        error = %e,
                        kind = e.error_kind(),
                        dropped = len,
                        "delivery failed and requeue bound exceeded, dropping batch"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intentmap_core::{EventDetail, EventType, SessionId};
    use intentmap_transport::{MockOutcome, MockTransport};

    fn config(batch_size: usize, flush_interval_ms: u64) -> CollectorConfig {
        CollectorConfig {
            batch_size,
            flush_interval_ms,
            ..Default::default()
        }
    }

    fn event(n: i64) -> EventRecord {
        EventRecord {
            session_id: SessionId::from_raw("sess_1_abcdefghi"),
            event_type: EventType::Click,
            page_url: "https://example.com/".into(),
            pathname: "/".into(),
            timestamp: n,
            referrer: None,
            viewport_width: 1280,
            viewport_height: 720,
            detail: EventDetail::default(),
        }
    }

    fn pipeline(
        batch_size: usize,
        flush_interval_ms: u64,
        script: Vec<MockOutcome>,
    ) -> (Pipeline, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new(script));
        let pipeline = Pipeline::new(transport.clone(), &config(batch_size, flush_interval_ms));
        pipeline.set_active(true);
        (pipeline, transport)
    }

    fn timestamps(events: &[EventRecord]) -> Vec<i64> {
        events.iter().map(|e| e.timestamp).collect()
    }

    #[tokio::test]
    async fn reaching_batch_size_flushes_immediately() {
        let (pipeline, transport) = pipeline(3, 60_000, vec![]);
        for n in 0..3 {
            pipeline.enqueue(event(n));
        }
        pipeline.wait_idle().await;

        assert_eq!(transport.call_count(), 1);
        assert_eq!(timestamps(&transport.batches()[0]), vec![0, 1, 2]);
        assert_eq!(pipeline.pending_len(), 0);
    }

    #[tokio::test]
    async fn below_threshold_flushes_on_timer() {
        let (pipeline, transport) = pipeline(10, 50, vec![]);
        pipeline.enqueue(event(1));
        assert_eq!(pipeline.pending_len(), 1);

        tokio::time::sleep(Duration::from_millis(90)).await;
        pipeline.wait_idle().await;

        assert_eq!(transport.call_count(), 1);
        assert_eq!(transport.batches()[0].len(), 1);
        assert_eq!(pipeline.pending_len(), 0);
    }

    #[tokio::test]
    async fn events_within_interval_share_one_timer_flush() {
        let (pipeline, transport) = pipeline(10, 60, vec![]);
        pipeline.enqueue(event(1));
        tokio::time::sleep(Duration::from_millis(15)).await;
        pipeline.enqueue(event(2));

        tokio::time::sleep(Duration::from_millis(100)).await;
        pipeline.wait_idle().await;

        assert_eq!(transport.call_count(), 1);
        assert_eq!(timestamps(&transport.batches()[0]), vec![1, 2]);
    }

    #[tokio::test]
    async fn manual_flush_cancels_timer() {
        let (pipeline, transport) = pipeline(10, 50, vec![]);
        pipeline.enqueue(event(1));
        pipeline.flush().await;

        assert_eq!(transport.call_count(), 1);

        // The armed timer must not fire a second, empty flush
        tokio::time::sleep(Duration::from_millis(90)).await;
        pipeline.wait_idle().await;
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn flush_on_empty_queue_is_noop() {
        let (pipeline, transport) = pipeline(10, 50, vec![]);
        pipeline.flush().await;
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn failed_batch_requeues_at_front_in_order() {
        let (pipeline, transport) = pipeline(10, 60_000, vec![MockOutcome::server_error()]);
        pipeline.enqueue(event(1));
        pipeline.enqueue(event(2));
        pipeline.flush().await;

        assert_eq!(transport.call_count(), 1);
        assert_eq!(timestamps(&pipeline.snapshot_pending()), vec![1, 2]);

        // Events enqueued after the failure land behind the requeued batch
        pipeline.enqueue(event(3));
        assert_eq!(timestamps(&pipeline.snapshot_pending()), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn inflight_send_does_not_block_new_events() {
        let (pipeline, transport) = pipeline(
            2,
            60_000,
            vec![MockOutcome::delayed_ok(Duration::from_millis(40))],
        );
        pipeline.enqueue(event(1));
        pipeline.enqueue(event(2)); // triggers the delayed in-flight send
        pipeline.enqueue(event(3)); // fresh batch while in flight

        assert_eq!(timestamps(&pipeline.snapshot_pending()), vec![3]);

        pipeline.wait_idle().await;
        assert_eq!(transport.call_count(), 1);
        assert_eq!(timestamps(&transport.batches()[0]), vec![1, 2]);
        assert_eq!(timestamps(&pipeline.snapshot_pending()), vec![3]);
    }

    #[tokio::test]
    async fn queue_never_exceeds_twice_batch_size() {
        // Every delivery fails; bound is 2 × 2 = 4
        let script = (0..8).map(|_| MockOutcome::server_error()).collect();
        let (pipeline, _transport) = pipeline(2, 60_000, script);

        for n in 0..10 {
            pipeline.enqueue(event(n));
            pipeline.wait_idle().await;
            assert!(
                pipeline.pending_len() <= 4,
                "bound violated at event {n}: {}",
                pipeline.pending_len()
            );
        }
    }

    #[tokio::test]
    async fn bound_exceeded_drops_failed_batch_keeps_newer() {
        let script = (0..4).map(|_| MockOutcome::server_error()).collect();
        let (pipeline, transport) = pipeline(2, 60_000, script);

        // 1,2 → fail → requeued. 3 crosses the threshold → 1,2,3 fail →
        // requeued (3 ≤ 4). 4 crosses → 1,2,3,4 fail → requeued (4 ≤ 4).
        for n in 1..=4 {
            pipeline.enqueue(event(n));
            pipeline.wait_idle().await;
        }
        assert_eq!(timestamps(&pipeline.snapshot_pending()), vec![1, 2, 3, 4]);
        assert_eq!(transport.call_count(), 3);

        // 5 crosses → 1..5 would requeue to length 5 > 4 → whole batch
        // dropped, keeping the queue empty for newer events.
        pipeline.enqueue(event(5));
        pipeline.wait_idle().await;
        assert_eq!(pipeline.pending_len(), 0);
        assert_eq!(transport.call_count(), 4);
    }

    #[tokio::test]
    async fn requeue_then_next_click_reflushes_everything() {
        // A failed bulk of 2 requeues; the next event re-crosses the
        // threshold and flushes all 3 together.
        let (pipeline, transport) = pipeline(2, 60_000, vec![MockOutcome::server_error()]);

        pipeline.enqueue(event(1));
        pipeline.enqueue(event(2));
        pipeline.wait_idle().await;
        assert_eq!(timestamps(&pipeline.snapshot_pending()), vec![1, 2]);

        pipeline.enqueue(event(3));
        pipeline.wait_idle().await;

        assert_eq!(transport.call_count(), 2);
        assert_eq!(timestamps(&transport.batches()[1]), vec![1, 2, 3]);
        assert_eq!(pipeline.pending_len(), 0);
    }

    #[tokio::test]
    async fn no_reflush_is_scheduled_after_requeue() {
        let (pipeline, transport) = pipeline(10, 50, vec![MockOutcome::server_error()]);
        pipeline.enqueue(event(1));
        pipeline.flush().await;
        assert_eq!(pipeline.pending_len(), 1);

        // Well past the flush interval: the requeue must not have armed
        // a timer on its own.
        tokio::time::sleep(Duration::from_millis(120)).await;
        pipeline.wait_idle().await;
        assert_eq!(transport.call_count(), 1);
        assert_eq!(pipeline.pending_len(), 1);

        // The next natural trigger picks the event up
        pipeline.enqueue(event(2));
        tokio::time::sleep(Duration::from_millis(90)).await;
        pipeline.wait_idle().await;
        assert_eq!(transport.call_count(), 2);
        assert_eq!(timestamps(&transport.batches()[1]), vec![1, 2]);
    }

    #[tokio::test]
    async fn inactive_pipeline_drops_events() {
        let (pipeline, transport) = pipeline(10, 50, vec![]);
        pipeline.set_active(false);
        pipeline.enqueue(event(1));
        assert_eq!(pipeline.pending_len(), 0);
        pipeline.flush().await;
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn tracking_disabled_drops_events() {
        let transport = Arc::new(MockTransport::healthy());
        let cfg = CollectorConfig {
            tracking_enabled: false,
            ..config(10, 50)
        };
        let pipeline = Pipeline::new(transport.clone(), &cfg);
        pipeline.set_active(true);

        pipeline.enqueue(event(1));
        assert_eq!(pipeline.pending_len(), 0);
    }
}
