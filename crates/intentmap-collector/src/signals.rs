use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Trailing-edge debouncer: the action runs once the signal has been quiet
/// for the configured delay. Each poke supersedes the previous one via a
/// generation counter, so bursts collapse to a single trailing run.
pub(crate) struct Debouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Must be called within a tokio runtime context.
    pub fn poke<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let my_generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let generation = Arc::clone(&self.generation);
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if generation.load(Ordering::Acquire) == my_generation {
                action();
            }
        });
    }
}

/// Count-based sampler: admits every Nth call. The rate is a fraction of
/// signal occurrences, not of wall-clock time.
pub(crate) struct Sampler {
    every: u32,
    count: AtomicU32,
}

impl Sampler {
    pub fn new(every: u32) -> Self {
        Self {
            every: every.max(1),
            count: AtomicU32::new(0),
        }
    }

    pub fn admit(&self) -> bool {
        let n = self.count.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        n % self.every == 0
    }
}
