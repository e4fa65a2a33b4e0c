use serde::{Deserialize, Serialize};

pub const DEFAULT_API_ENDPOINT: &str = "http://localhost:3000/api";
pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 5000;
pub const DEFAULT_THROTTLE_MOUSEMOVE: f64 = 0.05;
pub const DEFAULT_SCROLL_DEBOUNCE_MS: u64 = 100;

/// Collector configuration.
///
/// Field names are camelCase on the wire and every field has a production
/// default, so partial JSON deserializes cleanly — missing fields fall back
/// to their defaults. Out-of-domain values never error; they are normalized
/// back to defaults by [`CollectorConfig::normalized`] at construction.
///
/// ```json
/// { "apiEndpoint": "https://collect.example.com/api", "batchSize": 25 }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CollectorConfig {
    /// Base URL of the ingestion API. Trailing slashes are trimmed.
    pub api_endpoint: String,
    /// Master switch — when false, no event is ever queued.
    pub tracking_enabled: bool,
    /// Queue length that triggers an immediate flush.
    pub batch_size: usize,
    /// Idle flush timer in milliseconds.
    pub flush_interval_ms: u64,
    pub track_clicks: bool,
    pub track_scrolls: bool,
    pub track_mousemove: bool,
    /// Fraction of raw pointer-move signals to keep (count-based sampling).
    pub throttle_mousemove: f64,
    /// Quiet period before a scroll burst emits one event, in milliseconds.
    pub scroll_debounce_ms: u64,
    /// Raises the default level used by the logging initializer.
    pub debug: bool,
    /// Start tracking immediately on construction.
    pub auto_init: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            tracking_enabled: true,
            batch_size: DEFAULT_BATCH_SIZE,
            flush_interval_ms: DEFAULT_FLUSH_INTERVAL_MS,
            track_clicks: true,
            track_scrolls: true,
            track_mousemove: false,
            throttle_mousemove: DEFAULT_THROTTLE_MOUSEMOVE,
            scroll_debounce_ms: DEFAULT_SCROLL_DEBOUNCE_MS,
            debug: false,
            auto_init: true,
        }
    }
}

impl CollectorConfig {
    /// Replace out-of-domain values with defaults and trim the endpoint.
    ///
    /// A zero batch size or flush interval, an empty endpoint, or a sampling
    /// fraction outside `(0, 1]` would stall or break the pipeline; each is
    /// silently reset instead of surfacing an error to the host.
    pub fn normalized(mut self) -> Self {
        while self.api_endpoint.ends_with('/') {
            self.api_endpoint.pop();
        }
        if self.api_endpoint.is_empty() {
            self.api_endpoint = DEFAULT_API_ENDPOINT.to_string();
        }
        if self.batch_size == 0 {
            self.batch_size = DEFAULT_BATCH_SIZE;
        }
        if self.flush_interval_ms == 0 {
            self.flush_interval_ms = DEFAULT_FLUSH_INTERVAL_MS;
        }
        if !(self.throttle_mousemove > 0.0 && self.throttle_mousemove <= 1.0) {
            self.throttle_mousemove = DEFAULT_THROTTLE_MOUSEMOVE;
        }
        if self.scroll_debounce_ms == 0 {
            self.scroll_debounce_ms = DEFAULT_SCROLL_DEBOUNCE_MS;
        }
        self
    }

    /// Raw pointer-move signals per kept event: `round(1 / throttle)`.
    pub fn mousemove_sample_every(&self) -> u32 {
        let every = (1.0 / self.throttle_mousemove).round() as u32;
        every.max(1)
    }
}
