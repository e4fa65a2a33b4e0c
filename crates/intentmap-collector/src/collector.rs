use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use intentmap_core::{
    origin_of, CollectorConfig, EventDetail, EventType, PageContext, SessionId, Viewport,
};
use intentmap_store::{MemoryStorage, SessionStorage, SessionStore, SqliteStorage};
use intentmap_transport::{HttpTransport, Transport};

use crate::factory::EventFactory;
use crate::pipeline::Pipeline;
use crate::signals::{Debouncer, Sampler};

/// The lifecycle controller and signal intake.
///
/// One collector instance tracks one page. `record_*` methods are the Rust
/// rendition of DOM listener attachment: each checks the lifecycle state and
/// its per-signal enable flag, applies the signal's throttling policy, and
/// feeds the factory → pipeline path. All of them, plus `start`, must be
/// called within a tokio runtime context.
///
/// Delivery is best-effort: call [`shutdown`](Self::shutdown) at teardown to
/// drain in-flight requests, or accept that whatever is still in flight when
/// the process exits may be lost.
pub struct Collector {
    config: CollectorConfig,
    session: Arc<SessionStore>,
    factory: Arc<EventFactory>,
    pipeline: Pipeline,
    tracking: AtomicBool,
    scroll_debounce: Debouncer,
    move_sampler: Sampler,
}

impl Collector {
    /// Production wiring: HTTP transport against `config.api_endpoint`,
    /// session storage in `~/.intentmap/storage.db`. A storage that cannot
    /// be opened degrades to in-memory with a warning — tracking proceeds,
    /// sessions just stop surviving the process.
    pub fn new(config: CollectorConfig, page: PageContext) -> Self {
        let config = config.normalized();
        let transport: Arc<dyn Transport> =
            Arc::new(HttpTransport::new(config.api_endpoint.clone()));
        let storage: Arc<dyn SessionStorage> = match SqliteStorage::open(&default_storage_path()) {
            Ok(storage) => Arc::new(storage),
            Err(e) => {
                warn!(error = %e, "session storage unavailable, falling back to in-memory");
                Arc::new(MemoryStorage::new())
            }
        };
        Self::with_parts(config, page, transport, storage)
    }

    /// Explicit wiring, used by tests and by hosts that bring their own
    /// transport or storage.
    pub fn with_parts(
        config: CollectorConfig,
        page: PageContext,
        transport: Arc<dyn Transport>,
        storage: Arc<dyn SessionStorage>,
    ) -> Self {
        let config = config.normalized();
        let session = Arc::new(SessionStore::new(storage, origin_of(&page.page_url)));
        let factory = Arc::new(EventFactory::new(session.clone(), page));
        let pipeline = Pipeline::new(transport, &config);
        let collector = Self {
            scroll_debounce: Debouncer::new(Duration::from_millis(config.scroll_debounce_ms)),
            move_sampler: Sampler::new(config.mousemove_sample_every()),
            session,
            factory,
            pipeline,
            tracking: AtomicBool::new(false),
            config,
        };
        if collector.config.auto_init {
            collector.start();
        }
        collector
    }

    /// Begin tracking: resume or mint the session and record a pageview.
    /// Idempotent — a second call while tracking is a no-op.
    pub fn start(&self) {
        if self.tracking.swap(true, Ordering::SeqCst) {
            return;
        }
        self.pipeline.set_active(true);

        let session_id = self.session.session_id();
        debug!(session_id = %session_id, "tracking started");

        self.pipeline
            .enqueue(self.factory.create(EventType::Pageview, EventDetail::default()));
    }

    /// Stop tracking and flush whatever is pending. Idempotent. Events
    /// recorded after this are dropped until `start` is called again.
    pub async fn stop(&self) {
        if !self.tracking.swap(false, Ordering::SeqCst) {
            return;
        }
        self.pipeline.set_active(false);
        self.pipeline.flush().await;
        debug!("tracking stopped");
    }

    /// Stop, then wait for every in-flight delivery to finish. The teardown
    /// contract: hosts that skip this get best-effort-only delivery.
    pub async fn shutdown(&self) {
        self.stop().await;
        self.pipeline.wait_idle().await;
    }

    /// Detach and deliver everything currently queued.
    pub async fn flush(&self) {
        self.pipeline.flush().await;
    }

    /// The current session id, minting one if needed.
    pub fn session_id(&self) -> SessionId {
        self.session.session_id()
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// A click at viewport coordinates. Recorded in document coordinates
    /// (client position + current scroll offsets), with a coarse target
    /// descriptor and the scroll depth at click time.
    pub fn record_click(&self, client_x: f64, client_y: f64, target: Option<&str>) {
        if !self.is_tracking() || !self.config.track_clicks {
            return;
        }
        let page = self.factory.page();
        let detail = EventDetail {
            x: Some(client_x + page.scroll_x),
            y: Some(client_y + page.scroll_y),
            target: target.map(|t| t.to_ascii_lowercase()),
            scroll_y: Some(page.scroll_y),
            scroll_depth: Some(page.scroll_depth()),
        };
        self.pipeline.enqueue(self.factory.create(EventType::Click, detail));
    }

    /// A raw scroll tick. The scroll position is always absorbed into the
    /// page context; the scroll *event* is debounced and fires only after
    /// `scroll_debounce_ms` of quiet.
    pub fn record_scroll(&self, scroll_x: f64, scroll_y: f64) {
        self.factory.set_scroll(scroll_x, scroll_y);
        if !self.is_tracking() || !self.config.track_scrolls {
            return;
        }
        let factory = Arc::clone(&self.factory);
        let pipeline = self.pipeline.clone();
        self.scroll_debounce.poke(move || {
            let page = factory.page();
            let detail = EventDetail {
                scroll_y: Some(page.scroll_y),
                scroll_depth: Some(page.scroll_depth()),
                ..Default::default()
            };
            pipeline.enqueue(factory.create(EventType::Scroll, detail));
        });
    }

    /// A raw pointer movement, count-sampled at `throttle_mousemove`.
    pub fn record_pointer_move(&self, client_x: f64, client_y: f64) {
        if !self.is_tracking() || !self.config.track_mousemove {
            return;
        }
        if !self.move_sampler.admit() {
            return;
        }
        let page = self.factory.page();
        let detail = EventDetail {
            x: Some(client_x + page.scroll_x),
            y: Some(client_y + page.scroll_y),
            scroll_y: Some(page.scroll_y),
            scroll_depth: Some(page.scroll_depth()),
            ..Default::default()
        };
        self.pipeline
            .enqueue(self.factory.create(EventType::Mousemove, detail));
    }

    /// A viewport resize: immediate, no debounce. The new dimensions are
    /// absorbed into the page context either way.
    pub fn record_resize(&self, width: u32, height: u32) {
        self.factory.set_viewport(Viewport::new(width, height));
        if !self.is_tracking() {
            return;
        }
        self.pipeline
            .enqueue(self.factory.create(EventType::Resize, EventDetail::default()));
    }

    /// A page visibility change: `focus` when becoming visible, `blur` when
    /// hidden.
    pub fn record_visibility(&self, visible: bool) {
        if !self.is_tracking() {
            return;
        }
        let event_type = if visible { EventType::Focus } else { EventType::Blur };
        self.pipeline
            .enqueue(self.factory.create(event_type, EventDetail::default()));
    }

    /// The host can keep the document height current as content loads.
    pub fn set_document_height(&self, document_height: f64) {
        self.factory.set_document_height(document_height);
    }
}

fn default_storage_path() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
        .join(".intentmap")
        .join("storage.db")
}
