use std::sync::Arc;

use parking_lot::RwLock;

use intentmap_core::{EventDetail, EventRecord, EventType, PageContext, Viewport};
use intentmap_store::SessionStore;

/// Builds normalized event records from raw signals plus session and page
/// context.
///
/// Creating an event touches the session (rewrites its `lastActivity`) and
/// mints one lazily on the first event. Base fields (url, pathname,
/// referrer, viewport, timestamp, session id) are stamped here; the typed
/// detail is the caller's, and the two occupy disjoint wire fields.
pub struct EventFactory {
    session: Arc<SessionStore>,
    page: RwLock<PageContext>,
}

impl EventFactory {
    pub fn new(session: Arc<SessionStore>, page: PageContext) -> Self {
        Self {
            session,
            page: RwLock::new(page),
        }
    }

    pub fn create(&self, event_type: EventType, detail: EventDetail) -> EventRecord {
        self.session.touch();
        let session_id = self.session.session_id();
        let page = self.page.read();
        EventRecord {
            session_id,
            event_type,
            page_url: page.page_url.clone(),
            pathname: page.pathname.clone(),
            timestamp: intentmap_core::now_millis(),
            referrer: page.referrer.clone(),
            viewport_width: page.viewport.width,
            viewport_height: page.viewport.height,
            detail,
        }
    }

    /// Snapshot of the current page context.
    pub fn page(&self) -> PageContext {
        self.page.read().clone()
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        self.page.write().viewport = viewport;
    }

    pub fn set_scroll(&self, scroll_x: f64, scroll_y: f64) {
        let mut page = self.page.write();
        page.scroll_x = scroll_x;
        page.scroll_y = scroll_y;
    }

    pub fn set_document_height(&self, document_height: f64) {
        self.page.write().document_height = document_height;
    }
}
