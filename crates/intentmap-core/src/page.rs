use serde::{Deserialize, Serialize};

/// Viewport dimensions in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Snapshot of the host page the collector is embedded in.
///
/// The host provides this at construction and keeps the mutable parts
/// (viewport, scroll offsets, document height) current by feeding resize and
/// scroll signals; the collector reads it when stamping events.
#[derive(Clone, Debug, PartialEq)]
pub struct PageContext {
    pub page_url: String,
    pub pathname: String,
    pub referrer: Option<String>,
    pub viewport: Viewport,
    /// Full scrollable height of the document in CSS pixels.
    pub document_height: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

impl PageContext {
    /// Build a context for a page URL; the pathname is derived from the URL.
    pub fn new(
        page_url: impl Into<String>,
        referrer: Option<String>,
        viewport: Viewport,
        document_height: f64,
    ) -> Self {
        let page_url = page_url.into();
        let pathname = pathname_of(&page_url);
        Self {
            page_url,
            pathname,
            referrer,
            viewport,
            document_height,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }

    /// Percentage of the scrollable document viewed, clamped to 0–100.
    ///
    /// When the document fits entirely in the viewport there is nothing to
    /// scroll and the whole document is visible: depth is 100.
    pub fn scroll_depth(&self) -> u8 {
        let scrollable = self.document_height - f64::from(self.viewport.height);
        if scrollable <= 0.0 {
            return 100;
        }
        let pct = (self.scroll_y / scrollable * 100.0).round();
        pct.clamp(0.0, 100.0) as u8
    }
}

/// Scheme + authority of a URL, the key for durable session storage.
///
/// Falls back to the whole input when it does not look like an absolute URL.
pub fn origin_of(url: &str) -> String {
    match url.split_once("://") {
        Some((scheme, rest)) => {
            let authority = rest.split(['/', '?', '#']).next().unwrap_or(rest);
            format!("{scheme}://{authority}")
        }
        None => url.to_string(),
    }
}

/// Path component of a URL, `/` when absent.
pub fn pathname_of(url: &str) -> String {
    let rest = match url.split_once("://") {
        Some((_, rest)) => rest,
        None => return "/".to_string(),
    };
    let without_query = rest.split(['?', '#']).next().unwrap_or(rest);
    match without_query.find('/') {
        Some(idx) => without_query[idx..].to_string(),
        None => "/".to_string(),
    }
}
