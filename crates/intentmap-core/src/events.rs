use serde::{Deserialize, Serialize};

use crate::ids::SessionId;

/// Interaction event discriminator, serialized lowercase on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Pageview,
    Click,
    Scroll,
    Mousemove,
    Resize,
    Focus,
    Blur,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pageview => "pageview",
            Self::Click => "click",
            Self::Scroll => "scroll",
            Self::Mousemove => "mousemove",
            Self::Resize => "resize",
            Self::Focus => "focus",
            Self::Blur => "blur",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-specific payload fields, flattened into the event on the wire.
///
/// Each event type populates its own subset; absent fields are omitted from
/// the JSON entirely, so a pageview serializes with no detail keys at all.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventDetail {
    /// Pointer X in document coordinates (click, mousemove).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    /// Pointer Y in document coordinates (click, mousemove).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    /// Coarse target descriptor, e.g. a lowercase tag name (click).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Vertical scroll offset at event time (click, scroll, mousemove).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scroll_y: Option<f64>,
    /// Percentage of the scrollable document viewed, 0–100.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scroll_depth: Option<u8>,
}

impl EventDetail {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A normalized interaction event, immutable once created.
///
/// The wire format is flat camelCase JSON: base fields stamped by the event
/// factory plus the flattened [`EventDetail`] for the specific event type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub session_id: SessionId,
    pub event_type: EventType,
    pub page_url: String,
    pub pathname: String,
    /// Epoch milliseconds at creation time.
    pub timestamp: i64,
    pub referrer: Option<String>,
    pub viewport_width: u32,
    pub viewport_height: u32,
    #[serde(flatten)]
    pub detail: EventDetail,
}

/// One aggregated interaction point returned by the heatmap read path.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InteractionPoint {
    pub x: f64,
    pub y: f64,
    pub intensity: f64,
}

impl Default for InteractionPoint {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, intensity: 1.0 }
    }
}
