/// Delivery failure taxonomy.
///
/// Every variant is handled the same way by the pipeline (requeue with
/// bound); the distinction exists for logging and for transport tests.
#[derive(Clone, Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid response body: {0}")]
    InvalidBody(String),
}

impl DeliveryError {
    /// Classify an HTTP response status. Success statuses are not errors and
    /// must be filtered by the caller before reaching this.
    pub fn from_status(status: u16, body: String) -> Self {
        Self::Status { status, body }
    }

    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::Network(_) => "network",
            Self::InvalidBody(_) => "invalid_body",
        }
    }
}
