use async_trait::async_trait;
use tracing::debug;

use intentmap_core::{DeliveryError, InteractionPoint};

use crate::delivery::{DeliveryBatch, Transport};

/// Production transport: JSON over HTTP via reqwest.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// `base_url` is the API root without a trailing slash, e.g.
    /// `https://collect.example.com/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Aggregated interaction points for a page, for the rendering
    /// collaborator. A response without an `interactions` array yields an
    /// empty vec rather than an error.
    pub async fn fetch_interactions(
        &self,
        page_url: &str,
    ) -> Result<Vec<InteractionPoint>, DeliveryError> {
        let url = format!("{}/heatmap", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("url", page_url)])
            .send()
            .await
            .map_err(|e| DeliveryError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::from_status(status.as_u16(), body));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| DeliveryError::InvalidBody(e.to_string()))?;

        let points = match body.get("interactions") {
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| DeliveryError::InvalidBody(e.to_string()))?,
            None => Vec::new(),
        };
        Ok(points)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn deliver(&self, batch: &DeliveryBatch) -> Result<(), DeliveryError> {
        let url = format!("{}{}", self.base_url, batch.endpoint_path());
        debug!(url = %url, events = batch.len(), "delivering batch");

        let response = self
            .client
            .post(&url)
            .json(&batch.payload())
            .send()
            .await
            .map_err(|e| DeliveryError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::from_status(status.as_u16(), body));
        }

        // The endpoint contract promises a JSON body; anything else counts
        // as a failed delivery.
        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| DeliveryError::InvalidBody(e.to_string()))?;

        Ok(())
    }
}
