//! HTTP client for the TropicTrek backend.
//!
//! The backend exposes three operations used by the chat client:
//! - `POST /chat` for a conversational exchange
//! - `GET /download/{pdf_id}` for a generated itinerary PDF
//! - `GET /health` for a reachability check
//!
//! [`TravelBackend`] is the seam the controller talks to; [`ApiClient`] is the
//! reqwest implementation.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;

mod client;
mod error;

pub use client::Client;
pub use error::NetworkError;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ChatReply {
    pub response: String,
    pub session_id: String,
    #[serde(default)]
    pub pdf_generated: bool,
    #[serde(default)]
    pub pdf_id: Option<String>,
}

impl ChatReply {
    /// The PDF id when the reply reports a generated PDF with a usable id.
    pub fn generated_pdf_id(&self) -> Option<&str> {
        if !self.pdf_generated {
            return None;
        }
        self.pdf_id.as_deref().filter(|id| !id.trim().is_empty())
    }
}

/// Whatever `/health` returns; only its arrival matters.
pub type HealthStatus = serde_json::Value;

#[async_trait]
pub trait TravelBackend: Send + Sync {
    async fn send_message(
        &self,
        message: &str,
        session_id: Option<&str>,
    ) -> Result<ChatReply, NetworkError>;

    async fn download_pdf(&self, pdf_id: &str) -> Result<Bytes, NetworkError>;

    async fn health_check(&self) -> Result<HealthStatus, NetworkError>;

    /// Check that an image referenced in a reply can be loaded.
    async fn probe_image(&self, url: &str) -> Result<(), NetworkError>;
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: Url,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, NetworkError> {
        let mut base_url =
            Url::parse(base_url).map_err(|_| NetworkError::InvalidUrl(base_url.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(NetworkError::InvalidUrl(base_url.to_string()));
        }
        // Keep any path prefix ("https://host/api") when joining endpoints
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::with_timeout(timeout).map_err(|source| NetworkError::Transport {
            url: base_url.to_string(),
            source,
        })?;

        Ok(Self { base_url, client })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, NetworkError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| NetworkError::InvalidUrl(self.base_url.to_string()))?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }
}

#[async_trait]
impl TravelBackend for ApiClient {
    async fn send_message(
        &self,
        message: &str,
        session_id: Option<&str>,
    ) -> Result<ChatReply, NetworkError> {
        let request = ChatRequest {
            message: message.to_string(),
            session_id: session_id.map(str::to_string),
        };
        let reply: ChatReply = self.client.post(self.endpoint(&["chat"])?, &request).await?;
        tracing::info!(
            session_id = %reply.session_id,
            pdf_generated = reply.pdf_generated,
            "Received chat reply ({} chars)",
            reply.response.len()
        );
        Ok(reply)
    }

    async fn download_pdf(&self, pdf_id: &str) -> Result<Bytes, NetworkError> {
        let bytes = self
            .client
            .get_bytes(self.endpoint(&["download", pdf_id])?)
            .await?;
        tracing::info!(pdf_id, "Downloaded PDF ({} bytes)", bytes.len());
        Ok(bytes)
    }

    async fn health_check(&self) -> Result<HealthStatus, NetworkError> {
        self.client.get(self.endpoint(&["health"])?).await
    }

    async fn probe_image(&self, url: &str) -> Result<(), NetworkError> {
        let url = Url::parse(url).map_err(|_| NetworkError::InvalidUrl(url.to_string()))?;
        self.client.head(url).await
    }
}
