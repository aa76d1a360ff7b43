//! Transport seam for the job-launch/polling protocol.
//!
//! The engine talks to the server through the [`TaskTransport`] trait so
//! tests can script envelopes without a network. [`HttpTransport`] is the
//! production implementation.

use crate::error::TransportError;
use crate::protocol::{RebuildRequest, ScanRequest, StatusEnvelope, TaskHandle};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use url::Url;

/// Trait for protocol transports
///
/// Implement this trait to drive the workflow against something other than
/// a live server (e.g., for testing).
#[async_trait]
pub trait TaskTransport: Send + Sync {
    /// Start a comprehensive scan; answers the new task's id
    async fn launch_scan(&self, request: &ScanRequest) -> Result<TaskHandle, TransportError>;

    /// Start a unified rebuild; answers the new task's id
    async fn launch_rebuild(&self, request: &RebuildRequest)
        -> Result<TaskHandle, TransportError>;

    /// Fetch the current status envelope for a task
    async fn status(&self, task_id: &str) -> Result<StatusEnvelope, TransportError>;

    /// Request cancellation of a task; the response body is ignored
    async fn cancel(&self, task_id: &str) -> Result<(), TransportError>;
}

/// HTTP implementation over reqwest
pub struct HttpTransport {
    base: Url,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport rooted at `base_url`, e.g.
    /// `http://localhost:8188/api/thumbnails`.
    pub fn new(base_url: &str) -> Result<Self, TransportError> {
        // A trailing slash keeps Url::join from eating the last segment
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base = Url::parse(&normalized).map_err(|e| TransportError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|source| TransportError::Client { source })?;

        Ok(Self { base, client })
    }

    fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        self.base.join(path).map_err(|e| TransportError::InvalidUrl {
            url: format!("{}{}", self.base, path),
            reason: e.to_string(),
        })
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, TransportError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let response = self
            .client
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        response.json().await.map_err(|source| TransportError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl TaskTransport for HttpTransport {
    async fn launch_scan(&self, request: &ScanRequest) -> Result<TaskHandle, TransportError> {
        self.post_json("comprehensive-scan", request).await
    }

    async fn launch_rebuild(
        &self,
        request: &RebuildRequest,
    ) -> Result<TaskHandle, TransportError> {
        self.post_json("rebuild-unified", request).await
    }

    async fn status(&self, task_id: &str) -> Result<StatusEnvelope, TransportError> {
        let url = self.endpoint(&format!("status/{task_id}"))?;
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        response.json().await.map_err(|source| TransportError::Decode {
            url: url.to_string(),
            source,
        })
    }

    async fn cancel(&self, task_id: &str) -> Result<(), TransportError> {
        let url = self.endpoint("cancel")?;
        let response = self
            .client
            .post(url.clone())
            .json(&json!({ "task_id": task_id }))
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_trailing_slash() {
        let transport = HttpTransport::new("http://localhost:8188/api/thumbnails").unwrap();
        let url = transport.endpoint("status/abc-123").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8188/api/thumbnails/status/abc-123"
        );
    }

    #[test]
    fn existing_trailing_slash_is_kept() {
        let transport = HttpTransport::new("http://localhost:8188/api/thumbnails/").unwrap();
        let url = transport.endpoint("comprehensive-scan").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8188/api/thumbnails/comprehensive-scan"
        );
    }

    #[test]
    fn garbage_url_is_rejected() {
        let result = HttpTransport::new("not a url at all");
        assert!(matches!(result, Err(TransportError::InvalidUrl { .. })));
    }
}
