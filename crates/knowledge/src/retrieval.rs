//! Client for the external context-extraction service.
//!
//! The service ranks knowledge-base documents against a query. This client
//! only transports the request and classifies failures; it never decides
//! whether a failure is recoverable.

use crate::types::{ContextExtractionResponse, ServiceHealth};
use pestkb_core::{AppError, AppResult};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Why a retrieval call produced no usable response.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("retrieval service timed out after {0:?}")]
    Timeout(Duration),

    #[error("could not connect to retrieval service: {0}")]
    Connection(String),

    #[error("retrieval service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed retrieval response: {0}")]
    MalformedBody(String),

    #[error("retrieval request failed: {0}")]
    Request(String),
}

impl RetrievalError {
    /// True when the service could not be reached or did not answer in
    /// time, as opposed to answering with something unusable.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::Connection(_) | Self::Status { .. } | Self::Request(_)
        )
    }

    fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else if err.is_decode() {
            Self::MalformedBody(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

impl From<RetrievalError> for AppError {
    fn from(err: RetrievalError) -> Self {
        AppError::Retrieval(err.to_string())
    }
}

#[derive(Debug, Serialize)]
struct ExtractContextRequest<'a> {
    query: &'a str,
}

/// HTTP client for the retrieval service.
#[derive(Debug, Clone)]
pub struct RetrievalClient {
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl RetrievalClient {
    /// Create a client whose every call is bounded by `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build retrieval client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// `POST /extract-context` with `{query}`.
    pub async fn extract_context(
        &self,
        query: &str,
    ) -> Result<ContextExtractionResponse, RetrievalError> {
        let url = format!("{}/extract-context", self.base_url);
        tracing::debug!("Requesting context from {}", url);

        let response = self
            .client
            .post(&url)
            .json(&ExtractContextRequest { query })
            .send()
            .await
            .map_err(|e| RetrievalError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RetrievalError::from_reqwest(e, self.timeout))?;

        if !status.is_success() {
            return Err(RetrievalError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| RetrievalError::MalformedBody(e.to_string()))
    }

    /// `GET /health`.
    pub async fn health(&self) -> Result<ServiceHealth, RetrievalError> {
        let url = format!("{}/health", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RetrievalError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| RetrievalError::from_reqwest(e, self.timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, timeout: Duration) -> RetrievalClient {
        RetrievalClient::new(server.uri(), timeout).unwrap()
    }

    #[tokio::test]
    async fn test_extract_context_posts_query() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/extract-context"))
            .and(body_json(json!({ "query": "ants in kitchen" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "keywords": ["ant", "kitchen"],
                "original_query": "ants in kitchen",
                "relevant_docs": [{
                    "filename": "ants.md",
                    "title": "ants",
                    "path": "/kb/ants.md",
                    "similarity_score": 0.52,
                    "content": "Ant colonies..."
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client_for(&server, Duration::from_secs(10))
            .extract_context("ants in kitchen")
            .await
            .unwrap();

        assert_eq!(response.keywords, vec!["ant", "kitchen"]);
        assert_eq!(response.relevant_docs[0].similarity_score, 0.52);
    }

    #[tokio::test]
    async fn test_non_success_status_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/extract-context"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "Query is required"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server, Duration::from_secs(10))
            .extract_context("")
            .await
            .unwrap_err();

        assert!(matches!(err, RetrievalError::Status { status: 400, .. }));
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_malformed_body_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/extract-context"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server, Duration::from_secs(10))
            .extract_context("ants")
            .await
            .unwrap_err();

        assert!(matches!(err, RetrievalError::MalformedBody(_)));
        assert!(!err.is_unavailable());
    }

    #[tokio::test]
    async fn test_slow_service_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/extract-context"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "relevant_docs": [] }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let timeout = Duration::from_millis(200);
        let err = client_for(&server, timeout)
            .extract_context("ants")
            .await
            .unwrap_err();

        assert!(matches!(err, RetrievalError::Timeout(t) if t == timeout));
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        let client = RetrievalClient::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
        let err = client.extract_context("ants").await.unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_health() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "healthy",
                "service": "Python NLP Backend"
            })))
            .mount(&server)
            .await;

        let health = client_for(&server, Duration::from_secs(1))
            .health()
            .await
            .unwrap();
        assert_eq!(health.status, "healthy");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client =
            RetrievalClient::new("http://localhost:5000/", Duration::from_secs(10)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000");
    }
}
