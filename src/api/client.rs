//! Reqwest-backed transport.
//!
//! The cache only ever talks to the `Transport` trait; this module
//! provides the production implementation with the timeout and default
//! headers both upstream APIs expect.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Method};
use serde_json::Value;

use crate::config::Config;

use super::{ApiError, RequestDescriptor};

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Performs a described request and yields the parsed JSON body.
///
/// The cache treats this as its only suspension point; implementations
/// own all transport policy (timeouts, TLS, connection pooling).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn perform(&self, request: &RequestDescriptor) -> Result<Value, ApiError>;
}

/// Production transport.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let mut headers = header::HeaderMap::new();
        // HeadHunter rejects requests without a User-Agent; send it on
        // every request, the placeholder API ignores it.
        if let Ok(value) = header::HeaderValue::from_str(&config.user_agent) {
            headers.insert(header::USER_AGENT, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn perform(&self, request: &RequestDescriptor) -> Result<Value, ApiError> {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .query(&request.params);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let response = Self::check_response(response).await?;

        // DELETE and some mutation endpoints answer with an empty body.
        if request.method == Method::DELETE {
            let text = response.text().await?;
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_str(&text)
                .map_err(|e| ApiError::Decode(format!("response body not parseable: {}", e)));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ApiError::Decode(format!("response body not parseable: {}", e)))
    }
}
