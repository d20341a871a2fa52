//! Declarative request descriptions.

use reqwest::Method;
use serde_json::Value;

/// Everything the transport needs to perform one HTTP request.
///
/// Endpoints build these from their arguments; the cache never inspects
/// them beyond using the transport to execute them.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub url: String,
    pub method: Method,
    /// Query-string parameters, appended in order.
    pub params: Vec<(String, String)>,
    /// JSON body for POST/PATCH requests.
    pub body: Option<Value>,
    /// Extra headers beyond the transport's defaults.
    pub headers: Vec<(String, String)>,
}

impl RequestDescriptor {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            params: Vec::new(),
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::PATCH, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_params(mut self, params: Vec<(String, String)>) -> Self {
        self.params = params;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Flatten a JSON object into query-string pairs, skipping nulls.
/// Scalar values render with `to_string`; strings without quotes.
pub fn query_params(args: &Value) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    if let Some(map) = args.as_object() {
        for (key, value) in map {
            match value {
                Value::Null => {}
                Value::String(s) => pairs.push((key.clone(), s.clone())),
                other => pairs.push((key.clone(), other.to_string())),
            }
        }
    }
    pairs
}
