use std::time::Duration;

use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::CONTENT_TYPE;
use hyper::{Method, Request, StatusCode};
use hyper_tls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::{initialize_client, OdyseeError};

/// Body of an outgoing call.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Empty,
    /// JSON-RPC envelope or any other JSON document.
    Json(Value),
    /// `application/x-www-form-urlencoded` pairs.
    Form(Vec<(String, String)>),
}

/// Everything needed to issue one HTTP call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallParams {
    pub method: Method,
    pub url: String,
    pub payload: Payload,
    pub query: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

impl CallParams {
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    fn new(method: Method, url: impl Into<String>) -> Self {
        CallParams {
            method,
            url: url.into(),
            payload: Payload::Empty,
            query: Vec::new(),
            timeout: None,
        }
    }

    pub fn json(mut self, body: Value) -> Self {
        self.payload = Payload::Json(body);
        self
    }

    pub fn form<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.payload = Payload::Form(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    pub fn query<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.query.extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Target URL with the query parameters appended.
    pub fn full_url(&self) -> Result<Url, url::ParseError> {
        if self.query.is_empty() {
            Url::parse(&self.url)
        } else {
            Url::parse_with_params(&self.url, &self.query)
        }
    }

    /// The JSON-RPC method of a JSON payload, if any.
    pub fn rpc_method(&self) -> Option<&str> {
        match &self.payload {
            Payload::Json(body) => body.get("method").and_then(Value::as_str),
            _ => None,
        }
    }

    /// Looks up a value in the form or query parameters.
    pub fn param(&self, key: &str) -> Option<&str> {
        let form: &[(String, String)] = match &self.payload {
            Payload::Form(pairs) => pairs.as_slice(),
            _ => &[],
        };
        form.iter()
            .chain(self.query.iter())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Human readable rendering of the parameters for error messages.
    /// Auth tokens are never echoed.
    pub fn describe(&self) -> String {
        let redact = |pairs: &[(String, String)]| -> String {
            pairs
                .iter()
                .map(|(k, v)| {
                    if k == "auth_token" {
                        format!("{k}=<redacted>")
                    } else {
                        format!("{k}={v}")
                    }
                })
                .collect::<Vec<_>>()
                .join("&")
        };

        let mut parts = Vec::new();
        if !self.query.is_empty() {
            parts.push(format!("query: {}", redact(&self.query)));
        }
        match &self.payload {
            Payload::Empty => (),
            Payload::Json(body) => parts.push(format!("json: {body}")),
            Payload::Form(pairs) => parts.push(format!("form: {}", redact(pairs))),
        }
        if parts.is_empty() {
            "no parameters".to_string()
        } else {
            parts.join(", ")
        }
    }
}

#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        RawResponse {
            status,
            body: body.into(),
        }
    }
}

/// Low level failure before any HTTP status was received.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("connection error: {0}")]
    Connection(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

/// A single HTTP round-trip. Retrying is not this layer's job.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, call: &CallParams, timeout: Duration) -> Result<RawResponse, TransportError>;
}

pub struct HyperTransport {
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
}

impl HyperTransport {
    pub fn new() -> Result<Self, OdyseeError> {
        Ok(HyperTransport {
            client: initialize_client()?,
        })
    }

    fn build_request(call: &CallParams) -> Result<Request<Full<Bytes>>, TransportError> {
        let url = call
            .full_url()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        let mut request_builder = Request::builder()
            .method(call.method.clone())
            .uri(url.as_str())
            .header("Accept", "application/json");

        let body = match &call.payload {
            Payload::Empty => Bytes::new(),
            Payload::Json(value) => {
                request_builder = request_builder.header(CONTENT_TYPE, "application/json");
                Bytes::from(value.to_string())
            }
            Payload::Form(pairs) => {
                request_builder =
                    request_builder.header(CONTENT_TYPE, "application/x-www-form-urlencoded");
                let encoded = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(pairs)
                    .finish();
                Bytes::from(encoded)
            }
        };

        request_builder
            .body(Full::new(body))
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn send(&self, call: &CallParams, timeout: Duration) -> Result<RawResponse, TransportError> {
        let req = Self::build_request(call)?;

        let round_trip = async {
            let resp = self
                .client
                .request(req)
                .await
                .map_err(|e| TransportError::Connection(e.to_string()))?;
            let status = resp.status();
            let body = resp
                .into_body()
                .collect()
                .await
                .map_err(|e| TransportError::Connection(e.to_string()))?
                .to_bytes();
            Ok::<_, TransportError>(RawResponse { status, body })
        };

        match tokio::time::timeout(timeout, round_trip).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(timeout)),
        }
    }
}
