use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hyper::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::transport::{CallParams, Transport};
use crate::OdyseeError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// The backend answers `get` for claims without a stream with this code.
pub const ALLOWED_ERROR_CODES: &[i64] = &[-32603];

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub timeout: Duration,
    pub allowed_error_codes: Vec<i64>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            timeout: DEFAULT_TIMEOUT,
            allowed_error_codes: ALLOWED_ERROR_CODES.to_vec(),
        }
    }
}

/// Why a single attempt was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FailureReason {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("HTTP status code: {0}")]
    Status(u16),
    #[error("invalid JSON body: {0}")]
    InvalidJson(String),
    #[error("JSON response error: {0}")]
    RpcError(Value),
}

/// Delay before the zero-based `attempt`: 0s, 1s, 3s, 7s, 15s, ...
pub fn backoff_delay(attempt: u32) -> Duration {
    let secs = 2u64.checked_pow(attempt).unwrap_or(u64::MAX);
    Duration::from_secs(secs - 1)
}

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Checks a 200 body. Arrays always pass; objects pass unless they carry a
/// truthy `error` whose `code` is not allow-listed.
pub fn validate_body(body: &[u8], allowed_error_codes: &[i64]) -> Result<Value, FailureReason> {
    let parsed: Value =
        serde_json::from_slice(body).map_err(|e| FailureReason::InvalidJson(e.to_string()))?;

    if parsed.is_array() {
        return Ok(parsed);
    }

    match parsed.get("error") {
        Some(error) if is_truthy(error) => {
            let code = error.get("code").and_then(Value::as_i64);
            match code {
                Some(code) if allowed_error_codes.contains(&code) => Ok(parsed),
                _ => Err(FailureReason::RpcError(error.clone())),
            }
        }
        _ => Ok(parsed),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|n| n != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Issues calls with retries. Shared by every endpoint; no endpoint retries on its own.
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
}

impl RequestExecutor {
    pub fn new(transport: Arc<dyn Transport>, sleeper: Arc<dyn Sleeper>, policy: RetryPolicy) -> Self {
        RequestExecutor {
            transport,
            sleeper,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn execute(&self, call: &CallParams) -> Result<Value, OdyseeError> {
        let timeout = call.timeout.unwrap_or(self.policy.timeout);
        let mut reasons = Vec::new();

        for attempt in 0..self.policy.max_attempts {
            self.sleeper.sleep(backoff_delay(attempt)).await;

            match self.attempt(call, timeout).await {
                Ok(body) => return Ok(body),
                Err(reason) => {
                    tracing::warn!(
                        method = %call.method,
                        url = %call.url,
                        attempt = attempt + 1,
                        max_attempts = self.policy.max_attempts,
                        %reason,
                        "Request attempt failed"
                    );
                    reasons.push(reason);
                }
            }
        }

        Err(OdyseeError::RetriesExhausted {
            method: call.method.clone(),
            url: call.url.clone(),
            params: call.describe(),
            reasons,
        })
    }

    async fn attempt(&self, call: &CallParams, timeout: Duration) -> Result<Value, FailureReason> {
        let response = self
            .transport
            .send(call, timeout)
            .await
            .map_err(|e| FailureReason::Transport(e.to_string()))?;

        if response.status != StatusCode::OK {
            return Err(FailureReason::Status(response.status.as_u16()));
        }

        validate_body(&response.body, &self.policy.allowed_error_codes)
    }
}
