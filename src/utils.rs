use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::OdyseeError;

pub fn rpc_body(method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
    })
}

/// Same envelope with the `id` member the comment API expects.
pub fn rpc_body_with_id(method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": method,
        "params": params,
    })
}

pub fn lbry_url(name: &str) -> String {
    format!("lbry://{}", name)
}

pub fn channel_url(channel_name: &str) -> String {
    format!("lbry://@{}", channel_name.trim_start_matches('@'))
}

pub fn field<'a>(value: &'a Value, key: &str) -> Result<&'a Value, OdyseeError> {
    value
        .get(key)
        .ok_or_else(|| OdyseeError::MissingField(key.to_string()))
}

pub fn str_field(value: &Value, key: &str) -> Result<String, OdyseeError> {
    field(value, key)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| OdyseeError::MissingField(key.to_string()))
}

pub fn opt_str(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

pub fn int_field(value: &Value, key: &str) -> Result<i64, OdyseeError> {
    field(value, key).and_then(|v| {
        as_integer(v).ok_or_else(|| OdyseeError::MissingField(key.to_string()))
    })
}

pub fn str_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// The platform sends timestamps both as numbers and as numeric strings.
pub fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Unix seconds to UTC, clamping negative values to the epoch.
pub fn timestamp_to_datetime(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs.max(0), 0).unwrap_or_default()
}

/// JSON-RPC reply. `result` is absent when the backend answered with an
/// allow-listed error.
#[derive(Debug, Deserialize)]
pub(crate) struct RpcResponse<T> {
    pub result: Option<T>,
}

impl<T> RpcResponse<T> {
    pub fn into_result(self) -> Result<T, OdyseeError> {
        self.result
            .ok_or_else(|| OdyseeError::MissingField("result".to_string()))
    }
}

/// One page of `claim_search` or `comment.List`. The records stay raw.
#[derive(Debug, Deserialize)]
pub(crate) struct ItemsPage {
    pub items: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReactionCounts {
    pub like: Option<i64>,
    pub dislike: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    data: Option<Vec<i64>>,
}

/// First element of the `data` array that the REST count endpoints return.
pub(crate) fn first_data_count(body: Value) -> Result<i64, OdyseeError> {
    let response: CountResponse = serde_json::from_value(body)?;
    response
        .data
        .and_then(|data| data.first().copied())
        .ok_or_else(|| OdyseeError::MissingField("data[0]".to_string()))
}
