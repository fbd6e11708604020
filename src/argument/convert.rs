//! Raw string / JSON values to typed [`Value`]s.

use crate::argument::{ArgumentKind, Value};
use crate::error::ArgumentFailure;
use axum::body::Bytes;

fn unconvertible(kind: ArgumentKind, raw: impl Into<String>) -> ArgumentFailure {
    ArgumentFailure::Unconvertible {
        expected: kind,
        value: raw.into(),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub(crate) fn from_str(kind: ArgumentKind, raw: &str) -> Result<Value, ArgumentFailure> {
    match kind {
        ArgumentKind::String => Ok(Value::String(raw.to_string())),
        ArgumentKind::Integer => raw
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| unconvertible(kind, raw)),
        ArgumentKind::Float => raw
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| unconvertible(kind, raw)),
        ArgumentKind::Boolean => parse_bool(raw.trim())
            .map(Value::Bool)
            .ok_or_else(|| unconvertible(kind, raw)),
        ArgumentKind::Json => Ok(Value::Json(
            serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string())),
        )),
        ArgumentKind::Bytes => Ok(Value::Bytes(Bytes::copy_from_slice(raw.as_bytes()))),
        ArgumentKind::Request | ArgumentKind::Service(_) => Err(unconvertible(kind, raw)),
    }
}

pub(crate) fn from_json(kind: ArgumentKind, json: &serde_json::Value) -> Result<Value, ArgumentFailure> {
    use serde_json::Value as Json;

    if json.is_null() {
        return Ok(Value::Null);
    }
    match (kind, json) {
        (ArgumentKind::Json, _) => Ok(Value::Json(json.clone())),
        (_, Json::String(s)) => from_str(kind, s),
        (ArgumentKind::String, Json::Number(_) | Json::Bool(_)) => Ok(Value::String(json.to_string())),
        (ArgumentKind::Integer, Json::Number(n)) => n
            .as_i64()
            .map(Value::Int)
            .ok_or_else(|| unconvertible(kind, json.to_string())),
        (ArgumentKind::Float, Json::Number(n)) => n
            .as_f64()
            .map(Value::Float)
            .ok_or_else(|| unconvertible(kind, json.to_string())),
        (ArgumentKind::Boolean, Json::Bool(b)) => Ok(Value::Bool(*b)),
        (ArgumentKind::Boolean, Json::Number(_)) => from_str(kind, &json.to_string()),
        (ArgumentKind::Bytes, _) => Ok(Value::Bytes(Bytes::from(json.to_string()))),
        _ => Err(unconvertible(kind, json.to_string())),
    }
}
