//! Schema validation helpers for Fluency JSON5 configuration.

use super::{STORE_PROVIDERS, SchemaMode};
use crate::ConfigError;
use serde_json::{Map, Value};

/// Validate a single config layer against the schema.
pub(super) fn validate_layer_schema(
    value: &Value,
    _mode: SchemaMode,
    layer: &str,
) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, "")?;
    let allowed = ["$schema", "proxy", "generation", "quota", "store"];
    ensure_allowed_keys(map, &allowed, layer, "")?;

    if let Some(value) = map.get("$schema") {
        expect_string(value, layer, "$schema")?;
    }
    if let Some(value) = map.get("proxy") {
        validate_proxy(value, layer, "proxy")?;
    }
    if let Some(value) = map.get("generation") {
        validate_generation(value, layer, "generation")?;
    }
    if let Some(value) = map.get("quota") {
        validate_quota(value, layer, "quota")?;
    }
    if let Some(value) = map.get("store") {
        validate_store(value, layer, "store")?;
    }
    Ok(())
}

/// Validate the "proxy" block.
fn validate_proxy(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &[
            "host",
            "port",
            "allowed_origin",
            "upstream_base_url",
            "api_key",
            "defaults",
        ],
        layer,
        path,
    )?;
    for key in ["host", "upstream_base_url"] {
        if let Some(value) = map.get(key) {
            expect_string(value, layer, &join_path(path, key))?;
        }
    }
    for key in ["allowed_origin", "api_key"] {
        if let Some(value) = map.get(key) {
            expect_optional_string(value, layer, &join_path(path, key))?;
        }
    }
    if let Some(value) = map.get("port") {
        expect_u64_max(value, u64::from(u16::MAX), layer, &join_path(path, "port"))?;
    }
    if let Some(value) = map.get("defaults") {
        validate_completion_defaults(value, layer, &join_path(path, "defaults"))?;
    }
    Ok(())
}

/// Validate the "proxy.defaults" block.
fn validate_completion_defaults(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["model", "max_tokens", "temperature"], layer, path)?;
    if let Some(value) = map.get("model") {
        expect_string(value, layer, &join_path(path, "model"))?;
    }
    if let Some(value) = map.get("max_tokens") {
        expect_u64_max(
            value,
            u64::from(u32::MAX),
            layer,
            &join_path(path, "max_tokens"),
        )?;
    }
    if let Some(value) = map.get("temperature") {
        expect_f64(value, layer, &join_path(path, "temperature"))?;
    }
    Ok(())
}

/// Validate the "generation" block.
fn validate_generation(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &[
            "transport",
            "proxy_url",
            "upstream_base_url",
            "api_key",
            "model",
            "test_max_tokens",
            "feedback_max_tokens",
            "temperature",
            "question_count",
        ],
        layer,
        path,
    )?;
    if let Some(value) = map.get("transport") {
        let transport_path = join_path(path, "transport");
        let transport = value
            .as_str()
            .ok_or_else(|| invalid_field(layer, &transport_path, "expected string"))?;
        if !matches!(transport, "proxy" | "direct") {
            return Err(invalid_field(
                layer,
                &transport_path,
                "expected \"proxy\" or \"direct\"",
            ));
        }
    }
    for key in ["proxy_url", "upstream_base_url", "model"] {
        if let Some(value) = map.get(key) {
            expect_string(value, layer, &join_path(path, key))?;
        }
    }
    if let Some(value) = map.get("api_key") {
        expect_optional_string(value, layer, &join_path(path, "api_key"))?;
    }
    for key in ["test_max_tokens", "feedback_max_tokens"] {
        if let Some(value) = map.get(key) {
            expect_u64_max(value, u64::from(u32::MAX), layer, &join_path(path, key))?;
        }
    }
    if let Some(value) = map.get("question_count") {
        expect_u64_max(value, 100, layer, &join_path(path, "question_count"))?;
    }
    if let Some(value) = map.get("temperature") {
        expect_f64(value, layer, &join_path(path, "temperature"))?;
    }
    Ok(())
}

/// Validate the "quota" block.
fn validate_quota(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["max_requests", "window_hours"], layer, path)?;
    for key in ["max_requests", "window_hours"] {
        if let Some(value) = map.get(key) {
            expect_u64_max(value, u64::from(u32::MAX), layer, &join_path(path, key))?;
        }
    }
    Ok(())
}

/// Validate the "store" block.
fn validate_store(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["provider", "path"], layer, path)?;
    if let Some(value) = map.get("provider") {
        let provider_path = join_path(path, "provider");
        let provider = value
            .as_str()
            .ok_or_else(|| invalid_field(layer, &provider_path, "expected string"))?;
        if !STORE_PROVIDERS.contains(&provider) {
            return Err(invalid_field(
                layer,
                &provider_path,
                "expected \"file\" or \"memory\"",
            ));
        }
    }
    if let Some(value) = map.get("path") {
        expect_optional_string(value, layer, &join_path(path, "path"))?;
    }
    Ok(())
}

/// Expect a JSON object or return a typed error.
fn expect_object<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(invalid_field(layer, path, "expected object")),
    }
}

/// Expect a JSON string or return a typed error.
fn expect_string(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.as_str().is_some() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected string"))
    }
}

/// Expect a JSON string or null.
fn expect_optional_string(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_null() {
        return Ok(());
    }
    expect_string(value, layer, path)
}

/// Expect a non-negative integer no larger than `max`.
fn expect_u64_max(value: &Value, max: u64, layer: &str, path: &str) -> Result<(), ConfigError> {
    match value.as_u64() {
        Some(number) if number <= max => Ok(()),
        Some(_) => Err(invalid_field(layer, path, &format!("expected at most {max}"))),
        None => Err(invalid_field(layer, path, "expected non-negative integer")),
    }
}

/// Expect a JSON number or return a typed error.
fn expect_f64(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_f64() || value.is_u64() || value.is_i64() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected number"))
    }
}

/// Ensure an object contains only allowed keys.
fn ensure_allowed_keys(
    map: &Map<String, Value>,
    allowed: &[&str],
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    for key in map.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(invalid_field(layer, &join_path(path, key), "unknown key"));
        }
    }
    Ok(())
}

/// Join nested paths for better error messages.
fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Build a structured invalid-field error.
fn invalid_field(layer: &str, path: &str, message: &str) -> ConfigError {
    let normalized_path = if path.is_empty() { "root" } else { path };
    ConfigError::InvalidField {
        path: format!("{layer}:{normalized_path}"),
        message: message.to_string(),
    }
}
