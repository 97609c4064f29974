// SPDX-License-Identifier: MIT OR Apache-2.0
//! Parsing of repeated `--param KEY=VALUE` flags into an input record.

use anyhow::{Context, Result};
use serde_json::{Map as JsonMap, Value as JsonValue};

/// Parse a `KEY=VALUE` style CLI flag payload.
///
/// Returns an error if `=` is missing or if the key portion is empty.
pub fn parse_key_value_flag(raw: &str, flag_name: &str) -> Result<(String, String)> {
    let (raw_key, raw_value) = raw
        .split_once('=')
        .with_context(|| format!("{flag_name} expects KEY=VALUE, got '{raw}'"))?;

    let key = raw_key.trim();
    if key.is_empty() {
        anyhow::bail!("{flag_name} key cannot be empty (got '{raw}')");
    }

    Ok((key.to_string(), raw_value.to_string()))
}

/// Parse a parameter value from JSON-like text.
///
/// If `raw` parses as JSON, that JSON value is returned. Otherwise the
/// original input is treated as a string.
pub fn parse_param_value(raw: &str) -> JsonValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return JsonValue::String(String::new());
    }

    serde_json::from_str::<JsonValue>(trimmed)
        .unwrap_or_else(|_| JsonValue::String(raw.to_string()))
}

/// Build an input record from `--param` flags. Later keys win.
pub fn record_from_params(params: &[String]) -> Result<JsonValue> {
    let mut record = JsonMap::new();
    for raw in params {
        let (key, value) = parse_key_value_flag(raw, "--param")?;
        record.insert(key, parse_param_value(&value));
    }
    Ok(JsonValue::Object(record))
}
