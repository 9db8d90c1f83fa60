//! Artifact extraction from deployment log text
//!
//! Pure functions: one line in, the recognized subset of artifact fields out.
//! JSON lines are read as chain transaction results (`txhash` plus
//! `logs[].events[].attributes[]`), anything else is matched against the CLI's
//! plain-text output. Within a line the last occurrence of a field wins; the
//! caller's accumulator keeps the first value seen across lines.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::models::deployment::PartialArtifact;

static TXHASH: OnceLock<Regex> = OnceLock::new();
static CODE_ID: OnceLock<Regex> = OnceLock::new();

fn txhash_regex() -> &'static Regex {
    TXHASH.get_or_init(|| Regex::new(r"(?i)txhash:\s*([A-F0-9]{64})").expect("valid txhash regex"))
}

fn code_id_regex() -> &'static Regex {
    CODE_ID.get_or_init(|| {
        Regex::new(r#"(?s)key: code_id.*?value: "?(\d+)"?"#).expect("valid code_id regex")
    })
}

/// Extract whatever artifact fields a single log line carries
pub fn extract(line: &str) -> PartialArtifact {
    match serde_json::from_str::<Value>(line.trim()) {
        Ok(Value::Object(object)) => extract_json(&object),
        _ => extract_text(line),
    }
}

/// Plain-text rules only, for free-form CLI output
pub fn extract_text(text: &str) -> PartialArtifact {
    PartialArtifact {
        transaction_hash: txhash_regex()
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string()),
        code_id: code_id_regex()
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string()),
        ..Default::default()
    }
}

fn extract_json(object: &Map<String, Value>) -> PartialArtifact {
    let mut partial = PartialArtifact {
        transaction_hash: object.get("txhash").and_then(scalar),
        ..Default::default()
    };

    let groups = object.get("logs").and_then(Value::as_array);
    let events = groups
        .into_iter()
        .flatten()
        .filter_map(|group| group.get("events").and_then(Value::as_array))
        .flatten();

    for event in events {
        let Some(kind) = event.get("type").and_then(Value::as_str) else {
            continue;
        };
        for (key, value) in attributes(event) {
            match (kind, key) {
                ("store_code", "code_id") | ("instantiate", "code_id") => {
                    partial.code_id = Some(value);
                }
                ("instantiate", "_contract_address") | ("instantiate", "contract_address") => {
                    partial.contract_address = Some(value);
                }
                ("wasm", "token_name") | ("wasm", "contract_name") => {
                    partial.contract_name = Some(value);
                }
                ("wasm", "token_symbol") => partial.token_symbol = Some(value),
                ("wasm", "token_supply") => partial.token_supply = Some(value),
                _ => {}
            }
        }
    }

    partial
}

fn attributes(event: &Value) -> impl Iterator<Item = (&str, String)> {
    event
        .get("attributes")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|attr| {
            let key = attr.get("key").and_then(Value::as_str)?;
            let value = attr.get("value").and_then(scalar)?;
            Some((key, value))
        })
}

/// String or number as a non-empty string
fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
