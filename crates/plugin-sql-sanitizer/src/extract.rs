//! Candidate SQL extraction from message bodies.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

/// A string that opens with a statement keyword.
static STATEMENT_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(select|insert|update|delete|drop|truncate|alter|create|replace|merge|grant|revoke|with)\s",
    )
    .expect("statement start pattern is valid")
});

/// A statement embedded in prose, e.g. `please run: DROP TABLE x`. Each
/// keyword needs the clause that makes it a statement.
static EMBEDDED_STATEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:select\s+[^;]*?\bfrom\b|insert\s+into\b|update\s+\S+\s+set\b|delete\s+from\b|(?:drop|create|alter)\s+(?:table|database|schema|index|view)\b|truncate\s+\S|(?:grant|revoke)\s+\S)",
    )
    .expect("embedded statement pattern is valid")
});

/// Returns whether `text` looks like or contains an SQL statement.
pub fn looks_like_sql(text: &str) -> bool {
    STATEMENT_START.is_match(text) || EMBEDDED_STATEMENT.is_match(text)
}

/// The statement keyword of `text`, upper-cased: the opening keyword, or
/// else the first embedded statement's.
pub fn statement_verb(text: &str) -> Option<String> {
    if let Some(caps) = STATEMENT_START.captures(text) {
        return Some(caps[1].to_ascii_uppercase());
    }
    EMBEDDED_STATEMENT
        .find(text)
        .and_then(|m| m.as_str().split_whitespace().next())
        .map(str::to_ascii_uppercase)
}

/// Finds the SQL text to check in `body`.
///
/// For JSON bodies, string values of the named `fields` (at any depth) win;
/// otherwise every statement-like string value is taken. A non-JSON body is
/// a candidate itself when it looks like SQL.
pub fn candidates(body: &str, fields: &[String]) -> Vec<String> {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => from_value(&value, fields),
        Err(_) if looks_like_sql(body) => vec![body.to_string()],
        Err(_) => Vec::new(),
    }
}

/// Finds the SQL text of a `tools/call` body.
///
/// A JSON body is read as it is now: `params.arguments` first, then the
/// whole body. `arguments` is only used when the body is not JSON.
pub fn tool_candidates(body: &str, arguments: Option<&Value>, fields: &[String]) -> Vec<String> {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => {
            let found = value
                .pointer("/params/arguments")
                .map(|arguments| from_value(arguments, fields))
                .unwrap_or_default();
            if found.is_empty() {
                from_value(&value, fields)
            } else {
                found
            }
        }
        Err(_) => {
            let found = arguments
                .map(|arguments| from_value(arguments, fields))
                .unwrap_or_default();
            if found.is_empty() {
                candidates(body, fields)
            } else {
                found
            }
        }
    }
}

/// Same as [`candidates`] for an already parsed value.
pub fn from_value(value: &Value, fields: &[String]) -> Vec<String> {
    let mut found = Vec::new();
    collect_fields(value, fields, &mut found);
    if found.is_empty() {
        collect_statements(value, &mut found);
    }
    found
}

fn collect_fields(value: &Value, fields: &[String], out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                match child {
                    Value::String(text) if fields.iter().any(|f| f == key) => {
                        out.push(text.clone());
                    }
                    _ => collect_fields(child, fields, out),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_fields(item, fields, out);
            }
        }
        _ => {}
    }
}

fn collect_statements(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(text) if looks_like_sql(text) => out.push(text.clone()),
        Value::Object(map) => map.values().for_each(|child| collect_statements(child, out)),
        Value::Array(items) => items.iter().for_each(|item| collect_statements(item, out)),
        _ => {}
    }
}
