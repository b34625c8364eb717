//! Per-entry validation of the plugin configuration document.
//!
//! Validation never fails as a whole: each malformed entry is dropped with
//! a collected reason and the remaining entries are kept.

use std::collections::HashSet;

use serde_json::Value;
use tracing::{info, warn};

use crate::config::descriptor::PluginDescriptor;
use crate::hooks::definitions::{HookPoint, PluginMode};

/// Outcome of validating a list of raw entries.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Accepted descriptors, in document order.
    pub descriptors: Vec<PluginDescriptor>,
    /// One human-readable reason per rejected entry.
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// Number of accepted entries.
    pub fn accepted(&self) -> usize {
        self.descriptors.len()
    }

    /// Number of rejected entries.
    pub fn rejected(&self) -> usize {
        self.errors.len()
    }
}

/// Validates raw entries in document order.
pub fn validate(entries: &[Value]) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut names: HashSet<String> = HashSet::new();

    for (position, entry) in entries.iter().enumerate() {
        match validate_entry(entry) {
            Ok(descriptor) if names.contains(&descriptor.name) => {
                let reason = format!(
                    "entry {position} (plugin '{}'): duplicate plugin name",
                    descriptor.name
                );
                warn!(entry = position, plugin = %descriptor.name, "Rejected plugin entry: duplicate name");
                report.errors.push(reason);
            }
            Ok(descriptor) => {
                names.insert(descriptor.name.clone());
                report.descriptors.push(descriptor);
            }
            Err(problem) => {
                let reason = match entry_name(entry) {
                    Some(name) => format!("entry {position} (plugin '{name}'): {problem}"),
                    None => format!("entry {position}: {problem}"),
                };
                warn!(entry = position, reason = %reason, "Rejected plugin entry");
                report.errors.push(reason);
            }
        }
    }

    info!(
        accepted = report.accepted(),
        rejected = report.rejected(),
        "Plugin configuration validated"
    );

    report
}

fn entry_name(entry: &Value) -> Option<&str> {
    entry
        .get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
}

fn validate_entry(entry: &Value) -> Result<PluginDescriptor, String> {
    let Some(map) = entry.as_object() else {
        return Err("entry is not a mapping".to_string());
    };

    let name = identifier(map.get("name"), "name")?;
    let kind = identifier(map.get("kind"), "kind")?;

    let hooks = parse_hooks(map.get("hooks"))?;

    let mode = match map.get("mode") {
        Some(Value::String(mode)) => mode.parse::<PluginMode>().map_err(|_| {
            format!("invalid 'mode' '{mode}' (expected enforce, monitor, or warn)")
        })?,
        Some(_) => return Err("invalid 'mode' (expected enforce, monitor, or warn)".to_string()),
        None => return Err("missing 'mode'".to_string()),
    };

    let priority = match map.get("priority") {
        Some(value) => value
            .as_i64()
            .ok_or_else(|| format!("invalid 'priority' {value} (must be an integer)"))?,
        None => return Err("missing 'priority'".to_string()),
    };

    let config = match map.get("config") {
        None | Some(Value::Null) => serde_json::Map::new(),
        Some(Value::Object(config)) => config.clone(),
        Some(_) => return Err("'config' must be a mapping".to_string()),
    };

    Ok(PluginDescriptor {
        name: name.to_string(),
        kind: kind.to_string(),
        hooks,
        mode,
        priority,
        config,
    })
}

/// A non-empty string kept exactly as written.
fn identifier<'a>(value: Option<&'a Value>, key: &str) -> Result<&'a str, String> {
    match value.and_then(Value::as_str) {
        Some(text) if text.trim().is_empty() => Err(format!("missing or empty '{key}'")),
        Some(text) if text.trim() != text => {
            Err(format!("'{key}' '{text}' has leading or trailing whitespace"))
        }
        Some(text) => Ok(text),
        None => Err(format!("missing or empty '{key}'")),
    }
}

fn parse_hooks(value: Option<&Value>) -> Result<Vec<HookPoint>, String> {
    let Some(value) = value else {
        return Err("missing 'hooks'".to_string());
    };
    let Some(items) = value.as_array() else {
        return Err("'hooks' must be a list of hook names".to_string());
    };
    if items.is_empty() {
        return Err("'hooks' must not be empty".to_string());
    }

    let mut hooks = Vec::with_capacity(items.len());
    for item in items {
        let Some(name) = item.as_str() else {
            return Err(format!("'hooks' contains a non-string value {item}"));
        };
        let hook = name
            .parse::<HookPoint>()
            .map_err(|_| format!("unrecognized hook '{name}'"))?;
        if !hooks.contains(&hook) {
            hooks.push(hook);
        }
    }

    Ok(hooks)
}
