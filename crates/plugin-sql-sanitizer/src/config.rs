//! Sanitizer settings read from a descriptor's `config`.

use serde::Deserialize;

/// SQL sanitizer configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SqlConfig {
    /// JSON field names holding SQL text, searched at any depth.
    pub fields: Vec<String>,
    /// Flag `DELETE` statements without a `WHERE` clause.
    pub block_delete_without_where: bool,
    /// Flag `UPDATE` statements without a `WHERE` clause.
    pub block_update_without_where: bool,
    /// Case-insensitive regex denylist applied to every statement.
    pub blocked_patterns: Vec<String>,
    /// Flag statements without a bind marker (`?`, `$1`, `:name`, `@name`).
    pub require_parameterization: bool,
    /// Report violations as a denial rather than as warnings.
    pub block_on_violation: bool,
}

impl Default for SqlConfig {
    fn default() -> Self {
        Self {
            fields: default_fields(),
            block_delete_without_where: true,
            block_update_without_where: true,
            blocked_patterns: default_blocked_patterns(),
            require_parameterization: false,
            block_on_violation: true,
        }
    }
}

fn default_fields() -> Vec<String> {
    ["sql", "query", "statement"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn default_blocked_patterns() -> Vec<String> {
    vec![
        r"\bdrop\s+(table|database|schema|index|view)\b".to_string(),
        r"\btruncate\s+(table\s+)?\w+".to_string(),
    ]
}
