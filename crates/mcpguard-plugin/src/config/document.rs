//! Plugin configuration document reader.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use mcpguard_core::config::DocumentFormat;
use mcpguard_core::error::{AppError, ErrorKind};
use mcpguard_core::result::AppResult;

use super::yaml;

/// Raw entries of a plugin configuration document, not yet validated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDocument {
    /// One value per plugin entry, in document order.
    pub entries: Vec<Value>,
}

impl ConfigDocument {
    /// Parses document text.
    ///
    /// The top level may be a list of entries or a mapping with a `plugins`
    /// list. An empty document, or one whose `plugins` is null, has no
    /// entries.
    pub fn parse(text: &str, format: DocumentFormat, path: Option<&str>) -> AppResult<Self> {
        let format = format.resolve(path, text);
        debug!(format = ?format, path = ?path, "Parsing plugin document");

        let root = match format {
            DocumentFormat::Json => serde_json::from_str::<Value>(text).map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    format!("Invalid plugin document: {e}"),
                    e,
                )
            })?,
            DocumentFormat::Yaml | DocumentFormat::Auto => yaml::parse(text).map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    format!("Invalid plugin document: {e}"),
                    e,
                )
            })?,
        };

        Self::from_value(root)
    }

    /// Extracts the entry list from an already parsed document root.
    pub fn from_value(root: Value) -> AppResult<Self> {
        let entries = match root {
            Value::Null => Vec::new(),
            Value::Array(entries) => entries,
            Value::Object(mut map) => match map.remove("plugins") {
                Some(Value::Array(entries)) => entries,
                Some(Value::Null) | None => Vec::new(),
                Some(_) => {
                    return Err(AppError::configuration(
                        "Invalid plugin document: 'plugins' must be a list",
                    ));
                }
            },
            _ => {
                return Err(AppError::configuration(
                    "Invalid plugin document: expected a list of plugins or a 'plugins' key",
                ));
            }
        };

        Ok(Self { entries })
    }

    /// Reads and parses a document from disk.
    pub async fn read(path: impl AsRef<Path>, format: DocumentFormat) -> AppResult<Self> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Configuration,
                format!("Cannot read plugin document '{}': {e}", path.display()),
                e,
            )
        })?;

        Self::parse(&text, format, path.to_str())
    }

    /// Number of raw entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the document declares no plugins.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
