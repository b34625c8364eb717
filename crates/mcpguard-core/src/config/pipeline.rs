//! Inspection pipeline configuration.

use serde::{Deserialize, Serialize};

/// Format of the plugin configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// Pick the format from the file extension or the document content.
    #[default]
    Auto,
    /// Canonical JSON.
    Json,
    /// The minimal YAML subset.
    Yaml,
}

impl DocumentFormat {
    /// Resolves `Auto` against a file path and the document text.
    ///
    /// `.json` selects JSON, `.yaml`/`.yml` select YAML. Without a usable
    /// extension, a document whose first significant character is `[` or
    /// `{` is JSON; anything else is YAML.
    pub fn resolve(self, path: Option<&str>, text: &str) -> Self {
        if self != Self::Auto {
            return self;
        }

        if let Some(ext) = path
            .and_then(|p| std::path::Path::new(p).extension())
            .and_then(|e| e.to_str())
        {
            match ext.to_ascii_lowercase().as_str() {
                "json" => return Self::Json,
                "yaml" | "yml" => return Self::Yaml,
                _ => {}
            }
        }

        match text.trim_start().chars().next() {
            Some('[') | Some('{') => Self::Json,
            _ => Self::Yaml,
        }
    }
}

/// Settings for loading the plugin chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Path to the plugin configuration document.
    #[serde(default = "default_plugins_path")]
    pub plugins_path: String,
    /// Format of the plugin configuration document.
    #[serde(default)]
    pub format: DocumentFormat,
    /// Defer loading the document until the first request is inspected.
    #[serde(default)]
    pub lazy_init: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            plugins_path: default_plugins_path(),
            format: DocumentFormat::Auto,
            lazy_init: false,
        }
    }
}

fn default_plugins_path() -> String {
    "config/plugins.yaml".to_string()
}
