//! SQL statement sanitizer plugin for MCP Guard.
//!
//! Extracts SQL from message bodies, strips comments, and flags destructive
//! statements without a `WHERE` clause, denylisted patterns, and (when
//! enabled) statements without bind markers.

pub mod analyzer;
pub mod config;
pub mod extract;
pub mod plugin;

pub use config::SqlConfig;
pub use plugin::{KIND, SqlSanitizerModule};
