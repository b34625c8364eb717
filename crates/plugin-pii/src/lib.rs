//! PII redaction plugin for MCP Guard.
//!
//! Detects Social Security numbers, email addresses and card numbers in
//! message bodies and redacts, reports, or blocks them depending on the
//! configured `action`.

pub mod patterns;
pub mod plugin;

pub use plugin::{KIND, PiiAction, PiiConfig, PiiModule};
