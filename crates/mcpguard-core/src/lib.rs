//! # mcpguard-core
//!
//! Core crate for MCP Guard. Contains the application configuration
//! schema, logging settings, and the unified error system.
//!
//! This crate has **no** internal dependencies on other MCP Guard crates.

pub mod config;
pub mod error;
pub mod result;

pub use error::AppError;
pub use result::AppResult;
