//! Plugin configuration: document parsing, the YAML subset, validation,
//! and the validated descriptor type.

pub mod descriptor;
pub mod document;
pub mod validator;
pub mod yaml;

pub use descriptor::PluginDescriptor;
pub use document::ConfigDocument;
pub use validator::{ValidationReport, validate};
pub use yaml::YamlError;
