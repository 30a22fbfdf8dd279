//! Errors for parsing scene settings from text (command line, config).

use thiserror::Error;

/// Errors that can occur when parsing a named scene setting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown material: {0} (expected diffuse, mirror or glossy)")]
    UnknownMaterial(String),

    #[error("Unknown environment: {0} (expected yellow-blue or red-green)")]
    UnknownEnvironment(String),

    #[error("Unknown template: {0}")]
    UnknownTemplate(String),
}
