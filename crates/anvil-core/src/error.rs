//! Error types for anvil

use thiserror::Error;

/// The main error type for anvil operations
#[derive(Debug, Error)]
pub enum AnvilError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Behavior not found: {0}")]
    BehaviorNotFound(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Invalid template name: {0:?}")]
    InvalidTemplateName(String),

    /// The base argument of a repack is not the root of a template instance
    #[error("Node {0} is not a template root")]
    NotATemplateRoot(String),

    #[error("Structural behavior cannot be {0}")]
    StructuralBehavior(String),

    #[error("Template format error: {0}")]
    TemplateFormat(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("TOML serialization error: {0}")]
    TomlSerError(String),
}

/// Result type alias for anvil operations
pub type Result<T> = std::result::Result<T, AnvilError>;

impl From<toml::de::Error> for AnvilError {
    fn from(err: toml::de::Error) -> Self {
        AnvilError::TomlParseError(err.to_string())
    }
}

impl From<toml::ser::Error> for AnvilError {
    fn from(err: toml::ser::Error) -> Self {
        AnvilError::TomlSerError(err.to_string())
    }
}
