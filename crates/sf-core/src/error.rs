//! Error types for sf-core

use thiserror::Error;

/// Core error type for SqlForward
#[derive(Error, Debug)]
pub enum CoreError {
    /// C001: Configuration file not found
    #[error("[C001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// C002: Invalid configuration value
    #[error("[C002] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// C003: Script folder does not exist
    #[error("[C003] Script folder not found: {path}")]
    ScriptFolderNotFound { path: String },

    /// C004: Script path has no usable file name
    #[error("[C004] Invalid script file name: {path}")]
    InvalidScriptName { path: String },

    /// C005: Parameter name already present in the collection
    #[error("[C005] Duplicate parameter name: {name}")]
    DuplicateParameter { name: String },

    /// C006: Parameter name cannot be used as a placeholder
    #[error("[C006] Invalid parameter name '{name}': expected a letter or '_' followed by letters, digits or '_'")]
    InvalidParameterName { name: String },

    /// C007: Resolved value does not fit the declared parameter type
    #[error("[C007] Parameter '{name}' expects {expected}, resolver returned {found}")]
    ParameterType {
        name: String,
        expected: String,
        found: String,
    },

    /// C008: IO error with file path context
    #[error("[C008] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// C009: YAML parse error
    #[error("[C009] Config parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
