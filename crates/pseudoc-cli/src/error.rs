//! Error handling module for the pseudoc CLI.
//!
//! This module provides custom error types using `thiserror` for structured
//! error handling throughout the application.

use thiserror::Error;

/// Main error type for the pseudoc CLI application.
#[derive(Error, Debug)]
pub enum CliError {
    /// Error when a required configuration is missing or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error when file operations fail.
    #[error("File operation failed: {0}")]
    FileOperation(String),

    /// A lex/parse/type/runtime error surfaced by the compiler facade.
    #[error(transparent)]
    Compile(#[from] pseudoc_drv::CompileError),

    /// Error when IO operations fail.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error when JSON serialization fails (`--format json`).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// `spec.md` §6's process exit codes: 0 success, 1 LexError, 2
    /// ParseError, 3 TypeError, 4 RuntimeError; anything else from the CLI
    /// itself (bad config, missing file) is 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Compile(e) => e.exit_code(),
            _ => 1,
        }
    }
}

/// Result type alias using CliError.
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = CliError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");
    }

    #[test]
    fn file_operation_error_display() {
        let err = CliError::FileOperation("permission denied".to_string());
        assert_eq!(err.to_string(), "File operation failed: permission denied");
    }

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err: CliError = io_err.into();
        assert!(matches!(cli_err, CliError::Io(_)));
        assert_eq!(cli_err.exit_code(), 1);
    }

    #[test]
    fn json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let cli_err: CliError = json_err.into();
        assert!(matches!(cli_err, CliError::Json(_)));
    }

    #[test]
    fn compile_error_exit_code_passes_through() {
        let compile_err = pseudoc_drv::compile("DECLARE X : INTEGER\nX <- 1 @ 2\n", true).unwrap_err();
        let cli_err: CliError = compile_err.into();
        assert_eq!(cli_err.exit_code(), 1);
    }
}
