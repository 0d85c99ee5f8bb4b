//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps errors to appropriate exit codes.

use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Invalid command line input
    #[error("{message}")]
    #[diagnostic(code(commodore_renovate::cli::usage))]
    Usage {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Manager configuration could not be loaded or is invalid
    #[error("Configuration error: {message}")]
    #[diagnostic(code(commodore_renovate::cli::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// A manager failed on its input
    #[error("Extraction failed: {message}")]
    #[diagnostic(code(commodore_renovate::cli::extract))]
    Extract { message: String },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(commodore_renovate::cli::io))]
    Io { message: String },

    /// Internal error (runtime, unexpected failure)
    #[error("Internal error: {message}")]
    #[diagnostic(code(commodore_renovate::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage { .. } => exit_codes::USAGE_ERROR,
            CliError::Config { .. } => exit_codes::CONFIG_ERROR,
            CliError::Extract { .. } => exit_codes::EXTRACT_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    pub fn usage_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create an IO error for `path`
    pub fn io(path: &std::path::Path, err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{}: {}", path.display(), err),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<commodore_core::CoreError> for CliError {
    fn from(err: commodore_core::CoreError) -> Self {
        CliError::Config {
            message: err.to_string(),
            help: Some("check the manager configuration and the extra config file".to_string()),
        }
    }
}

impl From<commodore_extract::ExtractError> for CliError {
    fn from(err: commodore_extract::ExtractError) -> Self {
        match err {
            commodore_extract::ExtractError::Core(e) => e.into(),
            other => CliError::Extract {
                message: other.to_string(),
            },
        }
    }
}

impl From<commodore_extract::PackageFilesError> for CliError {
    fn from(err: commodore_extract::PackageFilesError) -> Self {
        CliError::usage_with_help(
            err.to_string(),
            "pass the component's `class/defaults.yml` and `class/<component>.yml`",
        )
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            CliError::usage_with_help("x", "y").exit_code(),
            exit_codes::USAGE_ERROR
        );
        let io = CliError::io(std::path::Path::new("f.yml"), std::io::ErrorKind::NotFound.into());
        assert_eq!(io.exit_code(), exit_codes::IO_ERROR);
        assert_eq!(CliError::internal("x").exit_code(), exit_codes::ERROR);
        assert_ne!(exit_codes::SUCCESS, exit_codes::ERROR);
    }

    #[test]
    fn test_package_files_error_is_usage() {
        let err: CliError = commodore_extract::PackageFilesError::WrongFileCount { count: 1 }.into();
        assert_eq!(err.exit_code(), exit_codes::USAGE_ERROR);
        assert_eq!(err.to_string(), "expected exactly two package files, got 1");
    }

    #[test]
    fn test_core_error_is_config() {
        let err: CliError = commodore_core::CoreError::InvalidConfig {
            message: "bad".to_string(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_codes::CONFIG_ERROR);
    }
}
