//! Error types for inventory operations

use thiserror::Error;

/// Inventory operation errors
#[derive(Debug, Error)]
pub enum InventoryError {
    // ============ Rendering Errors ============
    #[error("Inventory rendering failed with {status}: {stderr}")]
    RenderFailed { status: String, stderr: String },

    #[error("Failed to start renderer `{command}`: {source}")]
    RenderSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid renderer output: {message}")]
    InvalidRenderOutput { message: String },

    // ============ Repository Errors ============
    #[error("Failed to clone {url}: {message}")]
    CloneFailed { url: String, message: String },

    #[error("Invalid repository URL: {url} - {reason}")]
    InvalidRepositoryUrl { url: String, reason: String },

    // ============ IO Errors ============
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Core(#[from] commodore_core::CoreError),
}

/// Result type for inventory operations
pub type Result<T> = std::result::Result<T, InventoryError>;

impl From<serde_yaml::Error> for InventoryError {
    fn from(e: serde_yaml::Error) -> Self {
        InventoryError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for InventoryError {
    fn from(e: serde_json::Error) -> Self {
        InventoryError::Serialization(e.to_string())
    }
}
