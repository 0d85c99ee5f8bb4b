//! Extraction error types

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Errors the component manager can't degrade around
#[derive(Error, Debug, Diagnostic)]
pub enum ExtractError {
    #[error(transparent)]
    #[diagnostic(code(commodore::extract::config))]
    Core(#[from] commodore_core::CoreError),

    #[error(transparent)]
    #[diagnostic(code(commodore::extract::inventory))]
    Inventory(#[from] commodore_inventory::InventoryError),
}

pub type Result<T> = std::result::Result<T, ExtractError>;

/// A configuration document that isn't valid YAML
#[derive(Error, Debug, Diagnostic, Clone)]
#[error("Failed to parse {file_name}: {message}")]
#[diagnostic(code(commodore::extract::parse))]
pub struct DocumentParseError {
    pub file_name: String,

    pub message: String,

    #[source_code]
    pub src: NamedSource<String>,

    #[label("here")]
    pub span: Option<SourceSpan>,
}

impl DocumentParseError {
    pub fn from_yaml(err: &serde_yaml::Error, file_name: &str, content: &str) -> Self {
        let span = err
            .location()
            .map(|loc| SourceSpan::from((loc.index().min(content.len()), 1)));
        Self {
            file_name: file_name.to_string(),
            message: err.to_string(),
            src: NamedSource::new(file_name, content.to_string()),
            span,
        }
    }
}

/// Why a helm package file batch can't be processed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PackageFilesError {
    #[error("expected exactly two package files, got {count}")]
    WrongFileCount { count: usize },

    #[error("Component repository has no `class/defaults.ya?ml`")]
    NoDefaultsFile { files: Vec<String> },

    #[error("Unable to identify component name from package files")]
    NoComponentName { files: Vec<String> },
}
