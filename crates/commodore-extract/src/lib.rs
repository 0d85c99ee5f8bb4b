//! Commodore Extract - dependency managers for Commodore configuration
//!
//! Three managers turn configuration hierarchies into dependency records:
//! - [`images`]: container images declared in parameters
//! - [`helm`]: Helm charts of a component repository
//! - [`components`]: components and packages, resolved through the
//!   rendered inventory

pub mod components;
pub mod document;
pub mod error;
pub mod helm;
pub mod images;

pub use components::{ComponentManager, DeclarationKind, extract_dependencies};
pub use document::{load_parameters, parse_document};
pub use error::{DocumentParseError, ExtractError, PackageFilesError, Result};
pub use helm::{SourceFile, UpgradeConfig, extract_all_package_files, handle_oci_chart};
