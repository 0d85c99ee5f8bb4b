//! Commodore Core - Core types for the commodore-renovate managers
//!
//! This crate provides the foundational types shared by the managers:
//! - `Facts`: distribution/cloud/region classification derived from file paths
//! - `Values`: layered configuration trees with deep merge support
//! - `ManagerConfig` / `ExtraConfig`: per-repository configuration
//! - `PackageDependency`: the normalized dependency record

pub mod config;
pub mod dependency;
pub mod error;
pub mod facts;
pub mod values;

pub use config::{ExtraConfig, ImageScan, ManagerConfig};
pub use dependency::{Datasource, PackageDependency, PackageFile, SkipReason, Versioning};
pub use error::{CoreError, Result};
pub use facts::{FactPatterns, Facts, parse_file_name};
pub use values::{Values, merge_config, scalar_string};
