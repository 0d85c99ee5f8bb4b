//! Commodore Inventory - external collaborators of the managers
//!
//! This crate wraps everything that leaves the process:
//!
//! - **Inventory rendering**: `commodore inventory show`, memoized per
//!   repository path and fact combination
//! - **Cluster registry**: Lieutenant API lookups of cluster facts
//! - **Global repositories**: one clone per URL per process
//!
//! ## Example
//!
//! ```rust,no_run
//! use commodore_core::Facts;
//! use commodore_inventory::{CommodoreRenderer, Inventory, RenderRequest};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let inventory = Inventory::new(Arc::new(CommodoreRenderer::default()), "/tmp/commodore-renovate");
//! let facts = Facts { distribution: Some("k3d".into()), ..Default::default() };
//!
//! let params = inventory
//!     .render_inventory(&RenderRequest {
//!         repo_path: Path::new("."),
//!         global_path: None,
//!         extra_values_file: None,
//!         facts: &facts,
//!     })
//!     .await;
//! println!("{} components", params.components.len());
//! # }
//! ```

pub mod cache;
pub mod error;
pub mod global_repo;
pub mod inventory;
pub mod lieutenant;
pub mod mock;
pub mod renderer;

// Re-exports for convenience
pub use cache::KeyedCache;
pub use error::{InventoryError, Result};
pub use global_repo::{GlobalRepoCache, load_global_repo_config};
pub use inventory::{Inventory, RenderRequest, key_digest, write_yaml_file};
pub use lieutenant::{ClusterInfo, GitRepoInfo, LieutenantClient, LieutenantError};
pub use mock::MockRenderer;
pub use renderer::{
    CommodoreRenderer, ComponentRef, InventoryRenderer, RenderArgs, RenderedParameters,
};
