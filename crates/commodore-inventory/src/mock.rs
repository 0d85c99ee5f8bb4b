//! Mock inventory renderer for testing
//!
//! Returns canned parameters without invoking any external command and
//! records every render it is asked to do.

use async_trait::async_trait;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{InventoryError, Result};
use crate::renderer::{InventoryRenderer, RenderArgs, RenderedParameters};

/// In-memory renderer for testing
#[derive(Clone, Default)]
pub struct MockRenderer {
    output: Arc<RwLock<RenderedParameters>>,
    failing: Arc<RwLock<bool>>,
    calls: Arc<RwLock<Vec<RenderArgs>>>,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renderer answering every call with `output`
    pub fn with_output(output: RenderedParameters) -> Self {
        let renderer = Self::new();
        renderer.set_output(output);
        renderer
    }

    pub fn set_output(&self, output: RenderedParameters) {
        *self.output.write().unwrap_or_else(PoisonError::into_inner) = output;
    }

    /// Make subsequent renders fail like a non-zero exit would
    pub fn set_failing(&self, failing: bool) {
        *self.failing.write().unwrap_or_else(PoisonError::into_inner) = failing;
    }

    /// Number of renders performed so far
    pub fn render_count(&self) -> usize {
        self.calls.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Arguments of every render, oldest first
    pub fn calls(&self) -> Vec<RenderArgs> {
        self.calls.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl InventoryRenderer for MockRenderer {
    async fn render(&self, args: &RenderArgs) -> Result<RenderedParameters> {
        self.calls
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(args.clone());

        if *self.failing.read().unwrap_or_else(PoisonError::into_inner) {
            return Err(InventoryError::RenderFailed {
                status: "exit status: 1".to_string(),
                stderr: "mock render failure".to_string(),
            });
        }

        Ok(self.output.read().unwrap_or_else(PoisonError::into_inner).clone())
    }
}
