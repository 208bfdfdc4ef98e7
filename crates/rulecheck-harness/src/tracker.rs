//! Scoped registry of model instances
//!
//! Every model the harness creates is registered here the moment it exists.
//! The tracker is the only component allowed to release a registered model;
//! it does so exactly once, on `release`, `release_all` or drop.

use rulecheck_core::{ModelId, SchemaModel};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

#[derive(Default)]
pub struct ResourceTracker {
    models: Vec<Arc<dyn SchemaModel>>,
}

impl ResourceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a model. Registering the same instance twice is a no-op.
    pub fn register(&mut self, model: Arc<dyn SchemaModel>) -> Arc<dyn SchemaModel> {
        if !self.models.iter().any(|m| m.id() == model.id()) {
            tracing::debug!(model = %model.id(), "Tracking model");
            self.models.push(Arc::clone(&model));
        }
        model
    }

    /// Release one tracked model. Returns false if it was not tracked.
    pub fn release(&mut self, id: ModelId) -> bool {
        match self.models.iter().position(|m| m.id() == id) {
            Some(index) => {
                let model = self.models.remove(index);
                release_quietly(model.as_ref());
                true
            }
            None => false,
        }
    }

    /// Release every tracked model, returning how many were released
    pub fn release_all(&mut self) -> usize {
        let models = std::mem::take(&mut self.models);
        let count = models.len();
        for model in &models {
            release_quietly(model.as_ref());
        }
        if count > 0 {
            tracing::debug!(count, "Released tracked models");
        }
        count
    }

    /// Number of models still awaiting release
    pub fn open_count(&self) -> usize {
        self.models.len()
    }

    pub fn is_tracked(&self, id: ModelId) -> bool {
        self.models.iter().any(|m| m.id() == id)
    }
}

impl Drop for ResourceTracker {
    fn drop(&mut self) {
        self.release_all();
    }
}

/// Release a model, logging instead of propagating a panic
fn release_quietly(model: &dyn SchemaModel) {
    let id = model.id();
    if catch_unwind(AssertUnwindSafe(|| model.release())).is_err() {
        tracing::warn!(model = %id, "Model release panicked; continuing teardown");
    }
}
