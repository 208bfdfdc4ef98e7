//! Model construction from an ordered script list

use rulecheck_core::{ModelEngine, ModelOptions, SchemaModel, ScriptUnit, TargetVersion};
use std::sync::Arc;

use crate::error::HarnessError;
use crate::tracker::ResourceTracker;

/// Builds a schema model from scripts, in list order
///
/// A later script may redefine objects from an earlier one; the model keeps
/// the last definition. Scripts are never deduplicated.
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    scripts: Vec<ScriptUnit>,
    options: ModelOptions,
    version: TargetVersion,
}

impl ModelBuilder {
    pub fn new(version: TargetVersion) -> Self {
        Self {
            scripts: Vec::new(),
            options: ModelOptions::default(),
            version,
        }
    }

    pub fn with_options(mut self, options: ModelOptions) -> Self {
        self.options = options;
        self
    }

    pub fn add_script(&mut self, script: ScriptUnit) {
        self.scripts.push(script);
    }

    pub fn scripts(&self) -> &[ScriptUnit] {
        &self.scripts
    }

    pub fn options(&self) -> &ModelOptions {
        &self.options
    }

    pub fn version(&self) -> TargetVersion {
        self.version
    }

    pub fn set_version(&mut self, version: TargetVersion) {
        self.version = version;
    }

    /// Create the model, register it, then apply every script
    ///
    /// The model is tracked before the first script is applied, so a failing
    /// script still leaves it in the tracker's hands.
    pub fn build(
        &self,
        engine: &dyn ModelEngine,
        tracker: &mut ResourceTracker,
    ) -> Result<Arc<dyn SchemaModel>, HarnessError> {
        let model = tracker.register(engine.create_model(self.version, &self.options)?);

        for script in &self.scripts {
            tracing::debug!(source = %script.source_name, model = %model.id(), "Applying script");
            model.add_or_update_objects(&script.content, &script.source_name)?;
        }

        tracing::debug!(
            engine = engine.name(),
            model = %model.id(),
            scripts = self.scripts.len(),
            "Model built"
        );
        Ok(model)
    }
}
