//! [`ModelEngine`] implementation backed by [`ScriptModel`]

use rulecheck_core::{EngineError, LoadMode, ModelEngine, ModelOptions, SchemaModel, TargetVersion};
use std::path::Path;
use std::sync::Arc;

use crate::model::ScriptModel;
use crate::package::Package;

/// Builds [`ScriptModel`]s and persists them as JSON packages
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptModelEngine;

impl ScriptModelEngine {
    pub fn new() -> Self {
        Self
    }
}

impl ModelEngine for ScriptModelEngine {
    fn name(&self) -> &'static str {
        "script"
    }

    fn create_model(
        &self,
        version: TargetVersion,
        options: &ModelOptions,
    ) -> Result<Arc<dyn SchemaModel>, EngineError> {
        let model = ScriptModel::new(version, options.clone());
        tracing::debug!(model = %model.id(), version = %version, "Created model");
        Ok(Arc::new(model))
    }

    fn save_package(&self, model: &dyn SchemaModel, path: &Path) -> Result<(), EngineError> {
        if model.is_released() {
            return Err(EngineError::Released(model.id()));
        }

        let package = Package::from_model(model)?;
        package.save_to_file(path)?;
        tracing::debug!(model = %model.id(), path = %path.display(), "Saved package");
        Ok(())
    }

    fn load_package(&self, path: &Path, mode: LoadMode) -> Result<Arc<dyn SchemaModel>, EngineError> {
        let package = Package::from_file(path)?;
        let version = package.header.target_version;
        let options = package.header.options;

        let model = match mode {
            LoadMode::MetadataOnly => ScriptModel::metadata_only(version, options, package.body.objects),
            LoadMode::ScriptBacked => {
                let model = ScriptModel::new(version, options);
                for script in &package.body.scripts {
                    model.add_or_update_objects(&script.content, &script.source_name)?;
                }
                model
            }
        };

        tracing::debug!(
            model = %model.id(),
            path = %path.display(),
            mode = ?mode,
            objects = model.object_count(),
            "Loaded package"
        );
        Ok(Arc::new(model))
    }
}
