//! Package round trip: persist a model and analyze the reloaded copy

use rulecheck_core::{LoadMode, ModelEngine, SchemaModel};
use std::path::Path;
use std::sync::Arc;

use crate::error::HarnessError;
use crate::tracker::ResourceTracker;

pub struct PackageRoundTripper<'a> {
    engine: &'a dyn ModelEngine,
}

impl<'a> PackageRoundTripper<'a> {
    pub fn new(engine: &'a dyn ModelEngine) -> Self {
        Self { engine }
    }

    /// Save `model` to `path` and return a script-backed reload
    ///
    /// An existing file at `path` is replaced and missing parent directories
    /// are created. Once the reload is registered, the original model is
    /// released through the tracker.
    pub fn round_trip(
        &self,
        model: Arc<dyn SchemaModel>,
        path: Option<&Path>,
        tracker: &mut ResourceTracker,
    ) -> Result<Arc<dyn SchemaModel>, HarnessError> {
        let path = require_package_path(path)?;

        if path.exists() {
            std::fs::remove_file(path).map_err(|e| HarnessError::io(path, e))?;
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| HarnessError::io(parent, e))?;
        }

        self.engine.save_package(model.as_ref(), path)?;
        tracing::debug!(model = %model.id(), path = %path.display(), "Saved package");

        // Fragment-based rules need a script-backed load.
        let reloaded = tracker.register(self.engine.load_package(path, LoadMode::ScriptBacked)?);
        tracker.release(model.id());

        tracing::debug!(from = %model.id(), to = %reloaded.id(), "Reloaded model from package");
        Ok(reloaded)
    }
}

/// Reject an unset or blank package path
pub fn require_package_path(path: Option<&Path>) -> Result<&Path, HarnessError> {
    match path {
        Some(path) if !path.to_string_lossy().trim().is_empty() => Ok(path),
        _ => Err(HarnessError::Argument(
            "A package path is required when analyzing the package model".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulecheck_core::{ModelOptions, TargetVersion};
    use rulecheck_model::ScriptModelEngine;

    fn built(engine: &ScriptModelEngine, tracker: &mut ResourceTracker) -> Arc<dyn SchemaModel> {
        let model = tracker.register(
            engine
                .create_model(TargetVersion::Sql2022, &ModelOptions::default())
                .unwrap(),
        );
        model
            .add_or_update_objects("CREATE TABLE t (Id INT PRIMARY KEY);", "t.sql")
            .unwrap();
        model
    }

    #[test]
    fn round_trip_replaces_model() {
        let engine = ScriptModelEngine::new();
        let mut tracker = ResourceTracker::new();
        let original = built(&engine, &mut tracker);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/model.rcpkg");

        let reloaded = PackageRoundTripper::new(&engine)
            .round_trip(Arc::clone(&original), Some(&path), &mut tracker)
            .unwrap();

        assert!(path.exists());
        assert!(original.is_released());
        assert!(!tracker.is_tracked(original.id()));
        assert!(tracker.is_tracked(reloaded.id()));
        assert_eq!(tracker.open_count(), 1);
        assert!(reloaded.is_script_backed());
        assert_eq!(reloaded.objects().len(), 2);
    }

    #[test]
    fn existing_package_is_replaced() {
        let engine = ScriptModelEngine::new();
        let mut tracker = ResourceTracker::new();
        let original = built(&engine, &mut tracker);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.rcpkg");
        std::fs::write(&path, "stale").unwrap();

        PackageRoundTripper::new(&engine)
            .round_trip(original, Some(&path), &mut tracker)
            .unwrap();
        assert_ne!(std::fs::read_to_string(&path).unwrap(), "stale");
    }

    #[test]
    fn blank_path_is_argument_error() {
        let engine = ScriptModelEngine::new();
        let mut tracker = ResourceTracker::new();
        let original = built(&engine, &mut tracker);

        for path in [None, Some(Path::new("")), Some(Path::new("   "))] {
            let err = PackageRoundTripper::new(&engine)
                .round_trip(Arc::clone(&original), path, &mut tracker)
                .err()
                .unwrap();
            assert!(matches!(err, HarnessError::Argument(_)));
        }
        assert!(!original.is_released());
    }
}
