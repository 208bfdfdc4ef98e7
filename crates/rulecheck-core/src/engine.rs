//! Capability traits for the model and rule engines
//!
//! The harness consumes engines purely through these traits. Reference
//! implementations live in `rulecheck-model` and `rulecheck-rules`; tests
//! inject their own.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::diagnostic::ValidationMessage;
use crate::problem::{AnalysisErrorRecord, AnalysisResult, ElementRef};
use crate::rules::{RuleDescriptor, RuleExecutionConfig};
use crate::script::{ModelOptions, ScriptUnit, TargetVersion};

static NEXT_MODEL_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique model instance identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModelId(pub u64);

impl ModelId {
    /// Allocate a fresh id
    pub fn next() -> Self {
        Self(NEXT_MODEL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "model#{}", self.0)
    }
}

/// How a package is turned back into a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadMode {
    /// Object metadata only, no source fragments
    MetadataOnly,

    /// Rebuilt from the packaged scripts; fragments available
    ScriptBacked,
}

/// One element of a compiled model, as seen by rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelObject {
    pub element: ElementRef,

    /// Logical source name of the script that last defined the object
    pub source_name: Option<String>,

    pub start_line: u32,
    pub start_column: u32,

    /// Source text of the defining statement (script-backed models only)
    pub fragment: Option<String>,

    /// Declared data type (columns only)
    pub data_type: Option<String>,

    /// Table declares a primary key
    pub has_primary_key: bool,
}

/// Errors raised by engine implementations
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Model build failed: {0}")]
    Build(String),

    #[error("Package error: {0}")]
    Package(String),

    #[error("Model {0} has already been released")]
    Released(ModelId),

    #[error("Rule engine error: {0}")]
    Rules(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Maps model element references to fully-qualified display names
pub trait DisplayNameResolver {
    fn display_name(&self, element: &ElementRef) -> String;
}

/// A compiled schema model
///
/// Models use interior mutability so they can be registered with a
/// resource tracker the moment they are created, before any script is
/// applied.
pub trait SchemaModel: DisplayNameResolver + Send + Sync {
    fn id(&self) -> ModelId;

    fn target_version(&self) -> TargetVersion;

    fn options(&self) -> &ModelOptions;

    /// Add or update the objects defined by `script`, tagged with `source_name`
    fn add_or_update_objects(&self, script: &str, source_name: &str) -> Result<(), EngineError>;

    /// Run structural validation
    fn validate(&self) -> Vec<ValidationMessage>;

    /// Snapshot of every element, in a stable order
    fn objects(&self) -> Vec<ModelObject>;

    /// Scripts applied so far, in application order
    fn scripts(&self) -> Vec<ScriptUnit>;

    /// Whether source fragments are available
    fn is_script_backed(&self) -> bool;

    /// Release the model's resources. Must be idempotent and must not panic.
    fn release(&self);

    fn is_released(&self) -> bool;
}

/// Creates, persists and reloads schema models
pub trait ModelEngine {
    /// Get the engine name
    fn name(&self) -> &'static str;

    /// Create an empty model
    fn create_model(
        &self,
        version: TargetVersion,
        options: &ModelOptions,
    ) -> Result<Arc<dyn SchemaModel>, EngineError>;

    /// Serialize a model into a package at `path`
    fn save_package(&self, model: &dyn SchemaModel, path: &Path) -> Result<(), EngineError>;

    /// Load a new model from the package at `path`
    fn load_package(&self, path: &Path, mode: LoadMode) -> Result<Arc<dyn SchemaModel>, EngineError>;
}

/// Builds analysis services for a platform version
pub trait RuleEngine {
    fn create_service(
        &self,
        version: TargetVersion,
        config: &RuleExecutionConfig,
    ) -> Result<Box<dyn AnalysisService>, EngineError>;
}

/// A configured analysis capability
pub trait AnalysisService {
    /// Every rule the engine discovered for this version, enabled or not
    fn loaded_rules(&self) -> Vec<RuleDescriptor>;

    /// Errors raised while loading rule definitions
    fn load_errors(&self) -> Vec<AnalysisErrorRecord>;

    /// Run the enabled rules against `model`
    fn analyze(&self, model: &dyn SchemaModel) -> Result<AnalysisResult, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_ids_are_unique() {
        let a = ModelId::next();
        let b = ModelId::next();
        assert_ne!(a, b);
        assert!(b > a);
        assert!(a.to_string().starts_with("model#"));
    }

    #[test]
    fn engine_error_messages() {
        let err = EngineError::Released(ModelId(7));
        assert_eq!(err.to_string(), "Model model#7 has already been released");
        let err = EngineError::Package("checksum mismatch".to_string());
        assert_eq!(err.to_string(), "Package error: checksum mismatch");
    }
}
