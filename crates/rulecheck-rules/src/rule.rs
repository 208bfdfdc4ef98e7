//! Rule trait

use rulecheck_core::{ModelObject, RuleDescriptor, SchemaModel, TargetVersion};

/// What a rule sees while it runs
pub struct RuleContext<'a> {
    pub model: &'a dyn SchemaModel,

    /// Snapshot of every model object, in model order
    pub objects: &'a [ModelObject],
}

impl<'a> RuleContext<'a> {
    pub fn new(model: &'a dyn SchemaModel, objects: &'a [ModelObject]) -> Self {
        Self { model, objects }
    }

    /// Display name of an object, resolved through the model
    pub fn display_name(&self, object: &ModelObject) -> String {
        self.model.display_name(&object.element)
    }
}

/// A rule failed to evaluate an object
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct RuleError(pub String);

/// A unit of analysis logic
///
/// Rules are evaluated once per applicable object. Returning `Some` reports
/// a problem with the given description at the object's position.
pub trait Rule: Send + Sync {
    fn descriptor(&self) -> &RuleDescriptor;

    /// Whether the rule is loaded for a platform version
    fn supports(&self, _version: TargetVersion) -> bool {
        true
    }

    fn applies_to(&self, object: &ModelObject) -> bool;

    fn check(&self, ctx: &RuleContext<'_>, object: &ModelObject) -> Result<Option<String>, RuleError>;
}
