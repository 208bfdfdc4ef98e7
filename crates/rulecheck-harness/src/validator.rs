//! Validation gating

use rulecheck_core::{SchemaModel, Severity, ValidationMessage};

use crate::error::HarnessError;

/// Validate a model, failing on any Error-severity message
///
/// The failure carries every message, not just the errors, so one run is
/// enough to diagnose the scripts. Warnings and infos are logged and
/// returned.
pub fn validate_model(model: &dyn SchemaModel) -> Result<Vec<ValidationMessage>, HarnessError> {
    let messages = model.validate();

    if messages.iter().any(ValidationMessage::is_error) {
        return Err(HarnessError::ModelValidation { messages });
    }

    for message in &messages {
        match message.severity {
            Severity::Warning => tracing::warn!(model = %model.id(), "{}", message),
            _ => tracing::info!(model = %model.id(), "{}", message),
        }
    }

    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulecheck_core::{ModelOptions, TargetVersion};
    use rulecheck_model::ScriptModel;

    fn model(sql: &str) -> ScriptModel {
        let model = ScriptModel::new(TargetVersion::Sql2022, ModelOptions::default());
        model.add_or_update_objects(sql, "v.sql").unwrap();
        model
    }

    #[test]
    fn warnings_pass() {
        let messages = validate_model(&model("CREATE TABLE other.t (Id INT);")).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].severity, Severity::Warning);
    }

    #[test]
    fn errors_fail_with_all_messages() {
        let model = model("CREATE TABLE other.t (Id INT, Id INT);");
        match validate_model(&model) {
            Err(HarnessError::ModelValidation { messages }) => {
                assert!(messages.iter().any(|m| m.severity == Severity::Error));
                assert!(messages.iter().any(|m| m.severity == Severity::Warning));
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }
}
