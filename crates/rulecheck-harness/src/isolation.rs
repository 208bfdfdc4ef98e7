//! Rule isolation: run exactly one rule, and make sure it exists

use rulecheck_core::{AnalysisService, RuleEngine, RuleExecutionConfig, TargetVersion};

use crate::aggregate::format_records;
use crate::error::HarnessError;

/// Analysis service restricted to a single rule
pub struct IsolatedRule {
    pub config: RuleExecutionConfig,
    pub service: Box<dyn AnalysisService>,
}

/// Build an allow-list configuration for `rule_id` and verify the engine
/// actually loaded that rule for `version`
///
/// Rule-definition load errors fail first, since they are the usual reason a
/// rule goes missing. A missing rule fails with its id in the message rather
/// than producing an empty report.
pub fn isolate_rule(
    engine: &dyn RuleEngine,
    version: TargetVersion,
    rule_id: &str,
) -> Result<IsolatedRule, HarnessError> {
    let rule_id = rule_id.trim();
    if rule_id.is_empty() {
        return Err(HarnessError::Argument("A rule id is required".to_string()));
    }

    let config = RuleExecutionConfig::only(rule_id);
    let service = engine.create_service(version, &config)?;

    let load_errors = service.load_errors();
    if !load_errors.is_empty() {
        return Err(HarnessError::RuleDiscovery(format!(
            "Rule definitions failed to load\n{}",
            format_records(&load_errors)
        )));
    }

    let loaded = service.loaded_rules();
    if !loaded.iter().any(|rule| rule.id.eq_ignore_ascii_case(rule_id)) {
        return Err(HarnessError::RuleDiscovery(format!(
            "Rule {} was not loaded for {} ({} rules available)",
            rule_id,
            version,
            loaded.len()
        )));
    }

    tracing::debug!(rule = rule_id, version = %version, "Rule isolated");
    Ok(IsolatedRule { config, service })
}
