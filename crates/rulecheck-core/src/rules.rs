//! Rule descriptors and the rule execution configuration

use serde::{Deserialize, Serialize};

use crate::diagnostic::Severity;

/// Metadata for a rule loaded by a rule engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDescriptor {
    /// Stable, fully-qualified rule id
    pub id: String,

    /// One-line description
    pub short_description: String,

    /// Default severity of problems raised by the rule
    pub severity: Severity,

    /// Rule inspects source fragments, so it needs a script-backed model
    pub requires_script: bool,
}

/// Enablement entry for one rule id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleEnablement {
    pub rule_id: String,
    pub enabled: bool,
}

/// Which rules an analysis run executes
///
/// Immutable once built. With the allow-list flag set, only rules that
/// have an enabled entry run; every other rule is disabled. Without it,
/// every rule runs unless an entry disables it. Rule ids compare
/// case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleExecutionConfig {
    entries: Vec<RuleEnablement>,
    allow_list: bool,
}

impl RuleExecutionConfig {
    /// Enable exactly one rule and disable all others
    pub fn only(rule_id: impl Into<String>) -> Self {
        Self {
            entries: vec![RuleEnablement {
                rule_id: rule_id.into(),
                enabled: true,
            }],
            allow_list: true,
        }
    }

    /// Run every rule the engine loads
    pub fn all() -> Self {
        Self {
            entries: Vec::new(),
            allow_list: false,
        }
    }

    pub fn entries(&self) -> &[RuleEnablement] {
        &self.entries
    }

    pub fn is_allow_list(&self) -> bool {
        self.allow_list
    }

    /// Check if a rule id is enabled under this configuration
    pub fn is_enabled(&self, rule_id: &str) -> bool {
        let entry = self
            .entries
            .iter()
            .find(|e| e.rule_id.eq_ignore_ascii_case(rule_id));

        match entry {
            Some(e) => e.enabled,
            None => !self.allow_list,
        }
    }

    /// Ids with an explicit enabled entry
    pub fn enabled_rule_ids(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| e.enabled)
            .map(|e| e.rule_id.as_str())
    }
}

impl Default for RuleExecutionConfig {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_enables_single_rule() {
        let config = RuleExecutionConfig::only("RC.Naming.TablePrefix");
        assert!(config.is_allow_list());
        assert!(config.is_enabled("RC.Naming.TablePrefix"));
        assert!(config.is_enabled("rc.naming.tableprefix"));
        assert!(!config.is_enabled("RC.Design.SelectStar"));
        assert_eq!(config.enabled_rule_ids().collect::<Vec<_>>(), vec!["RC.Naming.TablePrefix"]);
        assert_eq!(config.entries().len(), 1);
    }

    #[test]
    fn all_enables_everything() {
        let config = RuleExecutionConfig::all();
        assert!(!config.is_allow_list());
        assert!(config.is_enabled("anything"));
        assert_eq!(config, RuleExecutionConfig::default());
    }
}
