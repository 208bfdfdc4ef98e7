//! Rule catalog: every rule the engine can load, plus load errors

use rulecheck_core::{AnalysisErrorRecord, AnalysisPhase, TargetVersion};
use std::path::Path;
use std::sync::Arc;

use crate::builtin::builtin_rules;
use crate::definitions::{load_definitions_dir, parse_definitions};
use crate::rule::Rule;

/// Collection of rules available to analysis services
///
/// Rule ids are unique (case-insensitive); a second rule with a taken id is
/// rejected and recorded as a load error.
pub struct RuleCatalog {
    rules: Vec<Arc<dyn Rule>>,
    load_errors: Vec<AnalysisErrorRecord>,
}

impl RuleCatalog {
    /// Create an empty catalog
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            load_errors: Vec::new(),
        }
    }

    /// Catalog holding the built-in rules
    pub fn builtin() -> Self {
        let mut catalog = Self::empty();
        for rule in builtin_rules() {
            catalog.register(rule);
        }
        catalog
    }

    /// Add a rule, returning false if its id is already taken
    pub fn register(&mut self, rule: Arc<dyn Rule>) -> bool {
        let id = rule.descriptor().id.clone();
        if self.find(&id).is_some() {
            self.load_errors.push(AnalysisErrorRecord::new(
                AnalysisPhase::Initialization,
                format!("Duplicate rule id {}", id),
            ));
            return false;
        }
        self.rules.push(rule);
        true
    }

    /// Load pattern rules from a definition file's text
    pub fn load_definitions_str(&mut self, text: &str, document: &str) {
        let (rules, errors) = parse_definitions(text, document);
        self.absorb(rules, errors);
    }

    /// Load pattern rules from every `*.toml` file under `dir`
    pub fn load_definitions_dir(&mut self, dir: &Path) {
        let (rules, errors) = load_definitions_dir(dir);
        self.absorb(rules, errors);
    }

    fn absorb(&mut self, rules: Vec<crate::definitions::PatternRule>, errors: Vec<AnalysisErrorRecord>) {
        self.load_errors.extend(errors);
        for rule in rules {
            self.register(Arc::new(rule));
        }
    }

    /// Look up a rule by id (case-insensitive)
    pub fn find(&self, id: &str) -> Option<&Arc<dyn Rule>> {
        self.rules
            .iter()
            .find(|r| r.descriptor().id.eq_ignore_ascii_case(id))
    }

    /// Rules loaded for a platform version, in catalog order
    pub fn rules_for(&self, version: TargetVersion) -> Vec<Arc<dyn Rule>> {
        self.rules
            .iter()
            .filter(|r| r.supports(version))
            .cloned()
            .collect()
    }

    /// Ids of every rule in the catalog, whatever its eligibility
    pub fn rule_ids(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.descriptor().id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn load_errors(&self) -> &[AnalysisErrorRecord] {
        &self.load_errors
    }
}

impl Default for RuleCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
