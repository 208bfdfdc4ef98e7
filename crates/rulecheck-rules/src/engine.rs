//! [`RuleEngine`] implementation backed by a [`RuleCatalog`]

use rulecheck_core::{
    AnalysisErrorRecord, AnalysisPhase, AnalysisProblem, AnalysisResult, AnalysisService,
    ElementRef, EngineError, ModelObject, ObjectKind, RuleDescriptor, RuleEngine,
    RuleExecutionConfig, SchemaModel, TargetVersion,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::catalog::RuleCatalog;
use crate::rule::{Rule, RuleContext};

const DISABLE_DIRECTIVE: &str = "rulecheck:disable";

/// Rule engine over a fixed catalog
pub struct CatalogRuleEngine {
    catalog: RuleCatalog,
}

impl CatalogRuleEngine {
    pub fn new(catalog: RuleCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }
}

impl Default for CatalogRuleEngine {
    fn default() -> Self {
        Self::new(RuleCatalog::builtin())
    }
}

impl RuleEngine for CatalogRuleEngine {
    fn create_service(
        &self,
        version: TargetVersion,
        config: &RuleExecutionConfig,
    ) -> Result<Box<dyn AnalysisService>, EngineError> {
        let rules = self.catalog.rules_for(version);
        tracing::debug!(version = %version, rules = rules.len(), "Created analysis service");

        Ok(Box::new(CatalogService {
            rules,
            known_ids: self.catalog.rule_ids(),
            config: config.clone(),
            load_errors: self.catalog.load_errors().to_vec(),
        }))
    }
}

struct CatalogService {
    rules: Vec<Arc<dyn Rule>>,
    /// Every catalog id; directives may name rules ineligible for the version
    known_ids: Vec<String>,
    config: RuleExecutionConfig,
    load_errors: Vec<AnalysisErrorRecord>,
}

impl AnalysisService for CatalogService {
    fn loaded_rules(&self) -> Vec<RuleDescriptor> {
        self.rules.iter().map(|r| r.descriptor().clone()).collect()
    }

    fn load_errors(&self) -> Vec<AnalysisErrorRecord> {
        self.load_errors.clone()
    }

    fn analyze(&self, model: &dyn SchemaModel) -> Result<AnalysisResult, EngineError> {
        if model.is_released() {
            return Err(EngineError::Released(model.id()));
        }

        let objects = model.objects();
        let ctx = RuleContext::new(model, &objects);
        let mut result = AnalysisResult::default();

        let mut runnable = Vec::new();
        for rule in self.rules.iter().filter(|r| self.config.is_enabled(&r.descriptor().id)) {
            if rule.descriptor().requires_script && !model.is_script_backed() {
                result.initialization_errors.push(AnalysisErrorRecord::new(
                    AnalysisPhase::Initialization,
                    format!(
                        "Rule {} requires a script-backed model; source fragments are unavailable",
                        rule.descriptor().id
                    ),
                ));
                continue;
            }
            runnable.push(rule);
        }

        let suppressions = collect_suppressions(&objects, &self.known_ids, &mut result.suppression_errors);

        for rule in runnable {
            let descriptor = rule.descriptor();
            for object in objects.iter().filter(|o| rule.applies_to(o)) {
                match rule.check(&ctx, object) {
                    Ok(Some(description)) => {
                        if is_suppressed(&suppressions, object, &descriptor.id) {
                            result.suppressed += 1;
                            continue;
                        }
                        result.problems.push(AnalysisProblem {
                            description,
                            rule_id: descriptor.id.clone(),
                            severity: descriptor.severity,
                            element: object.element.clone(),
                            source_name: object.source_name.clone(),
                            start_line: object.start_line,
                            start_column: object.start_column,
                        });
                    }
                    Ok(None) => {}
                    Err(err) => {
                        let mut record = AnalysisErrorRecord::new(
                            AnalysisPhase::Analysis,
                            format!(
                                "Rule {} failed on {}: {}",
                                descriptor.id,
                                model.display_name(&object.element),
                                err
                            ),
                        );
                        if let Some(source) = &object.source_name {
                            record = record.at(source.clone(), object.start_line, object.start_column);
                        }
                        result.analysis_errors.push(record);
                    }
                }
            }
        }

        result.analysis_succeeded = result.initialization_errors.is_empty()
            && result.analysis_errors.is_empty()
            && result.suppression_errors.is_empty();

        tracing::debug!(
            model = %model.id(),
            problems = result.problems.len(),
            suppressed = result.suppressed,
            "Analysis finished"
        );
        Ok(result)
    }
}

/// Object whose statement carries directives for `element`
fn owner_key(element: &ElementRef) -> String {
    match element.kind {
        ObjectKind::Column if element.parts.len() > 2 => {
            ElementRef::new(ObjectKind::Table, element.parts[..element.parts.len() - 1].to_vec())
                .identity_key()
        }
        _ => element.identity_key(),
    }
}

fn is_suppressed(suppressions: &BTreeMap<String, BTreeSet<String>>, object: &ModelObject, rule_id: &str) -> bool {
    suppressions
        .get(&owner_key(&object.element))
        .map_or(false, |ids| ids.contains(&rule_id.to_lowercase()))
}

/// Read `-- rulecheck:disable` directives from statement fragments
///
/// Columns share their table's fragment, so only non-column objects are
/// scanned. A fragment runs through a line comment that follows its `;`. Unknown rule ids become suppression-phase error records.
fn collect_suppressions(
    objects: &[ModelObject],
    known: &[String],
    errors: &mut Vec<AnalysisErrorRecord>,
) -> BTreeMap<String, BTreeSet<String>> {
    let mut suppressions: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for object in objects.iter().filter(|o| o.element.kind != ObjectKind::Column) {
        let Some(fragment) = object.fragment.as_deref() else {
            continue;
        };

        for (index, line) in fragment.lines().enumerate() {
            let Some(comment_at) = line.find("--") else {
                continue;
            };
            let comment = &line[comment_at..];
            let Some(directive_at) = comment.find(DISABLE_DIRECTIVE) else {
                continue;
            };

            let ids = comment[directive_at + DISABLE_DIRECTIVE.len()..]
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|id| !id.is_empty());

            for id in ids {
                if known.iter().any(|k| k.eq_ignore_ascii_case(id)) {
                    suppressions
                        .entry(owner_key(&object.element))
                        .or_default()
                        .insert(id.to_lowercase());
                    continue;
                }

                let line_no = object.start_line + index as u32;
                let column = if index == 0 {
                    object.start_column + comment_at as u32
                } else {
                    comment_at as u32 + 1
                };
                let mut record = AnalysisErrorRecord::new(
                    AnalysisPhase::Suppression,
                    format!("Suppression directive refers to unknown rule {}", id),
                );
                if let Some(source) = &object.source_name {
                    record = record.at(source.clone(), line_no, column);
                }
                errors.push(record);
            }
        }
    }

    suppressions
}
