//! Single-rule test harness

use rulecheck_core::{
    AnalysisResult, AnalysisTarget, ErrorSurfacing, HarnessConfig, ModelEngine, ModelOptions,
    RuleEngine, ScriptUnit, TargetVersion,
};
use std::path::PathBuf;
use std::sync::Arc;

use crate::aggregate::ErrorAggregator;
use crate::builder::ModelBuilder;
use crate::error::HarnessError;
use crate::isolation::isolate_rule;
use crate::report::render_problems;
use crate::round_trip::{require_package_path, PackageRoundTripper};
use crate::runner::run_analysis;
use crate::tracker::ResourceTracker;
use crate::validator::validate_model;

/// Report text and structured result of a successful run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: String,
    pub result: AnalysisResult,
}

/// Runs one analysis rule against a model built from scripts
///
/// Pipeline: build, validate, optionally round-trip through a package,
/// isolate the rule, analyze, fail on engine error records, render the
/// report. Every model created during a run is released when the run
/// ends, whatever the outcome.
///
/// A harness holds one tracker and is driven through `&mut self`, so one
/// instance runs one test at a time.
pub struct RuleTestHarness {
    model_engine: Arc<dyn ModelEngine>,
    rule_engine: Arc<dyn RuleEngine>,
    builder: ModelBuilder,
    analysis_target: AnalysisTarget,
    package_path: Option<PathBuf>,
    aggregator: ErrorAggregator,
    tracker: ResourceTracker,
}

impl RuleTestHarness {
    pub fn new(
        model_engine: Arc<dyn ModelEngine>,
        rule_engine: Arc<dyn RuleEngine>,
        version: TargetVersion,
    ) -> Self {
        Self {
            model_engine,
            rule_engine,
            builder: ModelBuilder::new(version),
            analysis_target: AnalysisTarget::default(),
            package_path: None,
            aggregator: ErrorAggregator::default(),
            tracker: ResourceTracker::new(),
        }
    }

    /// Create a harness from a loaded `rulecheck.toml`
    ///
    /// A relative package path is resolved against the config's directory.
    pub fn from_config(
        model_engine: Arc<dyn ModelEngine>,
        rule_engine: Arc<dyn RuleEngine>,
        config: &HarnessConfig,
    ) -> Self {
        let mut harness = Self::new(model_engine, rule_engine, config.target_version)
            .with_options(config.model.clone())
            .with_error_surfacing(config.errors.clone());
        harness.analysis_target = config.analysis_target;
        harness.package_path = config.package_path.as_deref().map(|p| config.resolve_path(p));
        harness
    }

    pub fn with_options(mut self, options: ModelOptions) -> Self {
        self.builder = self.builder.with_options(options);
        self
    }

    pub fn with_script(mut self, content: impl Into<String>, source_name: impl Into<String>) -> Self {
        self.builder.add_script(ScriptUnit::new(content, source_name));
        self
    }

    pub fn with_scripts(mut self, scripts: impl IntoIterator<Item = ScriptUnit>) -> Self {
        for script in scripts {
            self.builder.add_script(script);
        }
        self
    }

    pub fn with_error_surfacing(mut self, surfacing: ErrorSurfacing) -> Self {
        self.aggregator = ErrorAggregator::new(surfacing);
        self
    }

    pub fn add_script(&mut self, script: ScriptUnit) {
        self.builder.add_script(script);
    }

    pub fn scripts(&self) -> &[ScriptUnit] {
        self.builder.scripts()
    }

    pub fn analysis_target(&self) -> AnalysisTarget {
        self.analysis_target
    }

    pub fn set_analysis_target(&mut self, target: AnalysisTarget) {
        self.analysis_target = target;
    }

    pub fn package_path(&self) -> Option<&std::path::Path> {
        self.package_path.as_deref()
    }

    pub fn set_package_path(&mut self, path: impl Into<PathBuf>) {
        self.package_path = Some(path.into());
    }

    pub fn set_target_version(&mut self, version: TargetVersion) {
        self.builder.set_version(version);
    }

    /// Models created by the harness and not yet released
    pub fn open_models(&self) -> usize {
        self.tracker.open_count()
    }

    /// Run the pipeline for `rule_id` and hand the report to `verify`
    ///
    /// `verify` is only called when the pipeline completes; any failure is
    /// returned instead.
    pub fn run_test<F>(&mut self, rule_id: &str, verify: F) -> Result<(), HarnessError>
    where
        F: FnOnce(&str, &AnalysisResult),
    {
        let outcome = self.run(rule_id)?;
        verify(&outcome.report, &outcome.result);
        Ok(())
    }

    /// Run the pipeline for `rule_id`, returning the report and result
    pub fn run(&mut self, rule_id: &str) -> Result<RunOutcome, HarnessError> {
        let outcome = self.execute(rule_id);
        self.tracker.release_all();

        if let Err(err) = &outcome {
            tracing::debug!(rule = rule_id, error = %err, "Rule test failed");
        }
        outcome
    }

    /// Release every tracked model. Also happens on drop.
    pub fn close(&mut self) -> usize {
        self.tracker.release_all()
    }

    fn execute(&mut self, rule_id: &str) -> Result<RunOutcome, HarnessError> {
        let rule_id = rule_id.trim();
        if rule_id.is_empty() {
            return Err(HarnessError::Argument("A rule id is required".to_string()));
        }
        if self.analysis_target == AnalysisTarget::Package {
            require_package_path(self.package_path.as_deref())?;
        }

        let mut model = self.builder.build(self.model_engine.as_ref(), &mut self.tracker)?;
        validate_model(model.as_ref())?;

        if self.analysis_target == AnalysisTarget::Package {
            model = PackageRoundTripper::new(self.model_engine.as_ref()).round_trip(
                model,
                self.package_path.as_deref(),
                &mut self.tracker,
            )?;
        }

        let isolated = isolate_rule(self.rule_engine.as_ref(), model.target_version(), rule_id)?;
        let result = run_analysis(isolated.service.as_ref(), model.as_ref())?;
        self.aggregator.check(&result)?;

        let report = render_problems(&result.problems, model.as_ref());
        tracing::info!(
            rule = rule_id,
            target = %self.analysis_target,
            problems = result.problems.len(),
            suppressed = result.suppressed,
            "Rule test complete"
        );
        Ok(RunOutcome { report, result })
    }
}
