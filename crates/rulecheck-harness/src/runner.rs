//! Single analysis pass

use rulecheck_core::{AnalysisResult, AnalysisService, SchemaModel};

use crate::error::HarnessError;

/// Run the service once against `model`. Never retried.
pub fn run_analysis(service: &dyn AnalysisService, model: &dyn SchemaModel) -> Result<AnalysisResult, HarnessError> {
    tracing::debug!(model = %model.id(), "Running analysis");
    let result = service.analyze(model)?;

    tracing::debug!(
        model = %model.id(),
        problems = result.problems.len(),
        analysis_errors = result.analysis_errors.len(),
        succeeded = result.analysis_succeeded,
        "Analysis complete"
    );
    Ok(result)
}
