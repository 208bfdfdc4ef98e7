//! Error record aggregation

use rulecheck_core::{AnalysisErrorRecord, AnalysisPhase, AnalysisResult, ErrorSurfacing};

use crate::error::HarnessError;

/// Header line of an aggregated error report
pub const ERRORS_HEADER: &str = "Errors found:";

/// Turns engine error records into a single fatal failure
#[derive(Debug, Clone, Default)]
pub struct ErrorAggregator {
    surfacing: ErrorSurfacing,
}

impl ErrorAggregator {
    pub fn new(surfacing: ErrorSurfacing) -> Self {
        Self { surfacing }
    }

    /// Records from every surfaced phase, in phase order
    pub fn collect<'r>(&self, result: &'r AnalysisResult) -> Vec<&'r AnalysisErrorRecord> {
        AnalysisPhase::ALL
            .iter()
            .filter(|phase| self.surfacing.surfaces(**phase))
            .flat_map(|phase| result.errors_for(*phase))
            .collect()
    }

    /// Fail if any surfaced phase recorded an error
    pub fn check(&self, result: &AnalysisResult) -> Result<(), HarnessError> {
        let records = self.collect(result);
        if records.is_empty() {
            return Ok(());
        }
        Err(HarnessError::AnalysisExecution(format_records(records)))
    }
}

/// `<document>(<line>, <column>): <message>`, or the bare message without a document
///
/// A missing line or column prints as 0.
pub fn format_record(record: &AnalysisErrorRecord) -> String {
    match &record.document {
        Some(document) => format!(
            "{}({}, {}): {}",
            document,
            record.line.unwrap_or(0),
            record.column.unwrap_or(0),
            record.message
        ),
        None => record.message.clone(),
    }
}

/// Join formatted records under the `Errors found:` header
pub fn format_records<'r>(records: impl IntoIterator<Item = &'r AnalysisErrorRecord>) -> String {
    let mut text = String::from(ERRORS_HEADER);
    for record in records {
        text.push('\n');
        text.push_str(&format_record(record));
    }
    text
}
