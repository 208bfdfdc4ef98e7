//! Harness failure taxonomy

use rulecheck_core::{EngineError, ValidationMessage};
use std::path::PathBuf;

/// Every way a harness run can fail. All of them end the run.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// A required input is missing or blank
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// The built model has Error-severity validation messages
    #[error("Model validation failed:\n{}", join_messages(.messages))]
    ModelValidation { messages: Vec<ValidationMessage> },

    /// The rule under test was not loaded, or rule definitions failed to load
    #[error("Rule discovery failed: {0}")]
    RuleDiscovery(String),

    /// The engine raised error records while analyzing
    #[error("{0}")]
    AnalysisExecution(String),

    /// A report differs from its stored baseline
    #[error("Report differs from baseline {} at line {line}:\n  expected: {expected}\n  actual:   {actual}", .path.display())]
    BaselineMismatch {
        path: PathBuf,
        line: usize,
        expected: String,
        actual: String,
    },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl HarnessError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn join_messages(messages: &[ValidationMessage]) -> String {
    messages
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
