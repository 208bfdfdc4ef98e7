//! Analysis output: problems found by rules and errors raised by the engine

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::diagnostic::Severity;

/// Kind of a model element
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Schema,
    Table,
    Column,
    View,
    Index,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::Table => "table",
            Self::Column => "column",
            Self::View => "view",
            Self::Index => "index",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Internal reference to a model element
///
/// `parts` holds the name from the outermost container inwards, e.g.
/// `["dbo", "users", "id"]` for a column. Turning a reference into a
/// human-readable name is the model's job (see `DisplayNameResolver`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElementRef {
    pub kind: ObjectKind,
    pub parts: Vec<String>,
}

impl ElementRef {
    pub fn new(kind: ObjectKind, parts: Vec<String>) -> Self {
        Self { kind, parts }
    }

    /// Innermost name part
    pub fn name(&self) -> &str {
        self.parts.last().map(String::as_str).unwrap_or("")
    }

    /// Case-insensitive identity key, used to match redefinitions
    ///
    /// Parts containing `.` are bracketed so `[t].[x.a]` and `[t.x].[a]`
    /// stay distinct.
    pub fn identity_key(&self) -> String {
        let joined = self
            .parts
            .iter()
            .map(|p| {
                let lower = p.to_lowercase();
                if lower.contains('.') || lower.contains('[') {
                    format!("[{}]", lower.replace(']', "]]"))
                } else {
                    lower
                }
            })
            .collect::<Vec<_>>()
            .join(".");
        format!("{}:{}", self.kind, joined)
    }
}

/// A single violation reported by a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisProblem {
    /// Human-readable description
    pub description: String,

    /// Fully-qualified rule id
    pub rule_id: String,

    /// Severity assigned by the rule
    pub severity: Severity,

    /// Offending model element
    pub element: ElementRef,

    /// Logical source name of the defining script, when known
    pub source_name: Option<String>,

    /// Start line (1-indexed)
    pub start_line: u32,

    /// Start column (1-indexed)
    pub start_column: u32,
}

/// Phase of an analysis run that raised an error record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisPhase {
    Initialization,
    Analysis,
    Suppression,
}

impl AnalysisPhase {
    pub const ALL: [AnalysisPhase; 3] = [Self::Initialization, Self::Analysis, Self::Suppression];
}

impl std::fmt::Display for AnalysisPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialization => write!(f, "initialization"),
            Self::Analysis => write!(f, "analysis"),
            Self::Suppression => write!(f, "suppression"),
        }
    }
}

/// An error raised by the engine itself (not a rule finding)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisErrorRecord {
    pub document: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub message: String,
    pub phase: AnalysisPhase,
}

impl AnalysisErrorRecord {
    /// Create a record with no source position
    pub fn new(phase: AnalysisPhase, message: impl Into<String>) -> Self {
        Self {
            document: None,
            line: None,
            column: None,
            message: message.into(),
            phase,
        }
    }

    /// Attach a document position
    pub fn at(mut self, document: impl Into<String>, line: u32, column: u32) -> Self {
        self.document = Some(document.into());
        self.line = Some(line);
        self.column = Some(column);
        self
    }
}

/// Result of one analysis run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Problems found by enabled rules, in engine order
    pub problems: Vec<AnalysisProblem>,

    pub initialization_errors: Vec<AnalysisErrorRecord>,
    pub analysis_errors: Vec<AnalysisErrorRecord>,
    pub suppression_errors: Vec<AnalysisErrorRecord>,

    /// Number of problems dropped by suppression directives
    pub suppressed: usize,

    /// Engine-level success flag (false when any phase recorded errors)
    pub analysis_succeeded: bool,
}

impl AnalysisResult {
    /// Error records raised during one phase
    pub fn errors_for(&self, phase: AnalysisPhase) -> &[AnalysisErrorRecord] {
        match phase {
            AnalysisPhase::Initialization => &self.initialization_errors,
            AnalysisPhase::Analysis => &self.analysis_errors,
            AnalysisPhase::Suppression => &self.suppression_errors,
        }
    }

    pub fn summary(&self) -> AnalysisSummary {
        let mut problems_by_rule = BTreeMap::new();
        for problem in &self.problems {
            *problems_by_rule.entry(problem.rule_id.clone()).or_insert(0) += 1;
        }

        AnalysisSummary {
            total_problems: self.problems.len(),
            problems_by_rule,
            error_records: AnalysisPhase::ALL
                .iter()
                .map(|phase| self.errors_for(*phase).len())
                .sum(),
            suppressed: self.suppressed,
            analysis_succeeded: self.analysis_succeeded,
        }
    }
}

/// Compact view of an [`AnalysisResult`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total_problems: usize,
    pub problems_by_rule: BTreeMap<String, usize>,
    pub error_records: usize,
    pub suppressed: usize,
    pub analysis_succeeded: bool,
}
