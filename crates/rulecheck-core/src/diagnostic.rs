//! Severity levels and model validation messages
//!
//! Validation messages are produced by a model engine while compiling
//! scripts. They are never persisted; the harness only inspects them to
//! decide whether a run may proceed to analysis.

use serde::{Deserialize, Serialize};

/// Severity shared by validation messages and analysis problems
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,

    /// Warning - surfaced for diagnostics, never blocking
    Warning,

    /// Error - blocks the run
    Error,
}

impl Severity {
    /// Stable label used in reports and baselines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "Info",
            Self::Warning => "Warning",
            Self::Error => "Error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Position of a message inside a source script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Logical source name of the script
    pub source_name: String,

    /// Line number (1-indexed)
    pub line: u32,

    /// Column number (1-indexed)
    pub column: u32,
}

impl SourceLocation {
    pub fn new(source_name: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            source_name: source_name.into(),
            line,
            column,
        }
    }
}

/// A single message produced by model validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationMessage {
    /// Human-readable text
    pub text: String,

    /// Severity level
    pub severity: Severity,

    /// Source location (best-effort)
    pub location: Option<SourceLocation>,
}

impl ValidationMessage {
    /// Create a message without a location
    pub fn new(severity: Severity, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity,
            location: None,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(Severity::Error, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(Severity::Warning, text)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(Severity::Info, text)
    }

    /// Set the location
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for ValidationMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(loc) => write!(
                f,
                "{}: {}({}, {}): {}",
                self.severity, loc.source_name, loc.line, loc.column, self.text
            ),
            None => write!(f, "{}: {}", self.severity, self.text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_labels_are_stable() {
        assert_eq!(Severity::Info.as_str(), "Info");
        assert_eq!(Severity::Warning.as_str(), "Warning");
        assert_eq!(Severity::Error.to_string(), "Error");
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }

    #[test]
    fn validation_message_display() {
        let msg = ValidationMessage::error("Duplicate column [id]")
            .with_location(SourceLocation::new("tables/users.sql", 3, 5));
        assert_eq!(msg.to_string(), "Error: tables/users.sql(3, 5): Duplicate column [id]");
        assert!(msg.is_error());

        let plain = ValidationMessage::warning("Table has no columns");
        assert_eq!(plain.to_string(), "Warning: Table has no columns");
        assert!(!plain.is_error());
    }

    #[test]
    fn validation_message_serialization() {
        let msg = ValidationMessage::info("Object replaced");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"info\""));
    }
}
