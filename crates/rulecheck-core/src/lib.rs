//! RuleCheck Core
//!
//! Stable domain types shared by the harness and the engines it drives.
//! The capability traits in [`engine`] are the only contract between the
//! harness and the model/rule engines. Nothing reaches past them.

pub mod diagnostic;
pub mod script;
pub mod problem;
pub mod rules;
pub mod engine;
pub mod config;

pub use diagnostic::{Severity, ValidationMessage, SourceLocation};
pub use script::{ScriptUnit, ModelOptions, TargetVersion, AnalysisTarget, ScriptDialect};
pub use problem::{
    ElementRef, ObjectKind, AnalysisProblem, AnalysisErrorRecord, AnalysisPhase, AnalysisResult,
    AnalysisSummary,
};
pub use rules::{RuleDescriptor, RuleEnablement, RuleExecutionConfig};
pub use engine::{
    DisplayNameResolver, SchemaModel, ModelEngine, RuleEngine, AnalysisService, ModelObject,
    ModelId, LoadMode, EngineError,
};
pub use config::{HarnessConfig, ErrorSurfacing, ConfigError};
