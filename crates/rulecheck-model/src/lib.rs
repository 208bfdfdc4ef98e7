//! Reference script model engine
//!
//! Compiles T-SQL (or generic SQL) scripts into a [`ScriptModel`] using
//! sqlparser, and persists models as JSON packages. This is the engine the
//! harness is exercised against in tests and from the CLI; the harness
//! itself only sees the `rulecheck_core::engine` traits.

pub mod parser;
pub mod model;
pub mod package;
pub mod engine;

pub use parser::{ScriptParser, Definition, ScriptParseError};
pub use model::ScriptModel;
pub use package::{Package, PackageHeader, PackageError, PACKAGE_FORMAT, PACKAGE_FORMAT_VERSION};
pub use engine::ScriptModelEngine;
