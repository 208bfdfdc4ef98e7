//! Reference rule engine
//!
//! A [`RuleCatalog`] holds the built-in rules plus any pattern rules loaded
//! from TOML definition files. [`CatalogRuleEngine`] turns a catalog into
//! analysis services for the harness.
//!
//! ## Suppression
//!
//! A `-- rulecheck:disable <id>[, <id>...]` comment inside a statement
//! suppresses problems raised by those rules on the objects the statement
//! defines. Directives naming rules that are not loaded are reported as
//! suppression-phase errors.

pub mod rule;
pub mod builtin;
pub mod definitions;
pub mod catalog;
pub mod engine;

pub use rule::{Rule, RuleContext, RuleError};
pub use builtin::{builtin_rules, TablePrefixRule, MissingPrimaryKeyRule, SelectStarRule, DeprecatedTypeRule};
pub use definitions::{PatternRule, RuleDefinition, RuleDefinitionFile, PatternMode};
pub use catalog::RuleCatalog;
pub use engine::CatalogRuleEngine;
