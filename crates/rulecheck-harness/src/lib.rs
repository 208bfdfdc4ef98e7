//! Deterministic single-rule test harness
//!
//! Builds a schema model from scripts, validates it, optionally forces it
//! through a package round trip, runs exactly one analysis rule and renders
//! a sorted, diffable report of the problems found. Engines are consumed
//! through the capability traits in `rulecheck-core`.
//!
//! ```rust,ignore
//! let mut harness = RuleTestHarness::new(model_engine, rule_engine, TargetVersion::Sql2022)
//!     .with_script("CREATE TABLE tblUsers (Id INT);", "tables/users.sql");
//!
//! harness.run_test("RC.Naming.TablePrefix", |report, result| {
//!     assert_eq!(result.problems.len(), 1);
//!     check_baseline(report, Path::new("baselines/table_prefix.txt"), update_requested()).unwrap();
//! })?;
//! ```

pub mod error;
pub mod tracker;
pub mod builder;
pub mod validator;
pub mod round_trip;
pub mod isolation;
pub mod runner;
pub mod aggregate;
pub mod report;
pub mod baseline;
pub mod harness;

pub use error::HarnessError;
pub use tracker::ResourceTracker;
pub use builder::ModelBuilder;
pub use validator::validate_model;
pub use round_trip::PackageRoundTripper;
pub use isolation::{isolate_rule, IsolatedRule};
pub use runner::run_analysis;
pub use aggregate::{ErrorAggregator, format_record, format_records};
pub use report::{compare_problems, sort_problems, render_problems, script_file_name, END_OF_PROBLEM};
pub use baseline::{check_baseline, update_requested, BaselineOutcome, UPDATE_BASELINES_ENV};
pub use harness::{RuleTestHarness, RunOutcome};
