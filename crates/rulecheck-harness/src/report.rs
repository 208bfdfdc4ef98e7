//! Deterministic problem report
//!
//! Problems are ordered by source name (ordinal; absent sorts as empty),
//! then start line, then start column, and rendered one block per problem:
//!
//! ```text
//! Problem description: Table [dbo].[tblUsers] uses the 'tbl' prefix.
//! FullID: RC.Naming.TablePrefix
//! Severity: Warning
//! Model element: [dbo].[tblUsers]
//! Script file: users.sql
//! Start line: 1
//! Start column: 1
//! ========end of problem========
//!
//! ```

use rulecheck_core::{AnalysisProblem, DisplayNameResolver};
use std::cmp::Ordering;

/// Line closing every problem block
pub const END_OF_PROBLEM: &str = "========end of problem========";

/// Report ordering: source name, start line, start column
pub fn compare_problems(a: &AnalysisProblem, b: &AnalysisProblem) -> Ordering {
    fn source(p: &AnalysisProblem) -> &str {
        p.source_name.as_deref().unwrap_or("")
    }

    source(a)
        .cmp(source(b))
        .then(a.start_line.cmp(&b.start_line))
        .then(a.start_column.cmp(&b.start_column))
}

/// Sort in report order. Stable, so ties keep engine order.
pub fn sort_problems(problems: &mut [AnalysisProblem]) {
    problems.sort_by(compare_problems);
}

/// File-name component of a source name; `/` and `\` both separate
pub fn script_file_name(source_name: Option<&str>) -> &str {
    source_name
        .and_then(|name| name.rsplit(|c: char| c == '/' || c == '\\').next())
        .unwrap_or("")
}

/// Render problems in report order
///
/// Display names come from `resolver`, normally the analyzed model.
pub fn render_problems<R>(problems: &[AnalysisProblem], resolver: &R) -> String
where
    R: DisplayNameResolver + ?Sized,
{
    let mut sorted = problems.to_vec();
    sort_problems(&mut sorted);

    let mut report = String::new();
    for problem in &sorted {
        render_problem(&mut report, problem, resolver.display_name(&problem.element));
    }
    report
}

fn render_problem(out: &mut String, problem: &AnalysisProblem, element: String) {
    out.push_str(&format!("Problem description: {}\n", problem.description));
    out.push_str(&format!("FullID: {}\n", problem.rule_id));
    out.push_str(&format!("Severity: {}\n", problem.severity.as_str()));
    out.push_str(&format!("Model element: {}\n", element));
    out.push_str(&format!("Script file: {}\n", script_file_name(problem.source_name.as_deref())));
    out.push_str(&format!("Start line: {}\n", problem.start_line));
    out.push_str(&format!("Start column: {}\n", problem.start_column));
    out.push_str(END_OF_PROBLEM);
    out.push_str("\n\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rulecheck_core::{ElementRef, ObjectKind, Severity};

    struct Dotted;

    impl DisplayNameResolver for Dotted {
        fn display_name(&self, element: &ElementRef) -> String {
            element.parts.join(".")
        }
    }

    fn problem(source: Option<&str>, line: u32, column: u32) -> AnalysisProblem {
        AnalysisProblem {
            description: format!("at {}:{}", line, column),
            rule_id: "RC.Test".to_string(),
            severity: Severity::Warning,
            element: ElementRef::new(ObjectKind::Table, vec!["dbo".into(), "t".into()]),
            source_name: source.map(str::to_string),
            start_line: line,
            start_column: column,
        }
    }

    #[test]
    fn comparator_orders_by_source_line_column() {
        let a = problem(Some("a.sql"), 9, 9);
        let b = problem(Some("b.sql"), 1, 1);
        let b_later = problem(Some("b.sql"), 1, 5);
        let none = problem(None, 100, 1);

        assert_eq!(compare_problems(&a, &b), Ordering::Less);
        assert_eq!(compare_problems(&b, &b_later), Ordering::Less);
        assert_eq!(compare_problems(&none, &a), Ordering::Less);
        assert_eq!(compare_problems(&b, &b.clone()), Ordering::Equal);
    }

    #[test]
    fn comparator_is_ordinal() {
        let upper = problem(Some("Z.sql"), 1, 1);
        let lower = problem(Some("a.sql"), 1, 1);
        assert_eq!(compare_problems(&upper, &lower), Ordering::Less);
    }

    #[test]
    fn script_file_names() {
        assert_eq!(script_file_name(Some("dir/sub/file.sql")), "file.sql");
        assert_eq!(script_file_name(Some(r"C:\scripts\file.sql")), "file.sql");
        assert_eq!(script_file_name(Some("plain.sql")), "plain.sql");
        assert_eq!(script_file_name(None), "");
    }

    #[test]
    fn renders_blocks() {
        let problems = vec![problem(Some("scripts/b.sql"), 2, 3), problem(None, 1, 1)];
        let report = render_problems(&problems, &Dotted);
        let expected = [
            "Problem description: at 1:1",
            "FullID: RC.Test",
            "Severity: Warning",
            "Model element: dbo.t",
            "Script file: ",
            "Start line: 1",
            "Start column: 1",
            END_OF_PROBLEM,
            "",
            "Problem description: at 2:3",
            "FullID: RC.Test",
            "Severity: Warning",
            "Model element: dbo.t",
            "Script file: b.sql",
            "Start line: 2",
            "Start column: 3",
            END_OF_PROBLEM,
            "",
            "",
        ]
        .join("\n");
        assert_eq!(report, expected);
    }

    #[test]
    fn output_is_independent_of_input_order() {
        let mut problems = vec![
            problem(Some("c.sql"), 4, 1),
            problem(Some("a.sql"), 10, 2),
            problem(Some("a.sql"), 10, 1),
            problem(None, 3, 3),
            problem(Some("b.sql"), 1, 1),
        ];
        let first = render_problems(&problems, &Dotted);
        problems.reverse();
        assert_eq!(render_problems(&problems, &Dotted), first);
        problems.swap(0, 3);
        assert_eq!(render_problems(&problems, &Dotted), first);
    }

    #[test]
    fn empty_report() {
        assert_eq!(render_problems(&[], &Dotted), "");
    }
}
