//! Baseline files: stored reports compared byte for byte

use std::path::Path;

use crate::error::HarnessError;

/// Set to rewrite baselines instead of comparing against them
pub const UPDATE_BASELINES_ENV: &str = "RULECHECK_UPDATE_BASELINES";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselineOutcome {
    /// Report matches the stored baseline
    Matched,

    /// Baseline was (re)written from the report
    Updated,
}

/// Whether the environment asks for baselines to be rewritten
pub fn update_requested() -> bool {
    std::env::var(UPDATE_BASELINES_ENV)
        .map(|value| {
            let value = value.trim();
            !value.is_empty() && value != "0" && !value.eq_ignore_ascii_case("false")
        })
        .unwrap_or(false)
}

/// Compare `report` with the baseline at `path`, or rewrite it when `update` is set
pub fn check_baseline(report: &str, path: &Path, update: bool) -> Result<BaselineOutcome, HarnessError> {
    if update {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| HarnessError::io(parent, e))?;
        }
        std::fs::write(path, report).map_err(|e| HarnessError::io(path, e))?;
        tracing::info!(path = %path.display(), "Baseline updated");
        return Ok(BaselineOutcome::Updated);
    }

    let expected = std::fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
    if expected == report {
        return Ok(BaselineOutcome::Matched);
    }

    let (line, expected_line, actual_line) = first_difference(&expected, report);
    Err(HarnessError::BaselineMismatch {
        path: path.to_path_buf(),
        line,
        expected: expected_line,
        actual: actual_line,
    })
}

/// 1-based line number and contents of the first differing line
fn first_difference(expected: &str, actual: &str) -> (usize, String, String) {
    let mut expected_lines = expected.split('\n');
    let mut actual_lines = actual.split('\n');
    let mut line = 1;

    loop {
        match (expected_lines.next(), actual_lines.next()) {
            (Some(e), Some(a)) if e == a => line += 1,
            (e, a) => {
                let show = |l: Option<&str>| l.map_or_else(|| "<end of file>".to_string(), |l| format!("{:?}", l));
                return (line, show(e), show(a));
            }
        }
    }
}
