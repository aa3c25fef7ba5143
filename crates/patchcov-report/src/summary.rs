use patchcov_core::ChangeSet;
use serde::Serialize;

/// Overall gate outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GateStatus {
    /// Every added line is covered.
    Covered,
    /// At least one added line is uncovered.
    Uncovered,
}

/// Machine-readable counterpart of the rendered report.
///
/// # Examples
///
/// ```
/// use patchcov_core::{AddedLine, ChangeSet};
/// use patchcov_report::summary::{CoverageSummary, GateStatus};
///
/// let mut set = ChangeSet::new("a.go");
/// set.lines.push(AddedLine::new(1, "x"));
/// let summary = CoverageSummary::from_change_sets(&[set]);
/// assert_eq!(summary.status, GateStatus::Uncovered);
/// assert_eq!(summary.uncovered_lines, 1);
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageSummary {
    /// Gate outcome.
    pub status: GateStatus,
    /// Added lines across all files.
    pub added_lines: usize,
    /// Covered added lines across all files.
    pub covered_lines: usize,
    /// Uncovered added lines across all files.
    pub uncovered_lines: usize,
    /// Per-file breakdown, in change set order.
    pub files: Vec<FileSummary>,
}

/// Coverage of one file's added lines.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    /// Profile-compatible path.
    pub path: String,
    /// Added lines in this file.
    pub added_lines: usize,
    /// Covered added lines in this file.
    pub covered_lines: usize,
    /// The uncovered lines themselves.
    pub uncovered: Vec<UncoveredLine>,
}

/// An added line no test executes.
#[derive(Debug, Clone, Serialize)]
pub struct UncoveredLine {
    /// 1-based line number in the new file.
    pub number: u32,
    /// Source text.
    pub text: String,
}

impl CoverageSummary {
    /// Summarise correlated change sets.
    pub fn from_change_sets(change_sets: &[ChangeSet]) -> Self {
        let files: Vec<FileSummary> = change_sets
            .iter()
            .map(|set| {
                let uncovered: Vec<UncoveredLine> = set
                    .uncovered()
                    .map(|l| UncoveredLine {
                        number: l.number,
                        text: l.text.clone(),
                    })
                    .collect();
                FileSummary {
                    path: set.path.clone(),
                    added_lines: set.lines.len(),
                    covered_lines: set.lines.len() - uncovered.len(),
                    uncovered,
                }
            })
            .collect();

        let added_lines = files.iter().map(|f| f.added_lines).sum();
        let covered_lines = files.iter().map(|f| f.covered_lines).sum();
        let uncovered_lines = files.iter().map(|f| f.uncovered.len()).sum();
        let status = if uncovered_lines == 0 {
            GateStatus::Covered
        } else {
            GateStatus::Uncovered
        };

        Self {
            status,
            added_lines,
            covered_lines,
            uncovered_lines,
            files,
        }
    }
}
