use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One line introduced by a change.
///
/// # Examples
///
/// ```
/// use patchcov_core::AddedLine;
///
/// let line = AddedLine::new(10, "\tfmt.Println(\"x\")");
/// assert_eq!(line.number, 10);
/// assert!(!line.covered);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddedLine {
    /// 1-based line number in the new version of the file.
    pub number: u32,
    /// Source text exactly as it appears on the new side of the diff.
    pub text: String,
    /// Whether a test executes this line. Only the correlator sets this.
    pub covered: bool,
}

impl AddedLine {
    /// Create an uncovered line.
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
            covered: false,
        }
    }
}

/// The added lines of one non-test source file touched by a change.
///
/// `path` is the join key against the coverage profile, so it must match the
/// profile's file identifier exactly.
///
/// # Examples
///
/// ```
/// use patchcov_core::{AddedLine, ChangeSet};
///
/// let mut set = ChangeSet::new("pkg/file.go");
/// set.lines.push(AddedLine::new(3, "x := 1"));
/// assert_eq!(set.uncovered().count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSet {
    /// Profile-compatible file identifier.
    pub path: String,
    /// Added lines in order of appearance in the diff.
    pub lines: Vec<AddedLine>,
}

impl ChangeSet {
    /// Create a change set with no lines.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            lines: Vec::new(),
        }
    }

    /// Lines not yet marked covered.
    pub fn uncovered(&self) -> impl Iterator<Item = &AddedLine> {
        self.lines.iter().filter(|l| !l.covered)
    }

    /// Whether any line is uncovered.
    pub fn has_uncovered(&self) -> bool {
        self.lines.iter().any(|l| !l.covered)
    }
}

/// One statement region reported by the coverage tool.
///
/// # Examples
///
/// ```
/// use patchcov_core::CoverageBlock;
///
/// let block = CoverageBlock {
///     file_id: "pkg/file.go".into(),
///     start_line: 8,
///     start_col: 1,
///     end_line: 12,
///     end_col: 2,
///     statements: 1,
///     hit_count: 1,
/// };
/// assert!(block.covers(10));
/// assert!(!block.covers(13));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageBlock {
    /// File identifier, in the same format as [`ChangeSet::path`].
    pub file_id: String,
    /// First line of the region (inclusive).
    pub start_line: u32,
    /// Column on the first line.
    pub start_col: u32,
    /// Last line of the region (inclusive).
    pub end_line: u32,
    /// Column on the last line.
    pub end_col: u32,
    /// Number of statements in the region.
    pub statements: u32,
    /// How many times the region executed.
    pub hit_count: u64,
}

impl CoverageBlock {
    /// Whether `line` lies inside this block and the block executed at least once.
    pub fn covers(&self, line: u32) -> bool {
        self.hit_count >= 1 && (self.start_line..=self.end_line).contains(&line)
    }
}

/// Counter mode recorded in the `mode:` header of a Go coverage profile.
///
/// # Examples
///
/// ```
/// use patchcov_core::CoverMode;
///
/// assert_eq!("atomic".parse::<CoverMode>().unwrap(), CoverMode::Atomic);
/// assert!("branch".parse::<CoverMode>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverMode {
    /// Hit counts are 0 or 1.
    Set,
    /// Hit counts are execution counts.
    Count,
    /// Execution counts, collected with atomic increments.
    Atomic,
}

impl fmt::Display for CoverMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoverMode::Set => write!(f, "set"),
            CoverMode::Count => write!(f, "count"),
            CoverMode::Atomic => write!(f, "atomic"),
        }
    }
}

impl FromStr for CoverMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "set" => Ok(CoverMode::Set),
            "count" => Ok(CoverMode::Count),
            "atomic" => Ok(CoverMode::Atomic),
            other => Err(format!("unknown cover mode: {other}")),
        }
    }
}

/// How a malformed diff is handled.
///
/// # Examples
///
/// ```
/// use patchcov_core::ParseMode;
///
/// assert_eq!(ParseMode::default(), ParseMode::Lenient);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Treat an unparseable diff as one with no changes and log a warning.
    #[default]
    Lenient,
    /// Propagate the parse error.
    Strict,
}

/// Output format for the CLI.
///
/// Implements [`FromStr`] so it can be used directly with `clap` argument parsing.
///
/// # Examples
///
/// ```
/// use patchcov_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain-text report.
    #[default]
    Text,
    /// Machine-readable JSON summary with camelCase keys.
    Json,
    /// Report wrapped in a fenced code block.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
