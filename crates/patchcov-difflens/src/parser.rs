use std::fmt;
use std::path::PathBuf;

use patchcov_core::PatchcovError;

/// A complete diff for a single file, containing one or more hunks.
///
/// # Examples
///
/// ```
/// use patchcov_difflens::parser::{parse_unified_diff, FileDiff};
///
/// let diff = "diff --git a/hello.go b/hello.go\n\
///             --- a/hello.go\n\
///             +++ b/hello.go\n\
///             @@ -1,3 +1,4 @@\n\
///              func main() {\n\
///             +\tprintln(\"hello\")\n\
///              \treturn\n\
///              }\n";
/// let files = parse_unified_diff(diff).unwrap();
/// assert_eq!(files.len(), 1);
/// assert_eq!(files[0].hunks.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct FileDiff {
    /// Path in the old version.
    pub old_path: PathBuf,
    /// Path in the new version.
    pub new_path: PathBuf,
    /// Parsed hunks for this file.
    pub hunks: Vec<Hunk>,
    /// Whether this is a newly created file.
    pub is_new_file: bool,
    /// Whether this file was deleted.
    pub is_deleted_file: bool,
    /// Whether this file was renamed.
    pub is_rename: bool,
}

impl FileDiff {
    fn empty() -> Self {
        Self {
            old_path: PathBuf::new(),
            new_path: PathBuf::new(),
            hunks: Vec::new(),
            is_new_file: false,
            is_deleted_file: false,
            is_rename: false,
        }
    }

    /// Lines added on the new side, across every hunk, in diff order.
    pub fn added_lines(&self) -> impl Iterator<Item = &DiffLine> {
        self.hunks
            .iter()
            .flat_map(|h| h.lines.iter())
            .filter(|l| l.kind == LineKind::Added)
    }
}

impl fmt::Display for FileDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} hunks)",
            self.new_path.display(),
            self.hunks.len()
        )
    }
}

/// A single `@@` hunk.
#[derive(Debug, Clone)]
pub struct Hunk {
    /// Starting line in the old version.
    pub old_start: u32,
    /// Number of lines in the old version.
    pub old_lines: u32,
    /// Starting line in the new version.
    pub new_start: u32,
    /// Number of lines in the new version.
    pub new_lines: u32,
    /// Body lines in diff order.
    pub lines: Vec<DiffLine>,
}

/// Role of a line inside a hunk body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Present only on the new side (`+`).
    Added,
    /// Present only on the old side (`-`).
    Removed,
    /// Present on both sides (` `).
    Context,
}

/// One body line of a hunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    /// Added, removed, or context.
    pub kind: LineKind,
    /// Line number on the old side, if the line exists there.
    pub old_number: Option<u32>,
    /// Line number on the new side, if the line exists there.
    pub new_number: Option<u32>,
    /// Text without the leading marker character.
    pub content: String,
}

/// Position inside the hunk currently being read.
struct OpenHunk {
    hunk: Hunk,
    old_remaining: u32,
    new_remaining: u32,
    next_old: u32,
    next_new: u32,
}

impl OpenHunk {
    fn new(old_start: u32, old_lines: u32, new_start: u32, new_lines: u32) -> Self {
        Self {
            hunk: Hunk {
                old_start,
                old_lines,
                new_start,
                new_lines,
                lines: Vec::new(),
            },
            old_remaining: old_lines,
            new_remaining: new_lines,
            next_old: old_start,
            next_new: new_start,
        }
    }

    fn is_complete(&self) -> bool {
        self.old_remaining == 0 && self.new_remaining == 0
    }

    fn push(&mut self, line: &str, lineno: usize) -> Result<(), PatchcovError> {
        let (marker, content) = match line.chars().next() {
            // Some tools strip the single space of an empty context line.
            None => (' ', ""),
            Some('\r') if line == "\r" => (' ', ""),
            Some(c) => (c, &line[c.len_utf8()..]),
        };

        let (kind, old_number, new_number) = match marker {
            '+' => {
                self.take_new(lineno)?;
                (LineKind::Added, None, Some(self.next_new - 1))
            }
            '-' => {
                self.take_old(lineno)?;
                (LineKind::Removed, Some(self.next_old - 1), None)
            }
            ' ' => {
                self.take_old(lineno)?;
                self.take_new(lineno)?;
                (
                    LineKind::Context,
                    Some(self.next_old - 1),
                    Some(self.next_new - 1),
                )
            }
            _ => {
                return Err(PatchcovError::DiffParse(format!(
                    "line {lineno}: unexpected line inside hunk: {line}"
                )))
            }
        };

        self.hunk.lines.push(DiffLine {
            kind,
            old_number,
            new_number,
            content: content.to_string(),
        });
        Ok(())
    }

    fn take_old(&mut self, lineno: usize) -> Result<(), PatchcovError> {
        if self.old_remaining == 0 {
            return Err(PatchcovError::DiffParse(format!(
                "line {lineno}: hunk has more old-side lines than its header declares"
            )));
        }
        self.old_remaining -= 1;
        self.next_old += 1;
        Ok(())
    }

    fn take_new(&mut self, lineno: usize) -> Result<(), PatchcovError> {
        if self.new_remaining == 0 {
            return Err(PatchcovError::DiffParse(format!(
                "line {lineno}: hunk has more new-side lines than its header declares"
            )));
        }
        self.new_remaining -= 1;
        self.next_new += 1;
        Ok(())
    }
}

/// Parse a unified diff string (as produced by `git diff`) into structured [`FileDiff`] entries.
///
/// Handles new files, deleted files, renamed files, and binary files (which
/// are skipped). Hunk bodies are read using the counts in their `@@` header,
/// so a removed line whose text starts with `--` is never taken for a file
/// header.
///
/// # Errors
///
/// Returns [`PatchcovError::DiffParse`] if a hunk header is malformed, a hunk
/// appears before any file header, or a hunk body does not match its header.
///
/// # Examples
///
/// ```
/// use patchcov_difflens::parser::parse_unified_diff;
///
/// let files = parse_unified_diff("").unwrap();
/// assert!(files.is_empty());
/// ```
pub fn parse_unified_diff(input: &str) -> Result<Vec<FileDiff>, PatchcovError> {
    let mut files: Vec<FileDiff> = Vec::new();
    let mut current: Option<FileDiff> = None;
    let mut open: Option<OpenHunk> = None;
    let mut is_binary = false;

    // Split on '\n' only: a '\r' before it belongs to the line's text.
    for (idx, raw) in input.split_inclusive('\n').enumerate() {
        let lineno = idx + 1;
        let raw = raw.strip_suffix('\n').unwrap_or(raw);

        if let Some(hunk) = open.as_mut() {
            if raw.starts_with('\\') {
                // "\ No newline at end of file"
                continue;
            }
            if !hunk.is_complete() {
                hunk.push(raw, lineno)?;
                continue;
            }
        }
        flush_hunk(&mut current, &mut open);

        let line = raw.strip_suffix('\r').unwrap_or(raw);

        if line.starts_with("diff --git ") {
            flush_file(&mut files, &mut current, is_binary);
            is_binary = false;
            current = Some(FileDiff::empty());
            continue;
        }

        // Implicitly start a file if we see a header but have no current file.
        // This handles plain patches that lack the "diff --git" line.
        if line.starts_with("--- ") && current.as_ref().map_or(true, |f| !f.hunks.is_empty()) {
            flush_file(&mut files, &mut current, is_binary);
            is_binary = false;
            current = Some(FileDiff::empty());
        }

        if line.starts_with("@@ ") {
            let Some(file) = current.as_ref() else {
                return Err(PatchcovError::DiffParse(format!(
                    "line {lineno}: hunk header before any file header"
                )));
            };
            if file.new_path.as_os_str().is_empty() && file.old_path.as_os_str().is_empty() {
                return Err(PatchcovError::DiffParse(format!(
                    "line {lineno}: hunk header without ---/+++ file names"
                )));
            }
            let (old_start, old_lines, new_start, new_lines) = parse_hunk_header(line)?;
            open = Some(OpenHunk::new(old_start, old_lines, new_start, new_lines));
            continue;
        }

        let Some(file) = current.as_mut() else {
            continue;
        };

        if line.starts_with("Binary files ") && line.ends_with(" differ") {
            is_binary = true;
            continue;
        }

        if line.starts_with("new file mode") {
            file.is_new_file = true;
            continue;
        }

        if line.starts_with("deleted file mode") {
            file.is_deleted_file = true;
            continue;
        }

        if line.starts_with("rename from ") || line.starts_with("rename to ") {
            file.is_rename = true;
            continue;
        }

        if let Some(path) = line.strip_prefix("--- ") {
            file.old_path = parse_path(path);
            if file.old_path.as_os_str() == "/dev/null" {
                file.is_new_file = true;
            }
            continue;
        }

        if let Some(path) = line.strip_prefix("+++ ") {
            file.new_path = parse_path(path);
            if file.new_path.as_os_str() == "/dev/null" {
                file.is_deleted_file = true;
            }
            continue;
        }
    }

    if let Some(hunk) = open.as_ref() {
        if !hunk.is_complete() {
            return Err(PatchcovError::DiffParse(format!(
                "truncated hunk @@ -{},{} +{},{} @@: input ended early",
                hunk.hunk.old_start, hunk.hunk.old_lines, hunk.hunk.new_start, hunk.hunk.new_lines
            )));
        }
    }
    flush_hunk(&mut current, &mut open);
    flush_file(&mut files, &mut current, is_binary);

    Ok(files)
}

fn flush_hunk(current: &mut Option<FileDiff>, open: &mut Option<OpenHunk>) {
    if let Some(h) = open.take() {
        if let Some(file) = current.as_mut() {
            file.hunks.push(h.hunk);
        }
    }
}

fn flush_file(files: &mut Vec<FileDiff>, current: &mut Option<FileDiff>, is_binary: bool) {
    if let Some(file) = current.take() {
        if !is_binary {
            files.push(file);
        }
    }
}

fn parse_path(raw: &str) -> PathBuf {
    // git appends a tab and timestamp in some modes: "--- a/x.go\t2024-01-01 ..."
    let raw = raw.split('\t').next().unwrap_or(raw);
    let normalized = raw.trim_matches('"');

    if normalized == "/dev/null" {
        return PathBuf::from("/dev/null");
    }

    let stripped = normalized
        .strip_prefix("a/")
        .or_else(|| normalized.strip_prefix("b/"))
        .unwrap_or(normalized);

    PathBuf::from(stripped)
}

/// `@@ -a[,b] +c[,d] @@ [section]` into `(a, b, c, d)`; an omitted count is 1.
fn parse_hunk_header(line: &str) -> Result<(u32, u32, u32, u32), PatchcovError> {
    let invalid = || PatchcovError::DiffParse(format!("invalid hunk header: {line}"));

    let ranges = line
        .strip_prefix("@@ ")
        .and_then(|rest| rest.split_once(" @@"))
        .map(|(ranges, _section)| ranges)
        .ok_or_else(invalid)?;
    let (old, new) = ranges.split_once(' ').ok_or_else(invalid)?;
    let old = old.strip_prefix('-').ok_or_else(invalid)?;
    let new = new.strip_prefix('+').ok_or_else(invalid)?;

    let (old_start, old_lines) = parse_range(old, line)?;
    let (new_start, new_lines) = parse_range(new, line)?;
    Ok((old_start, old_lines, new_start, new_lines))
}

fn parse_range(range: &str, context: &str) -> Result<(u32, u32), PatchcovError> {
    let (start, count) = range.split_once(',').unwrap_or((range, "1"));
    let start: u32 = start
        .parse()
        .map_err(|_| PatchcovError::DiffParse(format!("invalid range number in: {context}")))?;
    let count: u32 = count
        .parse()
        .map_err(|_| PatchcovError::DiffParse(format!("invalid range count in: {context}")))?;

    // Line numbers are 1-based; start 0 only appears with an empty side.
    if start == 0 && count > 0 {
        return Err(PatchcovError::DiffParse(format!(
            "range starts at line 0 but spans {count} lines in: {context}"
        )));
    }
    // The line after the range must still be representable.
    if start.checked_add(count).is_none() {
        return Err(PatchcovError::DiffParse(format!(
            "line number overflows in: {context}"
        )));
    }
    Ok((start, count))
}
