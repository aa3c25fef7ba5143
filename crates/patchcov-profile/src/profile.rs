use std::collections::HashMap;
use std::path::Path;

use patchcov_core::{CoverMode, CoverageBlock, PatchcovError};

/// All statement blocks of a profile, grouped by file identifier.
///
/// Overlapping blocks are kept as they appear; nothing is merged.
///
/// # Examples
///
/// ```
/// use patchcov_profile::parse_profile_str;
///
/// let profile = parse_profile_str("mode: set\npkg/file.go:8.1,12.2 1 1\n", "cover.out").unwrap();
/// assert_eq!(profile.block_count(), 1);
/// assert_eq!(profile.blocks_for("pkg/file.go").len(), 1);
/// assert!(profile.blocks_for("pkg/other.go").is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CoverageProfile {
    mode: Option<CoverMode>,
    by_file: HashMap<String, Vec<CoverageBlock>>,
}

impl CoverageProfile {
    /// Counter mode from the `mode:` header, if the profile had one.
    pub fn mode(&self) -> Option<CoverMode> {
        self.mode
    }

    /// Blocks recorded for `file_id`, in profile order.
    pub fn blocks_for(&self, file_id: &str) -> &[CoverageBlock] {
        self.by_file.get(file_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// File identifiers present in the profile, in no particular order.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.by_file.keys().map(String::as_str)
    }

    /// Total number of blocks across all files.
    pub fn block_count(&self) -> usize {
        self.by_file.values().map(Vec::len).sum()
    }

    /// Add one block.
    pub fn push(&mut self, block: CoverageBlock) {
        self.by_file
            .entry(block.file_id.clone())
            .or_default()
            .push(block);
    }
}

impl FromIterator<CoverageBlock> for CoverageProfile {
    fn from_iter<I: IntoIterator<Item = CoverageBlock>>(iter: I) -> Self {
        let mut profile = Self::default();
        for block in iter {
            profile.push(block);
        }
        profile
    }
}

/// Read and parse the coverage profile at `path`.
///
/// # Errors
///
/// Returns [`PatchcovError::ProfileRead`] if the file cannot be read, or
/// [`PatchcovError::ProfileFormat`] if a line is malformed.
pub fn parse_profile(path: &Path) -> Result<CoverageProfile, PatchcovError> {
    let content = std::fs::read_to_string(path).map_err(|source| PatchcovError::ProfileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let profile = parse_profile_str(&content, path)?;
    tracing::debug!(
        path = %path.display(),
        files = profile.by_file.len(),
        blocks = profile.block_count(),
        "parsed coverage profile"
    );
    Ok(profile)
}

/// Parse profile text. `origin` labels error messages.
///
/// The first non-blank line may be a `mode: set|count|atomic` header; every
/// other non-blank line must read
/// `fileID:startLine.startCol,endLine.endCol numberOfStatements hitCount`.
///
/// # Errors
///
/// Returns [`PatchcovError::ProfileFormat`] naming the first bad line.
///
/// # Examples
///
/// ```
/// use patchcov_profile::parse_profile_str;
///
/// let err = parse_profile_str("pkg/file.go:8.1,12.2 1\n", "cover.out").unwrap_err();
/// assert!(err.to_string().contains("cover.out:1"));
/// ```
pub fn parse_profile_str(
    content: &str,
    origin: impl AsRef<Path>,
) -> Result<CoverageProfile, PatchcovError> {
    let origin = origin.as_ref();
    let mut profile = CoverageProfile::default();
    let mut seen_content = false;

    for (idx, raw) in content.lines().enumerate() {
        let lineno = idx + 1;
        let line = raw.trim_end();
        if line.is_empty() {
            continue;
        }
        let fail = |message: String| PatchcovError::ProfileFormat {
            path: origin.to_path_buf(),
            line: lineno,
            message,
        };

        if let Some(mode) = line.strip_prefix("mode:") {
            if seen_content {
                return Err(fail("mode header must be the first line".into()));
            }
            profile.mode = Some(mode.trim().parse::<CoverMode>().map_err(fail)?);
            seen_content = true;
            continue;
        }
        seen_content = true;

        profile.push(parse_block(line).map_err(fail)?);
    }

    Ok(profile)
}

fn parse_block(line: &str) -> Result<CoverageBlock, String> {
    // The file identifier may itself contain ':' (Windows drive letters).
    let (file_id, rest) = line
        .rsplit_once(':')
        .ok_or_else(|| "missing ':' between file and range".to_string())?;
    if file_id.is_empty() {
        return Err("empty file identifier".into());
    }

    let mut fields = rest.split(' ');
    let range = fields.next().unwrap_or_default();
    let statements = fields.next().ok_or("missing statement count")?;
    let hits = fields.next().ok_or("missing hit count")?;
    if fields.next().is_some() {
        return Err("unexpected trailing fields".into());
    }

    let (start, end) = range
        .split_once(',')
        .ok_or_else(|| format!("invalid range '{range}'"))?;
    let (start_line, start_col) = parse_position(start)?;
    let (end_line, end_col) = parse_position(end)?;
    if start_line > end_line {
        return Err(format!("start line {start_line} is after end line {end_line}"));
    }

    Ok(CoverageBlock {
        file_id: file_id.to_string(),
        start_line,
        start_col,
        end_line,
        end_col,
        statements: parse_number(statements, "statement count")?,
        hit_count: parse_number(hits, "hit count")?,
    })
}

fn parse_position(pos: &str) -> Result<(u32, u32), String> {
    let (line, col) = pos
        .split_once('.')
        .ok_or_else(|| format!("invalid position '{pos}'"))?;
    Ok((parse_number(line, "line")?, parse_number(col, "column")?))
}

fn parse_number<T: std::str::FromStr>(field: &str, what: &str) -> Result<T, String> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("invalid {what} '{field}'"));
    }
    field.parse().map_err(|_| format!("{what} out of range '{field}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mode_and_blocks() {
        let content = "\
mode: count
github.com/acme/w/pkg/file.go:8.13,12.2 3 5
github.com/acme/w/pkg/file.go:14.1,14.20 1 0
github.com/acme/w/pkg/other.go:1.1,2.2 1 1
";
        let profile = parse_profile_str(content, "cover.out").unwrap();
        assert_eq!(profile.mode(), Some(CoverMode::Count));
        assert_eq!(profile.block_count(), 3);

        let blocks = profile.blocks_for("github.com/acme/w/pkg/file.go");
        assert_eq!(blocks.len(), 2);
        assert_eq!(
            blocks[0],
            CoverageBlock {
                file_id: "github.com/acme/w/pkg/file.go".into(),
                start_line: 8,
                start_col: 13,
                end_line: 12,
                end_col: 2,
                statements: 3,
                hit_count: 5,
            }
        );
        assert_eq!(blocks[1].hit_count, 0);

        let mut files: Vec<&str> = profile.files().collect();
        files.sort_unstable();
        assert_eq!(
            files,
            vec!["github.com/acme/w/pkg/file.go", "github.com/acme/w/pkg/other.go"]
        );
    }

    #[test]
    fn mode_header_is_optional() {
        let profile = parse_profile_str("a.go:1.1,1.5 1 1\n", "p").unwrap();
        assert_eq!(profile.mode(), None);
        assert_eq!(profile.block_count(), 1);
    }

    #[test]
    fn empty_profile_has_no_blocks() {
        let profile = parse_profile_str("mode: set\n", "p").unwrap();
        assert_eq!(profile.block_count(), 0);
        let profile = parse_profile_str("", "p").unwrap();
        assert_eq!(profile.block_count(), 0);
    }

    #[test]
    fn overlapping_blocks_are_not_merged() {
        let content = "a.go:1.1,10.2 2 0\na.go:5.1,6.2 1 3\na.go:5.1,6.2 1 3\n";
        let profile = parse_profile_str(content, "p").unwrap();
        assert_eq!(profile.blocks_for("a.go").len(), 3);
    }

    #[test]
    fn windows_paths_split_on_last_colon() {
        let profile = parse_profile_str("C:\\src\\a.go:3.1,4.2 1 1\n", "p").unwrap();
        assert_eq!(profile.blocks_for("C:\\src\\a.go").len(), 1);
    }

    #[test]
    fn crlf_line_endings_accepted() {
        let profile = parse_profile_str("mode: set\r\na.go:1.1,2.2 1 1\r\n", "p").unwrap();
        assert_eq!(profile.block_count(), 1);
    }

    fn format_error(content: &str) -> (usize, String) {
        match parse_profile_str(content, "cover.out") {
            Err(PatchcovError::ProfileFormat { line, message, .. }) => (line, message),
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[test]
    fn missing_fields_rejected() {
        assert_eq!(format_error("a.go:1.1,2.2 1\n").1, "missing hit count");
        assert_eq!(format_error("a.go:1.1,2.2\n").1, "missing statement count");
    }

    #[test]
    fn non_numeric_fields_rejected() {
        let (line, message) = format_error("mode: set\na.go:1.1,2.2 1 1\na.go:x.1,2.2 1 1\n");
        assert_eq!(line, 3);
        assert!(message.contains("invalid line"));
        assert!(format_error("a.go:1.1,2.2 1 -1\n").1.contains("hit count"));
    }

    #[test]
    fn inverted_range_rejected() {
        assert!(format_error("a.go:9.1,2.2 1 1\n").1.contains("after end line"));
    }

    #[test]
    fn unknown_mode_rejected() {
        assert!(format_error("mode: branch\n").1.contains("unknown cover mode"));
    }

    #[test]
    fn late_mode_header_rejected() {
        let (line, _) = format_error("a.go:1.1,2.2 1 1\nmode: set\n");
        assert_eq!(line, 2);
    }

    #[test]
    fn line_without_colon_rejected() {
        assert!(format_error("garbage\n").1.contains("missing ':'"));
    }

    #[test]
    fn trailing_fields_rejected() {
        assert!(format_error("a.go:1.1,2.2 1 1 9\n").1.contains("trailing"));
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = parse_profile(&dir.path().join("nope.out")).unwrap_err();
        assert!(matches!(err, PatchcovError::ProfileRead { .. }));
    }

    #[test]
    fn reads_profile_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cover.out");
        std::fs::write(&path, "mode: atomic\npkg/a.go:1.1,3.2 2 4\n").unwrap();
        let profile = parse_profile(&path).unwrap();
        assert_eq!(profile.mode(), Some(CoverMode::Atomic));
        assert_eq!(profile.blocks_for("pkg/a.go")[0].hit_count, 4);
    }
}
