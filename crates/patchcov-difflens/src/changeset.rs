use patchcov_core::{AddedLine, ChangeSet, ParseMode, PatchcovError};

use crate::filter::SourceFilter;
use crate::parser::{parse_unified_diff, FileDiff};
use crate::prefix::PathPrefix;

/// Build one [`ChangeSet`] per analysed file in `diff_text`.
///
/// Every hunk of every file contributes its added lines. Deleted files,
/// rename-only entries, files without hunks and files whose hunks add no
/// line produce no change set, so a diff without added source lines yields
/// an empty vector.
///
/// # Errors
///
/// In [`ParseMode::Strict`], returns [`PatchcovError::DiffParse`] for a
/// malformed diff. In [`ParseMode::Lenient`] the same diff yields an empty
/// result and a warning is logged.
///
/// # Examples
///
/// ```
/// use patchcov_core::ParseMode;
/// use patchcov_difflens::changeset::build_change_sets;
/// use patchcov_difflens::filter::SourceFilter;
/// use patchcov_difflens::prefix::PathPrefix;
///
/// let diff = "--- a/pkg/file.go\n+++ b/pkg/file.go\n@@ -9,0 +10 @@\n+\tfmt.Println(\"x\")\n";
/// let sets = build_change_sets(diff, &PathPrefix::none(), &SourceFilter::go(), ParseMode::Strict).unwrap();
/// assert_eq!(sets[0].path, "pkg/file.go");
/// assert_eq!(sets[0].lines[0].number, 10);
/// ```
pub fn build_change_sets(
    diff_text: &str,
    prefix: &PathPrefix,
    filter: &SourceFilter,
    mode: ParseMode,
) -> Result<Vec<ChangeSet>, PatchcovError> {
    let files = match parse_unified_diff(diff_text) {
        Ok(files) => files,
        Err(e) if mode == ParseMode::Lenient => {
            tracing::warn!(error = %e, "diff could not be parsed; treating it as empty");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e),
    };

    Ok(files
        .iter()
        .filter_map(|file| change_set_for(file, prefix, filter))
        .collect())
}

fn change_set_for(file: &FileDiff, prefix: &PathPrefix, filter: &SourceFilter) -> Option<ChangeSet> {
    let name = file.new_path.to_string_lossy();
    if file.is_deleted_file || file.hunks.is_empty() {
        tracing::debug!(file = %name, "skipping file without new-side hunks");
        return None;
    }
    if !filter.includes(&name) {
        tracing::debug!(file = %name, "skipping non-source or test file");
        return None;
    }

    let mut set = ChangeSet::new(prefix.join(&name));
    set.lines = file
        .added_lines()
        .filter_map(|l| Some(AddedLine::new(l.new_number?, l.content.clone())))
        .collect();
    if set.lines.is_empty() {
        tracing::debug!(file = %name, "skipping file without added lines");
        return None;
    }
    tracing::debug!(path = %set.path, added = set.lines.len(), "built change set");
    Some(set)
}
