use patchcov_core::{AddedLine, ChangeSet};
use patchcov_profile::CoverageProfile;

/// Mark every added line that the profile shows as executed.
///
/// A line is covered when some block for the same file identifier contains
/// it and ran at least once, or when its text is exactly `}` or empty. Lines
/// are never uncovered again. Change sets whose path is absent from the
/// profile keep every other line uncovered.
///
/// # Examples
///
/// ```
/// use patchcov_core::{AddedLine, ChangeSet};
/// use patchcov_profile::parse_profile_str;
/// use patchcov_report::correlate::correlate;
///
/// let mut set = ChangeSet::new("pkg/file.go");
/// set.lines.push(AddedLine::new(10, "\tfmt.Println(\"x\")"));
/// set.lines.push(AddedLine::new(20, "\treturn nil"));
///
/// let profile = parse_profile_str("mode: set\npkg/file.go:8.1,12.2 1 1\n", "cover.out").unwrap();
/// let sets = correlate(vec![set], &profile);
/// assert!(sets[0].lines[0].covered);
/// assert!(!sets[0].lines[1].covered);
/// ```
pub fn correlate(mut change_sets: Vec<ChangeSet>, profile: &CoverageProfile) -> Vec<ChangeSet> {
    for set in &mut change_sets {
        let blocks = profile.blocks_for(&set.path);
        if blocks.is_empty() {
            tracing::debug!(path = %set.path, "no coverage blocks for file");
        }
        for line in &mut set.lines {
            if blocks.iter().any(|b| b.covers(line.number)) || is_structural_noise(line) {
                line.covered = true;
            }
        }
        tracing::debug!(
            path = %set.path,
            added = set.lines.len(),
            uncovered = set.uncovered().count(),
            "correlated"
        );
    }
    change_sets
}

/// Lines that are never an executable statement on their own.
fn is_structural_noise(line: &AddedLine) -> bool {
    line.text.is_empty() || line.text == "}"
}
