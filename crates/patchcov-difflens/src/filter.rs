//! Selects which files in a diff take part in coverage analysis.
//!
//! Only source files count; test files and paths matching configured
//! skip patterns are dropped before any correlation happens.

use std::path::Path;

use patchcov_core::DiffConfig;

/// Source/test classification by file name suffix, plus glob skip patterns.
///
/// # Examples
///
/// ```
/// use patchcov_difflens::filter::SourceFilter;
///
/// let filter = SourceFilter::go();
/// assert!(filter.includes("pkg/file.go"));
/// assert!(!filter.includes("pkg/file_test.go"));
/// assert!(!filter.includes("README.md"));
/// ```
#[derive(Debug, Clone)]
pub struct SourceFilter {
    source_suffixes: Vec<String>,
    test_suffixes: Vec<String>,
    skip_patterns: Vec<glob::Pattern>,
}

impl SourceFilter {
    /// Filter for Go code: `.go` sources, `_test.go` tests.
    pub fn go() -> Self {
        Self::from_config(&DiffConfig::default())
    }

    /// Create a filter from diff configuration.
    ///
    /// Skip patterns that are not valid globs are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use patchcov_core::DiffConfig;
    /// use patchcov_difflens::filter::SourceFilter;
    ///
    /// let config = DiffConfig {
    ///     skip_patterns: vec!["vendor/**".into()],
    ///     ..DiffConfig::default()
    /// };
    /// let filter = SourceFilter::from_config(&config);
    /// assert!(!filter.includes("vendor/dep/x.go"));
    /// assert!(filter.includes("cmd/x.go"));
    /// ```
    pub fn from_config(config: &DiffConfig) -> Self {
        let mut skip_patterns = Vec::new();
        for pat in &config.skip_patterns {
            match glob::Pattern::new(pat) {
                Ok(p) => skip_patterns.push(p),
                Err(e) => tracing::warn!(pattern = %pat, error = %e, "ignoring invalid skip pattern"),
            }
        }

        Self {
            source_suffixes: config.source_suffixes.clone(),
            test_suffixes: config.test_suffixes.clone(),
            skip_patterns,
        }
    }

    /// Whether `path` names a source file that is not a test file.
    pub fn is_source(&self, path: &str) -> bool {
        self.source_suffixes.iter().any(|s| path.ends_with(s.as_str()))
            && !self.test_suffixes.iter().any(|s| path.ends_with(s.as_str()))
    }

    /// Whether `path` should be analysed.
    pub fn includes(&self, path: &str) -> bool {
        self.is_source(path) && !self.is_skipped(Path::new(path))
    }

    fn is_skipped(&self, path: &Path) -> bool {
        self.skip_patterns.iter().any(|p| p.matches_path(path))
    }
}
