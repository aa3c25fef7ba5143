use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PatchcovError;
use crate::types::ParseMode;

/// Advisory line placed above a non-empty report.
pub const DEFAULT_HEADER: &str = "Please note the following code is not covered by tests.";

/// Top-level configuration loaded from `.patchcov.toml`.
///
/// Supports layered resolution: CLI flags > env vars > local config > defaults.
///
/// # Examples
///
/// ```
/// use patchcov_core::PatchcovConfig;
///
/// let config = PatchcovConfig::default();
/// assert_eq!(config.diff.source_suffixes, vec![".go"]);
/// assert_eq!(config.diff.test_suffixes, vec!["_test.go"]);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatchcovConfig {
    /// Which files in a diff are analysed and how strictly it is parsed.
    #[serde(default)]
    pub diff: DiffConfig,
    /// How diff paths are mapped onto profile file identifiers.
    #[serde(default)]
    pub paths: PathsConfig,
    /// Report presentation.
    #[serde(default)]
    pub report: ReportConfig,
}

impl PatchcovConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PatchcovError::Io`] if the file cannot be read,
    /// [`PatchcovError::Toml`] if the content is not valid TOML, or
    /// [`PatchcovError::Config`] if the values are inconsistent.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use patchcov_core::PatchcovConfig;
    /// use std::path::Path;
    ///
    /// let config = PatchcovConfig::from_file(Path::new(".patchcov.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, PatchcovError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`PatchcovError::Toml`] if parsing fails, or
    /// [`PatchcovError::Config`] if validation fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use patchcov_core::PatchcovConfig;
    ///
    /// let toml = r#"
    /// [paths]
    /// prefix = "github.com/acme/widgets"
    /// "#;
    /// let config = PatchcovConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.paths.prefix.as_deref(), Some("github.com/acme/widgets"));
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, PatchcovError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject combinations that cannot produce a meaningful gate.
    ///
    /// # Errors
    ///
    /// Returns [`PatchcovError::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<(), PatchcovError> {
        if self.diff.source_suffixes.is_empty() {
            return Err(PatchcovError::Config(
                "diff.source_suffixes must list at least one suffix".into(),
            ));
        }
        if self.diff.source_suffixes.iter().any(|s| s.is_empty()) {
            return Err(PatchcovError::Config(
                "diff.source_suffixes must not contain an empty suffix".into(),
            ));
        }
        if self.diff.test_suffixes.iter().any(|s| s.is_empty()) {
            return Err(PatchcovError::Config(
                "diff.test_suffixes must not contain an empty suffix".into(),
            ));
        }
        if self.paths.prefix.is_some() && self.paths.from_go_mod {
            return Err(PatchcovError::Config(
                "paths.prefix and paths.from_go_mod are mutually exclusive".into(),
            ));
        }
        Ok(())
    }
}

/// Diff selection configuration.
///
/// # Examples
///
/// ```
/// use patchcov_core::{DiffConfig, ParseMode};
///
/// let config = DiffConfig::default();
/// assert!(!config.strict);
/// assert_eq!(config.parse_mode(), ParseMode::Lenient);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffConfig {
    /// File name suffixes that mark a source file (default: `[".go"]`).
    #[serde(default = "default_source_suffixes")]
    pub source_suffixes: Vec<String>,
    /// File name suffixes that mark a test file (default: `["_test.go"]`).
    #[serde(default = "default_test_suffixes")]
    pub test_suffixes: Vec<String>,
    /// Glob patterns for additional paths to ignore (e.g. `"vendor/**"`).
    #[serde(default)]
    pub skip_patterns: Vec<String>,
    /// Fail on a malformed diff instead of treating it as empty.
    #[serde(default)]
    pub strict: bool,
}

impl DiffConfig {
    /// The parse mode selected by [`DiffConfig::strict`].
    pub fn parse_mode(&self) -> ParseMode {
        if self.strict {
            ParseMode::Strict
        } else {
            ParseMode::Lenient
        }
    }
}

fn default_source_suffixes() -> Vec<String> {
    vec![".go".into()]
}

fn default_test_suffixes() -> Vec<String> {
    vec!["_test.go".into()]
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            source_suffixes: default_source_suffixes(),
            test_suffixes: default_test_suffixes(),
            skip_patterns: Vec::new(),
            strict: false,
        }
    }
}

/// Path prefix configuration.
///
/// Coverage tools usually identify files by an import path such as
/// `github.com/acme/widgets/pkg/file.go` while diffs carry repository-relative
/// names. The prefix bridges the two.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Literal prefix joined in front of every diff path.
    pub prefix: Option<String>,
    /// Read the prefix from the `module` line of `go.mod` in the repository root.
    #[serde(default)]
    pub from_go_mod: bool,
}

/// Report presentation configuration.
///
/// # Examples
///
/// ```
/// use patchcov_core::{ReportConfig, DEFAULT_HEADER};
///
/// let config = ReportConfig::default();
/// assert_eq!(config.header, DEFAULT_HEADER);
/// assert_eq!(config.fence_language, "go");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Advisory line prepended to a non-empty report.
    #[serde(default = "default_header")]
    pub header: String,
    /// Info string for the markdown code fence (default: `"go"`).
    #[serde(default = "default_fence_language")]
    pub fence_language: String,
}

fn default_header() -> String {
    DEFAULT_HEADER.into()
}

fn default_fence_language() -> String {
    "go".into()
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            header: default_header(),
            fence_language: default_fence_language(),
        }
    }
}
