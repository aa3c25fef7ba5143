use std::path::PathBuf;

use miette::Diagnostic;

/// Errors that can occur across patchcov.
///
/// Library crates return this type directly; the binary renders it through
/// `miette` at the boundary.
///
/// # Examples
///
/// ```
/// use patchcov_core::PatchcovError;
///
/// let err = PatchcovError::Config("--post-comment requires --pr".into());
/// assert!(err.to_string().contains("--post-comment"));
/// ```
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum PatchcovError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    #[diagnostic(code(patchcov::io))]
    Io(#[from] std::io::Error),

    /// Inconsistent or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(code(patchcov::config))]
    Config(String),

    /// The diff text is not a valid unified diff.
    #[error("diff parse error: {0}")]
    #[diagnostic(
        code(patchcov::diff_parse),
        help("run without --strict to treat an unreadable diff as empty")
    )]
    DiffParse(String),

    /// The coverage profile could not be opened or read.
    #[error("cannot read coverage profile {}", .path.display())]
    #[diagnostic(
        code(patchcov::profile_read),
        help("generate one with `go test -coverprofile=cover.out ./...`")
    )]
    ProfileRead {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A coverage profile line does not match the expected syntax.
    #[error("malformed coverage profile {}:{line}: {message}", .path.display())]
    #[diagnostic(
        code(patchcov::profile_format),
        help("expected `file:startLine.startCol,endLine.endCol statements hits`")
    )]
    ProfileFormat {
        /// Profile path (or a label for in-memory content).
        path: PathBuf,
        /// 1-based line number within the profile.
        line: usize,
        /// What was wrong with the line.
        message: String,
    },

    /// Local git invocation failure.
    #[error("git error: {0}")]
    #[diagnostic(code(patchcov::git))]
    Git(String),

    /// GitHub API failure.
    #[error("GitHub error: {0}")]
    #[diagnostic(code(patchcov::github))]
    GitHub(String),

    /// JSON serialization failure.
    #[error("serialization error: {0}")]
    #[diagnostic(code(patchcov::serialization))]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    #[diagnostic(code(patchcov::toml))]
    Toml(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: PatchcovError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn config_error_displays_message() {
        let err = PatchcovError::Config("bad value".into());
        assert_eq!(err.to_string(), "configuration error: bad value");
    }

    #[test]
    fn profile_format_shows_location() {
        let err = PatchcovError::ProfileFormat {
            path: PathBuf::from("cover.out"),
            line: 3,
            message: "missing hit count".into(),
        };
        assert_eq!(
            err.to_string(),
            "malformed coverage profile cover.out:3: missing hit count"
        );
    }

    #[test]
    fn profile_read_keeps_source() {
        use std::error::Error;

        let err = PatchcovError::ProfileRead {
            path: PathBuf::from("/tmp/missing.out"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        assert!(err.to_string().contains("/tmp/missing.out"));
        assert!(err.source().is_some());
    }
}
