//! Maps repository-relative diff paths onto coverage profile file identifiers.

use std::path::{Path, PathBuf};

use patchcov_core::PatchcovError;

/// Base directory joined in front of every diff path.
///
/// # Examples
///
/// ```
/// use patchcov_difflens::prefix::PathPrefix;
///
/// let prefix = PathPrefix::new("github.com/acme/widgets");
/// assert_eq!(prefix.join("pkg/file.go"), "github.com/acme/widgets/pkg/file.go");
/// assert_eq!(PathPrefix::none().join("pkg/file.go"), "pkg/file.go");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathPrefix(PathBuf);

impl PathPrefix {
    /// A literal prefix.
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        Self(prefix.into())
    }

    /// No prefix: diff paths are used as-is.
    pub fn none() -> Self {
        Self::default()
    }

    /// Read the module path from the `module` directive of `go.mod` in `repo_root`.
    ///
    /// # Errors
    ///
    /// Returns [`PatchcovError::Io`] if `go.mod` cannot be read, or
    /// [`PatchcovError::Config`] if it has no `module` directive.
    pub fn from_go_mod(repo_root: &Path) -> Result<Self, PatchcovError> {
        let path = repo_root.join("go.mod");
        let content = std::fs::read_to_string(&path)?;
        let module = parse_module_directive(&content).ok_or_else(|| {
            PatchcovError::Config(format!("no module directive in {}", path.display()))
        })?;
        Ok(Self::new(module))
    }

    /// Legacy layout: the working directory relative to `$GOPATH/src`, followed by `base_dir`.
    ///
    /// A working directory outside `$GOPATH/src` is used unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    /// use patchcov_difflens::prefix::PathPrefix;
    ///
    /// let prefix = PathPrefix::from_gopath(
    ///     Path::new("/home/dev/go/src/github.com/acme/widgets"),
    ///     Path::new("/home/dev/go"),
    ///     "",
    /// );
    /// assert_eq!(prefix.join("main.go"), "github.com/acme/widgets/main.go");
    /// ```
    pub fn from_gopath(working_dir: &Path, gopath: &Path, base_dir: &str) -> Self {
        let src = gopath.join("src");
        let relative = working_dir.strip_prefix(&src).unwrap_or(working_dir);
        if base_dir.is_empty() {
            Self::new(relative)
        } else {
            Self::new(relative.join(base_dir))
        }
    }

    /// Whether this prefix adds nothing.
    pub fn is_empty(&self) -> bool {
        self.0.as_os_str().is_empty()
    }

    /// Join `name` onto the prefix with the platform path separator.
    pub fn join(&self, name: &str) -> String {
        if self.is_empty() {
            return name.to_string();
        }
        self.0.join(name).to_string_lossy().into_owned()
    }
}

fn parse_module_directive(go_mod: &str) -> Option<String> {
    go_mod.lines().find_map(|line| {
        let line = line.split("//").next().unwrap_or("").trim();
        let rest = line.strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let module = rest.trim().trim_matches('"');
        (!module.is_empty()).then(|| module.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_prefix_passes_name_through() {
        assert!(PathPrefix::none().is_empty());
        assert_eq!(PathPrefix::new("").join("a/b.go"), "a/b.go");
    }

    #[test]
    fn module_directive_parsed() {
        let go_mod = "// comment\nmodule github.com/acme/widgets // trailing\n\ngo 1.22\n";
        assert_eq!(
            parse_module_directive(go_mod).as_deref(),
            Some("github.com/acme/widgets")
        );
    }

    #[test]
    fn quoted_module_directive_parsed() {
        assert_eq!(
            parse_module_directive("module \"example.com/m\"\n").as_deref(),
            Some("example.com/m")
        );
    }

    #[test]
    fn modulefoo_is_not_a_directive() {
        assert!(parse_module_directive("modulefoo x\n").is_none());
        assert!(parse_module_directive("go 1.21\n").is_none());
    }

    #[test]
    fn from_go_mod_reads_repo_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("go.mod"), "module example.com/svc\n\ngo 1.22\n").unwrap();
        let prefix = PathPrefix::from_go_mod(dir.path()).unwrap();
        assert_eq!(prefix.join("api/h.go"), "example.com/svc/api/h.go");
    }

    #[test]
    fn from_go_mod_without_module_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("go.mod"), "go 1.22\n").unwrap();
        let err = PathPrefix::from_go_mod(dir.path()).unwrap_err();
        assert!(matches!(err, PatchcovError::Config(_)));
    }

    #[test]
    fn from_go_mod_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PathPrefix::from_go_mod(dir.path()).unwrap_err();
        assert!(matches!(err, PatchcovError::Io(_)));
    }

    #[test]
    fn gopath_layout_appends_base_dir() {
        let prefix = PathPrefix::from_gopath(
            Path::new("/go/src/github.com/acme/widgets"),
            Path::new("/go"),
            "test",
        );
        assert_eq!(prefix.join("x.go"), "github.com/acme/widgets/test/x.go");
    }

    #[test]
    fn outside_gopath_keeps_working_dir() {
        let prefix = PathPrefix::from_gopath(Path::new("/work/widgets"), Path::new("/go"), "");
        assert_eq!(prefix.join("x.go"), "/work/widgets/x.go");
    }
}
