use patchcov_core::{ChangeSet, ReportConfig, DEFAULT_HEADER};

/// Presentation options for [`render`].
///
/// # Examples
///
/// ```
/// use patchcov_report::render::RenderOptions;
///
/// let options = RenderOptions::markdown();
/// assert!(options.markdown);
/// assert_eq!(options.fence_language, "go");
/// ```
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Wrap the body in a single fenced code block.
    pub markdown: bool,
    /// Advisory line placed above the body.
    pub header: String,
    /// Info string of the code fence.
    pub fence_language: String,
}

impl RenderOptions {
    /// Plain-text output with the default header.
    pub fn text() -> Self {
        Self {
            markdown: false,
            header: DEFAULT_HEADER.into(),
            fence_language: "go".into(),
        }
    }

    /// Fenced markdown output with the default header.
    pub fn markdown() -> Self {
        Self {
            markdown: true,
            ..Self::text()
        }
    }

    /// Options taken from the `[report]` configuration section.
    pub fn from_config(config: &ReportConfig, markdown: bool) -> Self {
        Self {
            markdown,
            header: config.header.clone(),
            fence_language: config.fence_language.clone(),
        }
    }
}

/// Render the uncovered lines of correlated change sets.
///
/// Returns an empty string when every line is covered, so callers can treat a
/// non-empty result as "found uncovered code". Otherwise every change set
/// contributes its path followed by one `<number> <text>` line per uncovered
/// line; the header comes first and the result is trimmed.
///
/// # Examples
///
/// ```
/// use patchcov_core::{AddedLine, ChangeSet};
/// use patchcov_report::render::{render, RenderOptions};
///
/// let mut set = ChangeSet::new("pkg/file.go");
/// set.lines.push(AddedLine::new(10, "fmt.Println(\"x\")"));
///
/// let report = render(&[set], &RenderOptions::text());
/// assert_eq!(
///     report,
///     "Please note the following code is not covered by tests.\n\
///      pkg/file.go\n\n10 fmt.Println(\"x\")"
/// );
/// ```
pub fn render(change_sets: &[ChangeSet], options: &RenderOptions) -> String {
    if !change_sets.iter().any(ChangeSet::has_uncovered) {
        return String::new();
    }

    let mut body = String::new();
    for set in change_sets {
        body.push_str(&format!("{}\n\n", set.path));
        for line in set.uncovered() {
            body.push_str(&format!("{} {}\n", line.number, line.text));
        }
    }

    if options.markdown {
        body = format!("```{}\n{body}```", options.fence_language);
    }

    let body = body.trim();
    if body.is_empty() {
        return String::new();
    }
    format!("{}\n{body}", options.header).trim().to_string()
}
