use std::fmt;

use patchcov_core::PatchcovError;

/// A pull request addressed as `owner/repo#number`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

impl PullRequest {
    fn api_path(&self) -> String {
        format!("/repos/{}/{}", self.owner, self.repo)
    }
}

impl fmt::Display for PullRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

/// Parse `owner/repo#number`.
///
/// # Errors
///
/// Returns [`PatchcovError::Config`] if the reference is malformed or the
/// number is not a positive integer.
///
/// # Examples
///
/// ```
/// use patchcov_report::github::parse_pr_reference;
///
/// let pr = parse_pr_reference("golang/go#12345").unwrap();
/// assert_eq!(pr.owner, "golang");
/// assert_eq!(pr.repo, "go");
/// assert_eq!(pr.number, 12345);
/// assert_eq!(pr.to_string(), "golang/go#12345");
/// ```
pub fn parse_pr_reference(pr_ref: &str) -> Result<PullRequest, PatchcovError> {
    let invalid = |why: &str| {
        PatchcovError::Config(format!(
            "invalid pull request '{pr_ref}': {why} (expected owner/repo#number)"
        ))
    };

    let (slug, number) = pr_ref.rsplit_once('#').ok_or_else(|| invalid("missing '#'"))?;
    let (owner, repo) = slug.split_once('/').ok_or_else(|| invalid("missing '/'"))?;
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return Err(invalid("owner and repository must be single non-empty names"));
    }
    let number = match number.parse::<u64>() {
        Ok(n) if n > 0 => n,
        _ => return Err(invalid("number must be a positive integer")),
    };

    Ok(PullRequest {
        owner: owner.to_string(),
        repo: repo.to_string(),
        number,
    })
}

/// Fetches pull request diffs and posts the coverage report back as a comment.
pub struct GitHubClient {
    octocrab: octocrab::Octocrab,
    http: reqwest::Client,
    token: String,
}

impl GitHubClient {
    /// Build a client authenticated with `token`.
    ///
    /// # Errors
    ///
    /// Returns [`PatchcovError::Config`] for an empty token, or
    /// [`PatchcovError::GitHub`] if the API client cannot be built.
    pub fn new(token: &str) -> Result<Self, PatchcovError> {
        if token.is_empty() {
            return Err(PatchcovError::Config(
                "a GitHub token is required for --pr. Pass --github-token or set GITHUB_TOKEN"
                    .into(),
            ));
        }

        let octocrab = octocrab::Octocrab::builder()
            .personal_token(token.to_string())
            .build()
            .map_err(|e| PatchcovError::GitHub(format!("failed to create GitHub client: {e}")))?;

        Ok(Self {
            octocrab,
            http: reqwest::Client::new(),
            token: token.to_string(),
        })
    }

    /// Download the unified diff of `pr`.
    ///
    /// The REST API serves it from the pull request URL when asked for the
    /// diff media type.
    ///
    /// # Errors
    ///
    /// Returns [`PatchcovError::GitHub`] on network failure or a non-success status.
    pub async fn get_pr_diff(&self, pr: &PullRequest) -> Result<String, PatchcovError> {
        let url = format!("https://api.github.com{}/pulls/{}", pr.api_path(), pr.number);
        tracing::debug!(%pr, "fetching pull request diff");

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/vnd.github.v3.diff")
            .header("Authorization", format!("Bearer {}", self.token))
            .header("User-Agent", "patchcov")
            .send()
            .await
            .map_err(|e| PatchcovError::GitHub(format!("failed to fetch diff of {pr}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PatchcovError::GitHub(format!(
                "fetching diff of {pr} returned {status}: {body}"
            )));
        }

        response
            .text()
            .await
            .map_err(|e| PatchcovError::GitHub(format!("failed to read diff of {pr}: {e}")))
    }

    /// Post `body` as a conversation comment on `pr` and return the comment's URL.
    ///
    /// # Errors
    ///
    /// Returns [`PatchcovError::GitHub`] on API errors.
    pub async fn post_comment(&self, pr: &PullRequest, body: &str) -> Result<String, PatchcovError> {
        // Pull requests share the issue comment endpoint.
        let route = format!("{}/issues/{}/comments", pr.api_path(), pr.number);
        let payload = serde_json::json!({ "body": body });

        let response: serde_json::Value = self
            .octocrab
            .post(route, Some(&payload))
            .await
            .map_err(|e| PatchcovError::GitHub(format!("failed to comment on {pr}: {e}")))?;

        Ok(response
            .get("html_url")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_owner_repo_and_number() {
        let pr = parse_pr_reference("octocat/hello-world#42").unwrap();
        assert_eq!(
            pr,
            PullRequest {
                owner: "octocat".into(),
                repo: "hello-world".into(),
                number: 42,
            }
        );
        assert_eq!(pr.api_path(), "/repos/octocat/hello-world");
    }

    #[test]
    fn rejects_malformed_references() {
        for bad in [
            "owner/repo",
            "repo#123",
            "/repo#1",
            "owner/#1",
            "a/b/c#1",
            "owner/repo#abc",
            "owner/repo#0",
            "owner/repo#-3",
        ] {
            let err = parse_pr_reference(bad).unwrap_err();
            assert!(matches!(err, PatchcovError::Config(_)), "{bad} accepted");
        }
    }

    #[test]
    fn empty_token_is_a_config_error() {
        let err = GitHubClient::new("").err().unwrap();
        assert!(matches!(err, PatchcovError::Config(_)));
    }
}
