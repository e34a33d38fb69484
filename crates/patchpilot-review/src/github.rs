use serde::Deserialize;

use patchpilot_core::{ChangedFile, PilotError};

/// GitHub client for diff comparison, commit listing, comment posting, and
/// repository-variable lookup.
///
/// # Examples
///
/// ```no_run
/// use patchpilot_review::github::GitHubClient;
///
/// let client = GitHubClient::new(Some("ghp_xxxx")).unwrap();
/// ```
pub struct GitHubClient {
    octocrab: octocrab::Octocrab,
    http: reqwest::Client,
    token: String,
}

#[derive(Deserialize)]
struct CompareResponse {
    #[serde(default)]
    files: Vec<ChangedFile>,
}

#[derive(Deserialize)]
struct CommitEntry {
    sha: String,
}

#[derive(Deserialize)]
struct RepoVariable {
    value: String,
}

impl GitHubClient {
    /// Create a client from an explicit token or the `GITHUB_TOKEN` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`PilotError::Config`] if no token is available, or
    /// [`PilotError::Github`] if the client cannot be built.
    pub fn new(token: Option<&str>) -> Result<Self, PilotError> {
        let token = match token {
            Some(t) => t.to_string(),
            None => std::env::var("GITHUB_TOKEN").map_err(|_| {
                PilotError::Config("GITHUB_TOKEN not set. The bot needs it to talk to GitHub".into())
            })?,
        };

        let octocrab = octocrab::Octocrab::builder()
            .personal_token(token.clone())
            .build()
            .map_err(|e| PilotError::Github(format!("failed to create GitHub client: {e}")))?;

        let http = reqwest::Client::new();

        Ok(Self {
            octocrab,
            http,
            token,
        })
    }

    /// Fetch the changed files between two commits.
    ///
    /// # Errors
    ///
    /// Returns [`PilotError::Github`] on network or API errors.
    pub async fn compare_files(
        &self,
        owner: &str,
        repo: &str,
        base: &str,
        head: &str,
    ) -> Result<Vec<ChangedFile>, PilotError> {
        let url = format!("https://api.github.com/repos/{owner}/{repo}/compare/{base}...{head}");

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .header("Authorization", format!("Bearer {}", self.token))
            .header("User-Agent", "patchpilot")
            .send()
            .await
            .map_err(|e| PilotError::Github(format!("failed to fetch comparison: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PilotError::Github(format!(
                "GitHub API error {status}: {body}"
            )));
        }

        let compared: CompareResponse = response
            .json()
            .await
            .map_err(|e| PilotError::Github(format!("failed to parse comparison: {e}")))?;

        Ok(compared.files)
    }

    /// List the commit SHAs of a pull request, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`PilotError::Github`] on API errors.
    pub async fn list_commit_shas(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
    ) -> Result<Vec<String>, PilotError> {
        let route = format!("/repos/{owner}/{repo}/pulls/{pr_number}/commits");
        let commits: Vec<CommitEntry> = self
            .octocrab
            .get(route, None::<&()>)
            .await
            .map_err(|e| PilotError::Github(format!("failed to list PR commits: {e}")))?;

        Ok(commits.into_iter().map(|c| c.sha).collect())
    }

    /// Post a comment on the pull request's issue thread.
    ///
    /// # Errors
    ///
    /// Returns [`PilotError::Github`] on API errors.
    pub async fn post_comment(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
        body: &str,
    ) -> Result<(), PilotError> {
        let route = format!("/repos/{owner}/{repo}/issues/{pr_number}/comments");
        let payload = serde_json::json!({ "body": body });

        let _response: serde_json::Value = self
            .octocrab
            .post(route, Some(&payload))
            .await
            .map_err(|e| PilotError::Github(format!("failed to post comment: {e}")))?;

        Ok(())
    }

    /// Fetch a repository-level Actions variable, or `None` when it is not defined.
    ///
    /// # Errors
    ///
    /// Returns [`PilotError::Github`] on errors other than the variable being absent.
    pub async fn repo_variable(
        &self,
        owner: &str,
        repo: &str,
        name: &str,
    ) -> Result<Option<String>, PilotError> {
        let url = format!("https://api.github.com/repos/{owner}/{repo}/actions/variables/{name}");

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .header("Authorization", format!("Bearer {}", self.token))
            .header("User-Agent", "patchpilot")
            .send()
            .await
            .map_err(|e| PilotError::Github(format!("failed to fetch repo variable: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PilotError::Github(format!(
                "GitHub API error {status}: {body}"
            )));
        }

        let variable: RepoVariable = response
            .json()
            .await
            .map_err(|e| PilotError::Github(format!("failed to parse repo variable: {e}")))?;

        Ok(Some(variable.value))
    }
}
