//! Pull-request event orchestration.
//!
//! Drives the full pipeline for one event: credential resolution, PR
//! preconditions, diff fetch (narrowed on incremental pushes), file selection,
//! patch assembly, the review call, and comment posting. Every failure is
//! handled at its own stage and logged; nothing here terminates the process.

use std::fmt;

use serde::Deserialize;

use patchpilot_core::BotConfig;
use patchpilot_filter::{assembler, selector};

use crate::client::ReviewClient;
use crate::github::GitHubClient;
use crate::llm::OpenAiBackend;

/// The comment body posted when the review finds nothing to flag.
pub const LGTM_COMMENT: &str = "LGTM 👍";

const CREDENTIAL_VARIABLE: &str = "OPENAI_API_KEY";

const CREDENTIAL_HELP_COMMENT: &str = "Seems you are using me but didn't get `OPENAI_API_KEY` \
set in the repository's Variables/Secrets. Please add it (or export it in the workflow \
environment) so I can review your pull requests. See the README's configuration section \
for details.";

/// A `pull_request` webhook event, reduced to the fields the handler consumes.
///
/// # Examples
///
/// ```
/// use patchpilot_review::handler::PullRequestEvent;
///
/// let event: PullRequestEvent = serde_json::from_str(r#"{
///     "action": "opened",
///     "pull_request": {
///         "number": 7,
///         "state": "open",
///         "locked": false,
///         "labels": [],
///         "base": {"sha": "aaa"},
///         "head": {"sha": "bbb"}
///     },
///     "repository": {"name": "r", "owner": {"login": "o"}}
/// }"#).unwrap();
/// assert_eq!(event.action, "opened");
/// assert_eq!(event.pull_request.number, 7);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestEvent {
    /// What happened: `opened`, `synchronize`, `closed`, ...
    pub action: String,
    /// The pull request the event concerns.
    pub pull_request: PullRequest,
    /// The repository the pull request belongs to.
    pub repository: Repository,
}

/// Pull-request metadata from the event payload.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    /// PR number within the repository.
    pub number: u64,
    /// `open` or `closed`.
    pub state: String,
    /// Whether the conversation is locked.
    #[serde(default)]
    pub locked: bool,
    /// Labels currently attached.
    #[serde(default)]
    pub labels: Vec<Label>,
    /// Base branch tip.
    pub base: GitRef,
    /// Head branch tip.
    pub head: GitRef,
}

/// A label attached to the pull request.
#[derive(Debug, Clone, Deserialize)]
pub struct Label {
    /// Label name.
    pub name: String,
}

/// A git reference with its commit SHA.
#[derive(Debug, Clone, Deserialize)]
pub struct GitRef {
    /// Commit SHA.
    pub sha: String,
}

/// Repository coordinates from the event payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    /// Repository name.
    pub name: String,
    /// Repository owner.
    pub owner: Owner,
}

/// Repository owner.
#[derive(Debug, Clone, Deserialize)]
pub struct Owner {
    /// Owner login.
    pub login: String,
}

/// Terminal status of handling one pull-request event.
///
/// Early exits are statuses, not errors: they describe why no review comment
/// was (or was not) posted.
///
/// # Examples
///
/// ```
/// use patchpilot_review::handler::HandlerStatus;
///
/// assert_eq!(HandlerStatus::LabelMissing.to_string(), "target label not attached");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerStatus {
    /// No API key available in config or repo variables; a guidance comment was posted.
    NoCredential,
    /// The pull request is closed or locked.
    NotReviewable,
    /// A target label is configured and the PR does not carry it.
    LabelMissing,
    /// The comparison returned no changed files.
    EmptyDiff,
    /// Selection rules filtered out every changed file.
    NothingSelected,
    /// The review ran to completion (comment posting may still have failed and been logged).
    Reviewed,
    /// The review could not be produced; no comment was posted.
    ReviewFailed,
}

impl fmt::Display for HandlerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerStatus::NoCredential => write!(f, "no API key configured"),
            HandlerStatus::NotReviewable => write!(f, "pull request closed or locked"),
            HandlerStatus::LabelMissing => write!(f, "target label not attached"),
            HandlerStatus::EmptyDiff => write!(f, "no changed files"),
            HandlerStatus::NothingSelected => write!(f, "all changed files filtered out"),
            HandlerStatus::Reviewed => write!(f, "review completed"),
            HandlerStatus::ReviewFailed => write!(f, "review failed"),
        }
    }
}

/// The diff range to fetch for an event.
///
/// On a synchronize event with at least two listed commits, the range narrows
/// to the last two so each incremental push reviews only what it added,
/// instead of re-reviewing the whole PR. Everything else reviews base..head.
///
/// # Examples
///
/// ```
/// use patchpilot_review::handler::diff_range;
///
/// let commits = vec!["c1".to_string(), "c2".to_string(), "c3".to_string()];
/// assert_eq!(diff_range("base", "head", "synchronize", &commits), ("c2", "c3"));
/// assert_eq!(diff_range("base", "head", "opened", &commits), ("base", "head"));
/// ```
pub fn diff_range<'a>(
    base: &'a str,
    head: &'a str,
    action: &str,
    commits: &'a [String],
) -> (&'a str, &'a str) {
    if action == "synchronize" && commits.len() >= 2 {
        (
            commits[commits.len() - 2].as_str(),
            commits[commits.len() - 1].as_str(),
        )
    } else {
        (base, head)
    }
}

/// Orchestrates one pull-request event end to end.
pub struct EventHandler {
    github: GitHubClient,
    config: BotConfig,
}

impl EventHandler {
    /// Create a handler from a GitHub client and bot configuration.
    pub fn new(github: GitHubClient, config: BotConfig) -> Self {
        Self { github, config }
    }

    /// Handle a pull-request event.
    ///
    /// Always returns a status; failures at any stage are logged and mapped
    /// to a status instead of propagating.
    pub async fn handle(&self, event: &PullRequestEvent) -> HandlerStatus {
        let pr = &event.pull_request;
        let owner = event.repository.owner.login.as_str();
        let repo = event.repository.name.as_str();

        let Some(api_key) = self.resolve_credential(owner, repo, pr.number).await else {
            return HandlerStatus::NoCredential;
        };

        if pr.state != "open" || pr.locked {
            tracing::info!(number = pr.number, state = %pr.state, locked = pr.locked, "skipping PR");
            return HandlerStatus::NotReviewable;
        }

        if let Some(target) = &self.config.target_label {
            if !pr.labels.iter().any(|label| &label.name == target) {
                tracing::info!(number = pr.number, label = %target, "target label not attached");
                return HandlerStatus::LabelMissing;
            }
        }

        let commits = if event.action == "synchronize" {
            match self.github.list_commit_shas(owner, repo, pr.number).await {
                Ok(shas) => shas,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to list commits, falling back to full range");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };
        let (from, to) = diff_range(&pr.base.sha, &pr.head.sha, &event.action, &commits);

        let files = match self.github.compare_files(owner, repo, from, to).await {
            Ok(files) => files,
            Err(e) => {
                tracing::error!(error = %e, from, to, "failed to fetch diff");
                return HandlerStatus::ReviewFailed;
            }
        };
        if files.is_empty() {
            tracing::info!(number = pr.number, "comparison returned no changed files");
            return HandlerStatus::EmptyDiff;
        }

        let selected = selector::select(files, &self.config.rules);
        if selected.is_empty() {
            tracing::info!(number = pr.number, "selection rules left nothing to review");
            return HandlerStatus::NothingSelected;
        }

        let patch = assembler::assemble(&selected, self.config.max_patch_length);

        let verdict = {
            let backend = match OpenAiBackend::new(&self.config.llm, api_key) {
                Ok(backend) => backend,
                Err(e) => {
                    tracing::error!(error = %e, "failed to build LLM backend");
                    return HandlerStatus::ReviewFailed;
                }
            };
            let client = ReviewClient::new(backend, self.config.llm.clone());
            match client.review(&patch).await {
                Ok(verdict) => verdict,
                Err(e) => {
                    tracing::error!(error = %e, "review call failed, no comment will be posted");
                    return HandlerStatus::ReviewFailed;
                }
            }
        };

        let body = if !verdict.lgtm && !verdict.review_comment.is_empty() {
            verdict.review_comment
        } else {
            LGTM_COMMENT.to_string()
        };

        if let Err(e) = self.github.post_comment(owner, repo, pr.number, &body).await {
            tracing::warn!(error = %e, number = pr.number, "failed to post review comment");
        }

        HandlerStatus::Reviewed
    }

    /// Resolve the LLM API key: configuration first, then the repository's
    /// Actions variable. On failure a guidance comment is posted so the repo
    /// owner knows what to configure.
    async fn resolve_credential(&self, owner: &str, repo: &str, pr_number: u64) -> Option<String> {
        if let Some(key) = &self.config.llm.api_key {
            return Some(key.clone());
        }

        match self
            .github
            .repo_variable(owner, repo, CREDENTIAL_VARIABLE)
            .await
        {
            Ok(Some(value)) if !value.is_empty() => return Some(value),
            Ok(_) => {
                tracing::warn!("no {CREDENTIAL_VARIABLE} in env or repo variables");
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch {CREDENTIAL_VARIABLE} repo variable");
            }
        }

        if let Err(e) = self
            .github
            .post_comment(owner, repo, pr_number, CREDENTIAL_HELP_COMMENT)
            .await
        {
            tracing::warn!(error = %e, "failed to post credential guidance comment");
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(action: &str, state: &str, locked: bool, labels: &[&str]) -> PullRequestEvent {
        serde_json::from_value(serde_json::json!({
            "action": action,
            "pull_request": {
                "number": 42,
                "state": state,
                "locked": locked,
                "labels": labels.iter().map(|l| serde_json::json!({"name": l})).collect::<Vec<_>>(),
                "base": {"sha": "base-sha"},
                "head": {"sha": "head-sha"}
            },
            "repository": {"name": "repo", "owner": {"login": "owner"}}
        }))
        .unwrap()
    }

    fn handler(config: BotConfig) -> EventHandler {
        let github = GitHubClient::new(Some("ghp_test")).unwrap();
        EventHandler::new(github, config)
    }

    fn config_with_key() -> BotConfig {
        let mut config = BotConfig::default();
        config.llm.api_key = Some("sk-test".into());
        config
    }

    #[test]
    fn diff_range_narrows_synchronize_to_last_two_commits() {
        let commits: Vec<String> = vec!["c1".into(), "c2".into(), "c3".into()];
        assert_eq!(
            diff_range("base", "head", "synchronize", &commits),
            ("c2", "c3")
        );
    }

    #[test]
    fn diff_range_keeps_full_range_for_opened_events() {
        let commits: Vec<String> = vec!["c1".into(), "c2".into(), "c3".into()];
        assert_eq!(
            diff_range("base", "head", "opened", &commits),
            ("base", "head")
        );
    }

    #[test]
    fn diff_range_needs_two_commits_to_narrow() {
        let commits: Vec<String> = vec!["only".into()];
        assert_eq!(
            diff_range("base", "head", "synchronize", &commits),
            ("base", "head")
        );
        assert_eq!(
            diff_range("base", "head", "synchronize", &[]),
            ("base", "head")
        );
    }

    #[tokio::test]
    async fn closed_pr_is_not_reviewable() {
        let status = handler(config_with_key())
            .handle(&event("opened", "closed", false, &[]))
            .await;
        assert_eq!(status, HandlerStatus::NotReviewable);
    }

    #[tokio::test]
    async fn locked_pr_is_not_reviewable() {
        let status = handler(config_with_key())
            .handle(&event("opened", "open", true, &[]))
            .await;
        assert_eq!(status, HandlerStatus::NotReviewable);
    }

    #[tokio::test]
    async fn missing_target_label_short_circuits_before_any_review() {
        let mut config = config_with_key();
        config.target_label = Some("needs-review".into());
        let status = handler(config)
            .handle(&event("opened", "open", false, &["bug"]))
            .await;
        assert_eq!(status, HandlerStatus::LabelMissing);
    }

    #[tokio::test]
    async fn matching_target_label_passes_the_gate() {
        // With the label present the handler proceeds to the diff fetch,
        // which fails against the test token, mapping to ReviewFailed rather
        // than an early precondition status.
        let mut config = config_with_key();
        config.target_label = Some("needs-review".into());
        let status = handler(config)
            .handle(&event("opened", "open", false, &["needs-review"]))
            .await;
        assert_ne!(status, HandlerStatus::LabelMissing);
        assert_ne!(status, HandlerStatus::NotReviewable);
    }

    #[test]
    fn event_payload_parses_without_optional_fields() {
        let event: PullRequestEvent = serde_json::from_value(serde_json::json!({
            "action": "synchronize",
            "pull_request": {
                "number": 1,
                "state": "open",
                "base": {"sha": "a"},
                "head": {"sha": "b"}
            },
            "repository": {"name": "r", "owner": {"login": "o"}}
        }))
        .unwrap();
        assert!(!event.pull_request.locked);
        assert!(event.pull_request.labels.is_empty());
    }

    #[test]
    fn status_display_is_descriptive() {
        assert_eq!(HandlerStatus::Reviewed.to_string(), "review completed");
        assert_eq!(
            HandlerStatus::NoCredential.to_string(),
            "no API key configured"
        );
        assert_eq!(
            HandlerStatus::NothingSelected.to_string(),
            "all changed files filtered out"
        );
    }
}
