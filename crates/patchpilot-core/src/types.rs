use std::fmt;

use serde::{Deserialize, Serialize};

/// Status of a file in a pull-request diff comparison.
///
/// Matches the `status` field of the GitHub compare API. Only [`FileStatus::Added`]
/// and [`FileStatus::Modified`] files carry a diff worth reviewing line by line.
///
/// # Examples
///
/// ```
/// use patchpilot_core::FileStatus;
///
/// let status: FileStatus = serde_json::from_str("\"modified\"").unwrap();
/// assert_eq!(status, FileStatus::Modified);
/// assert!(status.is_reviewable());
/// assert!(!FileStatus::Removed.is_reviewable());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// New file added in this range.
    Added,
    /// Existing file changed in place.
    Modified,
    /// File deleted in this range.
    Removed,
    /// File moved to a new path.
    Renamed,
    /// File copied from another path.
    Copied,
    /// File changed in a way GitHub does not classify further.
    Changed,
    /// Listed in the comparison but content is identical.
    Unchanged,
}

impl FileStatus {
    /// Returns `true` if this file's diff is meaningful for line-level review.
    pub fn is_reviewable(self) -> bool {
        matches!(self, FileStatus::Added | FileStatus::Modified)
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStatus::Added => write!(f, "added"),
            FileStatus::Modified => write!(f, "modified"),
            FileStatus::Removed => write!(f, "removed"),
            FileStatus::Renamed => write!(f, "renamed"),
            FileStatus::Copied => write!(f, "copied"),
            FileStatus::Changed => write!(f, "changed"),
            FileStatus::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// A single changed file from a pull-request diff comparison.
///
/// Produced by the GitHub compare endpoint; immutable once fetched.
///
/// # Examples
///
/// ```
/// use patchpilot_core::{ChangedFile, FileStatus};
///
/// let file = ChangedFile {
///     filename: "src/lib.rs".into(),
///     status: FileStatus::Modified,
///     patch: Some("@@ -1 +1 @@\n-old\n+new".into()),
///     contents_url: "https://api.github.com/repos/o/r/contents/src%2Flib.rs".into(),
/// };
/// assert!(file.status.is_reviewable());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangedFile {
    /// Path of the file relative to the repository root.
    pub filename: String,
    /// How the file changed in this range.
    pub status: FileStatus,
    /// Unified diff text for the file. Absent for binary or oversized diffs.
    #[serde(default)]
    pub patch: Option<String>,
    /// API URL for the file's contents at the head commit.
    pub contents_url: String,
}

/// Include/ignore rules controlling which changed files get reviewed.
///
/// Precedence: a non-empty `include_patterns` is authoritative and the ignore
/// rules are not consulted. Otherwise the exact-name `ignore_list` is checked
/// before `ignore_patterns`.
///
/// # Examples
///
/// ```
/// use patchpilot_core::SelectionRules;
///
/// let rules = SelectionRules {
///     ignore_list: vec!["CHANGELOG.md".into()],
///     ignore_patterns: vec![],
///     include_patterns: vec!["*.rs".into()],
/// };
/// assert!(!rules.include_patterns.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct SelectionRules {
    /// Exact filenames to exclude.
    pub ignore_list: Vec<String>,
    /// Patterns excluding files, tried in order.
    pub ignore_patterns: Vec<String>,
    /// Patterns selecting files; overrides both ignore rules when non-empty.
    pub include_patterns: Vec<String>,
}

/// The structured verdict returned by the review model.
///
/// The model is instructed to answer with exactly these two fields. A verdict
/// with `lgtm: false` and a non-empty `review_comment` is posted verbatim;
/// anything else results in the fixed approval comment.
///
/// # Examples
///
/// ```
/// use patchpilot_core::ReviewVerdict;
///
/// let verdict: ReviewVerdict =
///     serde_json::from_str(r#"{"lgtm": false, "review_comment": "off-by-one in loop"}"#).unwrap();
/// assert!(!verdict.lgtm);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewVerdict {
    /// Whether the model approves the patch as-is.
    pub lgtm: bool,
    /// The model's commentary. May be empty when approving.
    pub review_comment: String,
}

impl ReviewVerdict {
    /// A verdict approving the patch with no commentary.
    ///
    /// # Examples
    ///
    /// ```
    /// use patchpilot_core::ReviewVerdict;
    ///
    /// let verdict = ReviewVerdict::approve();
    /// assert!(verdict.lgtm);
    /// assert!(verdict.review_comment.is_empty());
    /// ```
    pub fn approve() -> Self {
        Self {
            lgtm: true,
            review_comment: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_status_deserializes_lowercase() {
        let status: FileStatus = serde_json::from_str("\"removed\"").unwrap();
        assert_eq!(status, FileStatus::Removed);
        let status: FileStatus = serde_json::from_str("\"added\"").unwrap();
        assert_eq!(status, FileStatus::Added);
    }

    #[test]
    fn only_added_and_modified_are_reviewable() {
        assert!(FileStatus::Added.is_reviewable());
        assert!(FileStatus::Modified.is_reviewable());
        assert!(!FileStatus::Removed.is_reviewable());
        assert!(!FileStatus::Renamed.is_reviewable());
        assert!(!FileStatus::Copied.is_reviewable());
        assert!(!FileStatus::Changed.is_reviewable());
        assert!(!FileStatus::Unchanged.is_reviewable());
    }

    #[test]
    fn changed_file_parses_compare_api_shape() {
        let json = r#"{
            "filename": "src/main.rs",
            "status": "modified",
            "patch": "@@ -1 +1 @@\n-a\n+b",
            "contents_url": "https://api.github.com/repos/o/r/contents/src%2Fmain.rs?ref=abc"
        }"#;
        let file: ChangedFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.filename, "src/main.rs");
        assert_eq!(file.status, FileStatus::Modified);
        assert!(file.patch.is_some());
    }

    #[test]
    fn changed_file_patch_defaults_to_none() {
        let json = r#"{
            "filename": "image.png",
            "status": "added",
            "contents_url": "https://api.github.com/repos/o/r/contents/image.png"
        }"#;
        let file: ChangedFile = serde_json::from_str(json).unwrap();
        assert!(file.patch.is_none());
    }

    #[test]
    fn verdict_roundtrips_exact_field_names() {
        let verdict = ReviewVerdict {
            lgtm: false,
            review_comment: "needs work".into(),
        };
        let json = serde_json::to_value(&verdict).unwrap();
        assert!(json.get("lgtm").is_some());
        assert!(json.get("review_comment").is_some());
        assert!(json.get("reviewComment").is_none());
    }

    #[test]
    fn approve_is_lgtm_with_empty_comment() {
        assert_eq!(
            ReviewVerdict::approve(),
            ReviewVerdict {
                lgtm: true,
                review_comment: String::new(),
            }
        );
    }
}
