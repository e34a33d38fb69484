//! File selection: decide which changed files get reviewed.
//!
//! Rule precedence: a non-empty include list is authoritative and the ignore
//! rules are not consulted; otherwise the exact-name ignore list is checked
//! before the pattern-based ignore list.

use percent_encoding::percent_decode_str;
use url::Url;

use patchpilot_core::{ChangedFile, SelectionRules};

use crate::matcher;

/// Apply selection rules to a changed-file list.
///
/// Pattern rules match against the percent-decoded path component of each
/// file's contents URL rather than the raw filename, since contents URLs may
/// encode characters differently. The exact-name ignore list matches the
/// filename field directly.
///
/// An empty result means the caller should skip review entirely, which is
/// distinguishable from "reviewed and approved".
///
/// # Examples
///
/// ```
/// use patchpilot_core::{ChangedFile, FileStatus, SelectionRules};
/// use patchpilot_filter::selector::select;
///
/// let files = vec![ChangedFile {
///     filename: "a.ts".into(),
///     status: FileStatus::Modified,
///     patch: None,
///     contents_url: "https://api.github.com/repos/o/r/contents/a.ts".into(),
/// }];
/// let rules = SelectionRules {
///     ignore_list: vec![],
///     ignore_patterns: vec!["*.md".into()],
///     include_patterns: vec![],
/// };
/// assert_eq!(select(files, &rules).len(), 1);
/// ```
pub fn select(files: Vec<ChangedFile>, rules: &SelectionRules) -> Vec<ChangedFile> {
    files.into_iter().filter(|file| keep(file, rules)).collect()
}

fn keep(file: &ChangedFile, rules: &SelectionRules) -> bool {
    let path = match_path(file);

    if !rules.include_patterns.is_empty() {
        let included = matcher::matches_any(&rules.include_patterns, &path);
        if !included {
            tracing::debug!(file = %file.filename, "not in include patterns, skipping");
        }
        return included;
    }

    if rules.ignore_list.iter().any(|name| name == &file.filename) {
        tracing::debug!(file = %file.filename, "in ignore list, skipping");
        return false;
    }

    if !rules.ignore_patterns.is_empty() && matcher::matches_any(&rules.ignore_patterns, &path) {
        tracing::debug!(file = %file.filename, "matched ignore pattern, skipping");
        return false;
    }

    true
}

/// The path used for pattern matching: the percent-decoded pathname component
/// of the contents URL, falling back to the filename when the URL is not
/// parseable.
fn match_path(file: &ChangedFile) -> String {
    match Url::parse(&file.contents_url) {
        Ok(url) => percent_decode_str(url.path())
            .decode_utf8_lossy()
            .into_owned(),
        Err(_) => file.filename.clone(),
    }
}
