//! Patch assembly: concatenate per-file diffs into one reviewable blob.

use std::fmt::Write;

use patchpilot_core::ChangedFile;

/// Concatenate the diffs of the given files, annotated by filename.
///
/// Files are skipped when their status is not added/modified (removed and
/// renamed files carry no diff worth line-level review), when they have no
/// patch text, or when the patch text is strictly longer than
/// `max_patch_length`. An oversized patch is excluded whole, never truncated.
/// Output order follows the input order.
///
/// Returns the empty string when no file qualifies, which callers treat as
/// "nothing to review".
///
/// # Examples
///
/// ```
/// use patchpilot_core::{ChangedFile, FileStatus};
/// use patchpilot_filter::assembler::assemble;
///
/// let files = vec![ChangedFile {
///     filename: "a.rs".into(),
///     status: FileStatus::Modified,
///     patch: Some("@@ -1 +1 @@\n-x\n+y".into()),
///     contents_url: "https://api.github.com/repos/o/r/contents/a.rs".into(),
/// }];
/// let patch = assemble(&files, None);
/// assert!(patch.starts_with("\n\n// File: a.rs\n"));
/// assert!(assemble(&[], None).is_empty());
/// ```
pub fn assemble(files: &[ChangedFile], max_patch_length: Option<usize>) -> String {
    let mut combined = String::new();
    for file in files {
        if !file.status.is_reviewable() {
            continue;
        }
        let Some(patch) = &file.patch else {
            continue;
        };
        if let Some(limit) = max_patch_length {
            if patch.len() > limit {
                tracing::debug!(
                    file = %file.filename,
                    len = patch.len(),
                    limit,
                    "patch exceeds MAX_PATCH_LENGTH, skipping"
                );
                continue;
            }
        }
        let _ = write!(combined, "\n\n// File: {}\n{}", file.filename, patch);
    }
    combined
}
