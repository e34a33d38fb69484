use patchpilot_core::{LlmConfig, ReviewVerdict};

const DEFAULT_INSTRUCTION: &str = "Below is a code patch, please help me do a brief code review \
on it. Any bug risks and/or improvement suggestions are welcome.";

const JSON_CONTRACT: &str = "Answer with a strict JSON object containing exactly two fields: \
\"lgtm\" (boolean, true when the patch looks good as-is) and \"review_comment\" (string). \
Do not wrap the JSON in markdown and do not add any other fields or text.";

/// Build the review prompt for a patch.
///
/// Concatenates the configured instruction (or the default), the fixed JSON
/// response contract, an optional response-language directive, and the patch
/// text.
///
/// # Examples
///
/// ```
/// use patchpilot_core::LlmConfig;
/// use patchpilot_review::prompt::build_review_prompt;
///
/// let prompt = build_review_prompt(&LlmConfig::default(), "+let x = 1;");
/// assert!(prompt.contains("review"));
/// assert!(prompt.contains("lgtm"));
/// assert!(prompt.contains("+let x = 1;"));
/// ```
pub fn build_review_prompt(config: &LlmConfig, patch: &str) -> String {
    let instruction = config.prompt.as_deref().unwrap_or(DEFAULT_INSTRUCTION);

    let mut prompt = format!("{instruction}\n\n{JSON_CONTRACT}\n");
    if let Some(language) = &config.language {
        prompt.push_str(&format!("Answer me in {language}.\n"));
    }
    prompt.push_str(&format!("\n{patch}"));
    prompt
}

/// Parse the model's response content into a [`ReviewVerdict`].
///
/// Handles markdown code fences around the JSON. When the content is not a
/// valid verdict (providers do not always honor the JSON constraint), degrades
/// to a non-approving verdict carrying the raw text, so a human sees it rather
/// than it being silently dropped.
///
/// # Examples
///
/// ```
/// use patchpilot_review::prompt::parse_verdict;
///
/// let verdict = parse_verdict(r#"{"lgtm": true, "review_comment": ""}"#);
/// assert!(verdict.lgtm);
///
/// let fallback = parse_verdict("not json");
/// assert!(!fallback.lgtm);
/// assert_eq!(fallback.review_comment, "not json");
/// ```
pub fn parse_verdict(content: &str) -> ReviewVerdict {
    let cleaned = strip_code_fences(content);
    match serde_json::from_str::<ReviewVerdict>(cleaned) {
        Ok(verdict) => verdict,
        Err(e) => {
            tracing::warn!(error = %e, "model response was not a valid verdict, flagging raw text");
            ReviewVerdict {
                lgtm: false,
                review_comment: content.to_string(),
            }
        }
    }
}

fn strip_code_fences(s: &str) -> &str {
    let trimmed = s.trim();
    if let Some(rest) = trimmed.strip_prefix("```json") {
        if let Some(inner) = rest.strip_suffix("```") {
            return inner.trim();
        }
    }
    if let Some(rest) = trimmed.strip_prefix("```") {
        if let Some(inner) = rest.strip_suffix("```") {
            return inner.trim();
        }
    }
    trimmed
}
