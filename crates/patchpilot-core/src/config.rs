use crate::types::SelectionRules;

/// Top-level bot configuration captured once from the environment at startup.
///
/// All recognized keys are read eagerly into this immutable value and threaded
/// through constructors, so the core never touches process-wide state after
/// startup and tests can inject arbitrary configurations.
///
/// # Examples
///
/// ```
/// use patchpilot_core::BotConfig;
///
/// let config = BotConfig::from_lookup(|_| None);
/// assert_eq!(config.llm.model, "gpt-4o-mini");
/// assert_eq!(config.log_level, "info");
/// assert!(config.max_patch_length.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// GitHub API token (`GITHUB_TOKEN`).
    pub github_token: Option<String>,
    /// LLM provider settings.
    pub llm: LlmConfig,
    /// File selection rules (`IGNORE`, `IGNORE_PATTERNS`, `INCLUDE_PATTERNS`).
    pub rules: SelectionRules,
    /// Only review PRs carrying this label (`TARGET_LABEL`).
    pub target_label: Option<String>,
    /// Per-file diff length cutoff (`MAX_PATCH_LENGTH`, default unbounded).
    pub max_patch_length: Option<usize>,
    /// Logging verbosity (`LOG_LEVEL`, default `info`).
    pub log_level: String,
}

/// LLM provider configuration.
///
/// The Azure variant is selected once at construction: it is active iff both
/// `AZURE_API_VERSION` and `AZURE_DEPLOYMENT` are set.
///
/// # Examples
///
/// ```
/// use patchpilot_core::LlmConfig;
///
/// let config = LlmConfig::default();
/// assert_eq!(config.temperature, 1.0);
/// assert_eq!(config.top_p, 1.0);
/// assert!(config.azure.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// API key (`OPENAI_API_KEY`). When absent the handler falls back to the
    /// repository-level Actions variable of the same name.
    pub api_key: Option<String>,
    /// Override base URL (`OPENAI_API_ENDPOINT`).
    pub endpoint: Option<String>,
    /// Azure-flavored endpoint settings, when both keys are present.
    pub azure: Option<AzureConfig>,
    /// Model identifier (`MODEL`).
    pub model: String,
    /// Sampling temperature (`temperature`).
    pub temperature: f64,
    /// Nucleus sampling cutoff (`top_p`).
    pub top_p: f64,
    /// Response token cap (`max_tokens`).
    pub max_tokens: Option<u32>,
    /// Override review instruction text (`PROMPT`).
    pub prompt: Option<String>,
    /// Response-language directive (`LANGUAGE`).
    pub language: Option<String>,
}

/// Azure OpenAI deployment coordinates.
#[derive(Debug, Clone)]
pub struct AzureConfig {
    /// API version query parameter (`AZURE_API_VERSION`).
    pub api_version: String,
    /// Deployment name (`AZURE_DEPLOYMENT`).
    pub deployment: String,
}

fn default_model() -> String {
    "gpt-4o-mini".into()
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: None,
            azure: None,
            model: default_model(),
            temperature: 1.0,
            top_p: 1.0,
            max_tokens: None,
            prompt: None,
            language: None,
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            github_token: None,
            llm: LlmConfig::default(),
            rules: SelectionRules::default(),
            target_label: None,
            max_patch_length: None,
            log_level: default_log_level(),
        }
    }
}

impl BotConfig {
    /// Capture configuration from the process environment.
    ///
    /// # Examples
    ///
    /// ```
    /// use patchpilot_core::BotConfig;
    ///
    /// let config = BotConfig::from_env();
    /// assert!(!config.llm.model.is_empty());
    /// ```
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Capture configuration from an arbitrary key lookup.
    ///
    /// Empty values count as unset. Unparseable numeric values fall back to
    /// their defaults rather than failing startup.
    ///
    /// # Examples
    ///
    /// ```
    /// use patchpilot_core::BotConfig;
    ///
    /// let config = BotConfig::from_lookup(|key| match key {
    ///     "MODEL" => Some("gpt-4o".to_string()),
    ///     "MAX_PATCH_LENGTH" => Some("5000".to_string()),
    ///     "INCLUDE_PATTERNS" => Some("*.rs, *.toml".to_string()),
    ///     _ => None,
    /// });
    /// assert_eq!(config.llm.model, "gpt-4o");
    /// assert_eq!(config.max_patch_length, Some(5000));
    /// assert_eq!(config.rules.include_patterns, vec!["*.rs", "*.toml"]);
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let azure = match (get("AZURE_API_VERSION"), get("AZURE_DEPLOYMENT")) {
            (Some(api_version), Some(deployment)) => Some(AzureConfig {
                api_version,
                deployment,
            }),
            _ => None,
        };

        let llm = LlmConfig {
            api_key: get("OPENAI_API_KEY"),
            endpoint: get("OPENAI_API_ENDPOINT"),
            azure,
            model: get("MODEL").unwrap_or_else(default_model),
            temperature: get("temperature")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(1.0),
            top_p: get("top_p")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(1.0),
            max_tokens: get("max_tokens").and_then(|v| v.trim().parse().ok()),
            prompt: get("PROMPT"),
            language: get("LANGUAGE"),
        };

        let rules = SelectionRules {
            ignore_list: get("IGNORE").map(split_lines).unwrap_or_default(),
            ignore_patterns: get("IGNORE_PATTERNS").map(split_commas).unwrap_or_default(),
            include_patterns: get("INCLUDE_PATTERNS")
                .map(split_commas)
                .unwrap_or_default(),
        };

        Self {
            github_token: get("GITHUB_TOKEN"),
            llm,
            rules,
            target_label: get("TARGET_LABEL"),
            max_patch_length: get("MAX_PATCH_LENGTH").and_then(|v| v.trim().parse().ok()),
            log_level: get("LOG_LEVEL").unwrap_or_else(default_log_level),
        }
    }
}

fn split_lines(value: String) -> Vec<String> {
    value
        .lines()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn split_commas(value: String) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> BotConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BotConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = config_from(&[]);
        assert!(config.llm.api_key.is_none());
        assert!(config.llm.endpoint.is_none());
        assert!(config.llm.azure.is_none());
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.temperature, 1.0);
        assert_eq!(config.llm.top_p, 1.0);
        assert!(config.llm.max_tokens.is_none());
        assert!(config.rules.ignore_list.is_empty());
        assert!(config.target_label.is_none());
        assert!(config.max_patch_length.is_none());
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn azure_requires_both_keys() {
        let config = config_from(&[("AZURE_API_VERSION", "2024-02-01")]);
        assert!(config.llm.azure.is_none());

        let config = config_from(&[("AZURE_DEPLOYMENT", "gpt4")]);
        assert!(config.llm.azure.is_none());

        let config = config_from(&[
            ("AZURE_API_VERSION", "2024-02-01"),
            ("AZURE_DEPLOYMENT", "gpt4"),
        ]);
        let azure = config.llm.azure.expect("azure variant selected");
        assert_eq!(azure.api_version, "2024-02-01");
        assert_eq!(azure.deployment, "gpt4");
    }

    #[test]
    fn ignore_is_newline_separated() {
        let config = config_from(&[("IGNORE", "Cargo.lock\n\n  docs/CHANGELOG.md  \n")]);
        assert_eq!(
            config.rules.ignore_list,
            vec!["Cargo.lock", "docs/CHANGELOG.md"]
        );
    }

    #[test]
    fn patterns_are_comma_separated() {
        let config = config_from(&[
            ("IGNORE_PATTERNS", "/node_modules, *.min.js,,"),
            ("INCLUDE_PATTERNS", "src/**/*.rs"),
        ]);
        assert_eq!(
            config.rules.ignore_patterns,
            vec!["/node_modules", "*.min.js"]
        );
        assert_eq!(config.rules.include_patterns, vec!["src/**/*.rs"]);
    }

    #[test]
    fn numeric_values_parse() {
        let config = config_from(&[
            ("temperature", "0.2"),
            ("top_p", "0.9"),
            ("max_tokens", "2048"),
            ("MAX_PATCH_LENGTH", "10000"),
        ]);
        assert_eq!(config.llm.temperature, 0.2);
        assert_eq!(config.llm.top_p, 0.9);
        assert_eq!(config.llm.max_tokens, Some(2048));
        assert_eq!(config.max_patch_length, Some(10000));
    }

    #[test]
    fn unparseable_numbers_fall_back_to_defaults() {
        let config = config_from(&[
            ("temperature", "hot"),
            ("max_tokens", "many"),
            ("MAX_PATCH_LENGTH", "-3"),
        ]);
        assert_eq!(config.llm.temperature, 1.0);
        assert!(config.llm.max_tokens.is_none());
        assert!(config.max_patch_length.is_none());
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = config_from(&[("OPENAI_API_KEY", "   "), ("TARGET_LABEL", "")]);
        assert!(config.llm.api_key.is_none());
        assert!(config.target_label.is_none());
    }
}
