use patchpilot_core::{LlmConfig, PilotError, ReviewVerdict};

use crate::llm::{ChatBackend, ChatMessage, ChatRequest, ResponseFormat, Role};
use crate::prompt;

/// Reviews an assembled patch through a chat completion backend.
///
/// Generic over [`ChatBackend`] so tests can count calls without network.
///
/// # Examples
///
/// ```no_run
/// use patchpilot_core::LlmConfig;
/// use patchpilot_review::client::ReviewClient;
/// use patchpilot_review::llm::OpenAiBackend;
///
/// let config = LlmConfig::default();
/// let backend = OpenAiBackend::new(&config, "sk-test".into()).unwrap();
/// let client = ReviewClient::new(backend, config);
/// ```
pub struct ReviewClient<B> {
    backend: B,
    config: LlmConfig,
}

impl<B: ChatBackend> ReviewClient<B> {
    /// Create a review client from a backend and LLM configuration.
    pub fn new(backend: B, config: LlmConfig) -> Self {
        Self { backend, config }
    }

    /// Review a patch and return the model's verdict.
    ///
    /// An empty patch short-circuits to an approving verdict without touching
    /// the backend. A response with zero choices also approves. A response
    /// whose content is not a valid verdict degrades to a non-approving
    /// verdict carrying the raw text.
    ///
    /// # Errors
    ///
    /// Returns [`PilotError::Llm`] when the chat call itself fails; transport
    /// and authentication errors are surfaced, not swallowed.
    pub async fn review(&self, patch: &str) -> Result<ReviewVerdict, PilotError> {
        if patch.is_empty() {
            return Ok(ReviewVerdict::approve());
        }

        let content = prompt::build_review_prompt(&self.config, patch);
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: Role::User,
                content,
            }],
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            max_tokens: self.config.max_tokens,
            response_format: ResponseFormat::json_object(),
        };

        let response = self.backend.chat(&request).await?;

        let Some(choice) = response.choices.first() else {
            tracing::debug!("chat completion returned no choices");
            return Ok(ReviewVerdict::approve());
        };

        Ok(prompt::parse_verdict(&choice.message.content))
    }
}
