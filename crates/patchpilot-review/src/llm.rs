use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use patchpilot_core::{LlmConfig, PilotError};

/// A message in a chat conversation with the LLM.
///
/// # Examples
///
/// ```
/// use patchpilot_review::llm::{ChatMessage, Role};
///
/// let msg = ChatMessage {
///     role: Role::User,
///     content: "Review this patch".into(),
/// };
/// assert!(matches!(msg.role, Role::User));
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: Role,
    /// Text content of the message.
    pub content: String,
}

/// Role in the chat conversation.
///
/// # Examples
///
/// ```
/// use patchpilot_review::llm::Role;
///
/// let role = Role::User;
/// assert_eq!(serde_json::to_string(&role).unwrap(), "\"user\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System-level instructions.
    System,
    /// User input.
    User,
    /// Assistant response.
    Assistant,
}

/// A chat completion request body, OpenAI wire shape.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model identifier.
    pub model: String,
    /// Conversation messages.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature.
    pub temperature: f64,
    /// Nucleus sampling cutoff.
    pub top_p: f64,
    /// Optional response token cap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Response format constraint. Always `{"type": "json_object"}` here;
    /// providers enforce it when they can.
    pub response_format: ResponseFormat,
}

/// The `response_format` field of a chat request.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    /// Format kind, e.g. `"json_object"`.
    #[serde(rename = "type")]
    pub kind: String,
}

impl ResponseFormat {
    /// Request a JSON object response.
    pub fn json_object() -> Self {
        Self {
            kind: "json_object".into(),
        }
    }
}

/// A chat completion response, reduced to what the reviewer consumes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatResponse {
    /// Completion choices. Providers may legitimately return zero.
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

/// One completion choice.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    /// The assistant message for this choice.
    pub message: ChoiceMessage,
}

/// The message payload of a completion choice.
#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    /// Text content of the completion.
    #[serde(default)]
    pub content: String,
}

/// The chat completion capability the review client depends on.
///
/// Implemented by [`OpenAiBackend`] for real traffic; tests substitute
/// counting fakes to assert on call behavior.
#[async_trait]
pub trait ChatBackend {
    /// Send a chat completion request.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, PilotError>;
}

/// Where chat requests are sent. Resolved once at construction.
#[derive(Debug, Clone)]
enum ChatEndpoint {
    /// Any provider exposing `/v1/chat/completions`: OpenAI, Ollama, vLLM, etc.
    OpenAi { base_url: String },
    /// Azure OpenAI deployment-scoped endpoint.
    Azure {
        base_url: String,
        deployment: String,
        api_version: String,
    },
}

impl ChatEndpoint {
    fn url(&self) -> String {
        match self {
            ChatEndpoint::OpenAi { base_url } => format!("{base_url}/v1/chat/completions"),
            ChatEndpoint::Azure {
                base_url,
                deployment,
                api_version,
            } => format!(
                "{base_url}/openai/deployments/{deployment}/chat/completions?api-version={api_version}"
            ),
        }
    }
}

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// OpenAI-compatible chat completions client, with an Azure-flavored variant.
///
/// The endpoint variant is selected once at construction from the
/// configuration: Azure when deployment coordinates are present, otherwise a
/// generic OpenAI-compatible endpoint defaulting to the public API.
///
/// # Examples
///
/// ```
/// use patchpilot_core::LlmConfig;
/// use patchpilot_review::llm::OpenAiBackend;
///
/// let backend = OpenAiBackend::new(&LlmConfig::default(), "sk-test".into()).unwrap();
/// let _ = backend;
/// ```
pub struct OpenAiBackend {
    client: reqwest::Client,
    endpoint: ChatEndpoint,
    api_key: String,
}

impl OpenAiBackend {
    /// Create a backend from configuration and a resolved API key.
    ///
    /// # Errors
    ///
    /// Returns [`PilotError::Config`] when the Azure variant is selected
    /// without an endpoint, or [`PilotError::Llm`] if the HTTP client cannot
    /// be built.
    pub fn new(config: &LlmConfig, api_key: String) -> Result<Self, PilotError> {
        let endpoint = match &config.azure {
            Some(azure) => {
                let base_url = config.endpoint.clone().ok_or_else(|| {
                    PilotError::Config(
                        "AZURE_API_VERSION and AZURE_DEPLOYMENT are set but OPENAI_API_ENDPOINT is not"
                            .into(),
                    )
                })?;
                ChatEndpoint::Azure {
                    base_url,
                    deployment: azure.deployment.clone(),
                    api_version: azure.api_version.clone(),
                }
            }
            None => ChatEndpoint::OpenAi {
                base_url: config
                    .endpoint
                    .clone()
                    .unwrap_or_else(|| DEFAULT_BASE_URL.into()),
            },
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| PilotError::Llm(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    /// Send a chat completion request and return the parsed response.
    ///
    /// Transport and authentication failures surface as [`PilotError::Llm`];
    /// the caller decides whether to log or abort.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, PilotError> {
        let url = self.endpoint.url();

        let mut builder = self.client.post(&url);
        builder = match &self.endpoint {
            ChatEndpoint::OpenAi { .. } => {
                builder.header("Authorization", format!("Bearer {}", self.api_key))
            }
            ChatEndpoint::Azure { .. } => builder.header("api-key", &self.api_key),
        };

        let response = builder
            .json(request)
            .send()
            .await
            .map_err(|e| PilotError::Llm(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(PilotError::Llm(format!(
                "LLM API error {status}: {body_text}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| PilotError::Llm(format!("failed to parse response: {e}")))
    }
}
