mod openai;
pub mod retry;

pub use openai::{OpenAiChatClient, DEFAULT_BASE_URL, DEFAULT_MAX_COMPLETION_TOKENS, DEFAULT_MODEL};
pub use retry::{RetryPolicy, Retryable};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Used when a request carries no system prompt of its own.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a transaction parser for a finance application.
Output MUST be a single valid JSON object.
Do NOT include explanations, markdown, or extra text.

JSON schema:
{
  \"intent\": \"income | expense\",
  \"amount\": number,
  \"currency\": \"IDR\",
  \"date\": string | null,
  \"category\": string,
  \"note\": string,
  \"confidence\": number
}";

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub system_prompt: Option<String>,
    /// Overrides the client's retry budget for this call
    pub max_attempts: Option<u32>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: None,
            max_attempts: None,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub model: String,
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("prompt must be a non-empty string")]
    EmptyPrompt,

    #[error("failed to reach completion service: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("completion service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("completion service returned an empty response")]
    EmptyResponse,

    #[error("unexpected completion payload: {0}")]
    InvalidResponse(String),
}

impl Retryable for CompletionError {
    fn is_retryable(&self) -> bool {
        match self {
            CompletionError::Transport(err) => {
                err.is_connect()
                    || err.is_timeout()
                    || err.is_request()
                    || err
                        .status()
                        .map(|s| s.is_server_error() || s.as_u16() == 429)
                        .unwrap_or(false)
            }
            CompletionError::Status { status, .. } => *status >= 500 || *status == 429,
            CompletionError::EmptyResponse => true,
            CompletionError::EmptyPrompt | CompletionError::InvalidResponse(_) => false,
        }
    }
}

/// "Complete chat given prompt" service, injected into every LLM consumer.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, CompletionError>;
}
