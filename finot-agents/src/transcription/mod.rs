mod convert;

pub use convert::{convert_to_wav, decode_to_mono_f32, needs_conversion, write_wav_mono, ACCEPTED_EXTENSIONS};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::llm::{RetryPolicy, Retryable, DEFAULT_BASE_URL};

pub const DEFAULT_TRANSCRIPTION_MODEL: &str = "whisper-1";
pub const DEFAULT_LANGUAGE: &str = "id";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("audio file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read audio: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode audio: {0}")]
    Decode(String),

    #[error("failed to encode wav: {0}")]
    Encode(#[from] hound::Error),

    #[error("failed to reach transcription service: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("transcription service returned {status}: {body}")]
    Status { status: u16, body: String },
}

impl Retryable for TranscriptionError {
    fn is_retryable(&self) -> bool {
        match self {
            TranscriptionError::Transport(err) => err.is_connect() || err.is_timeout() || err.is_request(),
            TranscriptionError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Speech-to-text collaborator. `None` means nothing intelligible was heard.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &Path) -> Result<Option<String>, TranscriptionError>;
}

/// OpenAI-compatible `/audio/transcriptions` client.
pub struct WhisperTranscriber {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    language: String,
    retry: RetryPolicy,
}

impl WhisperTranscriber {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, TranscriptionError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_TRANSCRIPTION_MODEL.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn send_once(&self, audio: Vec<u8>, file_name: &str) -> Result<String, TranscriptionError> {
        let form = Form::new()
            .part("file", Part::bytes(audio).file_name(file_name.to_string()))
            .text("model", self.model.clone())
            .text("language", self.language.clone())
            .text("response_format", "text");

        let response = self
            .http
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(TranscriptionError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio: &Path) -> Result<Option<String>, TranscriptionError> {
        if !audio.is_file() {
            return Err(TranscriptionError::NotFound(audio.to_path_buf()));
        }

        // Keep the converted file alive until the upload completes.
        let converted = if needs_conversion(audio) {
            let source = audio.to_path_buf();
            let wav = tokio::task::spawn_blocking(move || convert_to_wav(&source))
                .await
                .map_err(|e| TranscriptionError::Decode(e.to_string()))??;
            debug!("Converted {} to {}", audio.display(), wav.path().display());
            Some(wav)
        } else {
            None
        };
        let upload_path = converted.as_ref().map(|wav| wav.path()).unwrap_or(audio);

        let bytes = tokio::fs::read(upload_path).await?;
        let file_name = upload_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("audio.wav")
            .to_string();

        let text = self
            .retry
            .run("transcription", |_| self.send_once(bytes.clone(), &file_name))
            .await?;

        let text = text.trim();
        info!("Transcribed {} characters", text.chars().count());
        Ok((!text.is_empty()).then(|| text.to_string()))
    }
}
