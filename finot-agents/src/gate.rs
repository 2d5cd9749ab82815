use async_trait::async_trait;
use shared_types::InputSource;

/// Consulted before any OCR, transcription or completion work is spent on a message.
#[async_trait]
pub trait ExtractionGate: Send + Sync {
    async fn allows(&self, user_id: i64, source: InputSource) -> bool;
}

/// Lets every message through.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenGate;

#[async_trait]
impl ExtractionGate for OpenGate {
    async fn allows(&self, _user_id: i64, _source: InputSource) -> bool {
        true
    }
}
