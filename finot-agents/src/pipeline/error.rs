use extractors::ocr::ImageLoadError;
use extractors::ParseError;
use shared_types::{ExtractionEnvelope, InputSource};

use crate::llm::CompletionError;
use crate::storage::StorageError;
use crate::transcription::TranscriptionError;

pub const MSG_CREDIT_EXHAUSTED: &str =
    "AI credit kamu sudah habis. Upgrade ke Pro untuk lanjut mencatat dengan AI.";
pub const MSG_AI_UNAVAILABLE: &str = "Maaf, AI sedang bermasalah. Coba lagi nanti ya.";
pub const MSG_ILLEGIBLE_RECEIPT: &str =
    "Maaf, saya tidak bisa membaca struk ini. Pastikan foto jelas dan teks terlihat.";
pub const MSG_INAUDIBLE: &str =
    "Maaf, saya tidak bisa mendengar pesan suaramu dengan jelas. Coba rekam ulang atau ketik saja.";

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("extraction not allowed for user {user_id}")]
    Denied { user_id: i64 },

    #[error(transparent)]
    ImageLoad(#[from] ImageLoadError),

    #[error("OCR text too short ({chars} chars, confidence {confidence:.1})")]
    IllegibleImage { chars: usize, confidence: f32 },

    #[error("transcription empty or too short")]
    Inaudible,

    #[error(transparent)]
    Transcription(#[from] TranscriptionError),

    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("background task failed: {0}")]
    Task(String),

    #[error("pipeline panicked: {0}")]
    Panicked(String),
}

impl PipelineError {
    /// The message shown to the user. Remediation differs per kind, so the
    /// wording does too.
    pub fn user_message(&self, source: InputSource) -> &'static str {
        match self {
            PipelineError::Denied { .. } => MSG_CREDIT_EXHAUSTED,
            PipelineError::IllegibleImage { .. } => MSG_ILLEGIBLE_RECEIPT,
            PipelineError::Inaudible => MSG_INAUDIBLE,
            PipelineError::Completion(_)
            | PipelineError::Transcription(TranscriptionError::Transport(_))
            | PipelineError::Transcription(TranscriptionError::Status { .. }) => MSG_AI_UNAVAILABLE,
            PipelineError::Parse(_) => match source {
                InputSource::Text => {
                    "Maaf, saya tidak bisa memahami pesan kamu. Coba ketik ulang seperti: 'beli makan 25rb'"
                }
                InputSource::Image => {
                    "Struk terbaca tapi saya tidak bisa mengekstrak transaksinya. Coba foto ulang dengan lebih jelas."
                }
                InputSource::Audio => {
                    "Pesan suara terbaca tapi saya tidak bisa memahami transaksinya. Coba sebutkan dengan lebih jelas."
                }
            },
            _ => match source {
                InputSource::Text => "Terjadi kesalahan internal. Silakan coba lagi.",
                InputSource::Image => "Gagal memproses gambar. Silakan coba lagi.",
                InputSource::Audio => "Gagal memproses pesan suara. Silakan coba lagi.",
            },
        }
    }

    pub fn into_envelope(self, source: InputSource) -> ExtractionEnvelope {
        let envelope = ExtractionEnvelope::failed(source, self.user_message(source), self.to_string());
        match self {
            PipelineError::IllegibleImage { confidence, .. } => envelope.with_ocr_confidence(confidence),
            _ => envelope,
        }
    }
}
