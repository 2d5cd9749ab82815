use serde::{Deserialize, Serialize};
use std::fmt;

use crate::transaction::SavedTransaction;

/// Modality a user message arrived in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputSource {
    Text,
    Image,
    Audio,
}

impl InputSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputSource::Text => "text",
            InputSource::Image => "image",
            InputSource::Audio => "audio",
        }
    }

    /// Label recorded on the LLM audit row; receipts are audited as OCR input.
    pub fn audit_label(&self) -> &'static str {
        match self {
            InputSource::Text => "text",
            InputSource::Image => "ocr",
            InputSource::Audio => "audio",
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform result of processing one user message.
///
/// Successful envelopes carry `transactions` and `count`; failed ones carry a
/// user-facing `error` and an internal `detail`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionEnvelope {
    pub success: bool,
    pub source: InputSource,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transactions: Vec<SavedTransaction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_confidence: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,
}

impl ExtractionEnvelope {
    pub fn succeeded(source: InputSource, transactions: Vec<SavedTransaction>) -> Self {
        let count = transactions.len();
        Self {
            success: true,
            source,
            transactions,
            count: Some(count),
            error: None,
            detail: None,
            ocr_confidence: None,
            transcription: None,
        }
    }

    pub fn failed(source: InputSource, error: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            success: false,
            source,
            transactions: Vec::new(),
            count: None,
            error: Some(error.into()),
            detail: Some(detail.into()),
            ocr_confidence: None,
            transcription: None,
        }
    }

    pub fn with_ocr_confidence(mut self, confidence: f32) -> Self {
        self.ocr_confidence = Some(confidence);
        self
    }

    pub fn with_transcription(mut self, transcription: impl Into<String>) -> Self {
        self.transcription = Some(transcription.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_envelope_shape() {
        let envelope = ExtractionEnvelope::failed(InputSource::Image, "oops", "ocr empty");
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["source"], "image");
        assert_eq!(value["error"], "oops");
        assert!(value.get("transactions").is_none());
        assert!(value.get("count").is_none());
    }

    #[test]
    fn test_success_envelope_counts_transactions() {
        let envelope = ExtractionEnvelope::succeeded(InputSource::Audio, Vec::new())
            .with_transcription("beli kopi");
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["count"], 0);
        assert_eq!(value["transcription"], "beli kopi");
    }
}
