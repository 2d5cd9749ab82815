//! Per-modality extraction orchestrator.
//!
//! Every entry point returns an [`ExtractionEnvelope`]; errors and panics are
//! folded into failure envelopes at this boundary and never escape.

mod error;

pub use error::{
    PipelineError, MSG_AI_UNAVAILABLE, MSG_CREDIT_EXHAUSTED, MSG_ILLEGIBLE_RECEIPT, MSG_INAUDIBLE,
};

use chrono::Utc;
use extractors::ocr::{FsImageLoader, ImageLoader, OcrPipeline, MIN_BEST_TEXT_CHARS};
use extractors::{parse_transactions, resolve_tx_date, sanity};
use futures::FutureExt;
use serde::Serialize;
use serde_json::json;
use shared_types::{
    Binarization, ExtractionEnvelope, InputSource, IntentClassification, OcrResult, SavedTransaction,
    UserIntent,
};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::gate::{ExtractionGate, OpenGate};
use crate::intent_classifier::IntentClassifier;
use crate::llm::{ChatCompletion, CompletionRequest, DEFAULT_SYSTEM_PROMPT};
use crate::prompts::build_extraction_prompt;
use crate::storage::{LlmAuditRecord, NewTransaction, TransactionRepository};
use crate::transcription::Transcriber;

/// Below this many trimmed characters the OCR text is not worth a completion call.
pub const MIN_OCR_CHARS: usize = 5;
/// Below this many trimmed characters a transcription is treated as silence.
pub const MIN_TRANSCRIPTION_CHARS: usize = 3;
/// Classifications under this confidence are still attempted as transactions.
pub const ROUTE_CONFIDENCE_FLOOR: f64 = 0.6;

/// Outcome of routing a free-text message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "route", content = "result", rename_all = "snake_case")]
pub enum TextRoute {
    Extracted(ExtractionEnvelope),
    Command(IntentClassification),
}

pub struct ExtractionPipeline {
    llm: Arc<dyn ChatCompletion>,
    repository: Arc<dyn TransactionRepository>,
    image_loader: Arc<dyn ImageLoader>,
    ocr: Arc<OcrPipeline>,
    transcriber: Arc<dyn Transcriber>,
    classifier: IntentClassifier,
    gate: Arc<dyn ExtractionGate>,
}

impl ExtractionPipeline {
    pub fn new(
        llm: Arc<dyn ChatCompletion>,
        repository: Arc<dyn TransactionRepository>,
        ocr: OcrPipeline,
        transcriber: Arc<dyn Transcriber>,
    ) -> Self {
        Self {
            classifier: IntentClassifier::new(llm.clone()),
            llm,
            repository,
            image_loader: Arc::new(FsImageLoader),
            ocr: Arc::new(ocr),
            transcriber,
            gate: Arc::new(OpenGate),
        }
    }

    pub fn with_image_loader(mut self, image_loader: Arc<dyn ImageLoader>) -> Self {
        self.image_loader = image_loader;
        self
    }

    pub fn with_gate(mut self, gate: Arc<dyn ExtractionGate>) -> Self {
        self.gate = gate;
        self
    }

    pub async fn process_text_message(&self, user_id: i64, text: &str) -> ExtractionEnvelope {
        self.guarded(user_id, InputSource::Text, self.run_text(user_id, text))
            .await
    }

    pub async fn process_image_message(
        &self,
        user_id: i64,
        file_path: &Path,
        receipt_id: Option<i64>,
    ) -> ExtractionEnvelope {
        self.guarded(
            user_id,
            InputSource::Image,
            self.run_image(user_id, file_path, receipt_id),
        )
        .await
    }

    pub async fn process_audio_message(&self, user_id: i64, file_path: &Path) -> ExtractionEnvelope {
        self.guarded(user_id, InputSource::Audio, self.run_audio(user_id, file_path))
            .await
    }

    pub async fn classify_intent(&self, text: &str) -> IntentClassification {
        self.classifier.classify(text).await
    }

    /// Classifies first; only transaction-like (or uncertain) messages are extracted.
    pub async fn route_text_message(&self, user_id: i64, text: &str) -> TextRoute {
        let classification = self.classify_intent(text).await;
        if classification.intent == UserIntent::Transaction
            || classification.confidence < ROUTE_CONFIDENCE_FLOOR
        {
            TextRoute::Extracted(self.process_text_message(user_id, text).await)
        } else {
            info!(
                "Routing message from user {} to command '{}'",
                user_id,
                classification.intent.as_str()
            );
            TextRoute::Command(classification)
        }
    }

    async fn guarded<F>(&self, user_id: i64, source: InputSource, run: F) -> ExtractionEnvelope
    where
        F: Future<Output = Result<ExtractionEnvelope, PipelineError>>,
    {
        if !self.gate.allows(user_id, source).await {
            warn!("Extraction denied for user {} ({})", user_id, source);
            return PipelineError::Denied { user_id }.into_envelope(source);
        }

        let outcome = match AssertUnwindSafe(run).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(PipelineError::Panicked(reason))
            }
        };

        match outcome {
            Ok(envelope) => {
                info!(
                    "{} message from user {} processed: {} transactions",
                    source,
                    user_id,
                    envelope.transactions.len()
                );
                envelope
            }
            Err(err) => {
                match &err {
                    PipelineError::Parse(_)
                    | PipelineError::IllegibleImage { .. }
                    | PipelineError::Inaudible
                    | PipelineError::Denied { .. } => {
                        warn!("{} pipeline failed for user {}: {}", source, user_id, err)
                    }
                    _ => error!("{} pipeline failed for user {}: {:#}", source, user_id, err),
                }
                err.into_envelope(source)
            }
        }
    }

    async fn run_text(&self, user_id: i64, text: &str) -> Result<ExtractionEnvelope, PipelineError> {
        info!("Processing text message: user={}, len={}", user_id, text.chars().count());
        let saved = self
            .extract_and_save(user_id, InputSource::Text, text, None, None)
            .await?;
        Ok(ExtractionEnvelope::succeeded(InputSource::Text, saved))
    }

    async fn run_image(
        &self,
        user_id: i64,
        file_path: &Path,
        receipt_id: Option<i64>,
    ) -> Result<ExtractionEnvelope, PipelineError> {
        info!("Processing image: user={}, file={}", user_id, file_path.display());
        let ocr = self.recognize_receipt(file_path).await?;

        let chars = ocr.trimmed_len();
        if chars < MIN_OCR_CHARS {
            return Err(PipelineError::IllegibleImage {
                chars,
                confidence: ocr.confidence,
            });
        }

        if let Some(receipt_id) = receipt_id {
            let record_id = self
                .repository
                .create_ocr_record(receipt_id, &ocr.text, ocr_metadata(&ocr))
                .await?;
            info!("Saved OCR record {} for receipt {}", record_id, receipt_id);
        }

        let saved = self
            .extract_and_save(
                user_id,
                InputSource::Image,
                &ocr.text,
                receipt_id,
                Some(ocr.confidence),
            )
            .await?;
        Ok(ExtractionEnvelope::succeeded(InputSource::Image, saved).with_ocr_confidence(ocr.confidence))
    }

    async fn run_audio(&self, user_id: i64, file_path: &Path) -> Result<ExtractionEnvelope, PipelineError> {
        info!("Processing audio: user={}, file={}", user_id, file_path.display());
        let transcription = self
            .transcriber
            .transcribe(file_path)
            .await?
            .map(|text| text.trim().to_string())
            .filter(|text| text.chars().count() >= MIN_TRANSCRIPTION_CHARS)
            .ok_or(PipelineError::Inaudible)?;
        info!("Audio transcribed: {} chars", transcription.chars().count());

        let saved = self
            .extract_and_save(user_id, InputSource::Audio, &transcription, None, None)
            .await?;
        Ok(ExtractionEnvelope::succeeded(InputSource::Audio, saved).with_transcription(transcription))
    }

    /// Default pass first; one aggressive pass when it reads too little.
    async fn recognize_receipt(&self, file_path: &Path) -> Result<OcrResult, PipelineError> {
        let loader = self.image_loader.clone();
        let ocr = self.ocr.clone();
        let path = file_path.to_path_buf();

        tokio::task::spawn_blocking(move || -> Result<OcrResult, PipelineError> {
            let image = loader.load(&path)?;
            let first = ocr.run(&image, Binarization::Otsu);
            info!(
                "OCR pass {:?}: {} chars, confidence {:.1}, {:?}",
                first.binarization,
                first.trimmed_len(),
                first.confidence,
                first.psm_used
            );
            if first.trimmed_len() >= MIN_BEST_TEXT_CHARS {
                return Ok(first);
            }

            info!("Low OCR result, retrying with adaptive binarization");
            let second = ocr.run(&image, Binarization::Adaptive);
            info!(
                "OCR pass {:?}: {} chars, confidence {:.1}, {:?}",
                second.binarization,
                second.trimmed_len(),
                second.confidence,
                second.psm_used
            );
            Ok(if second.trimmed_len() >= first.trimmed_len() {
                second
            } else {
                first
            })
        })
        .await
        .map_err(|e| PipelineError::Task(e.to_string()))?
    }

    /// Prompt, complete, audit, parse, sanity-check and persist in batch order.
    async fn extract_and_save(
        &self,
        user_id: i64,
        source: InputSource,
        content: &str,
        receipt_id: Option<i64>,
        ocr_confidence: Option<f32>,
    ) -> Result<Vec<SavedTransaction>, PipelineError> {
        let prompt = build_extraction_prompt(content, source);
        let completion = self
            .llm
            .complete(CompletionRequest::new(prompt.clone()).with_system_prompt(DEFAULT_SYSTEM_PROMPT))
            .await?;

        let mut meta = json!({
            "model": completion.model,
            "usage": completion.usage,
        });
        if let Some(confidence) = ocr_confidence {
            meta["ocr_confidence"] = json!(confidence);
        }

        let audit_id = self
            .repository
            .create_llm_audit(LlmAuditRecord {
                user_id,
                source: source.audit_label().to_string(),
                input_text: content.to_string(),
                prompt,
                output: completion.text.clone(),
                model: completion.model.clone(),
                meta,
            })
            .await?;
        info!("Saved LLM audit {} ({})", audit_id, source.audit_label());

        let candidates = parse_transactions(&completion.text)?;
        info!("Parsed {} transaction candidates", candidates.len());

        let now = Utc::now();
        let mut saved = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let review = sanity::check(&candidate);
            if review.needs_review {
                warn!(
                    "Transaction #{} needs review: {}",
                    candidate.transaction_index,
                    review.warning.as_deref().unwrap_or_default()
                );
            }

            let extra = json!({
                "sanity": {
                    "flags": review.flags,
                    "adjusted_confidence": review.adjusted_confidence,
                    "warning": review.warning,
                },
                "original_confidence": candidate.confidence,
            });

            let transaction_id = self
                .repository
                .create_transaction(NewTransaction {
                    user_id,
                    intent: candidate.intent,
                    amount: candidate.amount,
                    currency: candidate.currency.clone(),
                    category: review.normalized_category,
                    note: candidate.note.clone(),
                    tx_date: resolve_tx_date(candidate.date.as_deref(), now),
                    needs_review: review.needs_review,
                    llm_response_id: Some(audit_id),
                    receipt_id,
                    extra,
                })
                .await?;

            saved.push(SavedTransaction {
                transaction_id,
                transaction_index: candidate.transaction_index,
                intent: candidate.intent,
                amount: candidate.amount,
                category: review.normalized_category,
                needs_review: review.needs_review,
                flags: review.flags,
                adjusted_confidence: review.adjusted_confidence,
            });
        }

        Ok(saved)
    }
}

fn ocr_metadata(ocr: &OcrResult) -> serde_json::Value {
    json!({
        "confidence": ocr.confidence,
        "psm_used": ocr.psm_used.map(|psm| psm.number()),
        "word_count": ocr.word_count,
        "char_count": ocr.char_count,
        "binarization": ocr.binarization,
        "attempts": ocr.attempts,
    })
}
