use image::GrayImage;
use shared_types::{Binarization, OcrAttempt, OcrResult, PageSegMode};
use std::sync::Arc;
use tracing::{debug, warn};

use super::recognizer::TextRecognizer;

/// Text must be longer than this, after trimming, to be selected as best.
pub const MIN_BEST_TEXT_CHARS: usize = 10;

/// Tries each page segmentation mode in order and keeps the most confident
/// result with enough text.
pub struct OcrEngine {
    recognizer: Arc<dyn TextRecognizer>,
    modes: Vec<PageSegMode>,
}

impl OcrEngine {
    pub fn new(recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self {
            recognizer,
            modes: PageSegMode::RECEIPT_ORDER.to_vec(),
        }
    }

    pub fn with_modes(mut self, modes: Vec<PageSegMode>) -> Self {
        self.modes = modes;
        self
    }

    /// Runs every mode sequentially. Failures are recorded in the attempts
    /// trail; when nothing qualifies the result is empty with zero confidence.
    pub fn extract(&self, image: &GrayImage, binarization: Binarization) -> OcrResult {
        let mut attempts = Vec::with_capacity(self.modes.len());
        let mut best: Option<(PageSegMode, String, f32)> = None;

        for &psm in &self.modes {
            match self.recognizer.recognize(image, psm) {
                Ok(recognition) => {
                    let text = recognition.text.trim().to_string();
                    let confidence = recognition.mean_confidence();
                    let text_length = text.chars().count();
                    debug!(%psm, text_length, confidence, "OCR attempt finished");

                    attempts.push(OcrAttempt {
                        psm,
                        text_length,
                        confidence,
                        error: None,
                    });

                    let beats_best = best
                        .as_ref()
                        .map_or(true, |(_, _, best_confidence)| confidence > *best_confidence);
                    if text_length > MIN_BEST_TEXT_CHARS && beats_best {
                        best = Some((psm, text, confidence));
                    }
                }
                Err(err) => {
                    warn!(%psm, "OCR attempt failed: {}", err);
                    attempts.push(OcrAttempt {
                        psm,
                        text_length: 0,
                        confidence: 0.0,
                        error: Some(err.to_string()),
                    });
                }
            }
        }

        let (psm_used, text, confidence) = match best {
            Some((psm, text, confidence)) => (Some(psm), text, confidence),
            None => (None, String::new(), 0.0),
        };

        OcrResult {
            word_count: text.split_whitespace().count(),
            char_count: text.chars().count(),
            text,
            confidence,
            psm_used,
            binarization,
            attempts,
        }
    }
}
