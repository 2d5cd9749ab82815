use serde::{Deserialize, Serialize};
use std::fmt;

/// Tesseract page segmentation modes tried by the OCR engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageSegMode {
    /// PSM 3
    FullyAutomatic,
    /// PSM 4
    SingleColumn,
    /// PSM 6
    SingleBlock,
    /// PSM 11
    SparseText,
}

impl PageSegMode {
    /// Fixed extraction order, tried the same way on every pass.
    pub const RECEIPT_ORDER: [PageSegMode; 4] = [
        PageSegMode::SingleBlock,
        PageSegMode::SingleColumn,
        PageSegMode::FullyAutomatic,
        PageSegMode::SparseText,
    ];

    pub fn number(&self) -> u8 {
        match self {
            PageSegMode::FullyAutomatic => 3,
            PageSegMode::SingleColumn => 4,
            PageSegMode::SingleBlock => 6,
            PageSegMode::SparseText => 11,
        }
    }
}

impl fmt::Display for PageSegMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "psm {}", self.number())
    }
}

/// Binarization strategy used during preprocessing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Binarization {
    /// Global Otsu threshold
    #[default]
    Otsu,
    /// Local Gaussian-weighted threshold, used for the aggressive retry
    Adaptive,
}

/// Diagnostics for one page segmentation mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrAttempt {
    pub psm: PageSegMode,
    pub text_length: usize,
    pub confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrResult {
    pub text: String,
    /// Mean word confidence of the winning mode, 0-100
    pub confidence: f32,
    pub psm_used: Option<PageSegMode>,
    pub word_count: usize,
    pub char_count: usize,
    pub binarization: Binarization,
    pub attempts: Vec<OcrAttempt>,
}

impl OcrResult {
    pub fn trimmed_len(&self) -> usize {
        self.text.trim().chars().count()
    }
}
