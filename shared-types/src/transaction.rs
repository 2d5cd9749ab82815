use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Direction of money movement for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionIntent {
    Income,
    Expense,
}

impl TransactionIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionIntent::Income => "income",
            TransactionIntent::Expense => "expense",
        }
    }

    /// Resolves English and Indonesian synonyms, case-insensitively.
    pub fn from_synonym(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "income" | "pemasukan" | "masuk" => Some(TransactionIntent::Income),
            "expense" | "pengeluaran" | "keluar" => Some(TransactionIntent::Expense),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical category vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Makan,
    Minuman,
    Belanja,
    Transportasi,
    Tagihan,
    Hiburan,
    Kesehatan,
    Pendidikan,
    Gaji,
    Transfer,
    Tabungan,
    Investasi,
    Lainnya,
}

impl Category {
    pub const ALL: [Category; 13] = [
        Category::Makan,
        Category::Minuman,
        Category::Belanja,
        Category::Transportasi,
        Category::Tagihan,
        Category::Hiburan,
        Category::Kesehatan,
        Category::Pendidikan,
        Category::Gaji,
        Category::Transfer,
        Category::Tabungan,
        Category::Investasi,
        Category::Lainnya,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Makan => "makan",
            Category::Minuman => "minuman",
            Category::Belanja => "belanja",
            Category::Transportasi => "transportasi",
            Category::Tagihan => "tagihan",
            Category::Hiburan => "hiburan",
            Category::Kesehatan => "kesehatan",
            Category::Pendidikan => "pendidikan",
            Category::Gaji => "gaji",
            Category::Transfer => "transfer",
            Category::Tabungan => "tabungan",
            Category::Investasi => "investasi",
            Category::Lainnya => "lainnya",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Category::ALL
            .iter()
            .copied()
            .find(|category| category.as_str() == needle)
            .ok_or(UnknownCategory(needle))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);

/// A single proposed transaction extracted from one user message, prior to persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionCandidate {
    pub intent: TransactionIntent,
    /// Whole IDR, no minor units
    pub amount: i64,
    pub currency: String,
    /// Relative token ("today", "kemarin"), ISO date, or None for "now"
    pub date: Option<String>,
    /// Lower-cased model output; canonicalized by the sanity gate
    pub category: String,
    pub note: String,
    pub confidence: f64,
    pub raw_output: String,
    pub transaction_index: usize,
}

/// Review flags raised by the sanity gate, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SanityFlag {
    #[serde(rename = "Invalid Amount")]
    InvalidAmount,
    #[serde(rename = "Low Confidence")]
    LowConfidence,
    #[serde(rename = "Moderate Confidence")]
    ModerateConfidence,
}

impl SanityFlag {
    pub fn label(&self) -> &'static str {
        match self {
            SanityFlag::InvalidAmount => "Invalid Amount",
            SanityFlag::LowConfidence => "Low Confidence",
            SanityFlag::ModerateConfidence => "Moderate Confidence",
        }
    }
}

impl fmt::Display for SanityFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanityResult {
    pub needs_review: bool,
    pub flags: Vec<SanityFlag>,
    pub adjusted_confidence: f64,
    pub warning: Option<String>,
    pub normalized_category: Category,
}

/// Summary of a persisted transaction, as reported back in an extraction envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedTransaction {
    pub transaction_id: i64,
    pub transaction_index: usize,
    pub intent: TransactionIntent,
    pub amount: i64,
    pub category: Category,
    pub needs_review: bool,
    pub flags: Vec<SanityFlag>,
    pub adjusted_confidence: f64,
}

/// A transaction row read back from storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTransaction {
    pub id: i64,
    pub user_id: i64,
    pub intent: TransactionIntent,
    pub amount: i64,
    pub currency: String,
    pub category: Category,
    pub note: String,
    pub tx_date: chrono::DateTime<chrono::Utc>,
    pub needs_review: bool,
    pub llm_response_id: Option<i64>,
    pub receipt_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_synonyms() {
        assert_eq!(
            TransactionIntent::from_synonym("Pemasukan"),
            Some(TransactionIntent::Income)
        );
        assert_eq!(
            TransactionIntent::from_synonym(" keluar "),
            Some(TransactionIntent::Expense)
        );
        assert_eq!(TransactionIntent::from_synonym("refund"), None);
    }

    #[test]
    fn test_category_round_trips_through_str() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
        assert!("snacks".parse::<Category>().is_err());
    }

    #[test]
    fn test_flag_serializes_as_label() {
        let json = serde_json::to_string(&vec![SanityFlag::InvalidAmount]).unwrap();
        assert_eq!(json, r#"["Invalid Amount"]"#);
    }
}
