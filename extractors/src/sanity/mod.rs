use shared_types::{SanityFlag, SanityResult, TransactionCandidate};

use crate::normalizer::normalize_category;

pub const LOW_CONFIDENCE: f64 = 0.4;
pub const MODERATE_CONFIDENCE: f64 = 0.6;
pub const PENALTY_PER_FLAG: f64 = 0.05;

/// Semantic checks on a parsed candidate.
///
/// Never rejects: problems become review flags on a transaction that is
/// still saved.
pub fn check(candidate: &TransactionCandidate) -> SanityResult {
    let mut flags = Vec::new();
    let mut warnings = Vec::new();

    if candidate.amount <= 0 {
        flags.push(SanityFlag::InvalidAmount);
        warnings.push("Amount tidak valid".to_string());
    }

    if candidate.confidence < LOW_CONFIDENCE {
        flags.push(SanityFlag::LowConfidence);
        warnings.push("Confidence sangat rendah".to_string());
    } else if candidate.confidence < MODERATE_CONFIDENCE {
        flags.push(SanityFlag::ModerateConfidence);
        warnings.push("Confidence cukup rendah".to_string());
    }

    let category = normalize_category(&candidate.category);
    if category.was_corrected {
        warnings.push(format!(
            "Kategori dikoreksi: '{}' → '{}'",
            candidate.category, category.normalized
        ));
    }

    let adjusted_confidence =
        (candidate.confidence - PENALTY_PER_FLAG * flags.len() as f64).max(0.0);

    SanityResult {
        needs_review: !flags.is_empty(),
        flags,
        adjusted_confidence,
        warning: (!warnings.is_empty()).then(|| warnings.join("; ")),
        normalized_category: category.normalized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{Category, TransactionIntent};

    fn candidate(amount: i64, confidence: f64, category: &str) -> TransactionCandidate {
        TransactionCandidate {
            intent: TransactionIntent::Expense,
            amount,
            currency: "IDR".to_string(),
            date: None,
            category: category.to_string(),
            note: "test".to_string(),
            confidence,
            raw_output: String::new(),
            transaction_index: 0,
        }
    }

    #[test]
    fn test_clean_candidate() {
        let result = check(&candidate(25_000, 0.9, "makan"));
        assert!(!result.needs_review);
        assert!(result.flags.is_empty());
        assert_eq!(result.warning, None);
        assert_eq!(result.normalized_category, Category::Makan);
        assert!((result.adjusted_confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_amount_forces_review() {
        let result = check(&candidate(0, 0.9, "makan"));
        assert!(result.needs_review);
        assert_eq!(result.flags, vec![SanityFlag::InvalidAmount]);
        assert!((result.adjusted_confidence - 0.85).abs() < 1e-9);

        assert!(check(&candidate(-500, 0.9, "makan")).needs_review);
    }

    #[test]
    fn test_confidence_bands() {
        assert_eq!(
            check(&candidate(1, 0.3, "makan")).flags,
            vec![SanityFlag::LowConfidence]
        );
        assert_eq!(
            check(&candidate(1, 0.5, "makan")).flags,
            vec![SanityFlag::ModerateConfidence]
        );
        assert!(check(&candidate(1, 0.6, "makan")).flags.is_empty());
    }

    #[test]
    fn test_category_correction_warns_without_review() {
        let result = check(&candidate(10_000, 0.95, "food"));
        assert!(!result.needs_review);
        assert_eq!(result.normalized_category, Category::Makan);
        assert_eq!(
            result.warning.as_deref(),
            Some("Kategori dikoreksi: 'food' → 'makan'")
        );
    }

    #[test]
    fn test_warnings_joined_in_order() {
        let result = check(&candidate(0, 0.2, "rokok"));
        assert_eq!(
            result.flags,
            vec![SanityFlag::InvalidAmount, SanityFlag::LowConfidence]
        );
        assert_eq!(
            result.warning.as_deref(),
            Some("Amount tidak valid; Confidence sangat rendah; Kategori dikoreksi: 'rokok' → 'lainnya'")
        );
        assert!((result.adjusted_confidence - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_adjusted_confidence_is_monotone_and_floored() {
        for confidence in [0.0, 0.05, 0.39, 0.45, 0.59, 0.61, 1.0] {
            for amount in [-1, 0, 1] {
                let result = check(&candidate(amount, confidence, "makan"));
                assert!(result.adjusted_confidence <= confidence);
                assert!(result.adjusted_confidence >= 0.0);
                assert_eq!(result.needs_review, !result.flags.is_empty());
            }
        }

        let one_flag = check(&candidate(0, 0.9, "makan")).adjusted_confidence;
        let two_flags = check(&candidate(0, 0.5, "makan")).adjusted_confidence;
        assert!(two_flags < one_flag);
    }
}
