use serde_json::{Map, Value};
use shared_types::{TransactionCandidate, TransactionIntent};

use crate::normalizer::parse_amount;
use crate::response::{extract_json_object, ResponseError};

/// Fields every candidate object must carry.
pub const REQUIRED_FIELDS: [&str; 7] = [
    "intent",
    "amount",
    "currency",
    "date",
    "category",
    "note",
    "confidence",
];

const DEFAULT_CURRENCY: &str = "IDR";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    NoJson(#[from] ResponseError),

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("expected a JSON object")]
    NotAnObject,

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("unrecognized intent: {0}")]
    InvalidIntent(String),

    #[error("invalid confidence: {0}")]
    InvalidConfidence(String),

    #[error("'transactions' must be a list")]
    TransactionsNotList,

    #[error("'transactions' is empty")]
    EmptyTransactions,

    #[error("Error parsing transaction #{index}: {source}")]
    Element {
        /// 1-based position in the batch
        index: usize,
        #[source]
        source: Box<ParseError>,
    },
}

/// Parses model output into transaction candidates.
///
/// A top-level `transactions` array is a batch: every element must parse or
/// the whole call fails. Without it the object itself is the single candidate.
pub fn parse(llm_text: &str) -> Result<Vec<TransactionCandidate>, ParseError> {
    let json_text = extract_json_object(llm_text)?;
    let value: Value =
        serde_json::from_str(json_text).map_err(|e| ParseError::InvalidJson(e.to_string()))?;
    let object = value.as_object().ok_or(ParseError::NotAnObject)?;

    match object.get("transactions") {
        Some(Value::Array(items)) => {
            if items.is_empty() {
                return Err(ParseError::EmptyTransactions);
            }
            items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    item.as_object()
                        .ok_or(ParseError::NotAnObject)
                        .and_then(|fields| parse_candidate(fields, llm_text, index))
                        .map_err(|source| ParseError::Element {
                            index: index + 1,
                            source: Box::new(source),
                        })
                })
                .collect()
        }
        Some(_) => Err(ParseError::TransactionsNotList),
        None => Ok(vec![parse_candidate(object, llm_text, 0)?]),
    }
}

fn parse_candidate(
    fields: &Map<String, Value>,
    raw_output: &str,
    transaction_index: usize,
) -> Result<TransactionCandidate, ParseError> {
    for field in REQUIRED_FIELDS {
        if !fields.contains_key(field) {
            return Err(ParseError::MissingField(field));
        }
    }

    let intent_label = text_field(&fields["intent"]);
    let intent = TransactionIntent::from_synonym(&intent_label)
        .ok_or(ParseError::InvalidIntent(intent_label))?;

    let currency = match text_field(&fields["currency"]).trim() {
        "" => DEFAULT_CURRENCY.to_string(),
        code => code.to_uppercase(),
    };

    let date = match &fields["date"] {
        Value::Null => None,
        other => Some(text_field(other)).filter(|d| !d.trim().is_empty()),
    };

    Ok(TransactionCandidate {
        intent,
        amount: parse_amount(&fields["amount"]),
        currency,
        date,
        category: text_field(&fields["category"]).trim().to_lowercase(),
        note: text_field(&fields["note"]),
        confidence: parse_confidence(&fields["confidence"])?,
        raw_output: raw_output.to_string(),
        transaction_index,
    })
}

fn text_field(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn parse_confidence(value: &Value) -> Result<f64, ParseError> {
    let confidence = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|c| c.is_finite())
    .ok_or_else(|| ParseError::InvalidConfidence(value.to_string()))?;

    Ok(confidence.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_implicit_candidate() {
        let text = r#"{"intent": "pengeluaran", "amount": "25rb", "currency": "idr", "date": "today", "category": "Makan", "note": "makan siang", "confidence": 0.92}"#;
        let candidates = parse(text).unwrap();
        assert_eq!(candidates.len(), 1);

        let candidate = &candidates[0];
        assert_eq!(candidate.intent, TransactionIntent::Expense);
        assert_eq!(candidate.amount, 25_000);
        assert_eq!(candidate.currency, "IDR");
        assert_eq!(candidate.date.as_deref(), Some("today"));
        assert_eq!(candidate.category, "makan");
        assert_eq!(candidate.transaction_index, 0);
        assert_eq!(candidate.raw_output, text);
    }

    #[test]
    fn test_batch_keeps_order_and_indices() {
        let text = r#"Here: {"transactions": [
            {"intent": "expense", "amount": 50000, "currency": "IDR", "date": "today", "category": "makan", "note": "makan", "confidence": 0.9},
            {"intent": "expense", "amount": 20000, "currency": "IDR", "date": "yesterday", "category": "lainnya", "note": "rokok", "confidence": 0.85},
            {"intent": "income", "amount": 500000, "currency": "IDR", "date": null, "category": "gaji", "note": "gajian", "confidence": 0.95}
        ]}"#;
        let candidates = parse(text).unwrap();
        let intents: Vec<_> = candidates.iter().map(|c| c.intent).collect();
        let amounts: Vec<_> = candidates.iter().map(|c| c.amount).collect();
        let indices: Vec<_> = candidates.iter().map(|c| c.transaction_index).collect();

        assert_eq!(
            intents,
            vec![
                TransactionIntent::Expense,
                TransactionIntent::Expense,
                TransactionIntent::Income
            ]
        );
        assert_eq!(amounts, vec![50_000, 20_000, 500_000]);
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(candidates[2].date, None);
    }

    #[test]
    fn test_batch_fails_atomically_with_element_index() {
        let text = r#"{"transactions": [
            {"intent": "expense", "amount": 1000, "currency": "IDR", "date": null, "category": "makan", "note": "a", "confidence": 0.9},
            {"intent": "expense", "amount": 2000, "currency": "IDR", "date": null, "note": "b", "confidence": 0.9},
            {"intent": "expense", "amount": 3000, "currency": "IDR", "date": null, "category": "makan", "note": "c", "confidence": 0.9}
        ]}"#;
        let err = parse(text).unwrap_err();
        match &err {
            ParseError::Element { index, source } => {
                assert_eq!(*index, 2);
                assert_eq!(**source, ParseError::MissingField("category"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().starts_with("Error parsing transaction #2"));
    }

    #[test]
    fn test_transactions_must_be_non_empty_list() {
        assert_eq!(
            parse(r#"{"transactions": {}}"#).unwrap_err(),
            ParseError::TransactionsNotList
        );
        assert_eq!(
            parse(r#"{"transactions": []}"#).unwrap_err(),
            ParseError::EmptyTransactions
        );
    }

    #[test]
    fn test_unknown_intent_is_rejected() {
        let text = r#"{"intent": "refund", "amount": 1, "currency": "IDR", "date": null, "category": "x", "note": "", "confidence": 1}"#;
        assert_eq!(
            parse(text).unwrap_err(),
            ParseError::InvalidIntent("refund".to_string())
        );
    }

    #[test]
    fn test_confidence_parsing() {
        let text = r#"{"intent": "masuk", "amount": 1, "currency": null, "date": null, "category": "gaji", "note": "", "confidence": "0.75"}"#;
        let candidate = &parse(text).unwrap()[0];
        assert!((candidate.confidence - 0.75).abs() < 1e-9);
        assert_eq!(candidate.currency, "IDR");

        let text = r#"{"intent": "masuk", "amount": 1, "currency": "IDR", "date": null, "category": "gaji", "note": "", "confidence": "high"}"#;
        assert!(matches!(parse(text), Err(ParseError::InvalidConfidence(_))));
    }

    #[test]
    fn test_no_json_is_typed_error() {
        assert_eq!(
            parse("I could not find a transaction.").unwrap_err(),
            ParseError::NoJson(ResponseError::NoJsonFound)
        );
    }
}
