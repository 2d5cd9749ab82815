use extractors::{extract_json_object, ResponseError};
use serde_json::Value;
use shared_types::{Direction, IntentClassification, Period, UserIntent};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::llm::{ChatCompletion, CompletionError, CompletionRequest};
use crate::prompts::{build_intent_prompt, INTENT_SYSTEM_PROMPT};

/// Classification is cheaper to give up on than extraction.
pub const CLASSIFIER_MAX_ATTEMPTS: u32 = 2;

const DEFAULT_CONFIDENCE: f64 = 0.5;

#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error(transparent)]
    NoJson(#[from] ResponseError),

    #[error("invalid classification JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Routes a raw text message to one of the closed set of user intents.
pub struct IntentClassifier {
    llm: Arc<dyn ChatCompletion>,
}

impl IntentClassifier {
    pub fn new(llm: Arc<dyn ChatCompletion>) -> Self {
        Self { llm }
    }

    /// Never fails: any error degrades to a low-confidence `transaction`.
    pub async fn classify(&self, text: &str) -> IntentClassification {
        match self.try_classify(text).await {
            Ok(classification) => {
                info!(
                    "Intent classified: {} (confidence: {:.2})",
                    classification.intent.as_str(),
                    classification.confidence
                );
                classification
            }
            Err(err) => {
                error!("Intent classification failed: {}", err);
                IntentClassification::fallback()
            }
        }
    }

    async fn try_classify(&self, text: &str) -> Result<IntentClassification, ClassifyError> {
        let request = CompletionRequest::new(build_intent_prompt(text))
            .with_system_prompt(INTENT_SYSTEM_PROMPT)
            .with_max_attempts(CLASSIFIER_MAX_ATTEMPTS);
        let completion = self.llm.complete(request).await?;
        parse_classification(&completion.text)
    }
}

pub fn parse_classification(llm_text: &str) -> Result<IntentClassification, ClassifyError> {
    let value: Value = serde_json::from_str(extract_json_object(llm_text)?)?;

    let label = value.get("intent").and_then(Value::as_str).unwrap_or("unknown");
    let intent = UserIntent::from_label(label);
    if intent == UserIntent::Unknown && !label.eq_ignore_ascii_case("unknown") {
        warn!("Unknown intent from model: {}", label);
    }

    let confidence = match value.get("confidence") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|c| c.is_finite())
    .unwrap_or(DEFAULT_CONFIDENCE)
    .clamp(0.0, 1.0);

    let label_of = |key: &str| value.get(key).and_then(Value::as_str);

    Ok(IntentClassification {
        intent,
        confidence,
        period: label_of("period").and_then(Period::from_label),
        direction: label_of("direction").and_then(Direction::from_label),
        reason: label_of("reasoning")
            .or_else(|| label_of("reason"))
            .unwrap_or_default()
            .to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedCompletion;

    #[test]
    fn test_parse_full_classification() {
        let text = r#"{"intent": "history", "confidence": 0.88, "period": "week", "direction": "expense", "reasoning": "asks for recap"}"#;
        let classification = parse_classification(text).unwrap();
        assert_eq!(classification.intent, UserIntent::History);
        assert_eq!(classification.period, Some(Period::Week));
        assert_eq!(classification.direction, Some(Direction::Expense));
        assert_eq!(classification.reason, "asks for recap");
    }

    #[test]
    fn test_unrecognized_intent_maps_to_unknown() {
        let text = r#"noise {"intent": "weather", "confidence": 0.7, "period": null, "direction": null}"#;
        let classification = parse_classification(text).unwrap();
        assert_eq!(classification.intent, UserIntent::Unknown);
        assert_eq!(classification.period, None);
    }

    #[test]
    fn test_missing_json_is_error() {
        assert!(matches!(
            parse_classification("I think it's a transaction"),
            Err(ClassifyError::NoJson(_))
        ));
    }

    #[tokio::test]
    async fn test_classify_uses_reduced_retry_budget() {
        let llm = Arc::new(ScriptedCompletion::new(vec![Ok(
            r#"{"intent": "small_talk", "confidence": 0.95, "period": null, "direction": null, "reasoning": "greeting"}"#,
        )]));
        let classifier = IntentClassifier::new(llm.clone());

        let classification = classifier.classify("halo").await;
        assert_eq!(classification.intent, UserIntent::SmallTalk);

        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].max_attempts, Some(CLASSIFIER_MAX_ATTEMPTS));
        assert!(requests[0].prompt.contains("User message: \"halo\""));
    }

    #[tokio::test]
    async fn test_service_failure_falls_back_to_transaction() {
        let llm = Arc::new(ScriptedCompletion::new(vec![Err(CompletionError::Status {
            status: 503,
            body: "unavailable".to_string(),
        })]));
        let classification = IntentClassifier::new(llm).classify("beli kopi 20rb").await;
        assert_eq!(classification, IntentClassification::fallback());
    }

    #[tokio::test]
    async fn test_malformed_output_falls_back_to_transaction() {
        let llm = Arc::new(ScriptedCompletion::new(vec![Ok("not json at all")]));
        let classification = IntentClassifier::new(llm).classify("beli kopi 20rb").await;
        assert_eq!(classification.intent, UserIntent::Transaction);
        assert!((classification.confidence - 0.3).abs() < 1e-9);
    }
}
