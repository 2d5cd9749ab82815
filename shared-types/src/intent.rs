use serde::{Deserialize, Serialize};

/// What a free-text message is asking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserIntent {
    Transaction,
    Help,
    History,
    Export,
    SmallTalk,
    Insight,
    Prediction,
    SavingRec,
    HealthScore,
    Simulation,
    Analysis,
    Upgrade,
    Status,
    Unknown,
}

impl UserIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserIntent::Transaction => "transaction",
            UserIntent::Help => "help",
            UserIntent::History => "history",
            UserIntent::Export => "export",
            UserIntent::SmallTalk => "small_talk",
            UserIntent::Insight => "insight",
            UserIntent::Prediction => "prediction",
            UserIntent::SavingRec => "saving_rec",
            UserIntent::HealthScore => "health_score",
            UserIntent::Simulation => "simulation",
            UserIntent::Analysis => "analysis",
            UserIntent::Upgrade => "upgrade",
            UserIntent::Status => "status",
            UserIntent::Unknown => "unknown",
        }
    }

    /// Maps a model-provided label to the closed set; anything else is `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().replace('-', "_").as_str() {
            "transaction" => UserIntent::Transaction,
            "help" => UserIntent::Help,
            "history" => UserIntent::History,
            "export" => UserIntent::Export,
            "small_talk" => UserIntent::SmallTalk,
            "insight" => UserIntent::Insight,
            "prediction" => UserIntent::Prediction,
            "saving_rec" | "saving_recommendation" => UserIntent::SavingRec,
            "health_score" => UserIntent::HealthScore,
            "simulation" => UserIntent::Simulation,
            "analysis" => UserIntent::Analysis,
            "upgrade" => UserIntent::Upgrade,
            "status" => UserIntent::Status,
            _ => UserIntent::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Today,
    Week,
    Month,
    Year,
}

impl Period {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "today" => Some(Period::Today),
            "week" => Some(Period::Week),
            "month" => Some(Period::Month),
            "year" => Some(Period::Year),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Income,
    Expense,
}

impl Direction {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "income" => Some(Direction::Income),
            "expense" => Some(Direction::Expense),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentClassification {
    pub intent: UserIntent,
    pub confidence: f64,
    pub period: Option<Period>,
    pub direction: Option<Direction>,
    pub reason: String,
}

impl IntentClassification {
    /// Used when classification itself fails: attempt the message as a transaction.
    pub fn fallback() -> Self {
        Self {
            intent: UserIntent::Transaction,
            confidence: 0.3,
            period: None,
            direction: None,
            reason: "Fallback due to error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_labels_map_to_unknown() {
        assert_eq!(UserIntent::from_label("weather"), UserIntent::Unknown);
        assert_eq!(UserIntent::from_label(""), UserIntent::Unknown);
    }

    #[test]
    fn test_labels_round_trip() {
        for intent in [
            UserIntent::Transaction,
            UserIntent::SmallTalk,
            UserIntent::SavingRec,
            UserIntent::HealthScore,
            UserIntent::Status,
        ] {
            assert_eq!(UserIntent::from_label(intent.as_str()), intent);
        }
    }

    #[test]
    fn test_fallback_is_low_confidence_transaction() {
        let fallback = IntentClassification::fallback();
        assert_eq!(fallback.intent, UserIntent::Transaction);
        assert!((fallback.confidence - 0.3).abs() < f64::EPSILON);
    }
}
