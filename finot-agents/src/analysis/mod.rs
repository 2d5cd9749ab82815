//! Premium analysis features: insights, predictions, health score and
//! saving simulations over a user's stored transactions.

use chrono::{Duration, Utc};
use extractors::extract_json_object;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared_types::{StoredTransaction, TransactionIntent};
use std::sync::Arc;
use tracing::{error, info};

use crate::llm::{ChatCompletion, CompletionError, CompletionRequest};
use crate::prompts::analysis::{
    build_balance_prediction_prompt, build_daily_insight_prompt, build_financial_health_prompt,
    build_fixed_cut_simulation_prompt, build_monthly_analysis_prompt,
    build_saving_recommendation_prompt, build_saving_simulation_prompt,
    build_weekly_analysis_prompt, transaction_summary,
};
use crate::storage::{StorageError, TransactionHistory};

pub const ADVISOR_SYSTEM_PROMPT: &str = "You are FiNot, an AI financial advisor. \
Always respond in valid JSON format. \
Use Indonesian language for text fields.";

pub const DEFAULT_SIMULATION_SCENARIO: &str = "hemat 10000 per hari";

const SIMULATION_WINDOW_DAYS: i64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Completion(#[from] CompletionError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisKind {
    DailyInsight,
    BalancePrediction { current_balance: Option<i64> },
    SavingRecommendation,
    FinancialHealth,
    SavingSimulation { scenario: String },
    FixedCutSimulation { daily_cut: i64 },
    WeeklyAnalysis,
    MonthlyAnalysis,
}

impl AnalysisKind {
    fn window_days(&self) -> i64 {
        match self {
            AnalysisKind::DailyInsight => 1,
            AnalysisKind::WeeklyAnalysis => 7,
            _ => 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<i64>,
}

pub struct AnalysisService {
    llm: Arc<dyn ChatCompletion>,
    history: Arc<dyn TransactionHistory>,
}

impl AnalysisService {
    pub fn new(llm: Arc<dyn ChatCompletion>, history: Arc<dyn TransactionHistory>) -> Self {
        Self { llm, history }
    }

    pub async fn run(&self, user_id: i64, kind: AnalysisKind) -> Result<AnalysisReport, AnalysisError> {
        let all = self.history.transactions_for(user_id).await?;
        let recent = within_days(&all, kind.window_days());
        let summary = transaction_summary(&recent);

        let (prompt, balance) = match &kind {
            AnalysisKind::DailyInsight => (build_daily_insight_prompt(&summary), None),
            AnalysisKind::SavingRecommendation => (build_saving_recommendation_prompt(&summary), None),
            AnalysisKind::FinancialHealth => (build_financial_health_prompt(&summary), None),
            AnalysisKind::WeeklyAnalysis => (build_weekly_analysis_prompt(&summary), None),
            AnalysisKind::MonthlyAnalysis => (build_monthly_analysis_prompt(&summary), None),
            AnalysisKind::BalancePrediction { current_balance } => {
                let balance = current_balance
                    .filter(|b| *b != 0)
                    .unwrap_or_else(|| net_balance(&all));
                if balance <= 0 {
                    info!("Skipping balance prediction for user {}: balance {}", user_id, balance);
                    return Ok(AnalysisReport {
                        data: empty_prediction(),
                        balance: Some(balance),
                    });
                }
                (build_balance_prediction_prompt(&summary, balance), Some(balance))
            }
            AnalysisKind::SavingSimulation { scenario } => {
                let scenario = if scenario.trim().is_empty() {
                    DEFAULT_SIMULATION_SCENARIO
                } else {
                    scenario.as_str()
                };
                (
                    build_saving_simulation_prompt(
                        scenario,
                        net_balance(&all).max(0),
                        daily_average_expense(&recent),
                        &summary,
                    ),
                    None,
                )
            }
            AnalysisKind::FixedCutSimulation { daily_cut } => (
                build_fixed_cut_simulation_prompt(
                    *daily_cut,
                    net_balance(&all).max(0),
                    daily_average_expense(&recent),
                    &summary,
                ),
                None,
            ),
        };

        let data = self.complete_json(&prompt).await?;
        info!("Analysis {:?} generated for user {}", kind, user_id);
        Ok(AnalysisReport { data, balance })
    }

    async fn complete_json(&self, prompt: &str) -> Result<Value, CompletionError> {
        let completion = self
            .llm
            .complete(CompletionRequest::new(prompt).with_system_prompt(ADVISOR_SYSTEM_PROMPT))
            .await?;

        let parsed = extract_json_object(&completion.text)
            .map_err(|e| e.to_string())
            .and_then(|json| serde_json::from_str::<Value>(json).map_err(|e| e.to_string()));
        Ok(match parsed {
            Ok(value) => value,
            Err(reason) => {
                error!("Failed to parse analysis result: {}", reason);
                json!({"error": "Gagal menganalisis data", "raw": completion.text})
            }
        })
    }
}

fn within_days(transactions: &[StoredTransaction], days: i64) -> Vec<StoredTransaction> {
    let since = Utc::now() - Duration::days(days);
    transactions
        .iter()
        .filter(|tx| tx.tx_date >= since)
        .cloned()
        .collect()
}

fn net_balance(transactions: &[StoredTransaction]) -> i64 {
    transactions.iter().fold(0, |net, tx| match tx.intent {
        TransactionIntent::Income => net.saturating_add(tx.amount),
        TransactionIntent::Expense => net.saturating_sub(tx.amount),
    })
}

fn daily_average_expense(transactions: &[StoredTransaction]) -> i64 {
    let total = transactions
        .iter()
        .filter(|tx| tx.intent == TransactionIntent::Expense)
        .fold(0i64, |total, tx| total.saturating_add(tx.amount));
    total / SIMULATION_WINDOW_DAYS
}

fn empty_prediction() -> Value {
    json!({
        "daily_avg_expense": 0,
        "daily_avg_income": 0,
        "predicted_days": 0,
        "prediction_confidence": 0.5,
        "explanation": "Saldo kamu saat ini minus atau nol. Catat pemasukan terlebih dahulu agar prediksi bisa akurat.",
    })
}
