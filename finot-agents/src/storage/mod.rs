pub mod sqlite_storage;

pub use sqlite_storage::{SqliteStore, StoredOcrRecord};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{Category, StoredTransaction, TransactionIntent};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to serialize metadata: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("database connection lock poisoned")]
    LockPoisoned,

    #[error("corrupt row in {table}: {reason}")]
    CorruptRow { table: &'static str, reason: String },
}

/// One accepted candidate, ready to be written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub user_id: i64,
    pub intent: TransactionIntent,
    pub amount: i64,
    pub currency: String,
    pub category: Category,
    pub note: String,
    pub tx_date: DateTime<Utc>,
    pub needs_review: bool,
    pub llm_response_id: Option<i64>,
    pub receipt_id: Option<i64>,
    pub extra: serde_json::Value,
}

/// Raw model exchange kept for forensics, written before parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmAuditRecord {
    pub user_id: i64,
    pub source: String,
    pub input_text: String,
    pub prompt: String,
    pub output: String,
    pub model: String,
    pub meta: serde_json::Value,
}

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn create_transaction(&self, transaction: NewTransaction) -> Result<i64, StorageError>;

    async fn create_ocr_record(
        &self,
        receipt_id: i64,
        text: &str,
        metadata: serde_json::Value,
    ) -> Result<i64, StorageError>;

    async fn create_llm_audit(&self, record: LlmAuditRecord) -> Result<i64, StorageError>;
}

#[async_trait]
pub trait ReceiptRepository: Send + Sync {
    async fn create_receipt(&self, user_id: i64, file_path: &str) -> Result<i64, StorageError>;
}

/// Read side used by the analysis features.
#[async_trait]
pub trait TransactionHistory: Send + Sync {
    async fn transactions_for(&self, user_id: i64) -> Result<Vec<StoredTransaction>, StorageError>;
}
