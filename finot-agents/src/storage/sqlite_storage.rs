use super::{
    LlmAuditRecord, NewTransaction, ReceiptRepository, StorageError, TransactionHistory,
    TransactionRepository,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use shared_types::{Category, StoredTransaction, TransactionIntent};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct StoredOcrRecord {
    pub id: i64,
    pub receipt_id: i64,
    pub text: String,
    pub metadata: serde_json::Value,
}

pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Result<Self, StorageError> {
        {
            let guard = conn.lock().map_err(|_| StorageError::LockPoisoned)?;
            run_migrations(&guard)?;
        }
        Ok(Self { conn })
    }

    pub fn open(path: &Path) -> Result<Self, StorageError> {
        debug!("Opening database at {}", path.display());
        Self::new(Arc::new(Mutex::new(Connection::open(path)?)))
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::new(Arc::new(Mutex::new(Connection::open_in_memory()?)))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    /// All transactions of a user, oldest first.
    pub fn list_transactions(&self, user_id: i64) -> Result<Vec<StoredTransaction>, StorageError> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT id, user_id, intent, amount, currency, category, note, tx_date,
                    needs_review, llm_response_id, receipt_id
             FROM transactions
             WHERE user_id = ?
             ORDER BY tx_date ASC, id ASC",
        )?;

        let rows = stmt
            .query_map([user_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, i64>(7)?,
                    row.get::<_, bool>(8)?,
                    row.get::<_, Option<i64>>(9)?,
                    row.get::<_, Option<i64>>(10)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(
                |(id, user_id, intent, amount, currency, category, note, tx_date, needs_review, llm_response_id, receipt_id)|
                 -> Result<StoredTransaction, StorageError> {
                    let corrupt = |reason: String| StorageError::CorruptRow {
                        table: "transactions",
                        reason,
                    };
                    Ok(StoredTransaction {
                        id,
                        user_id,
                        intent: TransactionIntent::from_synonym(&intent)
                            .ok_or_else(|| corrupt(format!("intent '{intent}'")))?,
                        amount,
                        currency,
                        category: category.parse::<Category>().map_err(|e| corrupt(e.to_string()))?,
                        note,
                        tx_date: DateTime::<Utc>::from_timestamp(tx_date, 0)
                            .ok_or_else(|| corrupt(format!("timestamp {tx_date}")))?,
                        needs_review,
                        llm_response_id,
                        receipt_id,
                    })
                },
            )
            .collect()
    }

    pub fn transaction_extra(&self, transaction_id: i64) -> Result<Option<serde_json::Value>, StorageError> {
        let conn = self.lock()?;
        let extra: Option<String> = conn
            .query_row(
                "SELECT extra FROM transactions WHERE id = ?",
                [transaction_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(extra.map(|e| serde_json::from_str(&e)).transpose()?)
    }

    pub fn get_llm_audit(&self, audit_id: i64) -> Result<Option<LlmAuditRecord>, StorageError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT user_id, source, input_text, prompt, output, model, meta
                 FROM llm_responses WHERE id = ?",
                [audit_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(user_id, source, input_text, prompt, output, model, meta)| -> Result<_, StorageError> {
            Ok(LlmAuditRecord {
                user_id,
                source,
                input_text,
                prompt,
                output,
                model,
                meta: serde_json::from_str(&meta)?,
            })
        })
        .transpose()
    }

    pub fn count_llm_audits(&self, user_id: i64) -> Result<i64, StorageError> {
        let conn = self.lock()?;
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM llm_responses WHERE user_id = ?",
            [user_id],
            |row| row.get(0),
        )?)
    }

    pub fn ocr_records_for_receipt(&self, receipt_id: i64) -> Result<Vec<StoredOcrRecord>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, receipt_id, text, metadata
             FROM ocr_records
             WHERE receipt_id = ?
             ORDER BY id ASC",
        )?;

        let rows = stmt
            .query_map([receipt_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, receipt_id, text, metadata)| -> Result<_, StorageError> {
                Ok(StoredOcrRecord {
                    id,
                    receipt_id,
                    text,
                    metadata: serde_json::from_str(&metadata)?,
                })
            })
            .collect()
    }
}

pub fn run_migrations(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS receipts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            file_path TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS llm_responses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            source TEXT NOT NULL,
            input_text TEXT NOT NULL,
            prompt TEXT NOT NULL,
            output TEXT NOT NULL,
            model TEXT NOT NULL,
            meta TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS ocr_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            receipt_id INTEGER NOT NULL REFERENCES receipts(id),
            text TEXT NOT NULL,
            metadata TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            intent TEXT NOT NULL,
            amount INTEGER NOT NULL,
            currency TEXT NOT NULL,
            category TEXT NOT NULL,
            note TEXT NOT NULL,
            tx_date INTEGER NOT NULL,
            needs_review INTEGER NOT NULL DEFAULT 0,
            llm_response_id INTEGER REFERENCES llm_responses(id),
            receipt_id INTEGER REFERENCES receipts(id),
            extra TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_transactions_user ON transactions(user_id, tx_date);",
    )
}

#[async_trait]
impl TransactionRepository for SqliteStore {
    async fn create_transaction(&self, transaction: NewTransaction) -> Result<i64, StorageError> {
        let extra = serde_json::to_string(&transaction.extra)?;
        let conn = self.lock()?;
        let now = Utc::now().timestamp();

        conn.execute(
            "INSERT INTO transactions
             (user_id, intent, amount, currency, category, note, tx_date, needs_review,
              llm_response_id, receipt_id, extra, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            rusqlite::params![
                transaction.user_id,
                transaction.intent.as_str(),
                transaction.amount,
                transaction.currency,
                transaction.category.as_str(),
                transaction.note,
                transaction.tx_date.timestamp(),
                transaction.needs_review,
                transaction.llm_response_id,
                transaction.receipt_id,
                extra,
                now,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    async fn create_ocr_record(
        &self,
        receipt_id: i64,
        text: &str,
        metadata: serde_json::Value,
    ) -> Result<i64, StorageError> {
        let metadata = serde_json::to_string(&metadata)?;
        let conn = self.lock()?;
        let now = Utc::now().timestamp();

        conn.execute(
            "INSERT INTO ocr_records (receipt_id, text, metadata, created_at)
             VALUES (?, ?, ?, ?)",
            rusqlite::params![receipt_id, text, metadata, now],
        )?;

        Ok(conn.last_insert_rowid())
    }

    async fn create_llm_audit(&self, record: LlmAuditRecord) -> Result<i64, StorageError> {
        let meta = serde_json::to_string(&record.meta)?;
        let conn = self.lock()?;
        let now = Utc::now().timestamp();

        conn.execute(
            "INSERT INTO llm_responses
             (user_id, source, input_text, prompt, output, model, meta, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            rusqlite::params![
                record.user_id,
                record.source,
                record.input_text,
                record.prompt,
                record.output,
                record.model,
                meta,
                now,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }
}

#[async_trait]
impl ReceiptRepository for SqliteStore {
    async fn create_receipt(&self, user_id: i64, file_path: &str) -> Result<i64, StorageError> {
        let conn = self.lock()?;
        let now = Utc::now().timestamp();

        conn.execute(
            "INSERT INTO receipts (user_id, file_path, created_at) VALUES (?, ?, ?)",
            rusqlite::params![user_id, file_path, now],
        )?;

        Ok(conn.last_insert_rowid())
    }
}

#[async_trait]
impl TransactionHistory for SqliteStore {
    async fn transactions_for(&self, user_id: i64) -> Result<Vec<StoredTransaction>, StorageError> {
        self.list_transactions(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample(user_id: i64, amount: i64, day: u32) -> NewTransaction {
        NewTransaction {
            user_id,
            intent: TransactionIntent::Expense,
            amount,
            currency: "IDR".to_string(),
            category: Category::Makan,
            note: "nasi padang".to_string(),
            tx_date: Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap(),
            needs_review: false,
            llm_response_id: None,
            receipt_id: None,
            extra: json!({"sanity": {"flags": []}, "original_confidence": 0.9}),
        }
    }

    #[tokio::test]
    async fn test_transactions_round_trip_in_date_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        let later = store.create_transaction(sample(7, 30_000, 12)).await.unwrap();
        let earlier = store.create_transaction(sample(7, 25_000, 10)).await.unwrap();
        store.create_transaction(sample(8, 1_000, 11)).await.unwrap();

        let rows = store.list_transactions(7).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, earlier);
        assert_eq!(rows[1].id, later);
        assert_eq!(rows[0].category, Category::Makan);
        assert_eq!(rows[0].intent, TransactionIntent::Expense);
        assert_eq!(rows[0].tx_date, Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap());

        let extra = store.transaction_extra(earlier).unwrap().unwrap();
        assert_eq!(extra["original_confidence"], json!(0.9));
    }

    #[tokio::test]
    async fn test_audit_and_ocr_records() {
        let store = SqliteStore::open_in_memory().unwrap();
        let audit_id = store
            .create_llm_audit(LlmAuditRecord {
                user_id: 7,
                source: "ocr".to_string(),
                input_text: "TOTAL 18.000".to_string(),
                prompt: "prompt".to_string(),
                output: "{}".to_string(),
                model: "gpt-4o-mini".to_string(),
                meta: json!({"ocr_confidence": 81.5}),
            })
            .await
            .unwrap();

        let audit = store.get_llm_audit(audit_id).unwrap().unwrap();
        assert_eq!(audit.source, "ocr");
        assert_eq!(audit.meta["ocr_confidence"], json!(81.5));
        assert_eq!(store.count_llm_audits(7).unwrap(), 1);
        assert!(store.get_llm_audit(audit_id + 1).unwrap().is_none());

        let receipt_id = store.create_receipt(7, "/tmp/receipt.jpg").await.unwrap();
        store
            .create_ocr_record(receipt_id, "TOTAL 18.000", json!({"psm_used": 6}))
            .await
            .unwrap();
        let records = store.ocr_records_for_receipt(receipt_id).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].metadata["psm_used"], json!(6));
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();
        let conn = store.lock().unwrap();
        run_migrations(&conn).unwrap();
    }

    #[test]
    fn test_open_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("finot.db");
        SqliteStore::open(&path).unwrap();
        assert!(path.exists());
    }
}
