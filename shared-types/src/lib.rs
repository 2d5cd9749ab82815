pub mod envelope;
pub mod intent;
pub mod ocr;
pub mod transaction;

pub use envelope::{ExtractionEnvelope, InputSource};
pub use intent::{Direction, IntentClassification, Period, UserIntent};
pub use ocr::{Binarization, OcrAttempt, OcrResult, PageSegMode};
pub use transaction::{
    Category, SanityFlag, SanityResult, SavedTransaction, StoredTransaction,
    TransactionCandidate, TransactionIntent, UnknownCategory,
};
