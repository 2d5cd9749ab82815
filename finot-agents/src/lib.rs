pub mod analysis;
pub mod config;
pub mod gate;
pub mod intent_classifier;
pub mod jobs;
pub mod llm;
pub mod pipeline;
pub mod prompts;
pub mod storage;
pub mod transcription;

#[cfg(test)]
mod test_support;

pub use analysis::{AnalysisKind, AnalysisReport, AnalysisService};
pub use gate::{ExtractionGate, OpenGate};
pub use intent_classifier::IntentClassifier;
pub use jobs::{spawn_process_message, MessageInput, ProcessMessageJob};
pub use llm::{ChatCompletion, Completion, CompletionError, CompletionRequest, OpenAiChatClient};
pub use pipeline::{ExtractionPipeline, PipelineError, TextRoute};
pub use storage::{
    ReceiptRepository, SqliteStore, StorageError, TransactionHistory, TransactionRepository,
};
pub use transcription::{Transcriber, TranscriptionError, WhisperTranscriber};
