use serde::{Deserialize, Serialize};
use shared_types::ExtractionEnvelope;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::pipeline::ExtractionPipeline;

/// Payload handed off by the transport for background processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageInput {
    Text {
        text: String,
    },
    Image {
        file_path: PathBuf,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        receipt_id: Option<i64>,
    },
    Audio {
        file_path: PathBuf,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessMessageJob {
    pub user_id: i64,
    #[serde(flatten)]
    pub input: MessageInput,
}

impl ProcessMessageJob {
    pub async fn execute(&self, pipeline: &ExtractionPipeline) -> ExtractionEnvelope {
        match &self.input {
            MessageInput::Text { text } => pipeline.process_text_message(self.user_id, text).await,
            MessageInput::Image {
                file_path,
                receipt_id,
            } => {
                pipeline
                    .process_image_message(self.user_id, file_path, *receipt_id)
                    .await
            }
            MessageInput::Audio { file_path } => {
                pipeline.process_audio_message(self.user_id, file_path).await
            }
        }
    }
}

/// Runs the job on its own task; the transport may drop the handle.
pub fn spawn_process_message(
    pipeline: Arc<ExtractionPipeline>,
    job: ProcessMessageJob,
) -> JoinHandle<ExtractionEnvelope> {
    let job_id = Uuid::new_v4();
    info!("Job {} queued for user {}", job_id, job.user_id);

    tokio::spawn(async move {
        let envelope = job.execute(&pipeline).await;
        if envelope.success {
            info!(
                "Job {} completed: {} transactions ({})",
                job_id,
                envelope.transactions.len(),
                envelope.source
            );
        } else {
            warn!(
                "Job {} failed ({}): {}",
                job_id,
                envelope.source,
                envelope.detail.as_deref().unwrap_or_default()
            );
        }
        envelope
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_json_shape() {
        let job: ProcessMessageJob = serde_json::from_str(
            r#"{"user_id": 42, "type": "image", "file_path": "/tmp/struk.jpg"}"#,
        )
        .unwrap();
        assert_eq!(
            job.input,
            MessageInput::Image {
                file_path: PathBuf::from("/tmp/struk.jpg"),
                receipt_id: None,
            }
        );

        let text = ProcessMessageJob {
            user_id: 1,
            input: MessageInput::Text {
                text: "gajian 5jt".to_string(),
            },
        };
        let value = serde_json::to_value(&text).unwrap();
        assert_eq!(value["type"], "text");
        assert_eq!(value["text"], "gajian 5jt");
        assert_eq!(value["user_id"], 1);
    }

    #[test]
    fn test_unknown_message_type_is_rejected() {
        let result = serde_json::from_str::<ProcessMessageJob>(
            r#"{"user_id": 42, "type": "sticker"}"#,
        );
        assert!(result.is_err());
    }
}
