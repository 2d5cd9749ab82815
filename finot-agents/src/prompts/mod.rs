//! Instruction text sent to the chat completion service.

pub mod analysis;
mod extraction;
mod intent;

pub use extraction::{build_audio_prompt, build_receipt_prompt, build_text_prompt};
pub use intent::{build_intent_prompt, INTENT_SYSTEM_PROMPT};

use shared_types::InputSource;

/// Picks the extraction template for the message modality.
pub fn build_extraction_prompt(content: &str, source: InputSource) -> String {
    match source {
        InputSource::Text => build_text_prompt(content),
        InputSource::Image => build_receipt_prompt(content),
        InputSource::Audio => build_audio_prompt(content),
    }
}
