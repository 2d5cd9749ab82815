//! Locates the JSON object inside free-form model output.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResponseError {
    #[error("no JSON object found in model output")]
    NoJsonFound,
}

/// Returns the first balanced `{...}` span in `text`.
///
/// Braces are counted left to right. The span starts at the first `{` seen
/// while no object is open and ends at the `}` that closes it. Braces inside
/// string values are not special-cased.
pub fn extract_json_object(text: &str) -> Result<&str, ResponseError> {
    let mut depth = 0usize;
    let mut start = None;

    for (index, ch) in text.char_indices() {
        match ch {
            '{' => {
                if depth == 0 {
                    start = Some(index);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(start) = start {
                        return Ok(&text[start..=index]);
                    }
                }
            }
            _ => {}
        }
    }

    Err(ResponseError::NoJsonFound)
}
