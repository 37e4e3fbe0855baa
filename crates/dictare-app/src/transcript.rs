//! Recognizer for answer sheets that were already transcribed to text.

use dictare_core::error::DictareError;
use dictare_session::HandwritingRecognizer;

/// Treats the "image" as UTF-8 text and returns its non-blank lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct TranscriptRecognizer;

impl HandwritingRecognizer for TranscriptRecognizer {
    async fn recognize(&self, image_data: &[u8]) -> Result<Vec<String>, DictareError> {
        let text = std::str::from_utf8(image_data)
            .map_err(|e| DictareError::Ocr(format!("Answer transcript is not UTF-8: {}", e)))?;
        Ok(text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}
