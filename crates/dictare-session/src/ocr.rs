//! Handwriting recognizer collaborator.
//!
//! A recognizer turns a photo of the user's answer sheet into the raw text
//! lines it detected. Splitting those lines into tokens happens afterwards in
//! `dictare_match::extract_tokens`.

use dictare_core::error::DictareError;

/// Service that reads handwritten text from an image.
pub trait HandwritingRecognizer: Send + Sync {
    /// Recognize text lines in `image_data` (encoded image bytes).
    ///
    /// Returns the detected lines in reading order. May be empty if nothing
    /// legible was found.
    fn recognize(
        &self,
        image_data: &[u8],
    ) -> impl std::future::Future<Output = Result<Vec<String>, DictareError>> + Send;
}

/// Mock recognizer returning fixed lines for any non-empty image.
#[derive(Debug, Clone, Default)]
pub struct MockRecognizer {
    lines: Vec<String>,
}

impl MockRecognizer {
    /// A recognizer that finds nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// A recognizer that returns `lines` for every image.
    pub fn with_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

impl HandwritingRecognizer for MockRecognizer {
    async fn recognize(&self, image_data: &[u8]) -> Result<Vec<String>, DictareError> {
        if image_data.is_empty() {
            return Err(DictareError::Ocr("Empty image data".to_string()));
        }
        Ok(self.lines.clone())
    }
}
