use thiserror::Error;

/// Top-level error type for the Dictare system.
///
/// Subsystem crates define their own error types and wrap this one with
/// `#[from]`, so the `?` operator works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DictareError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Audio error: {0}")]
    Audio(String),

    #[error("Audio asset missing for word: {0}")]
    AssetMissing(String),

    #[error("OCR error: {0}")]
    Ocr(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for DictareError {
    fn from(err: toml::de::Error) -> Self {
        DictareError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for DictareError {
    fn from(err: toml::ser::Error) -> Self {
        DictareError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for DictareError {
    fn from(err: serde_json::Error) -> Self {
        DictareError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Dictare operations.
pub type Result<T> = std::result::Result<T, DictareError>;
