//! Error handling for the job matcher

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatcherError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The declared media type of a resume is not one we can read.
    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    /// The format is known but the payload has no usable text layer.
    #[error("Text extraction failed: {0}")]
    ExtractionFailure(String),

    /// The sentence encoder could not be reached or loaded.
    #[error("Embedding service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Match request exceeded its time budget of {0} ms")]
    Timeout(u64),

    #[error("Invalid job posting: {0}")]
    InvalidPosting(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Vocabulary error: {0}")]
    Vocabulary(String),

    #[error("Embedding generation error: {0}")]
    Embedding(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Output formatting error: {0}")]
    OutputFormatting(String),
}

impl MatcherError {
    /// Whether a caller may resubmit the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MatcherError::Timeout(_) | MatcherError::ServiceUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, MatcherError>;

impl From<toml::de::Error> for MatcherError {
    fn from(err: toml::de::Error) -> Self {
        MatcherError::Configuration(format!("Failed to parse TOML: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(MatcherError::Timeout(500).is_retryable());
        assert!(MatcherError::ServiceUnavailable("down".into()).is_retryable());
        assert!(!MatcherError::UnsupportedFormat("image/png".into()).is_retryable());
        assert!(!MatcherError::ExtractionFailure("scanned".into()).is_retryable());
    }
}
