//! Document ingestor: resume payload in, plain text out

use crate::error::{MatcherError, Result};
use crate::input::file_detector::FileType;
use crate::input::text_extractor::{
    MarkdownExtractor, PdfExtractor, PlainTextExtractor, TextExtractor,
};
use log::{debug, info};
use std::path::Path;

/// An uploaded resume. Lives only for the duration of parsing.
#[derive(Debug, Clone)]
pub struct ResumeDocument {
    pub bytes: Vec<u8>,
    pub media_type: String,
}

impl ResumeDocument {
    pub fn new(bytes: impl Into<Vec<u8>>, media_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            media_type: media_type.into(),
        }
    }

    /// Read a resume from disk, declaring its media type from the extension.
    pub async fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(MatcherError::InvalidInput(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| {
                MatcherError::UnsupportedFormat(format!("File has no extension: {}", path.display()))
            })?;

        let bytes = tokio::fs::read(path).await?;
        Ok(Self::new(bytes, FileType::from_extension(extension).to_string()))
    }
}

#[derive(Debug, Default)]
pub struct DocumentIngestor;

impl DocumentIngestor {
    pub fn new() -> Self {
        Self
    }

    /// Extract plain text, failing with `UnsupportedFormat` or `ExtractionFailure`.
    pub fn extract_text(&self, document: &ResumeDocument) -> Result<String> {
        let file_type = FileType::from_media_type(&document.media_type);

        let text = match file_type {
            FileType::Pdf => {
                info!("Extracting text from PDF ({} bytes)", document.bytes.len());
                PdfExtractor.extract(&document.bytes)?
            }
            FileType::Text => {
                info!("Reading plain text resume ({} bytes)", document.bytes.len());
                PlainTextExtractor.extract(&document.bytes)?
            }
            FileType::Markdown => {
                info!("Processing markdown resume ({} bytes)", document.bytes.len());
                MarkdownExtractor.extract(&document.bytes)?
            }
            FileType::Unknown => {
                return Err(MatcherError::UnsupportedFormat(format!(
                    "Unsupported media type: {}",
                    document.media_type
                )));
            }
        };

        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(MatcherError::ExtractionFailure(format!(
                "No extractable text in {} payload",
                file_type
            )));
        }

        debug!("Extracted {} characters", text.chars().count());
        Ok(text)
    }
}
