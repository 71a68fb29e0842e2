//! Input processing module
//! Handles media type detection and resume text extraction

pub mod file_detector;
pub mod manager;
pub mod text_extractor;

pub use manager::{DocumentIngestor, ResumeDocument};
