//! CLI interface for the job matcher

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "job-matcher")]
#[command(about = "Rank job postings against a resume")]
#[command(long_about = "Score job postings against a resume using skill coverage, sentence embeddings and seeker preferences")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score and rank job postings against a resume
    Match {
        /// Path to resume file (PDF, TXT, MD)
        #[arg(short, long)]
        resume: PathBuf,

        /// Path to a JSON array of job postings
        #[arg(short, long)]
        postings: PathBuf,

        /// Path to a JSON preference set
        #[arg(long)]
        preferences: Option<PathBuf>,

        /// Output format: console, json, markdown
        #[arg(short, long)]
        format: Option<String>,

        /// Drop matches scoring below this value
        #[arg(long)]
        min_score: Option<f32>,

        /// Return at most this many matches
        #[arg(short, long)]
        limit: Option<usize>,

        /// Skip this many top-ranked matches before applying the limit
        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Reference date for "Present" in work history (YYYY-MM-DD)
        #[arg(long)]
        as_of: Option<String>,

        /// Save output to file
        #[arg(short, long)]
        save: Option<PathBuf>,

        /// Include profile and diagnostic scores
        #[arg(short, long)]
        detailed: bool,
    },

    /// Print the profile extracted from a resume
    Profile {
        /// Path to resume file (PDF, TXT, MD)
        #[arg(short, long)]
        resume: PathBuf,

        /// Output format: console, json, markdown
        #[arg(short, long)]
        format: Option<String>,

        /// Reference date for "Present" in work history (YYYY-MM-DD)
        #[arg(long)]
        as_of: Option<String>,
    },

    /// Embedding model management commands
    Models {
        #[command(subcommand)]
        action: ModelAction,
    },

    /// Inspect or export the skill vocabulary
    Vocabulary {
        #[command(subcommand)]
        action: VocabularyAction,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum ModelAction {
    /// List available embedding models
    List,

    /// Download an embedding model
    Download {
        /// Model name or HuggingFace repo ID
        model: String,
    },
}

#[derive(Subcommand)]
pub enum VocabularyAction {
    /// List canonical skills by category
    List,

    /// Write the active vocabulary as TOML
    Export {
        /// Destination file
        path: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "matching.fuzzy_threshold")
        key: String,

        /// Configuration value
        value: String,
    },
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> Result<crate::config::OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "console" => Ok(crate::config::OutputFormat::Console),
        "json" => Ok(crate::config::OutputFormat::Json),
        "markdown" | "md" => Ok(crate::config::OutputFormat::Markdown),
        _ => Err(format!("Invalid output format: {}. Supported: console, json, markdown", format)),
    }
}

/// Parse a YYYY-MM-DD reference date
pub fn parse_as_of(value: &str) -> Result<chrono::NaiveDate, String> {
    chrono::NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| format!("Invalid date '{}': {}", value, e))
}

/// Validate file extension
pub fn validate_file_extension(path: &std::path::Path, allowed_extensions: &[&str]) -> Result<(), String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            if allowed_extensions.contains(&ext.to_lowercase().as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "Unsupported file extension: .{}. Allowed: {}",
                    ext,
                    allowed_extensions.join(", ")
                ))
            }
        }
        None => Err("File has no extension".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use clap::CommandFactory;
    use std::path::Path;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_match_command() {
        let cli = Cli::try_parse_from([
            "job-matcher", "match", "-r", "cv.pdf", "-p", "jobs.json", "--min-score", "60", "-l", "5",
            "--offset", "10",
        ])
        .unwrap();
        match cli.command {
            Commands::Match { resume, min_score, limit, offset, .. } => {
                assert_eq!(resume, PathBuf::from("cv.pdf"));
                assert_eq!(min_score, Some(60.0));
                assert_eq!(limit, Some(5));
                assert_eq!(offset, 10);
            }
            _ => panic!("expected match command"),
        }
    }

    #[test]
    fn test_offset_defaults_to_zero() {
        let cli = Cli::try_parse_from(["job-matcher", "match", "-r", "cv.txt", "-p", "jobs.json"]).unwrap();
        match cli.command {
            Commands::Match { offset, .. } => assert_eq!(offset, 0),
            _ => panic!("expected match command"),
        }
    }

    #[test]
    fn test_parse_vocabulary_export() {
        let cli = Cli::try_parse_from(["job-matcher", "vocabulary", "export", "skills.toml"]).unwrap();
        match cli.command {
            Commands::Vocabulary {
                action: VocabularyAction::Export { path },
            } => assert_eq!(path, PathBuf::from("skills.toml")),
            _ => panic!("expected vocabulary export"),
        }
    }

    #[test]
    fn test_parse_output_format() {
        assert_eq!(parse_output_format("MD"), Ok(OutputFormat::Markdown));
        assert!(parse_output_format("html").is_err());
    }

    #[test]
    fn test_parse_as_of() {
        assert_eq!(parse_as_of("2024-03-01"), Ok(chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));
        assert!(parse_as_of("March 2024").is_err());
    }

    #[test]
    fn test_validate_file_extension() {
        assert!(validate_file_extension(Path::new("a.PDF"), &["pdf"]).is_ok());
        assert!(validate_file_extension(Path::new("a.docx"), &["pdf", "txt"]).is_err());
        assert!(validate_file_extension(Path::new("noext"), &["pdf"]).is_err());
    }
}
