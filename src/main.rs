//! Job matcher: rank job postings against a resume

use clap::Parser;
use job_matcher::cli::{self, Cli, Commands, ConfigAction, ModelAction, VocabularyAction};
use job_matcher::config::{Config, OutputFormat};
use job_matcher::error::{MatcherError, Result};
use job_matcher::input::ResumeDocument;
use job_matcher::output::formatter::{save_report_to_file, suggest_filename};
use job_matcher::output::{MatchReport, ReportGenerator, ReportMetadata};
use job_matcher::processing::embedding_manager::EmbeddingModelManager;
use job_matcher::processing::embeddings::{EmbeddingEngine, Model2VecEncoder};
use job_matcher::processing::profile::today;
use job_matcher::processing::{
    JobPosting, MatchEngine, ModelSnapshot, PreferenceSet, RankOptions, SkillVocabulary,
};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Instant;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config_path = cli.config.clone();
    let config = match &config_path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command, config, config_path).await {
        error!("Command failed: {}", e);
        if e.is_retryable() {
            error!("This failure is transient; the same request may be retried");
        }
        process::exit(1);
    }
}

async fn run_command(command: Commands, config: Config, config_path: Option<PathBuf>) -> Result<()> {
    match command {
        Commands::Match {
            resume,
            postings,
            preferences,
            format,
            min_score,
            limit,
            offset,
            as_of,
            save,
            detailed,
        } => {
            let start_time = Instant::now();
            cli::validate_file_extension(&resume, &["pdf", "txt", "md"])
                .map_err(|e| MatcherError::InvalidInput(format!("Resume file: {}", e)))?;
            let output_format = resolve_format(format.as_deref(), &config)?;
            let as_of = resolve_as_of(as_of.as_deref())?;

            let job_postings = JobPosting::load_all(&postings)?;
            let preference_set = match &preferences {
                Some(path) => PreferenceSet::load(path)?,
                None => PreferenceSet::default(),
            };
            info!("Loaded {} postings from {}", job_postings.len(), postings.display());

            let vocabulary = load_vocabulary(&config)?;
            let corpus: Vec<String> = job_postings.iter().map(JobPosting::text).collect();
            let snapshot = ModelSnapshot::build(vocabulary, &corpus)?;

            let encoder = Model2VecEncoder::from_config(&config)?;
            let embeddings = Arc::new(EmbeddingEngine::new(
                Arc::new(encoder),
                config.matching.embedding_workers,
            ));
            let engine = MatchEngine::new(snapshot, Arc::clone(&embeddings), &config.matching);

            let document = ResumeDocument::from_path(&resume).await?;
            let profile = engine.extract_profile(&document, as_of)?;
            if profile.is_empty() {
                log::warn!("No skills, work history or education found in {}", resume.display());
            }

            let options = RankOptions { min_score, limit, offset };
            let results = engine
                .match_postings(&profile, &job_postings, &preference_set, options)
                .await?;

            let metadata = ReportMetadata {
                generated_at: chrono::Utc::now(),
                matcher_version: env!("CARGO_PKG_VERSION").to_string(),
                resume_file: resume.to_string_lossy().to_string(),
                postings_file: postings.to_string_lossy().to_string(),
                as_of,
                processing_time_ms: start_time.elapsed().as_millis() as u64,
                embedding_model: embeddings.model_name().to_string(),
                vocabulary_version: engine.snapshot().version().to_string(),
                postings_considered: job_postings.len(),
            };
            let report = MatchReport::new(metadata, profile, &job_postings, results);

            let generator = ReportGenerator::with_options(
                config.output.color_output && save.is_none(),
                detailed || config.output.detailed,
                true,
                true,
            );
            let content = generator.generate_report(&report, output_format)?;
            emit(&content, save.as_deref(), output_format, &resume)?;
        }

        Commands::Profile { resume, format, as_of } => {
            let output_format = resolve_format(format.as_deref(), &config)?;
            let as_of = resolve_as_of(as_of.as_deref())?;

            let vocabulary = load_vocabulary(&config)?;
            let snapshot = ModelSnapshot::build(vocabulary, &[] as &[String])?;
            let engine = MatchEngine::new(snapshot, Arc::new(EmbeddingEngine::unavailable()), &config.matching);

            let document = ResumeDocument::from_path(&resume).await?;
            let profile = engine.extract_profile(&document, as_of)?;

            let generator = ReportGenerator::with_options(config.output.color_output, true, true, true);
            println!("{}", generator.generate_profile(&profile, output_format)?);
        }

        Commands::Models { action } => {
            let mut manager = EmbeddingModelManager::new(&config).await?;
            match action {
                ModelAction::List => {
                    println!("📚 Available Embedding Models\n");
                    for model in manager.list_available_models() {
                        let status = if manager.is_downloaded(&model.name) {
                            "✅ Downloaded"
                        } else {
                            "⬇️  Available"
                        };
                        let marker = if model.name == config.models.default_embedding_model {
                            " (default)"
                        } else {
                            ""
                        };
                        println!(
                            "  • {}{} ({}) - {} MB, {} dims [{}]",
                            model.name, marker, model.repo_id, model.size_mb, model.dimensions, status
                        );
                        println!("    {}", model.description);
                    }
                }

                ModelAction::Download { model } => {
                    println!("⬇️  Downloading model: {}", model);
                    let path = manager.download_model(&model).await?;
                    println!("✅ Model '{}' ready", model);
                    println!("📁 Location: {}", path.display());
                }
            }
        }

        Commands::Vocabulary { action } => {
            let vocabulary = load_vocabulary(&config)?;
            match action {
                VocabularyAction::List => {
                    println!("📚 Skill Vocabulary {} ({} skills)\n", vocabulary.version(), vocabulary.len());
                    for (category, names) in vocabulary.by_category() {
                        println!("  {} ({}): {}", category, names.len(), names.join(", "));
                    }
                }

                VocabularyAction::Export { path } => {
                    save_report_to_file(&vocabulary.to_toml_string()?, &path)?;
                    println!("💾 Vocabulary {} written to {}", vocabulary.version(), path.display());
                }
            }
        }

        Commands::Config { action } => {
            let path = config_path.unwrap_or_else(Config::config_path);
            match action {
                Some(ConfigAction::Show) | None => {
                    println!("⚙️  Current Configuration ({})\n", path.display());
                    println!("Models Directory: {}", config.models_dir().display());
                    println!("Embedding Model: {}", config.models.default_embedding_model);
                    let m = &config.matching;
                    println!("\nMatching:");
                    println!("  Fuzzy threshold: {:.2}", m.fuzzy_threshold);
                    println!("  Experience tolerance: {:.1} years", m.experience_tolerance_years);
                    println!("  Region partial credit: {:.0}", m.region_partial_credit);
                    println!("  Embedding workers: {}", m.embedding_workers);
                    println!("  Request timeout: {}ms", m.request_timeout_ms);
                    match &m.vocabulary_path {
                        Some(p) => println!("  Vocabulary: {}", p.display()),
                        None => println!("  Vocabulary: built-in"),
                    }
                    println!("\nOutput: {:?} (detailed: {}, color: {})", config.output.format, config.output.detailed, config.output.color_output);
                }

                Some(ConfigAction::Reset) => {
                    Config::default().save_to(&path)?;
                    println!("✅ Configuration reset to defaults");
                }

                Some(ConfigAction::Set { key, value }) => {
                    let mut updated = config.clone();
                    updated.set_value(&key, &value)?;
                    updated.save_to(&path)?;
                    println!("✅ Set {} = {}", key, value);
                }
            }
        }
    }

    Ok(())
}

fn resolve_format(flag: Option<&str>, config: &Config) -> Result<OutputFormat> {
    match flag {
        Some(value) => cli::parse_output_format(value).map_err(MatcherError::InvalidInput),
        None => Ok(config.output.format),
    }
}

fn resolve_as_of(flag: Option<&str>) -> Result<chrono::NaiveDate> {
    match flag {
        Some(value) => cli::parse_as_of(value).map_err(MatcherError::InvalidInput),
        None => Ok(today()),
    }
}

fn load_vocabulary(config: &Config) -> Result<SkillVocabulary> {
    match &config.matching.vocabulary_path {
        Some(path) => {
            let vocabulary = SkillVocabulary::load(path)?;
            info!("Loaded vocabulary {} ({} skills)", vocabulary.version(), vocabulary.len());
            Ok(vocabulary)
        }
        None => Ok(SkillVocabulary::builtin()),
    }
}

fn emit(content: &str, save: Option<&Path>, format: OutputFormat, resume: &Path) -> Result<()> {
    match save {
        Some(path) => {
            let target = if path.is_dir() {
                path.join(suggest_filename(format, &resume.to_string_lossy(), true))
            } else {
                path.to_path_buf()
            };
            save_report_to_file(content, &target)?;
            println!("💾 Report saved to {}", target.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}
