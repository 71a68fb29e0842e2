//! Configuration management for the job matcher

use crate::error::{MatcherError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub models: ModelConfig,
    pub matching: MatchingConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub models_dir: PathBuf,
    pub default_embedding_model: String,
    pub available_models: Vec<AvailableModel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableModel {
    pub name: String,
    pub repo_id: String,
    pub size_mb: u64,
    pub dimensions: u32,
    pub description: String,
}

/// Tunables for the matching pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Minimum Jaro-Winkler similarity for a fuzzy skill match to count.
    pub fuzzy_threshold: f32,
    /// Years of experience shortfall over which `experience_match` decays to 0.
    pub experience_tolerance_years: f32,
    /// Score awarded when locations share a broad region.
    pub region_partial_credit: f32,
    /// Upper bound on concurrent encoder calls.
    pub embedding_workers: usize,
    /// Time budget for one match request.
    pub request_timeout_ms: u64,
    /// Optional TOML skill vocabulary replacing the built-in table.
    #[serde(default)]
    pub vocabulary_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub detailed: bool,
    pub color_output: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Console,
    Json,
    Markdown,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 0.92,
            experience_tolerance_years: 2.0,
            region_partial_credit: 60.0,
            embedding_workers: 4,
            request_timeout_ms: 30_000,
            vocabulary_path: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let models_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".job-matcher")
            .join("models");

        Self {
            models: ModelConfig {
                models_dir,
                default_embedding_model: "potion-base-8M".to_string(),
                available_models: vec![
                    AvailableModel {
                        name: "potion-base-8M".to_string(),
                        repo_id: "minishlab/potion-base-8M".to_string(),
                        size_mb: 33,
                        dimensions: 256,
                        description: "Fast static sentence embeddings, good default".to_string(),
                    },
                    AvailableModel {
                        name: "m2v-base".to_string(),
                        repo_id: "minishlab/M2V_base_output".to_string(),
                        size_mb: 90,
                        dimensions: 256,
                        description: "Model2Vec base embeddings model".to_string(),
                    },
                    AvailableModel {
                        name: "potion-retrieval-32M".to_string(),
                        repo_id: "minishlab/potion-retrieval-32M".to_string(),
                        size_mb: 130,
                        dimensions: 512,
                        description: "Larger retrieval-tuned static embeddings".to_string(),
                    },
                ],
            },
            matching: MatchingConfig::default(),
            output: OutputConfig {
                format: OutputFormat::Console,
                detailed: false,
                color_output: true,
            },
        }
    }
}

impl Config {
    /// Load from the user config path, writing defaults on first run.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| MatcherError::Configuration(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| MatcherError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("job-matcher")
            .join("config.toml")
    }

    pub fn validate(&self) -> Result<()> {
        let m = &self.matching;
        if !(0.0..=1.0).contains(&m.fuzzy_threshold) {
            return Err(MatcherError::Configuration(format!(
                "matching.fuzzy_threshold must be within [0, 1], got {}",
                m.fuzzy_threshold
            )));
        }
        if m.experience_tolerance_years <= 0.0 {
            return Err(MatcherError::Configuration(
                "matching.experience_tolerance_years must be positive".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&m.region_partial_credit) {
            return Err(MatcherError::Configuration(
                "matching.region_partial_credit must be within [0, 100]".to_string(),
            ));
        }
        if m.embedding_workers == 0 {
            return Err(MatcherError::Configuration(
                "matching.embedding_workers must be at least 1".to_string(),
            ));
        }
        if m.request_timeout_ms == 0 {
            return Err(MatcherError::Configuration(
                "matching.request_timeout_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply a dotted `key = value` override, as used by `config set`.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let parse_f32 = |v: &str| {
            v.parse::<f32>()
                .map_err(|_| MatcherError::Configuration(format!("'{}' is not a number", v)))
        };
        let parse_usize = |v: &str| {
            v.parse::<usize>()
                .map_err(|_| MatcherError::Configuration(format!("'{}' is not an integer", v)))
        };

        match key {
            "matching.fuzzy_threshold" => self.matching.fuzzy_threshold = parse_f32(value)?,
            "matching.experience_tolerance_years" => {
                self.matching.experience_tolerance_years = parse_f32(value)?
            }
            "matching.region_partial_credit" => {
                self.matching.region_partial_credit = parse_f32(value)?
            }
            "matching.embedding_workers" => self.matching.embedding_workers = parse_usize(value)?,
            "matching.request_timeout_ms" => {
                self.matching.request_timeout_ms = parse_usize(value)? as u64
            }
            "matching.vocabulary_path" => {
                self.matching.vocabulary_path = Some(PathBuf::from(value))
            }
            "models.default_embedding_model" => {
                self.models.default_embedding_model = value.to_string()
            }
            "models.models_dir" => self.models.models_dir = PathBuf::from(value),
            "output.detailed" => {
                self.output.detailed = value.parse().map_err(|_| {
                    MatcherError::Configuration(format!("'{}' is not a boolean", value))
                })?
            }
            "output.color_output" => {
                self.output.color_output = value.parse().map_err(|_| {
                    MatcherError::Configuration(format!("'{}' is not a boolean", value))
                })?
            }
            _ => {
                return Err(MatcherError::Configuration(format!(
                    "Unknown configuration key: {}",
                    key
                )))
            }
        }

        self.validate()
    }

    pub fn models_dir(&self) -> &PathBuf {
        &self.models.models_dir
    }

    pub fn get_model_by_name(&self, name: &str) -> Option<&AvailableModel> {
        self.models
            .available_models
            .iter()
            .find(|m| m.name == name || m.repo_id == name)
    }
}
