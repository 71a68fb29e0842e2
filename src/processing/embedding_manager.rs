//! Embedding model management: download Model2Vec models from the
//! Hugging Face Hub into the models directory and locate them on disk.

use crate::config::{AvailableModel, Config};
use crate::error::{MatcherError, Result};
use hf_hub::api::tokio::Api;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

const REQUIRED_FILES: [&str; 2] = ["tokenizer.json", "model.safetensors"];
const OPTIONAL_FILES: [&str; 1] = ["config.json"];

pub struct EmbeddingModelManager {
    models_dir: PathBuf,
    available_models: Vec<AvailableModel>,
    downloaded_models: BTreeSet<String>,
}

impl EmbeddingModelManager {
    pub async fn new(config: &Config) -> Result<Self> {
        let models_dir = config.models_dir().clone();
        if !models_dir.exists() {
            fs::create_dir_all(&models_dir).await?;
        }

        let mut manager = Self {
            models_dir,
            available_models: config.models.available_models.clone(),
            downloaded_models: BTreeSet::new(),
        };
        manager.scan_downloaded_models().await?;
        Ok(manager)
    }

    async fn scan_downloaded_models(&mut self) -> Result<()> {
        let mut entries = fs::read_dir(&self.models_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() && is_model_directory(&entry.path()).await {
                self.downloaded_models
                    .insert(entry.file_name().to_string_lossy().to_string());
            }
        }
        log::debug!(
            "Found {} downloaded models in {}",
            self.downloaded_models.len(),
            self.models_dir.display()
        );
        Ok(())
    }

    /// Resolve a model by short name or repository id.
    pub fn resolve(&self, input: &str) -> Option<&AvailableModel> {
        self.available_models
            .iter()
            .find(|m| m.name == input || m.repo_id == input)
            .or_else(|| {
                let lower = input.to_lowercase();
                self.available_models
                    .iter()
                    .find(|m| m.name.to_lowercase() == lower)
            })
    }

    pub fn list_available_models(&self) -> &[AvailableModel] {
        &self.available_models
    }

    pub fn is_downloaded(&self, name: &str) -> bool {
        self.downloaded_models.contains(name)
    }

    pub fn model_path(&self, name: &str) -> Option<PathBuf> {
        self.is_downloaded(name).then(|| self.models_dir.join(name))
    }

    pub async fn download_model(&mut self, name: &str) -> Result<PathBuf> {
        let model = self
            .resolve(name)
            .cloned()
            .ok_or_else(|| MatcherError::InvalidInput(format!("Unknown embedding model: {}", name)))?;

        let model_dir = self.models_dir.join(&model.name);
        if self.downloaded_models.contains(&model.name) {
            return Ok(model_dir);
        }

        log::info!("Downloading {} ({} MB) from {}", model.name, model.size_mb, model.repo_id);
        fs::create_dir_all(&model_dir).await?;

        let api = Api::new().map_err(|e| {
            MatcherError::ServiceUnavailable(format!("Failed to initialize HF API: {}", e))
        })?;
        let repo = api.repo(hf_hub::Repo::model(model.repo_id.clone()));

        let progress = ProgressBar::new_spinner();
        progress.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        progress.enable_steady_tick(Duration::from_millis(120));

        for file in REQUIRED_FILES.iter().chain(OPTIONAL_FILES.iter()) {
            progress.set_message(format!("Fetching {}", file));
            match repo.get(file).await {
                Ok(cached) => {
                    fs::copy(&cached, model_dir.join(file)).await?;
                    log::debug!("Downloaded {}", file);
                }
                Err(e) if OPTIONAL_FILES.contains(file) => {
                    log::warn!("Optional file {} not found: {}", file, e);
                }
                Err(e) => {
                    progress.finish_and_clear();
                    return Err(MatcherError::ServiceUnavailable(format!(
                        "Failed to download required file {}: {}",
                        file, e
                    )));
                }
            }
        }

        progress.finish_with_message(format!("Downloaded {}", model.name));
        self.downloaded_models.insert(model.name.clone());
        Ok(model_dir)
    }
}

async fn is_model_directory(path: &Path) -> bool {
    for file in REQUIRED_FILES {
        if fs::metadata(path.join(file)).await.is_err() {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &Path) -> Config {
        let mut config = Config::default();
        config.models.models_dir = dir.join("models");
        config
    }

    #[tokio::test]
    async fn test_manager_creates_models_dir() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(temp_dir.path());
        let manager = EmbeddingModelManager::new(&config).await.unwrap();

        assert!(config.models_dir().exists());
        assert!(!manager.list_available_models().is_empty());
        assert!(!manager.is_downloaded("potion-base-8M"));
    }

    #[tokio::test]
    async fn test_scan_finds_complete_models_only() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(temp_dir.path());

        let complete = config.models_dir().join("potion-base-8M");
        std::fs::create_dir_all(&complete).unwrap();
        std::fs::write(complete.join("tokenizer.json"), "{}").unwrap();
        std::fs::write(complete.join("model.safetensors"), "").unwrap();

        let partial = config.models_dir().join("m2v-base");
        std::fs::create_dir_all(&partial).unwrap();
        std::fs::write(partial.join("tokenizer.json"), "{}").unwrap();

        let manager = EmbeddingModelManager::new(&config).await.unwrap();
        assert!(manager.is_downloaded("potion-base-8M"));
        assert!(!manager.is_downloaded("m2v-base"));
        assert_eq!(manager.model_path("potion-base-8M"), Some(complete));
    }

    #[tokio::test]
    async fn test_resolve_model() {
        let temp_dir = TempDir::new().unwrap();
        let manager = EmbeddingModelManager::new(&config_in(temp_dir.path())).await.unwrap();

        assert_eq!(manager.resolve("minishlab/potion-base-8M").map(|m| m.name.as_str()), Some("potion-base-8M"));
        assert_eq!(manager.resolve("POTION-BASE-8M").map(|m| m.name.as_str()), Some("potion-base-8M"));
        assert!(manager.resolve("bert-large").is_none());
    }
}
