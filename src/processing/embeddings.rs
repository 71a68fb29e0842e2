//! Sentence embeddings using Model2Vec

use crate::config::Config;
use crate::error::{MatcherError, Result};
use crate::processing::text_processor::TextProcessor;
use anyhow::Context;
use model2vec_rs::model::StaticModel;
use parking_lot::Mutex;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

const DEFAULT_BATCH_SIZE: usize = 32;
const MAX_CACHE_ENTRIES: usize = 10_000;

/// A pretrained sentence encoder shared by every request.
pub trait SentenceEncoder: Send + Sync {
    fn name(&self) -> &str;

    /// One vector per input text, in input order.
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

pub struct Model2VecEncoder {
    model: StaticModel,
    name: String,
}

impl Model2VecEncoder {
    pub fn load(model_path: &Path, name: impl Into<String>) -> Result<Self> {
        let start_time = Instant::now();
        log::info!("Loading Model2Vec embedding model from: {}", model_path.display());

        let model = StaticModel::from_pretrained(
            model_path,
            None, // token
            None, // normalize
            None, // subfolder
        )
        .with_context(|| format!("Failed to load model from {}", model_path.display()))
        .map_err(|e| MatcherError::ServiceUnavailable(format!("{:#}", e)))?;

        log::info!("Model loaded in {:.2?}", start_time.elapsed());
        Ok(Self {
            model,
            name: name.into(),
        })
    }

    /// Load the configured default model from the models directory.
    pub fn from_config(config: &Config) -> Result<Self> {
        let configured = &config.models.default_embedding_model;
        let model_name = config
            .get_model_by_name(configured)
            .map_or(configured, |m| &m.name);
        let model_path = config.models_dir().join(model_name);
        if !model_path.exists() {
            return Err(MatcherError::ServiceUnavailable(format!(
                "Embedding model '{}' is not downloaded. Run: job-matcher models download {}",
                model_name, model_name
            )));
        }
        Self::load(&model_path, model_name.clone())
    }
}

impl SentenceEncoder for Model2VecEncoder {
    fn name(&self) -> &str {
        &self.name
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(self.model.encode(texts))
    }
}

/// Feature-hashing bag-of-words encoder. Deterministic and model-free; used
/// for tests and offline smoke runs.
pub struct HashingEncoder {
    dimensions: usize,
    processor: TextProcessor,
}

impl HashingEncoder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
            processor: TextProcessor::new(),
        }
    }
}

impl SentenceEncoder for HashingEncoder {
    fn name(&self) -> &str {
        "hashing"
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut vector = vec![0.0f32; self.dimensions];
                for token in self.processor.tokenize(text) {
                    let mut hasher = DefaultHasher::new();
                    token.hash(&mut hasher);
                    let hash = hasher.finish();
                    let sign = if hash & 1 == 0 { 1.0 } else { -1.0 };
                    vector[(hash >> 1) as usize % self.dimensions] += sign;
                }
                let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
                if norm > 0.0 {
                    vector.iter_mut().for_each(|x| *x /= norm);
                }
                vector
            })
            .collect())
    }
}

#[derive(Debug, Clone)]
pub struct CacheStats {
    pub cache_size: usize,
    pub model_name: String,
    pub batch_size: usize,
    pub workers: usize,
}

/// Runs encoder calls on the blocking pool, at most `workers` at a time,
/// caching vectors by text.
pub struct EmbeddingEngine {
    encoder: Option<Arc<dyn SentenceEncoder>>,
    permits: Arc<Semaphore>,
    workers: usize,
    batch_size: usize,
    cache: Mutex<HashMap<String, Arc<Vec<f32>>>>,
}

impl EmbeddingEngine {
    pub fn new(encoder: Arc<dyn SentenceEncoder>, workers: usize) -> Self {
        Self::build(Some(encoder), workers)
    }

    /// An engine whose every call fails with `ServiceUnavailable`.
    pub fn unavailable() -> Self {
        Self::build(None, 1)
    }

    fn build(encoder: Option<Arc<dyn SentenceEncoder>>, workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            encoder,
            permits: Arc::new(Semaphore::new(workers)),
            workers,
            batch_size: DEFAULT_BATCH_SIZE,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn model_name(&self) -> &str {
        self.encoder.as_deref().map_or("unavailable", |e| e.name())
    }

    fn encoder(&self) -> Result<Arc<dyn SentenceEncoder>> {
        self.encoder.clone().ok_or_else(|| {
            MatcherError::ServiceUnavailable("No sentence encoder is loaded".to_string())
        })
    }

    /// Encode texts, batching cache misses across the worker pool.
    pub async fn encode(&self, texts: &[String]) -> Result<Vec<Arc<Vec<f32>>>> {
        let encoder = self.encoder()?;
        let start_time = Instant::now();

        let mut vectors: Vec<Option<Arc<Vec<f32>>>> = {
            let cache = self.cache.lock();
            texts.iter().map(|t| cache.get(t).cloned()).collect()
        };
        let misses: Vec<(usize, String)> = vectors
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_none())
            .map(|(i, _)| (i, texts[i].clone()))
            .collect();

        let mut tasks = JoinSet::new();
        for (batch_no, batch) in misses.chunks(self.batch_size).enumerate() {
            let encoder = Arc::clone(&encoder);
            let permits = Arc::clone(&self.permits);
            let batch: Vec<String> = batch.iter().map(|(_, text)| text.clone()).collect();

            tasks.spawn(async move {
                let permit = permits.acquire_owned().await.map_err(|_| {
                    MatcherError::ServiceUnavailable("Embedding worker pool is closed".to_string())
                })?;
                let expected = batch.len();
                // The permit lives as long as the encoder call, even if this task is aborted.
                let encoded = tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    encoder.encode(&batch)
                })
                .await
                    .map_err(|e| MatcherError::Embedding(format!("Encoder task failed: {}", e)))??;
                if encoded.len() != expected {
                    return Err(MatcherError::Embedding(format!(
                        "Encoder returned {} vectors for {} texts",
                        encoded.len(),
                        expected
                    )));
                }
                Ok((batch_no, encoded))
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let (batch_no, encoded) =
                joined.map_err(|e| MatcherError::Embedding(format!("Encoder task failed: {}", e)))??;
            let start = batch_no * self.batch_size;
            let mut cache = self.cache.lock();
            if cache.len() + encoded.len() > MAX_CACHE_ENTRIES {
                cache.clear();
            }
            for ((index, text), vector) in misses[start..].iter().zip(encoded) {
                let vector = Arc::new(vector);
                cache.insert(text.clone(), Arc::clone(&vector));
                vectors[*index] = Some(vector);
            }
        }

        log::debug!(
            "Encoded {} texts ({} cache misses) in {:.2?}",
            texts.len(),
            misses.len(),
            start_time.elapsed()
        );

        vectors
            .into_iter()
            .map(|v| v.ok_or_else(|| MatcherError::Embedding("Missing embedding".to_string())))
            .collect()
    }

    /// Semantic similarity of `query` to each target, rescaled to [0, 100].
    pub async fn similarities(&self, query: &str, targets: &[String]) -> Result<Vec<f32>> {
        let mut texts = Vec::with_capacity(targets.len() + 1);
        texts.push(query.to_string());
        texts.extend(targets.iter().cloned());

        let vectors = self.encode(&texts).await?;
        let (query_vector, target_vectors) = vectors
            .split_first()
            .ok_or_else(|| MatcherError::Embedding("Missing query embedding".to_string()))?;

        target_vectors
            .iter()
            .map(|target| cosine_similarity(query_vector, target).map(rescale))
            .collect()
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            cache_size: self.cache.lock().len(),
            model_name: self.model_name().to_string(),
            batch_size: self.batch_size,
            workers: self.workers,
        }
    }

    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }
}

/// Cosine similarity in [-1, 1]; 0 when either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(MatcherError::Embedding(format!(
            "Embedding dimensions don't match: {} vs {}",
            a.len(),
            b.len()
        )));
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok((dot_product / (norm_a * norm_b)).clamp(-1.0, 1.0))
}

/// Map a cosine in [-1, 1] onto [0, 100].
pub fn rescale(cosine: f32) -> f32 {
    ((cosine + 1.0) / 2.0 * 100.0).clamp(0.0, 100.0)
}
