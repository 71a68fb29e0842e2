//! Match engine: coordinates extraction, keyword, semantic and preference
//! scoring over a published model snapshot.

use crate::config::MatchingConfig;
use crate::error::{MatcherError, Result};
use crate::input::{DocumentIngestor, ResumeDocument};
use crate::processing::embeddings::EmbeddingEngine;
use crate::processing::entities::{EntityExtractor, EntityRecognizer, PatternRecognizer};
use crate::processing::posting::{JobPosting, PreferenceSet};
use crate::processing::preferences::PreferenceScorer;
use crate::processing::profile::{ExtractedProfile, ProfileBuilder};
use crate::processing::scoring::{rank, MatchResult, RankOptions, ScoreBreakdown};
use crate::processing::tfidf::{KeywordScorer, TfIdfModel};
use crate::processing::vocabulary::SkillVocabulary;
use chrono::NaiveDate;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Immutable bundle of everything a request reads: vocabulary, the
/// recognizer built over it and the fitted TF-IDF model.
pub struct ModelSnapshot {
    pub vocabulary: SkillVocabulary,
    pub extractor: EntityExtractor,
    pub tfidf: TfIdfModel,
}

impl ModelSnapshot {
    pub fn new<S: AsRef<str>>(
        vocabulary: SkillVocabulary,
        recognizer: Arc<dyn EntityRecognizer>,
        corpus: &[S],
    ) -> Self {
        let tfidf = TfIdfModel::fit(corpus, &vocabulary);
        Self {
            vocabulary,
            extractor: EntityExtractor::new(recognizer),
            tfidf,
        }
    }

    /// Snapshot using the pattern recognizer built from `vocabulary`.
    pub fn build<S: AsRef<str>>(vocabulary: SkillVocabulary, corpus: &[S]) -> Result<Self> {
        let recognizer = PatternRecognizer::from_vocabulary(&vocabulary)?;
        Ok(Self::new(vocabulary, Arc::new(recognizer), corpus))
    }

    pub fn version(&self) -> &str {
        self.vocabulary.version()
    }
}

pub struct MatchEngine {
    snapshot: RwLock<Arc<ModelSnapshot>>,
    embeddings: Arc<EmbeddingEngine>,
    ingestor: DocumentIngestor,
    preference_scorer: PreferenceScorer,
    fuzzy_threshold: f64,
    request_timeout: Duration,
}

impl MatchEngine {
    pub fn new(snapshot: ModelSnapshot, embeddings: Arc<EmbeddingEngine>, config: &MatchingConfig) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(snapshot)),
            embeddings,
            ingestor: DocumentIngestor::new(),
            preference_scorer: PreferenceScorer::from_config(config),
            fuzzy_threshold: f64::from(config.fuzzy_threshold),
            request_timeout: Duration::from_millis(config.request_timeout_ms),
        }
    }

    /// The snapshot new requests will use.
    pub fn snapshot(&self) -> Arc<ModelSnapshot> {
        Arc::clone(&self.snapshot.read())
    }

    /// Swap in a new snapshot. Requests already running keep the old one.
    pub fn publish(&self, snapshot: ModelSnapshot) {
        log::info!(
            "Publishing model snapshot: vocabulary {} ({} skills), {} TF-IDF terms, recognizer {}",
            snapshot.version(),
            snapshot.vocabulary.len(),
            snapshot.tfidf.dimensions(),
            snapshot.extractor.recognizer_name()
        );
        *self.snapshot.write() = Arc::new(snapshot);
    }

    /// Rebuild vocabulary-derived models off to the side, then publish.
    pub fn refit<S: AsRef<str>>(&self, vocabulary: SkillVocabulary, corpus: &[S]) -> Result<()> {
        let snapshot = ModelSnapshot::build(vocabulary, corpus)?;
        self.publish(snapshot);
        Ok(())
    }

    pub fn embeddings(&self) -> &EmbeddingEngine {
        &self.embeddings
    }

    /// Parse a resume into a profile. Fails only on ingestion errors.
    pub fn extract_profile(&self, document: &ResumeDocument, as_of: NaiveDate) -> Result<ExtractedProfile> {
        let text = self.ingestor.extract_text(document)?;
        let snapshot = self.snapshot();
        let builder = ProfileBuilder::new(
            &snapshot.extractor,
            &snapshot.vocabulary,
            self.fuzzy_threshold,
            as_of,
        );
        Ok(builder.build(&text))
    }

    /// Score and rank every posting. All-or-nothing: any invalid posting,
    /// encoder failure or overrun of the time budget fails the whole request.
    pub async fn match_postings(
        &self,
        profile: &ExtractedProfile,
        postings: &[JobPosting],
        preferences: &PreferenceSet,
        options: RankOptions,
    ) -> Result<Vec<MatchResult>> {
        let budget_ms = self.request_timeout.as_millis() as u64;
        tokio::time::timeout(
            self.request_timeout,
            self.score_postings(profile, postings, preferences, options),
        )
        .await
        .map_err(|_| MatcherError::Timeout(budget_ms))?
    }

    async fn score_postings(
        &self,
        profile: &ExtractedProfile,
        postings: &[JobPosting],
        preferences: &PreferenceSet,
        options: RankOptions,
    ) -> Result<Vec<MatchResult>> {
        let start_time = Instant::now();
        for posting in postings {
            posting.validate()?;
        }
        preferences.validate()?;
        if postings.is_empty() {
            return Ok(Vec::new());
        }

        let snapshot = self.snapshot();
        let profile_text = semantic_query(profile, preferences);
        let posting_texts: Vec<String> = postings.iter().map(JobPosting::text).collect();

        let semantic = self.embeddings.similarities(&profile_text, &posting_texts).await?;

        let keyword_scorer = KeywordScorer::new(&snapshot.tfidf, &snapshot.vocabulary, self.fuzzy_threshold);
        let results: Vec<MatchResult> = postings
            .iter()
            .zip(semantic)
            .map(|(posting, semantic_similarity)| {
                let skill = keyword_scorer.score(&profile.skills, &profile_text, posting);
                let prefs = self.preference_scorer.score(profile, posting, preferences);
                let breakdown = ScoreBreakdown {
                    skill_match: skill.score,
                    semantic_similarity,
                    experience_match: prefs.experience_match,
                    location_match: prefs.location_match,
                    salary_match: prefs.salary_match,
                };

                let mut result = MatchResult::new(posting.id.clone(), breakdown, snapshot.version());
                result.matched_skills = skill.matched;
                result.missing_skills = skill.missing;
                result.keyword_similarity = skill.keyword_similarity;
                result
            })
            .collect();

        let ranked = rank(results, options);
        log::info!(
            "Scored {} postings ({} returned) in {:.2?}",
            postings.len(),
            ranked.len(),
            start_time.elapsed()
        );
        Ok(ranked)
    }
}

/// Profile text with the seeker's desired roles appended.
fn semantic_query(profile: &ExtractedProfile, preferences: &PreferenceSet) -> String {
    let summary = profile.summary_text();
    let roles: Vec<&str> = preferences
        .desired_roles
        .iter()
        .map(|r| r.trim())
        .filter(|r| !r.is_empty())
        .collect();
    if roles.is_empty() {
        summary
    } else if summary.is_empty() {
        format!("Looking for: {}", roles.join(", "))
    } else {
        format!("{}. Looking for: {}", summary, roles.join(", "))
    }
}

/// Active profile per user. A new upload replaces the old profile only once
/// parsing has succeeded.
#[derive(Default)]
pub struct ProfileRegistry {
    profiles: RwLock<HashMap<String, Arc<ExtractedProfile>>>,
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upload(
        &self,
        engine: &MatchEngine,
        user_id: &str,
        document: &ResumeDocument,
        as_of: NaiveDate,
    ) -> Result<Arc<ExtractedProfile>> {
        let profile = match engine.extract_profile(document, as_of) {
            Ok(profile) => Arc::new(profile),
            Err(e) => {
                log::warn!("Resume upload for '{}' rejected: {}", user_id, e);
                return Err(e);
            }
        };
        self.profiles
            .write()
            .insert(user_id.to_string(), Arc::clone(&profile));
        Ok(profile)
    }

    pub fn active(&self, user_id: &str) -> Option<Arc<ExtractedProfile>> {
        self.profiles.read().get(user_id).cloned()
    }
}
