//! Matching pipeline: extraction, normalization, vectorization and scoring

pub mod embedding_manager;
pub mod embeddings;
pub mod engine;
pub mod entities;
pub mod normalizer;
pub mod posting;
pub mod preferences;
pub mod profile;
pub mod scoring;
pub mod text_processor;
pub mod tfidf;
pub mod vocabulary;

pub use engine::{MatchEngine, ModelSnapshot, ProfileRegistry};
pub use posting::{ExperienceLevel, ExperienceRequirement, JobPosting, PreferenceSet, SalaryRange};
pub use profile::ExtractedProfile;
pub use scoring::{MatchResult, RankOptions, ScoreBreakdown, SCORE_WEIGHTS};
pub use vocabulary::SkillVocabulary;
