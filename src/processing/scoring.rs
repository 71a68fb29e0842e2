//! Score combination and ranking

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Fixed weights of the five sub-scores. They sum to exactly 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub skill_match: f32,
    pub semantic_similarity: f32,
    pub experience_match: f32,
    pub location_match: f32,
    pub salary_match: f32,
}

pub const SCORE_WEIGHTS: ScoreWeights = ScoreWeights {
    skill_match: 0.5,
    semantic_similarity: 0.2,
    experience_match: 0.1,
    location_match: 0.1,
    salary_match: 0.1,
};

impl ScoreWeights {
    pub fn total(&self) -> f32 {
        self.skill_match
            + self.semantic_similarity
            + self.experience_match
            + self.location_match
            + self.salary_match
    }
}

/// Per-component scores, each in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub skill_match: f32,
    pub semantic_similarity: f32,
    pub experience_match: f32,
    pub location_match: f32,
    pub salary_match: f32,
}

impl ScoreBreakdown {
    /// Clamp every component into [0, 100].
    pub fn clamped(self) -> Self {
        let clamp = |v: f32| if v.is_nan() { 0.0 } else { v.clamp(0.0, 100.0) };
        Self {
            skill_match: clamp(self.skill_match),
            semantic_similarity: clamp(self.semantic_similarity),
            experience_match: clamp(self.experience_match),
            location_match: clamp(self.location_match),
            salary_match: clamp(self.salary_match),
        }
    }

    /// Weighted sum, scaled once and clamped to [0, 100].
    pub fn composite(&self) -> f32 {
        let w = SCORE_WEIGHTS;
        let score = self.skill_match * w.skill_match
            + self.semantic_similarity * w.semantic_similarity
            + self.experience_match * w.experience_match
            + self.location_match * w.location_match
            + self.salary_match * w.salary_match;
        if score.is_nan() {
            0.0
        } else {
            score.clamp(0.0, 100.0)
        }
    }

    /// (name, score, weight) for each component in a fixed order.
    pub fn components(&self) -> [(&'static str, f32, f32); 5] {
        let w = SCORE_WEIGHTS;
        [
            ("skill_match", self.skill_match, w.skill_match),
            ("semantic_similarity", self.semantic_similarity, w.semantic_similarity),
            ("experience_match", self.experience_match, w.experience_match),
            ("location_match", self.location_match, w.location_match),
            ("salary_match", self.salary_match, w.salary_match),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub posting_id: String,
    pub score: f32,
    pub breakdown: ScoreBreakdown,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    /// TF-IDF cosine of profile and posting text, 0-100. Diagnostic only.
    pub keyword_similarity: f32,
    pub vocabulary_version: String,
}

impl MatchResult {
    pub fn new(posting_id: impl Into<String>, breakdown: ScoreBreakdown, vocabulary_version: impl Into<String>) -> Self {
        let breakdown = breakdown.clamped();
        Self {
            posting_id: posting_id.into(),
            score: breakdown.composite(),
            breakdown,
            matched_skills: Vec::new(),
            missing_skills: Vec::new(),
            keyword_similarity: 0.0,
            vocabulary_version: vocabulary_version.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RankOptions {
    pub min_score: Option<f32>,
    pub limit: Option<usize>,
    /// Ranked results to skip before `limit` applies.
    pub offset: usize,
}

/// Score descending, ties by posting id ascending.
pub fn rank(mut results: Vec<MatchResult>, options: RankOptions) -> Vec<MatchResult> {
    if let Some(min_score) = options.min_score {
        results.retain(|r| r.score >= min_score);
    }

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.posting_id.cmp(&b.posting_id))
    });

    let mut page: Vec<MatchResult> = results.into_iter().skip(options.offset).collect();
    if let Some(limit) = options.limit {
        page.truncate(limit);
    }
    page
}
