//! Report structures for ranked match results

use crate::processing::posting::JobPosting;
use crate::processing::profile::ExtractedProfile;
use crate::processing::scoring::{MatchResult, ScoreWeights, SCORE_WEIGHTS};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Ranked results for one profile, suitable for saving as match history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReport {
    pub metadata: ReportMetadata,
    pub weights: ScoreWeights,
    pub profile: ExtractedProfile,
    pub matches: Vec<RankedMatch>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub matcher_version: String,
    pub resume_file: String,
    pub postings_file: String,
    /// Reference date for open-ended work spans.
    pub as_of: NaiveDate,
    pub processing_time_ms: u64,
    pub embedding_model: String,
    pub vocabulary_version: String,
    pub postings_considered: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedMatch {
    pub rank: usize,
    pub title: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub result: MatchResult,
}

impl MatchReport {
    /// Attach posting details to already ranked results, keeping their order.
    pub fn new(
        metadata: ReportMetadata,
        profile: ExtractedProfile,
        postings: &[JobPosting],
        results: Vec<MatchResult>,
    ) -> Self {
        let by_id: HashMap<&str, &JobPosting> =
            postings.iter().map(|p| (p.id.as_str(), p)).collect();

        let matches = results
            .into_iter()
            .enumerate()
            .map(|(i, result)| {
                let posting = by_id.get(result.posting_id.as_str());
                RankedMatch {
                    rank: i + 1,
                    title: posting.map(|p| p.title.clone()).unwrap_or_default(),
                    company: posting.and_then(|p| p.company.clone()),
                    location: posting.and_then(|p| p.location.clone()),
                    result,
                }
            })
            .collect();

        Self {
            metadata,
            weights: SCORE_WEIGHTS,
            profile,
            matches,
        }
    }

    pub fn best(&self) -> Option<&RankedMatch> {
        self.matches.first()
    }
}

/// Qualitative band for a 0-100 score.
pub fn score_label(score: f32) -> &'static str {
    match score.round() as u32 {
        90..=100 => "EXCELLENT",
        80..=89 => "VERY GOOD",
        70..=79 => "GOOD",
        60..=69 => "FAIR",
        50..=59 => "BELOW AVG",
        _ => "POOR",
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::processing::scoring::ScoreBreakdown;

    pub(crate) fn sample_report() -> MatchReport {
        let mut backend = JobPosting::new("p-1", "Backend Engineer", "Python services");
        backend.company = Some("Acme".to_string());
        backend.location = Some("Austin, TX".to_string());
        let analyst = JobPosting::new("p-2", "Data Analyst", "SQL reporting");

        let breakdown = ScoreBreakdown {
            skill_match: 80.0,
            semantic_similarity: 60.0,
            experience_match: 100.0,
            location_match: 100.0,
            salary_match: 50.0,
        };
        let mut first = MatchResult::new("p-1", breakdown, "builtin-1");
        first.matched_skills = vec!["python".to_string()];
        first.missing_skills = vec!["aws".to_string()];
        let second = MatchResult::new(
            "p-2",
            ScoreBreakdown {
                skill_match: 0.0,
                ..breakdown
            },
            "builtin-1",
        );

        let metadata = ReportMetadata {
            generated_at: Utc::now(),
            matcher_version: "0.1.0".to_string(),
            resume_file: "resume.md".to_string(),
            postings_file: "postings.json".to_string(),
            as_of: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            processing_time_ms: 12,
            embedding_model: "hashing".to_string(),
            vocabulary_version: "builtin-1".to_string(),
            postings_considered: 2,
        };

        MatchReport::new(
            metadata,
            ExtractedProfile::default(),
            &[backend, analyst],
            vec![first, second],
        )
    }

    #[test]
    fn test_report_joins_posting_details() {
        let report = sample_report();
        assert_eq!(report.matches.len(), 2);
        assert_eq!(report.matches[0].rank, 1);
        assert_eq!(report.matches[0].company.as_deref(), Some("Acme"));
        assert_eq!(report.matches[1].title, "Data Analyst");
        assert_eq!(report.best().map(|m| m.result.posting_id.as_str()), Some("p-1"));
    }

    #[test]
    fn test_score_label() {
        assert_eq!(score_label(77.0), "GOOD");
        assert_eq!(score_label(99.6), "EXCELLENT");
        assert_eq!(score_label(12.0), "POOR");
    }
}
