//! Integration tests for the job matcher

use approx::assert_relative_eq;
use chrono::NaiveDate;
use job_matcher::config::MatchingConfig;
use job_matcher::error::{MatcherError, Result};
use job_matcher::input::ResumeDocument;
use job_matcher::output::formatter::JsonFormatter;
use job_matcher::output::{MatchReport, OutputFormatter, ReportMetadata};
use job_matcher::processing::embeddings::{EmbeddingEngine, HashingEncoder, SentenceEncoder};
use job_matcher::processing::{
    ExtractedProfile, JobPosting, MatchEngine, ModelSnapshot, PreferenceSet, ProfileRegistry,
    RankOptions, SkillVocabulary,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn postings() -> Vec<JobPosting> {
    JobPosting::load_all(Path::new("tests/fixtures/postings.json")).unwrap()
}

fn engine_with(encoder: Arc<dyn SentenceEncoder>, config: &MatchingConfig) -> MatchEngine {
    let corpus: Vec<String> = postings().iter().map(JobPosting::text).collect();
    let snapshot = ModelSnapshot::build(SkillVocabulary::builtin(), &corpus).unwrap();
    let embeddings = Arc::new(EmbeddingEngine::new(encoder, config.embedding_workers));
    MatchEngine::new(snapshot, embeddings, config)
}

fn engine() -> MatchEngine {
    engine_with(Arc::new(HashingEncoder::new(256)), &MatchingConfig::default())
}

async fn profile(engine: &MatchEngine, fixture: &str) -> ExtractedProfile {
    let document = ResumeDocument::from_path(Path::new(fixture)).await.unwrap();
    engine.extract_profile(&document, as_of()).unwrap()
}

struct SlowEncoder;

impl SentenceEncoder for SlowEncoder {
    fn name(&self) -> &str {
        "slow"
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        std::thread::sleep(Duration::from_millis(500));
        Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
    }
}

#[tokio::test]
async fn test_profile_from_text_resume() {
    let engine = engine();
    let profile = profile(&engine, "tests/fixtures/sample_resume.txt").await;

    for skill in ["python", "sql", "docker", "kubernetes", "react"] {
        assert!(profile.skills.contains(skill), "missing {}", skill);
    }
    assert_eq!(profile.work_history.len(), 2);
    assert!(profile.years_experience > 7.5 && profile.years_experience < 8.5);
    assert_eq!(profile.education.len(), 1);
    assert_eq!(profile.education[0].year, Some(2015));

    assert_eq!(profile.contact.email.as_deref(), Some("jane.roe@example.com"));
    assert_eq!(profile.contact.location.as_deref(), Some("Austin, TX"));
    assert!(profile.skill_categories["DevOps Tools"].contains("kubernetes"));
}

#[tokio::test]
async fn test_markdown_and_text_resumes_agree_on_skills() {
    let engine = engine();
    let txt = profile(&engine, "tests/fixtures/sample_resume.txt").await;
    let md = profile(&engine, "tests/fixtures/sample_resume.md").await;
    assert_eq!(txt.skills, md.skills);
}

#[tokio::test]
async fn test_unsupported_file_type() {
    let engine = engine();
    let document = ResumeDocument::from_path(Path::new("tests/fixtures/unsupported.xyz"))
        .await
        .unwrap();
    let result = engine.extract_profile(&document, as_of());
    assert!(matches!(result, Err(MatcherError::UnsupportedFormat(_))));
}

#[tokio::test]
async fn test_nonexistent_file() {
    let result = ResumeDocument::from_path(Path::new("tests/fixtures/nonexistent.txt")).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_extraction_is_idempotent() {
    let engine = engine();
    let first = profile(&engine, "tests/fixtures/sample_resume.txt").await;
    let second = profile(&engine, "tests/fixtures/sample_resume.txt").await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_match_fixture_postings() {
    let engine = engine();
    let profile = profile(&engine, "tests/fixtures/sample_resume.txt").await;
    let preferences = PreferenceSet::load(Path::new("tests/fixtures/preferences.json")).unwrap();

    let results = engine
        .match_postings(&profile, &postings(), &preferences, RankOptions::default())
        .await
        .unwrap();
    assert_eq!(results.len(), 3);

    for result in &results {
        assert!((0.0..=100.0).contains(&result.score));
        for (_, score, _) in result.breakdown.components() {
            assert!((0.0..=100.0).contains(&score));
        }
    }
    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }

    let backend = results.iter().find(|r| r.posting_id == "be-1").unwrap();
    assert_relative_eq!(backend.breakdown.skill_match, 200.0 / 3.0, epsilon = 1e-3);
    assert_eq!(backend.missing_skills, vec!["aws"]);
    assert_eq!(backend.breakdown.location_match, 100.0);
    assert_eq!(backend.breakdown.experience_match, 100.0);
    // Preferred 130-160k against a 120-150k posting overlaps on 20k of 30k.
    assert_relative_eq!(backend.breakdown.salary_match, 200.0 / 3.0, epsilon = 1e-3);

    let frontend = results.iter().find(|r| r.posting_id == "fe-1").unwrap();
    assert_eq!(frontend.breakdown.location_match, 100.0);
    assert_eq!(frontend.breakdown.salary_match, 50.0);
}

#[tokio::test]
async fn test_neutral_defaults_without_preferences() {
    let engine = engine();
    let profile = profile(&engine, "tests/fixtures/sample_resume.txt").await;
    let posting = JobPosting::new("bare", "Engineer", "General engineering role");

    let results = engine
        .match_postings(&profile, &[posting], &PreferenceSet::default(), RankOptions::default())
        .await
        .unwrap();
    let breakdown = results[0].breakdown;
    assert_eq!(breakdown.skill_match, 100.0);
    assert_eq!(breakdown.experience_match, 50.0);
    assert_eq!(breakdown.location_match, 50.0);
    assert_eq!(breakdown.salary_match, 50.0);
}

#[tokio::test]
async fn test_covering_more_skills_never_lowers_skill_match() {
    let engine = engine();
    let mut posting = JobPosting::new("p", "Backend Engineer", "Python, SQL and AWS");
    posting.required_skills = vec!["python".into(), "sql".into(), "aws".into()];

    let mut skill_scores = Vec::new();
    for text in ["Skills: Python, Java", "Skills: Python, SQL", "Skills: Python, SQL, AWS"] {
        let profile = engine
            .extract_profile(&ResumeDocument::new(text, "text/plain"), as_of())
            .unwrap();
        let results = engine
            .match_postings(&profile, std::slice::from_ref(&posting), &PreferenceSet::default(), RankOptions::default())
            .await
            .unwrap();
        skill_scores.push(results[0].breakdown.skill_match);
    }
    assert!(skill_scores.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(skill_scores[2], 100.0);
}

#[tokio::test]
async fn test_matching_is_deterministic() {
    let engine = engine();
    let profile = profile(&engine, "tests/fixtures/sample_resume.txt").await;
    let preferences = PreferenceSet::load(Path::new("tests/fixtures/preferences.json")).unwrap();

    let first = engine
        .match_postings(&profile, &postings(), &preferences, RankOptions::default())
        .await
        .unwrap();
    engine.embeddings().clear_cache();
    let second = engine
        .match_postings(&profile, &postings(), &preferences, RankOptions::default())
        .await
        .unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_min_score_and_limit() {
    let engine = engine();
    let profile = profile(&engine, "tests/fixtures/sample_resume.txt").await;
    let all = engine
        .match_postings(&profile, &postings(), &PreferenceSet::default(), RankOptions::default())
        .await
        .unwrap();

    let limited = engine
        .match_postings(
            &profile,
            &postings(),
            &PreferenceSet::default(),
            RankOptions { min_score: None, limit: Some(1), offset: 0 },
        )
        .await
        .unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].posting_id, all[0].posting_id);

    let threshold = all[0].score + 1.0;
    let none = engine
        .match_postings(
            &profile,
            &postings(),
            &PreferenceSet::default(),
            RankOptions { min_score: Some(threshold), limit: None, offset: 0 },
        )
        .await
        .unwrap();
    assert!(none.is_empty());

    let second = engine
        .match_postings(
            &profile,
            &postings(),
            &PreferenceSet::default(),
            RankOptions { min_score: None, limit: Some(1), offset: 1 },
        )
        .await
        .unwrap();
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].posting_id, all[1].posting_id);
}

#[tokio::test]
async fn test_unavailable_encoder_fails_request() {
    let corpus: Vec<String> = postings().iter().map(JobPosting::text).collect();
    let snapshot = ModelSnapshot::build(SkillVocabulary::builtin(), &corpus).unwrap();
    let engine = MatchEngine::new(
        snapshot,
        Arc::new(EmbeddingEngine::unavailable()),
        &MatchingConfig::default(),
    );

    let result = engine
        .match_postings(&ExtractedProfile::default(), &postings(), &PreferenceSet::default(), RankOptions::default())
        .await;
    let err = result.unwrap_err();
    assert!(matches!(err, MatcherError::ServiceUnavailable(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_request_timeout() {
    let config = MatchingConfig {
        request_timeout_ms: 50,
        ..MatchingConfig::default()
    };
    let engine = engine_with(Arc::new(SlowEncoder), &config);

    let result = engine
        .match_postings(&ExtractedProfile::default(), &postings(), &PreferenceSet::default(), RankOptions::default())
        .await;
    assert!(matches!(result, Err(MatcherError::Timeout(50))));
}

#[tokio::test]
async fn test_failed_upload_keeps_previous_profile() {
    let engine = engine();
    let registry = ProfileRegistry::new();

    let good = ResumeDocument::from_path(Path::new("tests/fixtures/sample_resume.txt"))
        .await
        .unwrap();
    let active = registry.upload(&engine, "jane", &good, as_of()).unwrap();

    let unreadable = ResumeDocument::new(vec![0xff, 0xfe, 0xfd], "text/plain");
    let result = registry.upload(&engine, "jane", &unreadable, as_of());
    assert!(matches!(result, Err(MatcherError::ExtractionFailure(_))));

    assert_eq!(registry.active("jane").unwrap().skills, active.skills);
}

#[tokio::test]
async fn test_report_json_roundtrip() {
    let engine = engine();
    let profile = profile(&engine, "tests/fixtures/sample_resume.txt").await;
    let postings = postings();
    let results = engine
        .match_postings(&profile, &postings, &PreferenceSet::default(), RankOptions::default())
        .await
        .unwrap();

    let metadata = ReportMetadata {
        generated_at: chrono::Utc::now(),
        matcher_version: env!("CARGO_PKG_VERSION").to_string(),
        resume_file: "tests/fixtures/sample_resume.txt".to_string(),
        postings_file: "tests/fixtures/postings.json".to_string(),
        as_of: as_of(),
        processing_time_ms: 0,
        embedding_model: engine.embeddings().model_name().to_string(),
        vocabulary_version: engine.snapshot().version().to_string(),
        postings_considered: postings.len(),
    };
    let report = MatchReport::new(metadata, profile, &postings, results.clone());

    let json = JsonFormatter::new(true).format_report(&report).unwrap();
    let saved: MatchReport = serde_json::from_str(&json).unwrap();

    let restored: Vec<_> = saved.matches.into_iter().map(|m| m.result).collect();
    assert_eq!(restored, results);
    assert_eq!(saved.metadata.embedding_model, "hashing");
}
