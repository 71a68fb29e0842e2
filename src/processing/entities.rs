//! Entity extraction over resume text
//!
//! The recognizer is a shared, immutable resource: it is built once at
//! startup and handed to every extraction as an `Arc<dyn EntityRecognizer>`.

use crate::error::{MatcherError, Result};
use crate::processing::vocabulary::SkillVocabulary;
use aho_corasick::{AhoCorasick, MatchKind};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Texts shorter than this never yield candidates.
pub const MIN_TEXT_CHARS: usize = 3;

const MAX_LIST_ITEM_CHARS: usize = 40;
const MAX_TITLE_LINE_CHARS: usize = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityCategory {
    SkillCandidate,
    Organization,
    Date,
    Degree,
    JobTitle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSpan {
    pub text: String,
    pub category: EntityCategory,
    /// Zero-based line number the span was found on.
    pub line: usize,
}

pub trait EntityRecognizer: Send + Sync {
    fn name(&self) -> &str;

    /// Tag spans of `text`. Must be deterministic for a given input.
    fn recognize(&self, text: &str) -> Vec<CandidateSpan>;
}

/// Front door used by the profile pipeline.
#[derive(Clone)]
pub struct EntityExtractor {
    recognizer: Arc<dyn EntityRecognizer>,
}

impl EntityExtractor {
    pub fn new(recognizer: Arc<dyn EntityRecognizer>) -> Self {
        Self { recognizer }
    }

    pub fn extract(&self, text: &str) -> Vec<CandidateSpan> {
        if text.trim().chars().count() < MIN_TEXT_CHARS {
            return Vec::new();
        }
        let spans = self.recognizer.recognize(text);
        log::debug!(
            "{} recognized {} candidate spans",
            self.recognizer.name(),
            spans.len()
        );
        spans
    }

    pub fn recognizer_name(&self) -> &str {
        self.recognizer.name()
    }
}

/// Gazetteer + pattern recognizer.
///
/// Skill candidates come from an Aho-Corasick automaton over every vocabulary
/// surface form, plus the items of delimited lists ("Skills: Rust, Pythn")
/// so that misspellings still reach the fuzzy normalizer.
pub struct PatternRecognizer {
    gazetteer: AhoCorasick,
    gazetteer_terms: Vec<String>,
    date_range: Regex,
    degree_long: Regex,
    degree_abbrev: Regex,
    organization_suffix: Regex,
    organization_at: Regex,
    list_label: Regex,
    title_keywords: Vec<&'static str>,
}

impl PatternRecognizer {
    pub fn from_vocabulary(vocabulary: &SkillVocabulary) -> Result<Self> {
        Self::with_terms(vocabulary.surface_forms().map(|(surface, _)| surface.to_string()))
    }

    pub fn with_terms(terms: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut gazetteer_terms: Vec<String> = terms
            .into_iter()
            .filter(|t| !t.trim().is_empty())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        // Longest first, then alphabetical, so automaton pattern ids are stable.
        gazetteer_terms.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let gazetteer = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::LeftmostLongest)
            .build(&gazetteer_terms)
            .map_err(|e| MatcherError::Vocabulary(format!("Failed to build gazetteer: {}", e)))?;

        let month = r"(?:jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?";
        let year = r"(?:19|20)\d{2}";
        let point = format!(r"(?:{month}\s+{year}|\d{{1,2}}/{year}|{year})");
        let date_range = Regex::new(&format!(
            r"(?i)\b{point}\s*(?:-|–|—|to|until)\s*(?:{point}|present|current|now|today)\b"
        ))
        .map_err(|e| MatcherError::Configuration(format!("Invalid date regex: {}", e)))?;

        let build = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| MatcherError::Configuration(format!("Invalid pattern: {}", e)))
        };

        Ok(Self {
            gazetteer,
            gazetteer_terms,
            date_range,
            degree_long: build(
                r"(?i)\b(?:bachelor(?:'s|s)?|master(?:'s|s)|master\s+(?:of|in|degree)|doctorate|ph\.?d|mba|associate(?:'s)?\s+(?:degree|of))\b",
            )?,
            degree_abbrev: build(
                r"\b(?:B\.S\.?|B\.Sc\.?|BSc|B\.A\.|M\.S\.?|M\.Sc\.?|MSc|M\.A\.|A\.S\.|A\.A\.|(?:BS|BA|MS)\s+(?:in|of)\b)",
            )?,
            organization_suffix: build(
                r"\b(?:[A-Z][\w&.-]*\s+){0,4}(?:Inc\.?|LLC|Ltd\.?|Corp\.?|Corporation|Company|Group|Technologies|Labs|Systems|Solutions|University|College|Institute)\b(?:\s+of(?:\s+[A-Z][\w-]*){1,3})?",
            )?,
            organization_at: build(r"\bat\s+([A-Z][\w&.-]*(?:\s+[A-Z][\w&.-]*){0,3})")?,
            list_label: build(r"^[^:]{1,30}:\s*")?,
            title_keywords: vec![
                "engineer", "developer", "analyst", "manager", "designer", "scientist",
                "architect", "consultant", "specialist", "lead", "intern", "director",
                "coordinator", "administrator", "programmer", "master",
            ],
        })
    }

    fn gazetteer_spans(&self, line_no: usize, line: &str, spans: &mut Vec<CandidateSpan>) {
        for mat in self.gazetteer.find_iter(line) {
            let term = &self.gazetteer_terms[mat.pattern().as_usize()];
            let matched = &line[mat.start()..mat.end()];

            let before_ok = line[..mat.start()]
                .chars()
                .next_back()
                .map_or(true, |c| !c.is_alphanumeric());
            let after_ok = line[mat.end()..]
                .chars()
                .next()
                .map_or(true, |c| !c.is_alphanumeric() && c != '+' && c != '#');
            if !before_ok || !after_ok {
                continue;
            }

            // Two-letter forms like "go" or "r" only count when written as a name.
            if term.chars().count() <= 2 && matched.chars().all(|c| !c.is_uppercase()) {
                continue;
            }

            spans.push(CandidateSpan {
                text: matched.to_string(),
                category: EntityCategory::SkillCandidate,
                line: line_no,
            });
        }
    }

    fn list_item_spans(&self, line_no: usize, line: &str, spans: &mut Vec<CandidateSpan>) {
        let body = self.list_label.replace(line, "");
        let items: Vec<&str> = body
            .split(|c: char| matches!(c, ',' | ';' | '|' | '/' | '\u{2022}'))
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .collect();

        if items.len() < 2 {
            return;
        }

        for item in items {
            let item = item.trim_matches(|c: char| c == '.' || c == '-' || c == '*');
            let chars = item.chars().count();
            if chars >= 2 && chars <= MAX_LIST_ITEM_CHARS && !self.date_range.is_match(item) {
                spans.push(CandidateSpan {
                    text: item.to_string(),
                    category: EntityCategory::SkillCandidate,
                    line: line_no,
                });
            }
        }
    }

    fn is_degree_line(&self, line: &str) -> bool {
        self.degree_long.is_match(line) || self.degree_abbrev.is_match(line)
    }

    fn title_text(&self, line: &str) -> Option<String> {
        let lower = line.to_lowercase();
        let has_keyword = self.title_keywords.iter().any(|k| {
            lower
                .split(|c: char| !c.is_alphanumeric())
                .any(|word| word == *k)
        });
        if !has_keyword || line.chars().count() > MAX_TITLE_LINE_CHARS {
            return None;
        }

        let without_dates = self.date_range.replace_all(line, "");
        let title = without_dates
            .split(|c: char| matches!(c, ',' | '|' | '(' | '@'))
            .next()
            .unwrap_or_default()
            .trim_matches(|c: char| c.is_whitespace() || c == '-' || c == ':')
            .to_string();

        (!title.is_empty()).then_some(title)
    }
}

impl EntityRecognizer for PatternRecognizer {
    fn name(&self) -> &str {
        "pattern-recognizer"
    }

    fn recognize(&self, text: &str) -> Vec<CandidateSpan> {
        let mut spans = Vec::new();

        for (line_no, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }

            self.gazetteer_spans(line_no, line, &mut spans);
            self.list_item_spans(line_no, line, &mut spans);

            for mat in self.date_range.find_iter(line) {
                spans.push(CandidateSpan {
                    text: mat.as_str().to_string(),
                    category: EntityCategory::Date,
                    line: line_no,
                });
            }

            for mat in self.organization_suffix.find_iter(line) {
                spans.push(CandidateSpan {
                    text: mat.as_str().trim().to_string(),
                    category: EntityCategory::Organization,
                    line: line_no,
                });
            }
            for cap in self.organization_at.captures_iter(line) {
                if let Some(org) = cap.get(1) {
                    spans.push(CandidateSpan {
                        text: org.as_str().trim().to_string(),
                        category: EntityCategory::Organization,
                        line: line_no,
                    });
                }
            }

            if self.is_degree_line(line) {
                spans.push(CandidateSpan {
                    text: line.to_string(),
                    category: EntityCategory::Degree,
                    line: line_no,
                });
            } else if let Some(title) = self.title_text(line) {
                spans.push(CandidateSpan {
                    text: title,
                    category: EntityCategory::JobTitle,
                    line: line_no,
                });
            }
        }

        spans
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> EntityExtractor {
        let recognizer = PatternRecognizer::from_vocabulary(&SkillVocabulary::builtin()).unwrap();
        EntityExtractor::new(Arc::new(recognizer))
    }

    fn texts(spans: &[CandidateSpan], category: EntityCategory) -> Vec<String> {
        spans
            .iter()
            .filter(|s| s.category == category)
            .map(|s| s.text.clone())
            .collect()
    }

    #[test]
    fn test_short_text_yields_nothing() {
        let extractor = extractor();
        assert!(extractor.extract("").is_empty());
        assert!(extractor.extract("  a ").is_empty());
    }

    #[test]
    fn test_skill_candidates() {
        let spans = extractor().extract("Built services in Python and C++ on AWS.\nKnows node.js");
        let skills = texts(&spans, EntityCategory::SkillCandidate);

        assert!(skills.contains(&"Python".to_string()));
        assert!(skills.contains(&"C++".to_string()));
        assert!(skills.contains(&"AWS".to_string()));
        assert!(skills.contains(&"node.js".to_string()));
    }

    #[test]
    fn test_word_boundaries_respected() {
        let spans = extractor().extract("Experienced in javascripting and going places");
        let skills = texts(&spans, EntityCategory::SkillCandidate);
        assert!(!skills.iter().any(|s| s.eq_ignore_ascii_case("javascript")));
        assert!(!skills.iter().any(|s| s.eq_ignore_ascii_case("go")));
    }

    #[test]
    fn test_list_items_become_candidates() {
        let spans = extractor().extract("Skills: Pythn, Terraform, Kubernets");
        let skills = texts(&spans, EntityCategory::SkillCandidate);
        assert!(skills.contains(&"Pythn".to_string()));
        assert!(skills.contains(&"Kubernets".to_string()));
    }

    #[test]
    fn test_dates_titles_orgs_degrees() {
        let text = "Senior Software Engineer at Acme Corp, Jan 2019 - Present\n\
                    B.S. Computer Science, Stanford University, 2012 - 2016";
        let spans = extractor().extract(text);

        let dates = texts(&spans, EntityCategory::Date);
        assert_eq!(dates, vec!["Jan 2019 - Present", "2012 - 2016"]);

        let titles = texts(&spans, EntityCategory::JobTitle);
        assert_eq!(titles, vec!["Senior Software Engineer at Acme Corp"]);

        let orgs = texts(&spans, EntityCategory::Organization);
        assert!(orgs.contains(&"Acme Corp".to_string()));
        assert!(orgs.iter().any(|o| o.contains("Stanford University")));

        let degrees = texts(&spans, EntityCategory::Degree);
        assert_eq!(degrees.len(), 1);
        assert!(degrees[0].starts_with("B.S. Computer Science"));
    }

    #[test]
    fn test_degree_needs_degree_context() {
        let spans = extractor().extract(
            "Scrum Master at Foo Inc, 2018 - 2022\nMaster's in Data Science\nMasters of Engineering, 2015",
        );

        let titles = texts(&spans, EntityCategory::JobTitle);
        assert_eq!(titles, vec!["Scrum Master at Foo Inc"]);

        let degrees = texts(&spans, EntityCategory::Degree);
        assert_eq!(degrees, vec!["Master's in Data Science", "Masters of Engineering, 2015"]);
    }

    #[test]
    fn test_phone_digits_are_not_dates() {
        let spans = extractor().extract("Phone: 0800-1234\nOffice 2019 - 2021");
        assert_eq!(texts(&spans, EntityCategory::Date), vec!["2019 - 2021"]);
    }

    #[test]
    fn test_recognition_is_deterministic() {
        let text = "Python, SQL, AWS\nData Engineer at Initech Inc 2018 - 2021";
        let extractor = extractor();
        assert_eq!(extractor.extract(text), extractor.extract(text));
    }
}
