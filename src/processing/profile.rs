//! Profile building: resume text to `ExtractedProfile`

use crate::processing::entities::{CandidateSpan, EntityCategory, EntityExtractor};
use crate::processing::normalizer::SkillNormalizer;
use crate::processing::text_processor::TextProcessor;
use crate::processing::vocabulary::SkillVocabulary;
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::OnceLock;

const DAYS_PER_YEAR: f32 = 365.25;
const SUMMARY_SENTENCES: usize = 3;
const MAX_RECENT_TITLES: usize = 3;
/// Lines before and after a degree line whose dates belong to education.
const EDUCATION_LINES_BEFORE: usize = 1;
const EDUCATION_LINES_AFTER: usize = 3;
/// Oldest year accepted in a work span.
const MIN_PLAUSIBLE_YEAR: i32 = 1950;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducationRecord {
    pub degree: String,
    pub institution: Option<String>,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
    /// "City, Region" from the resume header.
    pub location: Option<String>,
}

impl ContactInfo {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.phone.is_none() && self.location.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkSpan {
    pub title: Option<String>,
    pub organization: Option<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WorkSpan {
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days().max(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedProfile {
    /// Canonical skill names, sorted.
    pub skills: BTreeSet<String>,
    /// The same skills grouped by vocabulary category.
    #[serde(default)]
    pub skill_categories: BTreeMap<String, BTreeSet<String>>,
    pub years_experience: f32,
    pub education: Vec<EducationRecord>,
    pub work_history: Vec<WorkSpan>,
    pub titles: Vec<String>,
    pub summary: String,
    #[serde(default)]
    pub contact: ContactInfo,
}

impl ExtractedProfile {
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
            && self.education.is_empty()
            && self.work_history.is_empty()
            && self.summary.is_empty()
    }

    pub fn has_work_history(&self) -> bool {
        !self.work_history.is_empty()
    }

    /// Skills, recent titles and summary: the text encoded for semantic similarity.
    pub fn summary_text(&self) -> String {
        let mut parts = Vec::new();
        if !self.titles.is_empty() {
            parts.push(
                self.titles
                    .iter()
                    .take(MAX_RECENT_TITLES)
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", "),
            );
        }
        if !self.skills.is_empty() {
            parts.push(format!(
                "Skills: {}",
                self.skills.iter().cloned().collect::<Vec<_>>().join(", ")
            ));
        }
        if !self.summary.is_empty() {
            parts.push(self.summary.clone());
        }
        parts.join(". ")
    }
}

/// Aggregates recognized entities into a profile. Never fails: text with no
/// usable signal yields an empty profile.
pub struct ProfileBuilder<'a> {
    extractor: &'a EntityExtractor,
    vocabulary: &'a SkillVocabulary,
    normalizer: SkillNormalizer<'a>,
    text_processor: TextProcessor,
    as_of: NaiveDate,
}

impl<'a> ProfileBuilder<'a> {
    /// `as_of` closes open-ended spans such as "2020 - Present".
    pub fn new(
        extractor: &'a EntityExtractor,
        vocabulary: &'a SkillVocabulary,
        fuzzy_threshold: f64,
        as_of: NaiveDate,
    ) -> Self {
        Self {
            extractor,
            vocabulary,
            normalizer: SkillNormalizer::new(vocabulary, fuzzy_threshold),
            text_processor: TextProcessor::new(),
            as_of,
        }
    }

    pub fn build(&self, text: &str) -> ExtractedProfile {
        let spans = self.extractor.extract(text);

        let skills = self.normalizer.normalize_all(
            spans
                .iter()
                .filter(|s| s.category == EntityCategory::SkillCandidate)
                .map(|s| s.text.as_str()),
        );

        let skill_categories = self.group_by_category(&skills);

        let education_lines: HashSet<usize> = spans
            .iter()
            .filter(|s| s.category == EntityCategory::Degree)
            .flat_map(|s| {
                s.line.saturating_sub(EDUCATION_LINES_BEFORE)..=s.line + EDUCATION_LINES_AFTER
            })
            .collect();

        let education = self.education_records(&spans);
        let work_history = self.work_spans(&spans, &education_lines);
        let years_experience = total_years(&work_history);

        let mut seen = HashSet::new();
        let titles: Vec<String> = work_history
            .iter()
            .filter_map(|w| w.title.clone())
            .filter(|t| seen.insert(t.to_lowercase()))
            .collect();

        let summary = self.text_processor.summarize(text, SUMMARY_SENTENCES);
        let contact = ContactInfo {
            email: self.text_processor.find_email(text),
            phone: self.text_processor.find_phone(text),
            location: self.text_processor.find_location(text),
        };

        log::debug!(
            "Built profile: {} skills, {} spans, {:.1} years, {} education records",
            skills.len(),
            work_history.len(),
            years_experience,
            education.len()
        );

        ExtractedProfile {
            skills,
            skill_categories,
            years_experience,
            education,
            work_history,
            titles,
            summary,
            contact,
        }
    }

    fn group_by_category(&self, skills: &BTreeSet<String>) -> BTreeMap<String, BTreeSet<String>> {
        let mut groups: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for skill in skills {
            if let Some(entry) = self.vocabulary.entry(skill) {
                groups
                    .entry(entry.category.clone())
                    .or_default()
                    .insert(skill.clone());
            }
        }
        groups
    }

    fn education_records(&self, spans: &[CandidateSpan]) -> Vec<EducationRecord> {
        spans
            .iter()
            .filter(|s| s.category == EntityCategory::Degree)
            .map(|degree| {
                let institution = nearest_on_line(spans, EntityCategory::Organization, degree.line)
                    .or_else(|| nearest_on_line(spans, EntityCategory::Organization, degree.line + 1))
                    .map(|s| s.text.clone());
                EducationRecord {
                    degree: degree.text.clone(),
                    institution,
                    year: last_year(&degree.text),
                }
            })
            .collect()
    }

    /// Dates on a degree line belong to education. Dates a few lines around
    /// one do too, unless a job title sits on the date's own line or the line above.
    fn work_spans(&self, spans: &[CandidateSpan], education_lines: &HashSet<usize>) -> Vec<WorkSpan> {
        let degree_lines: HashSet<usize> = spans
            .iter()
            .filter(|s| s.category == EntityCategory::Degree)
            .map(|s| s.line)
            .collect();

        spans
            .iter()
            .filter(|s| s.category == EntityCategory::Date && !degree_lines.contains(&s.line))
            .filter(|s| {
                !education_lines.contains(&s.line)
                    || nearest_before(spans, EntityCategory::JobTitle, s.line).is_some()
            })
            .filter_map(|date| {
                let (start, end) = parse_date_range(&date.text, self.as_of)?;
                let title = nearest_before(spans, EntityCategory::JobTitle, date.line)
                    .map(|s| s.text.clone());
                let organization = nearest_before(spans, EntityCategory::Organization, date.line)
                    .map(|s| s.text.clone());
                Some(WorkSpan {
                    title,
                    organization,
                    start,
                    end,
                })
            })
            .collect()
    }
}

fn nearest_on_line(spans: &[CandidateSpan], category: EntityCategory, line: usize) -> Option<&CandidateSpan> {
    spans
        .iter()
        .find(|s| s.category == category && s.line == line)
}

/// Span on the same line, else on the line above.
fn nearest_before(spans: &[CandidateSpan], category: EntityCategory, line: usize) -> Option<&CandidateSpan> {
    nearest_on_line(spans, category, line)
        .or_else(|| line.checked_sub(1).and_then(|prev| nearest_on_line(spans, category, prev)))
}

fn last_year(text: &str) -> Option<i32> {
    static YEAR: OnceLock<Option<Regex>> = OnceLock::new();
    YEAR.get_or_init(|| Regex::new(r"\b(19|20)\d{2}\b").ok())
        .as_ref()?
        .find_iter(text)
        .last()
        .and_then(|m| m.as_str().parse().ok())
}

/// Parse "Jan 2019 - Present", "03/2018 - 06/2021" or "2012 - 2016".
/// Open ends resolve to `as_of`; ends past `as_of` are clamped to it.
pub fn parse_date_range(text: &str, as_of: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    static SEPARATOR: OnceLock<Option<Regex>> = OnceLock::new();
    let separator = SEPARATOR
        .get_or_init(|| Regex::new(r"(?i)\s*(?:-|–|—)\s*|\s+(?:to|until)\s+").ok())
        .as_ref()?;

    let mut parts = separator.splitn(text.trim(), 2);
    let start = parse_date_point(parts.next()?, as_of)?;
    let end = parse_date_point(parts.next()?, as_of)?.min(as_of);

    (start <= end).then_some((start, end))
}

fn parse_date_point(text: &str, as_of: NaiveDate) -> Option<NaiveDate> {
    let lower = text.trim().trim_end_matches('.').to_lowercase();
    if matches!(lower.as_str(), "present" | "current" | "now" | "today") {
        return Some(as_of);
    }

    if let Some((month, year)) = lower.split_once('/') {
        let month: u32 = month.trim().parse().ok()?;
        return NaiveDate::from_ymd_opt(parse_year(year)?, month, 1);
    }

    let mut words = lower.split_whitespace();
    let first = words.next()?;
    match words.next() {
        None => NaiveDate::from_ymd_opt(parse_year(first)?, 1, 1),
        Some(year) => {
            let month = month_number(first.trim_end_matches('.'))?;
            NaiveDate::from_ymd_opt(parse_year(year)?, month, 1)
        }
    }
}

/// Four-digit year no older than `MIN_PLAUSIBLE_YEAR`.
fn parse_year(text: &str) -> Option<i32> {
    let text = text.trim();
    if text.len() != 4 {
        return None;
    }
    text.parse().ok().filter(|year| *year >= MIN_PLAUSIBLE_YEAR)
}

fn month_number(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    let prefix: String = name.chars().take(3).collect();
    MONTHS
        .iter()
        .position(|m| *m == prefix)
        .map(|i| i as u32 + 1)
}

/// Years covered by the union of spans; overlapping time counts once.
pub fn total_years(spans: &[WorkSpan]) -> f32 {
    let mut intervals: Vec<(NaiveDate, NaiveDate)> =
        spans.iter().map(|s| (s.start, s.end)).collect();
    intervals.sort();

    let mut total_days = 0i64;
    let mut current: Option<(NaiveDate, NaiveDate)> = None;
    for (start, end) in intervals {
        current = match current {
            Some((cur_start, cur_end)) if start <= cur_end => Some((cur_start, cur_end.max(end))),
            Some((cur_start, cur_end)) => {
                total_days += (cur_end - cur_start).num_days();
                Some((start, end))
            }
            None => Some((start, end)),
        };
    }
    if let Some((cur_start, cur_end)) = current {
        total_days += (cur_end - cur_start).num_days();
    }

    let years = total_days.max(0) as f32 / DAYS_PER_YEAR;
    (years * 10.0).round() / 10.0
}

/// Reference date for callers that do not inject one.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
