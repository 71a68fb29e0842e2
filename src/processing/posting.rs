//! Job postings and seeker preferences

use crate::error::{MatcherError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SalaryRange {
    pub min: f64,
    pub max: f64,
}

impl SalaryRange {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        let range = Self { min, max };
        range.validate()?;
        Ok(range)
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    pub fn validate(&self) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min < 0.0 {
            return Err(MatcherError::InvalidInput(format!(
                "Salary bounds must be finite and non-negative: {} - {}",
                self.min, self.max
            )));
        }
        if self.min > self.max {
            return Err(MatcherError::InvalidInput(format!(
                "Salary minimum {} exceeds maximum {}",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Entry,
    Mid,
    Senior,
}

impl ExperienceLevel {
    /// Years of experience a level stands for.
    pub fn years(&self) -> f32 {
        match self {
            ExperienceLevel::Entry => 0.0,
            ExperienceLevel::Mid => 2.0,
            ExperienceLevel::Senior => 5.0,
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExperienceLevel::Entry => write!(f, "entry"),
            ExperienceLevel::Mid => write!(f, "mid"),
            ExperienceLevel::Senior => write!(f, "senior"),
        }
    }
}

impl FromStr for ExperienceLevel {
    type Err = MatcherError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));

        if has(&["senior", "sr.", "lead", "principal", "staff"]) {
            Ok(ExperienceLevel::Senior)
        } else if has(&["mid", "intermediate"]) {
            Ok(ExperienceLevel::Mid)
        } else if has(&["entry", "junior", "jr.", "intern", "graduate"]) {
            Ok(ExperienceLevel::Entry)
        } else {
            Err(MatcherError::InvalidInput(format!(
                "Unrecognized experience level: {}",
                s
            )))
        }
    }
}

/// Experience a posting asks for.
///
/// Deserializes from a bare number of years, a level name, or free text such
/// as `"2-5 years"` or `"3+ years"`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawExperience", into = "String")]
pub enum ExperienceRequirement {
    Level(ExperienceLevel),
    Years(f32),
    Range { min: f32, max: f32 },
}

impl ExperienceRequirement {
    /// Years the candidate must have. Ranges use their lower bound.
    pub fn min_years(&self) -> f32 {
        match self {
            ExperienceRequirement::Level(level) => level.years(),
            ExperienceRequirement::Years(years) => *years,
            ExperienceRequirement::Range { min, .. } => *min,
        }
    }
}

impl FromStr for ExperienceRequirement {
    type Err = MatcherError;

    fn from_str(s: &str) -> Result<Self> {
        static RANGE: OnceLock<Option<Regex>> = OnceLock::new();
        static YEARS: OnceLock<Option<Regex>> = OnceLock::new();

        let range = RANGE
            .get_or_init(|| Regex::new(r"(\d+(?:\.\d+)?)\s*(?:-|–|—|to)\s*(\d+(?:\.\d+)?)").ok())
            .as_ref();
        let years = YEARS
            .get_or_init(|| Regex::new(r"(\d+(?:\.\d+)?)\s*\+?\s*(?:years?|yrs?)?").ok())
            .as_ref();

        if let Some(caps) = range.and_then(|re| re.captures(s)) {
            let min: f32 = caps[1].parse().unwrap_or(0.0);
            let max: f32 = caps[2].parse().unwrap_or(min);
            return Ok(ExperienceRequirement::Range {
                min: min.min(max),
                max: max.max(min),
            });
        }
        if let Some(caps) = years.and_then(|re| re.captures(s)) {
            if let Ok(value) = caps[1].parse::<f32>() {
                return Ok(ExperienceRequirement::Years(value));
            }
        }
        s.parse::<ExperienceLevel>().map(ExperienceRequirement::Level)
    }
}

impl fmt::Display for ExperienceRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExperienceRequirement::Level(level) => write!(f, "{}", level),
            ExperienceRequirement::Years(years) => write!(f, "{} years", years),
            ExperienceRequirement::Range { min, max } => write!(f, "{}-{} years", min, max),
        }
    }
}

impl From<ExperienceRequirement> for String {
    fn from(value: ExperienceRequirement) -> Self {
        value.to_string()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawExperience {
    Years(f32),
    Text(String),
}

impl TryFrom<RawExperience> for ExperienceRequirement {
    type Error = MatcherError;

    fn try_from(raw: RawExperience) -> Result<Self> {
        match raw {
            RawExperience::Years(years) if years >= 0.0 => Ok(ExperienceRequirement::Years(years)),
            RawExperience::Years(years) => Err(MatcherError::InvalidInput(format!(
                "Negative experience requirement: {}",
                years
            ))),
            RawExperience::Text(text) => text.parse(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub salary: Option<SalaryRange>,
    #[serde(default, alias = "experience_required")]
    pub experience: Option<ExperienceRequirement>,
}

impl JobPosting {
    pub fn new(id: impl Into<String>, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            company: None,
            description: description.into(),
            required_skills: Vec::new(),
            location: None,
            salary: None,
            experience: None,
        }
    }

    /// Reject postings that cannot be scored.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(MatcherError::InvalidPosting("Posting has an empty id".to_string()));
        }
        if self.title.trim().is_empty() && self.description.trim().is_empty() {
            return Err(MatcherError::InvalidPosting(format!(
                "Posting '{}' has neither title nor description",
                self.id
            )));
        }
        if let Some(salary) = &self.salary {
            salary
                .validate()
                .map_err(|e| MatcherError::InvalidPosting(format!("Posting '{}': {}", self.id, e)))?;
        }
        Ok(())
    }

    /// Title and description joined, the text used for similarity.
    pub fn text(&self) -> String {
        match (self.title.trim(), self.description.trim()) {
            ("", description) => description.to_string(),
            (title, "") => title.to_string(),
            (title, description) => format!("{}\n{}", title, description),
        }
    }

    /// Load a JSON array of postings.
    pub fn load_all(path: &Path) -> Result<Vec<JobPosting>> {
        let content = std::fs::read_to_string(path)?;
        let postings: Vec<JobPosting> = serde_json::from_str(&content)?;
        Ok(postings)
    }
}

/// What the seeker is looking for. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferenceSet {
    #[serde(default)]
    pub desired_roles: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub salary: Option<SalaryRange>,
    #[serde(default)]
    pub experience_level: Option<ExperienceLevel>,
}

impl PreferenceSet {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let preferences: PreferenceSet = serde_json::from_str(&content)?;
        preferences.validate()?;
        Ok(preferences)
    }

    pub fn validate(&self) -> Result<()> {
        match &self.salary {
            Some(salary) => salary.validate(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_experience_parsing() {
        assert_eq!(
            "2-5 years".parse::<ExperienceRequirement>().unwrap(),
            ExperienceRequirement::Range { min: 2.0, max: 5.0 }
        );
        assert_eq!(
            "3+ years of experience".parse::<ExperienceRequirement>().unwrap(),
            ExperienceRequirement::Years(3.0)
        );
        assert_eq!(
            "Senior".parse::<ExperienceRequirement>().unwrap(),
            ExperienceRequirement::Level(ExperienceLevel::Senior)
        );
        assert!("whenever".parse::<ExperienceRequirement>().is_err());
    }

    #[test]
    fn test_min_years() {
        assert_eq!(ExperienceRequirement::Level(ExperienceLevel::Mid).min_years(), 2.0);
        assert_eq!(ExperienceRequirement::Range { min: 2.0, max: 5.0 }.min_years(), 2.0);
        assert_eq!(ExperienceRequirement::Years(7.0).min_years(), 7.0);
    }

    #[test]
    fn test_posting_deserialization() {
        let json = r#"{
            "id": "p-1",
            "title": "Backend Engineer",
            "description": "Build APIs",
            "required_skills": ["Python", "SQL"],
            "salary": {"min": 80000, "max": 100000},
            "experience_required": "2-5 years"
        }"#;
        let posting: JobPosting = serde_json::from_str(json).unwrap();
        assert_eq!(posting.required_skills.len(), 2);
        assert_eq!(posting.salary, Some(SalaryRange { min: 80000.0, max: 100000.0 }));
        assert_eq!(posting.experience.map(|e| e.min_years()), Some(2.0));
        assert!(posting.location.is_none());

        let numeric: JobPosting =
            serde_json::from_str(r#"{"id": "p-2", "title": "SRE", "experience": 4}"#).unwrap();
        assert_eq!(numeric.experience, Some(ExperienceRequirement::Years(4.0)));
    }

    #[test]
    fn test_validation() {
        let empty = JobPosting::new("p-1", "  ", "");
        assert!(matches!(empty.validate(), Err(MatcherError::InvalidPosting(_))));

        let title_only = JobPosting::new("p-2", "Data Analyst", "");
        assert!(title_only.validate().is_ok());

        let mut inverted = JobPosting::new("p-3", "Engineer", "");
        inverted.salary = Some(SalaryRange { min: 10.0, max: 5.0 });
        assert!(matches!(inverted.validate(), Err(MatcherError::InvalidPosting(_))));
    }

    #[test]
    fn test_preferences_default_empty() {
        let prefs: PreferenceSet = serde_json::from_str("{}").unwrap();
        assert_eq!(prefs, PreferenceSet::default());

        let prefs: PreferenceSet =
            serde_json::from_str(r#"{"locations": ["Austin, TX"], "experience_level": "mid"}"#)
                .unwrap();
        assert_eq!(prefs.experience_level, Some(ExperienceLevel::Mid));
    }
}
