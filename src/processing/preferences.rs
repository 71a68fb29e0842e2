//! Preference compatibility: experience, location and salary sub-scores
//!
//! Every sub-score lies in [0, 100]. A missing preference or posting field
//! yields the neutral score of 50.

use crate::config::MatchingConfig;
use crate::processing::posting::{JobPosting, PreferenceSet, SalaryRange};
use crate::processing::profile::ExtractedProfile;

pub const NEUTRAL_SCORE: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreferenceScores {
    pub experience_match: f32,
    pub location_match: f32,
    pub salary_match: f32,
}

#[derive(Debug, Clone)]
pub struct PreferenceScorer {
    experience_tolerance_years: f32,
    region_partial_credit: f32,
}

impl Default for PreferenceScorer {
    fn default() -> Self {
        Self::from_config(&MatchingConfig::default())
    }
}

impl PreferenceScorer {
    pub fn new(experience_tolerance_years: f32, region_partial_credit: f32) -> Self {
        Self {
            experience_tolerance_years: experience_tolerance_years.max(0.0),
            region_partial_credit: region_partial_credit.clamp(0.0, 100.0),
        }
    }

    pub fn from_config(config: &MatchingConfig) -> Self {
        Self::new(config.experience_tolerance_years, config.region_partial_credit)
    }

    pub fn score(
        &self,
        profile: &ExtractedProfile,
        posting: &JobPosting,
        preferences: &PreferenceSet,
    ) -> PreferenceScores {
        PreferenceScores {
            experience_match: self.experience_match(profile, posting, preferences),
            location_match: self.location_match(&preferences.locations, posting.location.as_deref()),
            salary_match: salary_match(preferences.salary.as_ref(), posting.salary.as_ref()),
        }
    }

    /// Full marks when the candidate meets the requirement, then a linear
    /// decay to 0 over `experience_tolerance_years` of shortfall.
    pub fn experience_match(
        &self,
        profile: &ExtractedProfile,
        posting: &JobPosting,
        preferences: &PreferenceSet,
    ) -> f32 {
        let Some(requirement) = posting.experience else {
            return NEUTRAL_SCORE;
        };

        let candidate_years = if profile.has_work_history() {
            profile.years_experience
        } else if let Some(level) = preferences.experience_level {
            level.years()
        } else {
            return NEUTRAL_SCORE;
        };

        let shortfall = requirement.min_years() - candidate_years;
        if shortfall <= 0.0 {
            100.0
        } else if self.experience_tolerance_years <= 0.0 {
            0.0
        } else {
            (100.0 * (1.0 - shortfall / self.experience_tolerance_years)).clamp(0.0, 100.0)
        }
    }

    /// Best score over the desired locations.
    pub fn location_match(&self, desired: &[String], posting_location: Option<&str>) -> f32 {
        let desired: Vec<&String> = desired.iter().filter(|d| !d.trim().is_empty()).collect();
        let posting_location = match posting_location.map(str::trim) {
            Some(location) if !location.is_empty() => location,
            _ => return NEUTRAL_SCORE,
        };
        if desired.is_empty() {
            return NEUTRAL_SCORE;
        }

        desired
            .iter()
            .map(|d| self.single_location(d, posting_location))
            .fold(0.0, f32::max)
    }

    fn single_location(&self, desired: &str, posting: &str) -> f32 {
        let desired = normalize_location(desired);
        let posting = normalize_location(posting);

        // Only a remote posting earns full credit on its own.
        if desired == posting || is_remote(&posting) {
            return 100.0;
        }
        if is_remote(&desired) {
            return 0.0;
        }

        let desired_parts = components(&desired);
        let posting_parts = components(&posting);
        let shares_region = regions(&desired_parts)
            .iter()
            .any(|r| regions(&posting_parts).contains(r))
            || (desired_parts.len() == 1 && posting_parts.contains(&desired_parts[0]))
            || (posting_parts.len() == 1 && desired_parts.contains(&posting_parts[0]));

        if shares_region {
            self.region_partial_credit
        } else {
            0.0
        }
    }
}

/// Share of the preferred range the posting pays for.
pub fn salary_match(preferred: Option<&SalaryRange>, posting: Option<&SalaryRange>) -> f32 {
    let (Some(preferred), Some(posting)) = (preferred, posting) else {
        return NEUTRAL_SCORE;
    };

    if preferred.span() <= 0.0 {
        return if posting.contains(preferred.min) { 100.0 } else { 0.0 };
    }
    if posting.min <= preferred.min && preferred.max <= posting.max {
        return 100.0;
    }

    let overlap = preferred.max.min(posting.max) - preferred.min.max(posting.min);
    if overlap <= 0.0 {
        return 0.0;
    }
    ((overlap / preferred.span()) * 100.0).clamp(0.0, 100.0) as f32
}

fn normalize_location(location: &str) -> String {
    location
        .split(',')
        .map(|part| part.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

fn components(location: &str) -> Vec<&str> {
    location.split(", ").collect()
}

/// Everything after the city; a bare name is its own region.
fn regions<'a>(parts: &'a [&'a str]) -> &'a [&'a str] {
    if parts.len() > 1 {
        &parts[1..]
    } else {
        parts
    }
}

fn is_remote(location: &str) -> bool {
    location
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word == "remote" || word == "anywhere")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::posting::{ExperienceLevel, ExperienceRequirement};
    use crate::processing::profile::WorkSpan;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn profile_with_years(years: f32) -> ExtractedProfile {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        ExtractedProfile {
            years_experience: years,
            work_history: vec![WorkSpan {
                title: None,
                organization: None,
                start,
                end: start,
            }],
            ..Default::default()
        }
    }

    fn posting_requiring(requirement: Option<ExperienceRequirement>) -> JobPosting {
        let mut posting = JobPosting::new("p-1", "Engineer", "Build things");
        posting.experience = requirement;
        posting
    }

    fn locations(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_salary_partial_overlap() {
        let posting = SalaryRange { min: 80_000.0, max: 100_000.0 };
        let preferred = SalaryRange { min: 90_000.0, max: 120_000.0 };
        assert_relative_eq!(
            salary_match(Some(&preferred), Some(&posting)),
            33.333_33,
            epsilon = 1e-3
        );
    }

    #[test]
    fn test_salary_edges() {
        let posting = SalaryRange { min: 80_000.0, max: 150_000.0 };
        let inside = SalaryRange { min: 90_000.0, max: 120_000.0 };
        let disjoint = SalaryRange { min: 200_000.0, max: 250_000.0 };
        let point = SalaryRange { min: 100_000.0, max: 100_000.0 };

        assert_eq!(salary_match(Some(&inside), Some(&posting)), 100.0);
        assert_eq!(salary_match(Some(&disjoint), Some(&posting)), 0.0);
        assert_eq!(salary_match(Some(&point), Some(&posting)), 100.0);
        assert_eq!(salary_match(Some(&disjoint), None), NEUTRAL_SCORE);
        assert_eq!(salary_match(None, Some(&posting)), NEUTRAL_SCORE);
    }

    #[test]
    fn test_experience_decay() {
        let scorer = PreferenceScorer::new(2.0, 60.0);
        let prefs = PreferenceSet::default();
        let senior = posting_requiring(Some(ExperienceRequirement::Level(ExperienceLevel::Senior)));

        assert_eq!(scorer.experience_match(&profile_with_years(6.0), &senior, &prefs), 100.0);
        assert_relative_eq!(scorer.experience_match(&profile_with_years(4.0), &senior, &prefs), 50.0);
        assert_eq!(scorer.experience_match(&profile_with_years(1.0), &senior, &prefs), 0.0);
    }

    #[test]
    fn test_experience_neutral_and_fallback() {
        let scorer = PreferenceScorer::default();
        let empty = ExtractedProfile::default();
        let mid = posting_requiring(Some(ExperienceRequirement::Range { min: 2.0, max: 5.0 }));

        assert_eq!(
            scorer.experience_match(&profile_with_years(1.0), &posting_requiring(None), &PreferenceSet::default()),
            NEUTRAL_SCORE
        );
        assert_eq!(scorer.experience_match(&empty, &mid, &PreferenceSet::default()), NEUTRAL_SCORE);

        let prefs = PreferenceSet {
            experience_level: Some(ExperienceLevel::Mid),
            ..Default::default()
        };
        assert_eq!(scorer.experience_match(&empty, &mid, &prefs), 100.0);
    }

    #[test]
    fn test_location_rules() {
        let scorer = PreferenceScorer::new(2.0, 60.0);

        assert_eq!(scorer.location_match(&locations(&["Austin, TX"]), Some("austin,  tx")), 100.0);
        assert_eq!(scorer.location_match(&locations(&["Austin, TX"]), Some("Remote (US)")), 100.0);
        assert_eq!(scorer.location_match(&locations(&["Remote"]), Some("Remote")), 100.0);
        assert_eq!(scorer.location_match(&locations(&["Austin, TX"]), Some("Dallas, TX")), 60.0);
        assert_eq!(scorer.location_match(&locations(&["Germany"]), Some("Berlin, Germany")), 60.0);
        assert_eq!(scorer.location_match(&locations(&["Austin, TX"]), Some("Berlin, Germany")), 0.0);
        assert_eq!(
            scorer.location_match(&locations(&["Berlin, Germany", "Dallas, TX"]), Some("Austin, TX")),
            60.0
        );
    }

    #[test]
    fn test_remote_seeker_gets_no_credit_for_onsite_posting() {
        let scorer = PreferenceScorer::new(2.0, 60.0);
        assert_eq!(scorer.location_match(&locations(&["Remote"]), Some("Berlin, Germany")), 0.0);
        assert_eq!(
            scorer.location_match(&locations(&["Remote", "Dallas, TX"]), Some("Austin, TX")),
            60.0
        );
        assert_eq!(
            scorer.location_match(&locations(&["Anywhere"]), Some("Remote - EMEA")),
            100.0
        );
    }

    #[test]
    fn test_location_neutral_when_missing() {
        let scorer = PreferenceScorer::default();
        assert_eq!(scorer.location_match(&[], Some("Austin, TX")), NEUTRAL_SCORE);
        assert_eq!(scorer.location_match(&locations(&["Austin, TX"]), None), NEUTRAL_SCORE);
        assert_eq!(scorer.location_match(&locations(&["  "]), Some("Austin, TX")), NEUTRAL_SCORE);
    }
}
