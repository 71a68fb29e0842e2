//! Skill normalization against the canonical vocabulary

use crate::processing::vocabulary::{fold, SkillVocabulary};
use std::collections::BTreeSet;
use strsim::jaro_winkler;

/// Candidates shorter than this are never fuzzy matched.
pub const MIN_FUZZY_CHARS: usize = 4;

pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.92;

/// How a candidate resolved to its canonical skill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NormalizationKind {
    Exact,
    Plural,
    Fuzzy(f64),
}

pub struct SkillNormalizer<'a> {
    vocabulary: &'a SkillVocabulary,
    fuzzy_threshold: f64,
}

impl<'a> SkillNormalizer<'a> {
    pub fn new(vocabulary: &'a SkillVocabulary, fuzzy_threshold: f64) -> Self {
        Self {
            vocabulary,
            fuzzy_threshold,
        }
    }

    /// Canonical skill name for a candidate, or `None` when unrecognized.
    pub fn normalize(&self, candidate: &str) -> Option<String> {
        self.normalize_with_kind(candidate).map(|(name, _)| name)
    }

    pub fn normalize_with_kind(&self, candidate: &str) -> Option<(String, NormalizationKind)> {
        let folded = fold(candidate.trim_matches(|c: char| c.is_whitespace() || c == '.' || c == ','));
        if folded.is_empty() {
            return None;
        }

        if let Some(canonical) = self.vocabulary.resolve(&folded) {
            return Some((canonical.to_string(), NormalizationKind::Exact));
        }

        if let Some(canonical) = self.depluralize(&folded) {
            return Some((canonical.to_string(), NormalizationKind::Plural));
        }

        self.fuzzy_match(&folded)
            .map(|(canonical, similarity)| (canonical, NormalizationKind::Fuzzy(similarity)))
    }

    /// Normalize many candidates into a sorted, deduplicated skill set.
    pub fn normalize_all<'s, I>(&self, candidates: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'s str>,
    {
        let mut skills = BTreeSet::new();
        let (mut plural, mut fuzzy) = (0usize, 0usize);
        for (name, kind) in candidates
            .into_iter()
            .filter_map(|c| self.normalize_with_kind(c))
        {
            match kind {
                NormalizationKind::Exact => {}
                NormalizationKind::Plural => plural += 1,
                NormalizationKind::Fuzzy(_) => fuzzy += 1,
            }
            skills.insert(name);
        }
        if plural + fuzzy > 0 {
            log::debug!(
                "Normalized {} skills ({} plural, {} fuzzy)",
                skills.len(),
                plural,
                fuzzy
            );
        }
        skills
    }

    fn depluralize(&self, folded: &str) -> Option<&'a str> {
        if folded.chars().count() < MIN_FUZZY_CHARS {
            return None;
        }
        if let Some(stem) = folded.strip_suffix("ies") {
            if let Some(canonical) = self.vocabulary.resolve(&format!("{}y", stem)) {
                return Some(canonical);
            }
        }
        if let Some(stem) = folded.strip_suffix("es") {
            if let Some(canonical) = self.vocabulary.resolve(stem) {
                return Some(canonical);
            }
        }
        folded
            .strip_suffix('s')
            .and_then(|stem| self.vocabulary.resolve(stem))
    }

    fn fuzzy_match(&self, folded: &str) -> Option<(String, f64)> {
        if folded.chars().count() < MIN_FUZZY_CHARS {
            return None;
        }

        let mut best: Option<(&str, f64)> = None;
        for (surface, canonical) in self.vocabulary.surface_forms() {
            if surface.chars().count() < MIN_FUZZY_CHARS {
                continue;
            }
            let similarity = jaro_winkler(folded, surface);
            if similarity < self.fuzzy_threshold {
                continue;
            }
            best = match best {
                None => Some((canonical, similarity)),
                Some((current, score)) => {
                    if similarity > score || (similarity == score && canonical < current) {
                        Some((canonical, similarity))
                    } else {
                        Some((current, score))
                    }
                }
            };
        }

        if let Some((canonical, similarity)) = best {
            log::debug!("Fuzzy matched '{}' -> '{}' ({:.3})", folded, canonical, similarity);
        }
        best.map(|(canonical, similarity)| (canonical.to_string(), similarity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::vocabulary::SkillEntry;

    fn builtin() -> SkillVocabulary {
        SkillVocabulary::builtin()
    }

    #[test]
    fn test_exact_and_synonym() {
        let vocab = builtin();
        let normalizer = SkillNormalizer::new(&vocab, DEFAULT_FUZZY_THRESHOLD);

        assert_eq!(normalizer.normalize("PYTHON"), Some("python".to_string()));
        assert_eq!(normalizer.normalize("Golang"), Some("go".to_string()));
        assert_eq!(normalizer.normalize(" ReactJS. "), Some("react".to_string()));
        assert_eq!(
            normalizer.normalize_with_kind("k8s").map(|(_, kind)| kind),
            Some(NormalizationKind::Exact)
        );
    }

    #[test]
    fn test_plural_stripping() {
        let vocab = builtin();
        let normalizer = SkillNormalizer::new(&vocab, DEFAULT_FUZZY_THRESHOLD);

        assert_eq!(normalizer.normalize("Microservice"), Some("microservices".to_string()));
        assert_eq!(normalizer.normalize("rest apis"), Some("rest api".to_string()));
        assert_eq!(
            normalizer.normalize_with_kind("Dockers"),
            Some(("docker".to_string(), NormalizationKind::Plural))
        );
    }

    #[test]
    fn test_fuzzy_match_above_threshold() {
        let vocab = builtin();
        let normalizer = SkillNormalizer::new(&vocab, DEFAULT_FUZZY_THRESHOLD);

        assert_eq!(normalizer.normalize("Pythn"), Some("python".to_string()));
        assert_eq!(normalizer.normalize("Kubernets"), Some("kubernetes".to_string()));
        assert_eq!(normalizer.normalize("Stanford University"), None);
    }

    #[test]
    fn test_short_candidates_skip_fuzzy() {
        let vocab = builtin();
        let normalizer = SkillNormalizer::new(&vocab, 0.5);
        assert_eq!(normalizer.normalize("Gx"), None);
        assert_eq!(normalizer.normalize("Jav"), None);
    }

    #[test]
    fn test_fuzzy_ties_break_by_name() {
        let skills = vec![
            SkillEntry {
                name: "abcdx".into(),
                category: "Other Tools".into(),
                synonyms: BTreeSet::new(),
            },
            SkillEntry {
                name: "abcdy".into(),
                category: "Other Tools".into(),
                synonyms: BTreeSet::new(),
            },
        ];
        let vocab = SkillVocabulary::new("tie", skills).unwrap();
        let normalizer = SkillNormalizer::new(&vocab, 0.8);
        assert_eq!(normalizer.normalize("abcdz"), Some("abcdx".to_string()));
    }

    #[test]
    fn test_normalize_all_dedupes() {
        let vocab = builtin();
        let normalizer = SkillNormalizer::new(&vocab, DEFAULT_FUZZY_THRESHOLD);
        let skills = normalizer.normalize_all(["Python", "python3", "Postgres", "COBOL"]);
        let skills: Vec<&str> = skills.iter().map(String::as_str).collect();
        assert_eq!(skills, vec!["postgresql", "python"]);
    }

    #[test]
    fn test_normalize_all_accepts_every_kind() {
        let vocab = builtin();
        let normalizer = SkillNormalizer::new(&vocab, DEFAULT_FUZZY_THRESHOLD);
        let skills = normalizer.normalize_all(["Python", "Dockers", "Kubernets", "COBOL"]);
        let skills: Vec<&str> = skills.iter().map(String::as_str).collect();
        assert_eq!(skills, vec!["docker", "kubernetes", "python"]);
    }
}
