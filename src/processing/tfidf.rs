//! TF-IDF vectorizer and keyword scoring
//!
//! The model is fitted offline over posting texts plus the vocabulary's
//! canonical names and is never mutated afterwards. Refits build a fresh
//! model that the engine publishes as part of a new snapshot.

use crate::processing::normalizer::SkillNormalizer;
use crate::processing::posting::JobPosting;
use crate::processing::text_processor::TextProcessor;
use crate::processing::vocabulary::{fold, SkillVocabulary};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Sparse L2-normalized vector: (term index, weight), sorted by index.
pub type SparseVector = Vec<(usize, f32)>;

pub struct TfIdfModel {
    /// term -> dimension index
    terms: HashMap<String, usize>,
    idf: Vec<f32>,
    document_count: usize,
    processor: TextProcessor,
}

impl TfIdfModel {
    /// Fit over `documents` plus one pseudo-document per canonical skill.
    pub fn fit<S: AsRef<str>>(documents: &[S], vocabulary: &SkillVocabulary) -> Self {
        let processor = TextProcessor::new();
        let corpus: Vec<Vec<String>> = documents
            .iter()
            .map(|d| processor.terms(d.as_ref()))
            .chain(vocabulary.canonical_names().map(|name| processor.terms(name)))
            .filter(|terms| !terms.is_empty())
            .collect();

        let n = corpus.len() as f32;
        let mut terms: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: Vec<f32> = Vec::new();

        for document in &corpus {
            let unique: HashSet<&str> = document.iter().map(String::as_str).collect();
            // Sorted so dimension indices do not depend on hash order.
            let mut unique: Vec<&str> = unique.into_iter().collect();
            unique.sort_unstable();
            for term in unique {
                let next = terms.len();
                let idx = *terms.entry(term.to_string()).or_insert(next);
                if idx == doc_freq.len() {
                    doc_freq.push(0.0);
                }
                doc_freq[idx] += 1.0;
            }
        }

        let idf = doc_freq
            .iter()
            .map(|df| (n / df.max(1.0)).ln() + 1.0)
            .collect();

        log::info!(
            "Fitted TF-IDF model: {} documents, {} terms",
            corpus.len(),
            terms.len()
        );

        Self {
            terms,
            idf,
            document_count: corpus.len(),
            processor,
        }
    }

    pub fn dimensions(&self) -> usize {
        self.idf.len()
    }

    pub fn document_count(&self) -> usize {
        self.document_count
    }

    pub fn transform(&self, text: &str) -> SparseVector {
        let mut tf: HashMap<usize, f32> = HashMap::new();
        for term in self.processor.terms(text) {
            if let Some(&idx) = self.terms.get(&term) {
                *tf.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut vector: SparseVector = tf
            .into_iter()
            .map(|(idx, count)| (idx, count * self.idf[idx]))
            .collect();
        vector.sort_unstable_by_key(|(idx, _)| *idx);

        let norm = vector.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, w) in vector.iter_mut() {
                *w /= norm;
            }
        }
        vector
    }

    /// Cosine similarity of two texts in [0, 1]; 0 when either has no known terms.
    pub fn text_similarity(&self, a: &str, b: &str) -> f32 {
        sparse_dot(&self.transform(a), &self.transform(b)).clamp(0.0, 1.0)
    }
}

fn sparse_dot(a: &SparseVector, b: &SparseVector) -> f32 {
    let (mut i, mut j, mut sum) = (0, 0, 0.0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                sum += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    sum
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillMatch {
    /// Share of required skills the profile has, 0-100.
    pub score: f32,
    pub matched: Vec<String>,
    pub missing: Vec<String>,
    /// TF-IDF cosine of profile and posting text, 0-100. Not part of the composite.
    pub keyword_similarity: f32,
}

pub struct KeywordScorer<'a> {
    model: &'a TfIdfModel,
    normalizer: SkillNormalizer<'a>,
}

impl<'a> KeywordScorer<'a> {
    pub fn new(model: &'a TfIdfModel, vocabulary: &'a SkillVocabulary, fuzzy_threshold: f64) -> Self {
        Self {
            model,
            normalizer: SkillNormalizer::new(vocabulary, fuzzy_threshold),
        }
    }

    /// Required skills after normalization. Unrecognized ones stay, case-folded,
    /// so they still count against the profile.
    pub fn required_skills(&self, posting: &JobPosting) -> BTreeSet<String> {
        posting
            .required_skills
            .iter()
            .filter(|s| !s.trim().is_empty())
            .map(|s| self.normalizer.normalize(s).unwrap_or_else(|| fold(s)))
            .collect()
    }

    /// |required ∩ profile| / |required| × 100. No requirements is a full match.
    pub fn score(&self, profile_skills: &BTreeSet<String>, profile_text: &str, posting: &JobPosting) -> SkillMatch {
        let required = self.required_skills(posting);
        let (matched, missing): (Vec<String>, Vec<String>) = required
            .into_iter()
            .partition(|skill| profile_skills.contains(skill));

        let total = matched.len() + missing.len();
        let score = if total == 0 {
            100.0
        } else {
            matched.len() as f32 / total as f32 * 100.0
        };

        SkillMatch {
            score,
            matched,
            missing,
            keyword_similarity: self.model.text_similarity(profile_text, &posting.text()) * 100.0,
        }
    }
}
