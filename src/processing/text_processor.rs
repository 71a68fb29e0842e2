//! Text processing and normalization

use regex::Regex;
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

/// Characters kept when a resume has too few sentences to summarize.
const SUMMARY_FALLBACK_CHARS: usize = 500;
/// Lines at the top of a resume searched for a home location.
const HEADER_LINES: usize = 6;

pub struct TextProcessor {
    stop_words: HashSet<&'static str>,
    whitespace_regex: Regex,
    email_regex: Regex,
    phone_regex: Regex,
    location_regex: Regex,
}

impl Default for TextProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextProcessor {
    pub fn new() -> Self {
        Self {
            stop_words: STOP_WORDS.iter().copied().collect(),
            whitespace_regex: Regex::new(r"\s+").expect("Invalid whitespace regex"),
            email_regex: Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}")
                .expect("Invalid email regex"),
            phone_regex: Regex::new(r"(?:\+?1[-. ]?)?\(?\b[0-9]{3}\)?[-. ]?[0-9]{3}[-. ]?[0-9]{4}\b")
                .expect("Invalid phone regex"),
            location_regex: Regex::new(
                r"^[A-Z][A-Za-z.'-]*(?:\s+[A-Z][A-Za-z.'-]*){0,3},\s*(?:[A-Z]{2}|[A-Z][a-z]+(?:\s+[A-Z][a-z]+){0,2})$",
            )
            .expect("Invalid location regex"),
        }
    }

    pub fn find_email(&self, text: &str) -> Option<String> {
        self.email_regex.find(text).map(|m| m.as_str().to_string())
    }

    pub fn find_phone(&self, text: &str) -> Option<String> {
        self.phone_regex.find(text).map(|m| m.as_str().trim().to_string())
    }

    /// A "City, Region" segment in the resume header, e.g. `Austin, TX`.
    pub fn find_location(&self, text: &str) -> Option<String> {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .take(HEADER_LINES)
            .flat_map(|line| line.split(|c: char| matches!(c, '|' | '\u{2022}' | '\u{00B7}')))
            .map(str::trim)
            .find(|segment| self.location_regex.is_match(segment))
            .map(str::to_string)
    }

    /// Normalize typography and collapse whitespace.
    pub fn clean_text(&self, text: &str) -> String {
        let normalized = Self::normalize_unicode(text);
        self.whitespace_regex
            .replace_all(&normalized, " ")
            .trim()
            .to_string()
    }

    /// Lowercased word tokens with stop words and single letters removed.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.unicode_words()
            .map(str::to_lowercase)
            .filter(|w| w.chars().count() > 1)
            .filter(|w| w.chars().any(char::is_alphabetic))
            .filter(|w| !self.stop_words.contains(w.as_str()))
            .collect()
    }

    /// Unigrams followed by adjacent bigrams, the term space of the TF-IDF model.
    pub fn terms(&self, text: &str) -> Vec<String> {
        let tokens = self.tokenize(text);
        let bigrams: Vec<String> = tokens
            .windows(2)
            .map(|pair| format!("{} {}", pair[0], pair[1]))
            .collect();

        let mut terms = tokens;
        terms.extend(bigrams);
        terms
    }

    pub fn split_sentences(&self, text: &str) -> Vec<String> {
        text.unicode_sentences()
            .map(|s| self.clean_text(s))
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// First `max_sentences` sentences, or a character prefix when the text
    /// has too few sentence boundaries to be meaningful.
    pub fn summarize(&self, text: &str, max_sentences: usize) -> String {
        let sentences = self.split_sentences(text);
        if sentences.len() >= max_sentences {
            sentences[..max_sentences].join(" ")
        } else {
            self.clean_text(text)
                .chars()
                .take(SUMMARY_FALLBACK_CHARS)
                .collect()
        }
    }

    fn normalize_unicode(text: &str) -> String {
        text.chars()
            .map(|c| match c {
                '\u{2018}' | '\u{2019}' => '\'',
                '\u{201C}' | '\u{201D}' => '"',
                '\u{2013}' | '\u{2014}' => '-',
                '\u{2022}' | '\u{25CF}' => ' ',
                '\u{00A0}' => ' ',
                _ => c,
            })
            .collect()
    }
}

const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "etc", "few",
    "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "him", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just", "me",
    "more", "most", "my", "no", "nor", "not", "now", "of", "off", "on", "once", "only", "or",
    "other", "our", "ours", "out", "over", "own", "per", "same", "she", "should", "so", "some",
    "such", "than", "that", "the", "their", "them", "then", "there", "these", "they", "this",
    "those", "through", "to", "too", "under", "until", "up", "us", "very", "via", "was", "we",
    "were", "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with",
    "within", "would", "you", "your", "yours",
];
