//! Canonical skill vocabulary
//!
//! Maps each canonical skill name to the surface forms that resumes and job
//! postings use for it. A vocabulary is immutable once built; administrative
//! rebuilds produce a new value with a new `version`.

use crate::error::{MatcherError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

pub const BUILTIN_VERSION: &str = "builtin-1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillEntry {
    pub name: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub synonyms: BTreeSet<String>,
}

fn default_category() -> String {
    "Other Tools".to_string()
}

/// On-disk layout of a vocabulary file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct VocabularyFile {
    version: String,
    skills: Vec<SkillEntry>,
}

#[derive(Debug, Clone)]
pub struct SkillVocabulary {
    version: String,
    entries: BTreeMap<String, SkillEntry>,
    /// lowercased surface form (canonical names included) -> canonical name
    surface_index: HashMap<String, String>,
}

impl SkillVocabulary {
    /// Build from entries, case-folding every name and rejecting synonyms
    /// that would map to two different canonical skills.
    pub fn new(version: impl Into<String>, skills: Vec<SkillEntry>) -> Result<Self> {
        let mut entries = BTreeMap::new();
        let mut surface_index = HashMap::new();

        for skill in skills {
            let name = fold(&skill.name);
            if name.is_empty() {
                return Err(MatcherError::Vocabulary("Skill with empty name".to_string()));
            }
            let synonyms: BTreeSet<String> = skill
                .synonyms
                .iter()
                .map(|s| fold(s))
                .filter(|s| !s.is_empty() && *s != name)
                .collect();

            for surface in std::iter::once(&name).chain(synonyms.iter()) {
                if let Some(existing) = surface_index.insert(surface.clone(), name.clone()) {
                    if existing != name {
                        return Err(MatcherError::Vocabulary(format!(
                            "Surface form '{}' maps to both '{}' and '{}'",
                            surface, existing, name
                        )));
                    }
                }
            }

            entries.insert(
                name.clone(),
                SkillEntry {
                    name,
                    category: skill.category,
                    synonyms,
                },
            );
        }

        Ok(Self {
            version: version.into(),
            entries,
            surface_index,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: VocabularyFile = toml::from_str(content)
            .map_err(|e| MatcherError::Vocabulary(format!("Failed to parse vocabulary: {}", e)))?;
        Self::new(file.version, file.skills)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        let file = VocabularyFile {
            version: self.version.clone(),
            skills: self.entries.values().cloned().collect(),
        };
        toml::to_string_pretty(&file)
            .map_err(|e| MatcherError::Vocabulary(format!("Failed to serialize vocabulary: {}", e)))
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Canonical name for a case-insensitive canonical or synonym surface form.
    pub fn resolve(&self, surface: &str) -> Option<&str> {
        self.surface_index.get(&fold(surface)).map(String::as_str)
    }

    pub fn contains(&self, canonical: &str) -> bool {
        self.entries.contains_key(canonical)
    }

    pub fn entry(&self, canonical: &str) -> Option<&SkillEntry> {
        self.entries.get(canonical)
    }

    /// Canonical names in sorted order.
    pub fn canonical_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Canonical names grouped by category, both sorted.
    pub fn by_category(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut groups: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for entry in self.entries.values() {
            groups
                .entry(entry.category.as_str())
                .or_default()
                .push(entry.name.as_str());
        }
        groups
    }

    /// Every (surface form, canonical name) pair, canonical names included.
    pub fn surface_forms(&self) -> impl Iterator<Item = (&str, &str)> {
        self.surface_index
            .iter()
            .map(|(surface, canonical)| (surface.as_str(), canonical.as_str()))
    }

    /// The taxonomy the resume parser has always shipped with.
    pub fn builtin() -> Self {
        let table: &[(&str, &[(&str, &[&str])])] = &[
            (
                "Programming Languages",
                &[
                    ("python", &["python3", "py"]),
                    ("java", &[]),
                    ("javascript", &["js", "ecmascript", "es6"]),
                    ("typescript", &[]),
                    ("c++", &["cpp", "cplusplus"]),
                    ("c#", &["csharp", "c sharp"]),
                    ("ruby", &[]),
                    ("go", &["golang"]),
                    ("rust", &["rustlang"]),
                    ("php", &[]),
                    ("swift", &[]),
                    ("kotlin", &[]),
                    ("scala", &[]),
                    ("r", &["r language"]),
                    ("matlab", &[]),
                    ("perl", &[]),
                    ("sql", &["structured query language"]),
                ],
            ),
            (
                "Web Frameworks",
                &[
                    ("react", &["reactjs", "react.js"]),
                    ("angular", &["angularjs", "angular.js"]),
                    ("vue", &["vuejs", "vue.js"]),
                    ("django", &[]),
                    ("flask", &[]),
                    ("fastapi", &["fast api"]),
                    ("express", &["expressjs", "express.js"]),
                    ("spring", &["spring boot", "springboot"]),
                    ("laravel", &[]),
                    ("rails", &["ruby on rails", "ror"]),
                    ("nextjs", &["next.js", "next js"]),
                    ("nuxt", &["nuxtjs", "nuxt.js"]),
                    ("svelte", &["sveltekit"]),
                    ("node.js", &["nodejs", "node js"]),
                ],
            ),
            (
                "Databases",
                &[
                    ("postgresql", &["postgres", "psql"]),
                    ("mysql", &[]),
                    ("mongodb", &["mongo"]),
                    ("redis", &[]),
                    ("elasticsearch", &["elastic search"]),
                    ("cassandra", &[]),
                    ("dynamodb", &["dynamo db"]),
                    ("oracle", &[]),
                    ("sql server", &["mssql", "microsoft sql server"]),
                    ("sqlite", &[]),
                    ("neo4j", &[]),
                ],
            ),
            (
                "Cloud Platforms",
                &[
                    ("aws", &["amazon web services"]),
                    ("azure", &["microsoft azure"]),
                    ("gcp", &["google cloud", "google cloud platform"]),
                    ("heroku", &[]),
                    ("digitalocean", &["digital ocean"]),
                    ("vercel", &[]),
                    ("netlify", &[]),
                    ("cloudflare", &[]),
                ],
            ),
            (
                "DevOps Tools",
                &[
                    ("docker", &[]),
                    ("kubernetes", &["k8s"]),
                    ("jenkins", &[]),
                    ("gitlab ci", &["gitlab-ci"]),
                    ("github actions", &[]),
                    ("terraform", &[]),
                    ("ansible", &[]),
                    ("circleci", &["circle ci"]),
                    ("travis ci", &["travis"]),
                ],
            ),
            (
                "Data Science",
                &[
                    ("machine learning", &["ml"]),
                    ("deep learning", &[]),
                    ("nlp", &["natural language processing"]),
                    ("computer vision", &[]),
                    ("tensorflow", &[]),
                    ("pytorch", &["torch"]),
                    ("scikit-learn", &["sklearn", "scikit learn"]),
                    ("pandas", &[]),
                    ("numpy", &[]),
                    ("keras", &[]),
                ],
            ),
            (
                "Other Tools",
                &[
                    ("git", &[]),
                    ("linux", &[]),
                    ("bash", &["shell scripting"]),
                    ("rest api", &["restful", "restful api", "rest apis"]),
                    ("graphql", &[]),
                    ("microservices", &["micro services", "microservice"]),
                    ("agile", &[]),
                    ("scrum", &[]),
                    ("jira", &[]),
                    ("confluence", &[]),
                ],
            ),
        ];

        let skills = table
            .iter()
            .flat_map(|(category, skills)| {
                skills.iter().map(move |(name, synonyms)| SkillEntry {
                    name: name.to_string(),
                    category: category.to_string(),
                    synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
                })
            })
            .collect();

        // The table above is static and collision-free; covered by tests.
        Self::new(BUILTIN_VERSION, skills).unwrap_or_else(|e| panic!("builtin vocabulary: {}", e))
    }
}

/// Case-fold and collapse internal whitespace.
pub(crate) fn fold(surface: &str) -> String {
    surface
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
