//! Typed question and profile catalogs.
//!
//! Both catalogs are externally authored JSON, loaded once into immutable
//! typed records. The crate embeds a default of each (`catalog/data/*.json`)
//! and caches it in a `OnceLock`, so every classification observes one
//! consistent snapshot; deployments can instead point the loaders at their
//! own files. The profile catalog must share key space with the Classifier's
//! target table for a profile to be selectable.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Embedded default question catalog (pt-BR, 8 statements per axis).
const EMBEDDED_QUESTIONS_JSON: &str = include_str!("data/questions.json");

/// Embedded default profile records (pt-BR, one per archetype key).
const EMBEDDED_PROFILES_JSON: &str = include_str!("data/profiles.json");

/// Errors raised while loading or validating a catalog file.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid catalog entry: {0}")]
    Invalid(String),
}

/// One axis a question contributes to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisContribution {
    /// Axis name, usually one of the five canonical axes.
    pub name: String,
    /// Signed multiplier; +1 means agreement pushes the axis positive.
    #[serde(default = "default_direction")]
    pub direction: f64,
    /// Non-negative weight of this question on the axis.
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_direction() -> f64 {
    1.0
}

fn default_weight() -> f64 {
    1.0
}

/// A quiz statement. The text is opaque to the scoring core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Stable identifier, e.g. `"EC1"`.
    pub id: String,
    /// The statement shown to the respondent.
    pub text: String,
    /// Axes this question contributes to. A question may touch several.
    pub axes: Vec<AxisContribution>,
}

/// Questions grouped by axis name, in the file's key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionCatalog {
    pub by_axis: BTreeMap<String, Vec<Question>>,
}

/// A question paired with the axis group it was filed under, the flattened
/// shape the quiz frontend consumes.
#[derive(Debug, Clone, Serialize)]
pub struct FlatQuestion {
    #[serde(flatten)]
    pub question: Question,
    pub axis: String,
}

impl QuestionCatalog {
    /// Parse a catalog from JSON text and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Every question must carry an id and non-negative axis weights.
    pub fn validate(&self) -> Result<(), CatalogError> {
        for (axis, questions) in &self.by_axis {
            for question in questions {
                if question.id.is_empty() {
                    return Err(CatalogError::Invalid(format!(
                        "question with empty id under axis '{axis}'"
                    )));
                }
                for contribution in &question.axes {
                    if contribution.weight < 0.0 {
                        return Err(CatalogError::Invalid(format!(
                            "question '{}' has negative weight on axis '{}'",
                            question.id, contribution.name
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Flatten into a single list, each question tagged with its axis group.
    pub fn flat(&self) -> Vec<FlatQuestion> {
        let mut flat = Vec::new();
        for (axis, questions) in &self.by_axis {
            for question in questions {
                flat.push(FlatQuestion {
                    question: question.clone(),
                    axis: axis.clone(),
                });
            }
        }
        flat
    }

    /// Build the id → question lookup the Aggregator folds over.
    pub fn index_by_id(&self) -> BTreeMap<&str, &Question> {
        let mut index = BTreeMap::new();
        for questions in self.by_axis.values() {
            for question in questions {
                index.insert(question.id.as_str(), question);
            }
        }
        index
    }

    /// Total number of questions across all axes.
    pub fn len(&self) -> usize {
        self.by_axis.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Descriptive metadata for one archetype profile.
///
/// Keyed by the same profile key as the Classifier's target table; a record
/// whose key has no target is simply never selected, and a target whose key
/// has no record is skipped during classification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub label: String,
    pub description_short: String,
    #[serde(default)]
    pub description_long: String,
    /// Per-axis reading of the archetype, e.g. "economic" → "centro-esquerda".
    #[serde(default)]
    pub axis_tendencies: BTreeMap<String, String>,
    #[serde(default)]
    pub authors_classic: Vec<String>,
    #[serde(default)]
    pub figures_modern_international: Vec<String>,
    #[serde(default)]
    pub figures_modern_national: Vec<String>,
    #[serde(default)]
    pub examples_practical: Vec<String>,
}

/// Profile records keyed by archetype key, iterated in sorted key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileCatalog {
    pub records: BTreeMap<String, ProfileRecord>,
}

impl ProfileCatalog {
    /// Parse a catalog from JSON text and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Every record must at least carry a label.
    pub fn validate(&self) -> Result<(), CatalogError> {
        for (key, record) in &self.records {
            if record.label.is_empty() {
                return Err(CatalogError::Invalid(format!(
                    "profile record '{key}' has an empty label"
                )));
            }
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&ProfileRecord> {
        self.records.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    /// First record in iteration order, the misalignment fallback candidate.
    pub fn first(&self) -> Option<(&String, &ProfileRecord)> {
        self.records.iter().next()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

static DEFAULT_QUESTIONS: OnceLock<QuestionCatalog> = OnceLock::new();
static DEFAULT_PROFILES: OnceLock<ProfileCatalog> = OnceLock::new();

/// The embedded default question catalog.
///
/// # Panics
/// Panics if the embedded JSON is malformed, which is a build defect.
pub fn default_questions() -> &'static QuestionCatalog {
    DEFAULT_QUESTIONS.get_or_init(|| {
        QuestionCatalog::from_json_str(EMBEDDED_QUESTIONS_JSON)
            .expect("embedded questions.json is invalid")
    })
}

/// The embedded default profile catalog.
///
/// # Panics
/// Panics if the embedded JSON is malformed, which is a build defect.
pub fn default_profiles() -> &'static ProfileCatalog {
    DEFAULT_PROFILES.get_or_init(|| {
        ProfileCatalog::from_json_str(EMBEDDED_PROFILES_JSON)
            .expect("embedded profiles.json is invalid")
    })
}
