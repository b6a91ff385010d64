//! The five ideological axes, the per-axis score vector, and normalization.
//!
//! - `economic`   — Estado vs Mercado
//! - `social`     — Autoridade/Ordem vs Liberdades Individuais
//! - `community`  — Nacional/Comunitário vs Cosmopolita/Global
//! - `method`     — Planejamento/Engenharia Social vs Incrementalismo
//! - `pragmatism` — Idealismo/Princípios vs Pragmatismo/Resultados

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Maximum raw magnitude one axis can reach with the shipped catalog:
/// 8 questions per axis × Likert magnitude 2 × weight 1.0. Raw scores beyond
/// this are clamped before rescaling; the constant is fixed here rather than
/// derived from whatever catalog happens to be loaded.
pub const MAX_ABS_RAW: f64 = 16.0;

/// One of the five canonical axes, in their fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Economic,
    Social,
    Community,
    Method,
    Pragmatism,
}

impl Axis {
    /// All five axes, in canonical order.
    pub const ALL: [Axis; 5] = [
        Axis::Economic,
        Axis::Social,
        Axis::Community,
        Axis::Method,
        Axis::Pragmatism,
    ];

    /// The stable name used in catalogs, API payloads, and stored scores.
    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::Economic => "economic",
            Axis::Social => "social",
            Axis::Community => "community",
            Axis::Method => "method",
            Axis::Pragmatism => "pragmatism",
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A score per axis, keyed by axis name.
///
/// Produced raw (unbounded) by the Aggregator. Always carries the five
/// canonical axes when built via [`AxisScores::zeroed`]; questions may
/// declare additional axis names, which are tracked alongside the canonical
/// five. Iteration order is deterministic (sorted by axis name).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AxisScores(pub BTreeMap<String, f64>);

impl AxisScores {
    /// An empty score vector.
    pub fn new() -> Self {
        Self::default()
    }

    /// A vector with all five canonical axes present at 0.0.
    pub fn zeroed() -> Self {
        let mut map = BTreeMap::new();
        for axis in Axis::ALL {
            map.insert(axis.as_str().to_string(), 0.0);
        }
        Self(map)
    }

    /// Score for an axis, 0.0 when absent.
    pub fn get(&self, axis: &str) -> f64 {
        self.0.get(axis).copied().unwrap_or(0.0)
    }

    /// Add `delta` to an axis, creating the entry at 0.0 on first use.
    pub fn add(&mut self, axis: &str, delta: f64) {
        *self.0.entry(axis.to_string()).or_insert(0.0) += delta;
    }

    /// True when the vector carries no signal: no entries at all, or every
    /// entry exactly zero. This is the Classifier's inconclusive condition.
    pub fn is_degenerate(&self) -> bool {
        self.0.is_empty() || self.0.values().all(|v| *v == 0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, f64)> for AxisScores {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Normalize raw axis scores to the `-10..+10` scale.
///
/// Each entry is clamped to `[-max_abs, +max_abs]` and rescaled linearly via
/// `(clamped / max_abs) * 10`. Non-finite values (NaN, ±inf) are dropped
/// rather than propagated. Axes absent from the input stay absent; distance
/// math downstream treats them as 0.0.
pub fn normalize_axes(scores: &AxisScores, max_abs: f64) -> BTreeMap<String, f64> {
    let mut norm = BTreeMap::new();
    for (axis, val) in scores.iter() {
        if !val.is_finite() {
            continue;
        }
        let clamped = val.clamp(-max_abs, max_abs);
        norm.insert(axis.clone(), (clamped / max_abs) * 10.0);
    }
    norm
}
