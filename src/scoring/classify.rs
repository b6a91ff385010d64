//! The Classifier: raw axis vector → nearest archetype profile.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{ProfileCatalog, ProfileRecord};
use crate::scoring::axes::{normalize_axes, Axis, AxisScores, MAX_ABS_RAW};

/// Target vectors ("ideal centers") of each archetype in the normalized 5D
/// space, components in canonical axis order
/// `[economic, social, community, method, pragmatism]`, each in `-10..+10`.
///
/// Declaration order is a contract: distance ties go to the earlier entry,
/// and the search visits targets in exactly this order. The coordinates are
/// cultural calibration data, tuned by the catalog authors rather than
/// learned.
pub const PROFILE_TARGETS: &[(&str, [f64; 5])] = &[
    // Center-left pro-state, civil liberties with some order, gradual
    // evidence-based reform, highly pragmatic.
    ("social_democrata_pragmatico", [-6.0, -3.0, 2.0, -2.0, 6.0]),
    // Strong free market, moderately liberal customs, incremental.
    ("liberal_classico_mercado", [8.0, 1.0, 0.0, 2.0, 5.0]),
    // Civil rights plus globalism, pro-innovation economics.
    ("liberal_social_cosmopolita", [5.0, -6.0, -6.0, -1.0, 3.0]),
    // Data over ideology, heavy rationalist planning.
    ("tecnocrata_pragmatico", [2.0, -1.0, 0.0, -6.0, 9.0]),
    // Institutional prudence, strong incrementalism.
    ("empirista_conservador", [3.0, 5.0, 5.0, 8.0, 7.0]),
    // Tradition and belonging, order and morality.
    ("conservador_comunitario", [1.0, 6.0, 8.0, 7.0, 6.0]),
    // Maximum individual liberty, extreme free market.
    ("direita_libertaria", [9.0, -9.0, -2.0, -3.0, 4.0]),
    // Strong authority, high nationalism, national protection.
    ("direita_autoritaria_nacional", [3.0, 9.0, 9.0, 3.0, 5.0]),
    // Anti-market, maximum liberty, cosmopolitan.
    ("esquerda_libertaria_cosmopolita", [-8.0, -8.0, -8.0, -3.0, 2.0]),
    // Anti-market with communal cohesion, reformist rationalism.
    ("esquerda_comunitaria", [-8.0, -2.0, 7.0, -2.0, 3.0]),
    // Principle-driven to the extreme, social engineering, minimal pragmatism.
    ("idealista_utopico", [0.0, 0.0, 0.0, -4.0, -9.0]),
    // Strong developmentalist state, popular nationalism, state planning.
    (
        "esquerda_nacional_desenvolvimentista_autoritaria",
        [-7.0, 5.0, 8.0, -5.0, 1.0],
    ),
];

/// Profile key of the inconclusive sentinel outcome.
pub const INCONCLUSIVE_KEY: &str = "inconclusivo";

/// A resolved classification: the chosen profile's record plus its key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub key: String,
    #[serde(flatten)]
    pub record: ProfileRecord,
}

impl Classification {
    /// The sentinel outcome for neutral or absent input. Carries guidance
    /// text and no axis tendencies or auxiliary lists.
    pub fn inconclusive() -> Self {
        Self::inconclusive_with(
            "Resultado inconclusivo",
            "Não foi possível identificar um perfil, pois as respostas foram neutras \
             ou insuficientes em todos os eixos.",
            "Para obter um resultado mais preciso, tente responder às afirmações \
             com mais convicção, evitando deixar tudo em neutro.",
        )
    }

    /// Sentinel with caller-supplied wording; the transport boundary uses
    /// this to explain *why* the input was degenerate (nothing answered vs.
    /// every answer identical).
    pub fn inconclusive_with(label: &str, description_short: &str, description_long: &str) -> Self {
        Self {
            key: INCONCLUSIVE_KEY.to_string(),
            record: ProfileRecord {
                label: label.to_string(),
                description_short: description_short.to_string(),
                description_long: description_long.to_string(),
                ..ProfileRecord::default()
            },
        }
    }

    pub fn is_inconclusive(&self) -> bool {
        self.key == INCONCLUSIVE_KEY
    }
}

/// The Classifier's only failure path.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The record catalog has no entries at all, so neither the nearest
    /// profile nor the misalignment fallback can produce a result. This is a
    /// configuration fault, distinct from a normal inconclusive outcome.
    #[error("profile record catalog is empty; cannot classify")]
    EmptyProfileCatalog,
}

/// Classify a raw axis vector against the archetype targets.
///
/// 1. Empty or all-zero input short-circuits to the inconclusive sentinel,
///    before normalization and regardless of the record catalog.
/// 2. The vector is normalized to `-10..+10` with [`MAX_ABS_RAW`].
/// 3. Squared Euclidean distance is computed to every entry of
///    [`PROFILE_TARGETS`] whose key also exists in `records`; targets without
///    a record are skipped, a guard against catalog drift. Distance runs over
///    exactly the five canonical axes: missing axes count as 0.0 and extra
///    axes in the normalized vector are ignored. Ties keep the
///    first-encountered target.
/// 4. If no target matched any record, the first record in `records` is
///    returned instead of failing. An entirely empty `records` is the one
///    configuration error surfaced to the caller.
pub fn classify_profile(
    raw_axes: &AxisScores,
    records: &ProfileCatalog,
) -> Result<Classification, ClassifyError> {
    if raw_axes.is_degenerate() {
        return Ok(Classification::inconclusive());
    }

    let norm = normalize_axes(raw_axes, MAX_ABS_RAW);

    let mut best: Option<(&str, &ProfileRecord, f64)> = None;
    for &(key, target) in PROFILE_TARGETS {
        let Some(record) = records.get(key) else {
            continue;
        };

        let mut dist_sq = 0.0;
        for (i, axis) in Axis::ALL.iter().enumerate() {
            let user_val = norm.get(axis.as_str()).copied().unwrap_or(0.0);
            let diff = user_val - target[i];
            dist_sq += diff * diff;
        }

        if best.as_ref().is_none_or(|(_, _, d)| dist_sq < *d) {
            best = Some((key, record, dist_sq));
        }
    }

    let (key, record) = match best {
        Some((key, record, _)) => (key, record),
        // Total catalog misalignment: fall back to an arbitrary (first)
        // record rather than failing. Alignment is validated out of band.
        None => {
            let (key, record) = records
                .first()
                .ok_or(ClassifyError::EmptyProfileCatalog)?;
            (key.as_str(), record)
        }
    };

    Ok(Classification {
        key: key.to_string(),
        record: record.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn record(label: &str) -> ProfileRecord {
        ProfileRecord {
            label: label.to_string(),
            description_short: format!("{label} (short)"),
            ..ProfileRecord::default()
        }
    }

    fn records_for(keys: &[&str]) -> ProfileCatalog {
        ProfileCatalog {
            records: keys
                .iter()
                .map(|k| (k.to_string(), record(k)))
                .collect(),
        }
    }

    fn all_target_records() -> ProfileCatalog {
        records_for(&PROFILE_TARGETS.iter().map(|(k, _)| *k).collect::<Vec<_>>())
    }

    fn raw(pairs: &[(&str, f64)]) -> AxisScores {
        pairs
            .iter()
            .map(|(axis, v)| (axis.to_string(), *v))
            .collect()
    }

    #[test]
    fn empty_input_is_inconclusive_regardless_of_catalog() {
        let result = classify_profile(&AxisScores::new(), &all_target_records()).unwrap();
        assert!(result.is_inconclusive());
        assert_eq!(result.key, "inconclusivo");
        assert!(result.record.axis_tendencies.is_empty());
        assert!(result.record.authors_classic.is_empty());

        // Even an empty record catalog cannot turn a neutral input into an
        // error.
        let result = classify_profile(&AxisScores::new(), &ProfileCatalog::default()).unwrap();
        assert!(result.is_inconclusive());
    }

    #[test]
    fn all_zero_input_is_inconclusive() {
        let result = classify_profile(&AxisScores::zeroed(), &all_target_records()).unwrap();
        assert!(result.is_inconclusive());
    }

    #[test]
    fn near_target_vector_selects_that_profile() {
        // Raw scores that normalize to roughly {0, 0, 0, -4, -9}.
        let scores = raw(&[
            ("economic", 0.3),
            ("social", -0.2),
            ("community", 0.0),
            ("method", -6.4),
            ("pragmatism", -14.4),
        ]);
        let result = classify_profile(&scores, &all_target_records()).unwrap();
        assert_eq!(result.key, "idealista_utopico");
    }

    #[test]
    fn exact_target_match_wins() {
        for (key, target) in PROFILE_TARGETS {
            let scores = raw(&[
                ("economic", target[0] * MAX_ABS_RAW / 10.0),
                ("social", target[1] * MAX_ABS_RAW / 10.0),
                ("community", target[2] * MAX_ABS_RAW / 10.0),
                ("method", target[3] * MAX_ABS_RAW / 10.0),
                ("pragmatism", target[4] * MAX_ABS_RAW / 10.0),
            ]);
            if scores.is_degenerate() {
                continue;
            }
            let result = classify_profile(&scores, &all_target_records()).unwrap();
            assert_eq!(&result.key, key);
        }
    }

    #[test]
    fn selection_is_deterministic() {
        let scores = raw(&[("economic", 5.0), ("social", -3.0)]);
        let catalog = all_target_records();
        let first = classify_profile(&scores, &catalog).unwrap();
        let second = classify_profile(&scores, &catalog).unwrap();
        assert_eq!(first.key, second.key);
    }

    #[test]
    fn target_without_record_is_never_selected() {
        // idealista_utopico would be the numeric winner, but its record is
        // missing from the catalog.
        let mut catalog = all_target_records();
        catalog.records.remove("idealista_utopico");

        let scores = raw(&[("method", -6.4), ("pragmatism", -14.4)]);
        let result = classify_profile(&scores, &catalog).unwrap();
        assert_ne!(result.key, "idealista_utopico");
    }

    #[test]
    fn total_misalignment_falls_back_to_first_record() {
        // No record key matches any target key.
        let catalog = records_for(&["zeta_unknown", "alpha_unknown"]);
        let scores = raw(&[("economic", 5.0)]);
        let result = classify_profile(&scores, &catalog).unwrap();
        // BTreeMap iteration order: "alpha_unknown" comes first.
        assert_eq!(result.key, "alpha_unknown");
    }

    #[test]
    fn empty_record_catalog_with_signal_is_an_error() {
        let scores = raw(&[("economic", 5.0)]);
        let err = classify_profile(&scores, &ProfileCatalog::default()).unwrap_err();
        assert!(matches!(err, ClassifyError::EmptyProfileCatalog));
    }

    #[test]
    fn extra_axes_are_ignored_in_distance() {
        let base = raw(&[("economic", 12.8)]); // normalizes to +8
        let mut with_extra = base.clone();
        with_extra.add("environment", 50.0);

        let catalog = all_target_records();
        assert_eq!(
            classify_profile(&base, &catalog).unwrap().key,
            classify_profile(&with_extra, &catalog).unwrap().key
        );
    }

    #[test]
    fn result_record_matches_catalog_entry() {
        let catalog = all_target_records();
        let scores = raw(&[("economic", 12.8), ("social", -14.4)]);
        let result = classify_profile(&scores, &catalog).unwrap();
        let expected = catalog.get(&result.key).unwrap();
        assert_eq!(&result.record, expected);
    }

    #[test]
    fn classification_serializes_flat() {
        let result = Classification::inconclusive();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["key"], "inconclusivo");
        assert_eq!(json["label"], "Resultado inconclusivo");
        let map: BTreeMap<String, serde_json::Value> =
            serde_json::from_value(json).unwrap();
        assert!(map.contains_key("description_short"));
    }
}
