//! The Aggregator: raw answers → raw axis score vector.

use std::collections::BTreeMap;

use crate::catalog::QuestionCatalog;
use crate::scoring::axes::AxisScores;

/// Fold a sparse map of question-id → Likert value into the raw axis vector.
///
/// The result always carries the five canonical axes (zero when untouched);
/// axis names a question declares beyond the canonical five are created on
/// first use and tracked as well. Answers for unknown question ids are
/// skipped silently so answer sets stay compatible across catalog revisions.
/// An empty answer set yields the zero vector.
///
/// Pure: no I/O, no shared state; the result depends only on the answers and
/// the catalog snapshot.
pub fn compute_axes(answers: &BTreeMap<String, i64>, catalog: &QuestionCatalog) -> AxisScores {
    let mut scores = AxisScores::zeroed();
    let index = catalog.index_by_id();

    for (qid, value) in answers {
        let Some(question) = index.get(qid.as_str()) else {
            continue;
        };
        for contribution in &question.axes {
            scores.add(
                &contribution.name,
                *value as f64 * contribution.direction * contribution.weight,
            );
        }
    }

    scores
}
