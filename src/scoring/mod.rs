//! The scoring-and-classification engine.
//!
//! Two stateless, pure components consumed by the transport layer:
//!
//! - **Aggregator** ([`compute_axes`]) — folds a sparse map of question-id →
//!   Likert answer into a dense raw score per axis, using each question's
//!   configured axis memberships, direction, and weight.
//! - **Classifier** ([`classify_profile`]) — normalizes the raw vector into
//!   the bounded `-10..+10` scale, computes squared Euclidean distance to
//!   each archetype's target vector, and returns the closest profile, with
//!   explicit handling of neutral/degenerate input.
//!
//! Data flows one way: raw answers → Aggregator → raw axis vector →
//! Classifier → normalized vector + assigned profile. The Classifier accepts
//! any raw axis vector; it has no dependency on the Aggregator's internals.

pub mod aggregate;
pub mod axes;
pub mod classify;

pub use aggregate::compute_axes;
pub use axes::{normalize_axes, Axis, AxisScores, MAX_ABS_RAW};
pub use classify::{classify_profile, Classification, ClassifyError, PROFILE_TARGETS};
