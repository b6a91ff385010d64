//! # Bússola
//!
//! A political-orientation quiz service. Likert-scale answers to statements
//! tagged with one of five ideological axes are aggregated into a
//! 5-dimensional score vector, normalized, and classified against a fixed set
//! of archetype profiles by nearest-neighbor distance. Results can be
//! persisted under an anonymous retrievable key.
//!
//! The crate splits into a pure scoring core (`scoring`), typed catalog
//! loading (`catalog`), a SQLite result store (`storage`), and an axum HTTP
//! surface (`server`).

pub mod catalog;
pub mod scoring;
pub mod server;
pub mod storage;

pub use catalog::{ProfileCatalog, ProfileRecord, Question, QuestionCatalog};
pub use scoring::{classify_profile, compute_axes, Axis, AxisScores, Classification};
pub use storage::ResultStore;

/// Version reported by `/health` and stamped on persisted results.
pub const VERSION: &str = "0.2.0";
