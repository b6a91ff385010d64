//! HTTP server for the quiz.
//!
//! Exposes the scoring core and the result store to the web frontend.
//!
//! # Endpoints
//!
//! - `GET  /health`            — Liveness probe
//! - `GET  /api/questions`     — Question catalog (flat + grouped by axis)
//! - `POST /api/submit`        — Score, classify, and persist an answer set
//! - `GET  /api/result/{id}`   — Retrieve a stored result by its key
//! - `GET  /api/stats`         — Aggregate statistics over stored results

pub mod routes;

pub use routes::{app_router, AppState};
