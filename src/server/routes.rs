//! Axum route handlers for the quiz HTTP server.
//!
//! # Routes
//!
//! - `GET  /health`          — Returns `{"status": "ok", "version": ...}`
//! - `GET  /api/questions`   — `{"questions": [...], "by_axis": {...}}`
//! - `POST /api/submit`      — Accepts an answer set, returns axes + profile
//! - `GET  /api/result/{id}` — Stored result lookup
//! - `GET  /api/stats`       — Aggregate statistics

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::catalog::{self, ProfileCatalog, QuestionCatalog};
use crate::scoring::{classify_profile, compute_axes, Classification};
use crate::storage::{NewResult, ResultStore};

/// Shared application state: immutable catalog snapshot plus the store.
#[derive(Clone)]
pub struct AppState {
    pub questions: Arc<QuestionCatalog>,
    pub profiles: Arc<ProfileCatalog>,
    pub store: Arc<ResultStore>,
}

impl AppState {
    /// State over the embedded default catalogs.
    pub fn new(store: Arc<ResultStore>) -> Self {
        Self {
            questions: Arc::new(catalog::default_questions().clone()),
            profiles: Arc::new(catalog::default_profiles().clone()),
            store,
        }
    }

    /// State over caller-supplied catalogs.
    pub fn with_catalogs(
        questions: QuestionCatalog,
        profiles: ProfileCatalog,
        store: Arc<ResultStore>,
    ) -> Self {
        Self {
            questions: Arc::new(questions),
            profiles: Arc::new(profiles),
            store,
        }
    }
}

/// Build the axum router with all routes.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/questions", get(questions_handler))
        .route("/api/submit", post(submit_handler))
        .route("/api/result/:id", get(result_handler))
        .route("/api/stats", get(stats_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health — liveness probe.
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
        "service": "bussola",
    }))
}

/// GET /api/questions — the catalog in both shapes the frontend uses: a flat
/// array (current quiz page) and the same questions grouped by axis (future
/// per-axis pagination).
async fn questions_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "questions": state.questions.flat(),
        "by_axis": &*state.questions,
    }))
}

/// POST /api/submit body.
#[derive(Debug, Deserialize)]
pub struct SubmitPayload {
    pub answers: BTreeMap<String, i64>,
    #[serde(default)]
    pub user_locale: Option<String>,
    #[serde(default)]
    pub device_type: Option<String>,
}

/// POST /api/submit — score an answer set, classify it, persist the result.
///
/// Two degenerate inputs are short-circuited at this boundary, with guidance
/// text specific to each cause, before the core ever runs:
///
/// 1. No answers at all.
/// 2. Every answer identical (all -2, all 0, all +2, ...), which cannot carry
///    a consistent pattern.
///
/// The core's own neutral-input check still covers the all-zero subset for
/// non-HTTP callers; these checks exist to give the respondent a better
/// explanation. Degenerate submissions are not persisted.
async fn submit_handler(
    State(state): State<AppState>,
    Json(payload): Json<SubmitPayload>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if payload.answers.is_empty() {
        let profile = Classification::inconclusive_with(
            "Perfil inconclusivo",
            "Você não respondeu a nenhuma afirmação. Para identificar seu perfil, \
             é necessário responder pelo menos parte das perguntas.",
            "",
        );
        return Ok(Json(serde_json::json!({
            "result_id": Value::Null,
            "axes": {},
            "profile": profile,
        })));
    }

    let mut values = payload.answers.values();
    let first = values.next().copied();
    if values.all(|v| Some(*v) == first) {
        let profile = Classification::inconclusive_with(
            "Perfil inconclusivo",
            "Suas respostas foram muito homogêneas (por exemplo, discordo totalmente \
             em todas as afirmações). Isso impede identificar um padrão consistente \
             de ideias. Tente responder variando entre concordo e discordo conforme \
             cada frase faça sentido para você.",
            "",
        );
        return Ok(Json(serde_json::json!({
            "result_id": Value::Null,
            "axes": {},
            "profile": profile,
        })));
    }

    let axes_scores = compute_axes(&payload.answers, &state.questions);
    let profile = classify_profile(&axes_scores, &state.profiles).map_err(|e| {
        tracing::error!("classification failed: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": e.to_string()})),
        )
    })?;

    // Persist. A storage failure is logged but does not cost the respondent
    // their result; they just get no retrieval key.
    let result_id = {
        let store = state.store.clone();
        let answers = payload.answers.clone();
        let scores = axes_scores.clone();
        let profile_key = profile.key.clone();
        let profile_label = profile.record.label.clone();
        let user_locale = payload.user_locale.clone();
        let device_type = payload.device_type.clone();

        let saved = tokio::task::spawn_blocking(move || {
            store.save_result(&NewResult {
                answers: &answers,
                scores: &scores,
                version: crate::VERSION,
                profile_key: &profile_key,
                profile_label: &profile_label,
                user_locale: user_locale.as_deref(),
                device_type: device_type.as_deref(),
            })
        })
        .await;

        match saved {
            Ok(Ok(id)) => Some(id),
            Ok(Err(e)) => {
                tracing::error!("failed to persist result: {}", e);
                None
            }
            Err(e) => {
                tracing::error!("result persistence task panicked: {}", e);
                None
            }
        }
    };

    Ok(Json(serde_json::json!({
        "result_id": result_id,
        "axes": axes_scores,
        "profile": profile,
    })))
}

/// GET /api/result/{id} — retrieve a stored result by its anonymous key.
async fn result_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let store = state.store.clone();
    let lookup_id = id.clone();
    let fetched = tokio::task::spawn_blocking(move || store.fetch_result(&lookup_id))
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": format!("lookup task failed: {}", e)})),
            )
        })?
        .map_err(|e| {
            tracing::error!("failed to fetch result {}: {}", id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": e.to_string()})),
            )
        })?;

    match fetched {
        Some(stored) => Ok(Json(serde_json::to_value(stored).map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": e.to_string()})),
            )
        })?)),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": format!("Result '{}' not found", id)})),
        )),
    }
}

/// GET /api/stats — aggregate statistics over stored results.
async fn stats_handler(
    State(state): State<AppState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let store = state.store.clone();
    let stats = tokio::task::spawn_blocking(move || store.stats_summary())
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": format!("stats task failed: {}", e)})),
            )
        })?
        .map_err(|e| {
            tracing::error!("failed to compute stats: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": e.to_string()})),
            )
        })?;

    Ok(Json(serde_json::json!(stats)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        AppState::new(Arc::new(ResultStore::open_in_memory().unwrap()))
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn post_submit(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/submit")
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = app_router(test_state());

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], crate::VERSION);
        assert_eq!(json["service"], "bussola");
    }

    #[tokio::test]
    async fn test_questions_returns_both_shapes() {
        let app = app_router(test_state());

        let request = Request::builder()
            .uri("/api/questions")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        let flat = json["questions"].as_array().unwrap();
        assert_eq!(flat.len(), 40);
        assert!(flat.iter().all(|q| q["axis"].is_string() && q["id"].is_string()));
        assert_eq!(json["by_axis"]["economic"].as_array().unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_submit_empty_answers_is_inconclusive() {
        let app = app_router(test_state());

        let response = app
            .oneshot(post_submit(serde_json::json!({"answers": {}})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["profile"]["key"], "inconclusivo");
        assert_eq!(json["profile"]["label"], "Perfil inconclusivo");
        assert_eq!(json["result_id"], Value::Null);
    }

    #[tokio::test]
    async fn test_submit_homogeneous_answers_is_inconclusive() {
        let state = test_state();
        let app = app_router(state.clone());

        let response = app
            .oneshot(post_submit(serde_json::json!({
                "answers": {"EC1": -2, "SO1": -2, "ME1": -2}
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["profile"]["key"], "inconclusivo");

        // Degenerate submissions are not persisted.
        let stats = state.store.stats_summary().unwrap();
        assert_eq!(stats.total, 0);
    }

    #[tokio::test]
    async fn test_submit_scores_classifies_and_persists() {
        let state = test_state();
        let app = app_router(state.clone());

        // Strongly pro-market, strongly pro-liberty answers across every
        // economic and social question.
        let response = app
            .oneshot(post_submit(serde_json::json!({
                "answers": {
                    "EC1": 2, "EC3": 2, "EC5": 2, "EC7": 2,
                    "EC2": -2, "EC4": -2, "EC6": -2, "EC8": -2,
                    "SO1": -2, "SO3": -2, "SO5": -2, "SO7": -2,
                    "SO2": 2, "SO4": 2, "SO6": 2, "SO8": 2,
                    "PR1": 1
                },
                "user_locale": "pt-BR"
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["axes"]["economic"], 16.0);
        assert_eq!(json["axes"]["social"], -16.0);
        assert_eq!(json["profile"]["key"], "direita_libertaria");

        let result_id = json["result_id"].as_str().unwrap().to_string();
        assert!(result_id.starts_with("IDEO-"));

        let stored = state.store.fetch_result(&result_id).unwrap().unwrap();
        assert_eq!(stored.profile_key, "direita_libertaria");
        assert_eq!(stored.user_locale.as_deref(), Some("pt-BR"));
    }

    #[tokio::test]
    async fn test_result_roundtrip_via_http() {
        let state = test_state();
        let app = app_router(state.clone());

        let response = app
            .clone()
            .oneshot(post_submit(serde_json::json!({
                "answers": {"EC2": 2, "EC4": 2, "EC6": 2, "PR1": 2, "PR3": 1}
            })))
            .await
            .unwrap();
        let submitted = json_body(response).await;
        let result_id = submitted["result_id"].as_str().unwrap();

        let request = Request::builder()
            .uri(format!("/api/result/{result_id}"))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["id"], *result_id);
        assert_eq!(json["profile_key"], submitted["profile"]["key"]);
    }

    #[tokio::test]
    async fn test_result_unknown_id_is_404() {
        let app = app_router(test_state());

        let request = Request::builder()
            .uri("/api/result/IDEO-AAAA-BBBB")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let state = test_state();
        let app = app_router(state.clone());

        let _ = app
            .clone()
            .oneshot(post_submit(serde_json::json!({
                "answers": {"EC1": 2, "SO1": -1}
            })))
            .await
            .unwrap();

        let request = Request::builder()
            .uri("/api/stats")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["total"], 1);
        assert!(json["latest_timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_submit_with_empty_profile_catalog_is_500() {
        let state = AppState::with_catalogs(
            catalog::default_questions().clone(),
            ProfileCatalog::default(),
            Arc::new(ResultStore::open_in_memory().unwrap()),
        );
        let app = app_router(state);

        let response = app
            .oneshot(post_submit(serde_json::json!({
                "answers": {"EC1": 2, "SO1": -1}
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
