//! Quiz HTTP server binary.
//!
//! # Environment Variables
//!
//! - `PORT` — HTTP port (default: 8080)
//! - `BUSSOLA_DB` — SQLite results database path (default: data/results.db)
//! - `BUSSOLA_QUESTIONS` — Optional path to a questions.json overriding the
//!   embedded catalog
//! - `BUSSOLA_PROFILES` — Optional path to a profiles.json overriding the
//!   embedded catalog
//! - `RUST_LOG` — Tracing filter (default: "info")
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin server
//! ```

use std::sync::Arc;

use bussola::catalog::{self, ProfileCatalog, QuestionCatalog};
use bussola::server::{app_router, AppState};
use bussola::storage::ResultStore;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,bussola=debug".into()),
        )
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let bind_addr = format!("0.0.0.0:{}", port);

    let db_path = std::env::var("BUSSOLA_DB").unwrap_or_else(|_| "data/results.db".to_string());
    let store = match ResultStore::open(&db_path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!("Failed to open results database {}: {}", db_path, e);
            std::process::exit(1);
        }
    };

    let questions = match std::env::var("BUSSOLA_QUESTIONS") {
        Ok(path) => match QuestionCatalog::load(&path) {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::error!("Failed to load question catalog {}: {}", path, e);
                std::process::exit(1);
            }
        },
        Err(_) => catalog::default_questions().clone(),
    };

    let profiles = match std::env::var("BUSSOLA_PROFILES") {
        Ok(path) => match ProfileCatalog::load(&path) {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::error!("Failed to load profile catalog {}: {}", path, e);
                std::process::exit(1);
            }
        },
        Err(_) => catalog::default_profiles().clone(),
    };

    tracing::info!(
        "Catalogs loaded: {} questions, {} profiles",
        questions.len(),
        profiles.len()
    );

    let state = AppState::with_catalogs(questions, profiles, store);
    let app = app_router(state);

    tracing::info!("bussola server starting on {}", bind_addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health          — liveness probe");
    tracing::info!("  GET  /api/questions   — question catalog");
    tracing::info!("  POST /api/submit      — score and classify an answer set");
    tracing::info!("  GET  /api/result/:id  — stored result lookup");
    tracing::info!("  GET  /api/stats       — aggregate statistics");

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind");

    axum::serve(listener, app)
        .await
        .expect("Server failed");
}
