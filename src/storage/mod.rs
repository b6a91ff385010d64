//! SQLite persistence for quiz results.
//!
//! Each submitted result is stored under an anonymous retrievable key
//! (`IDEO-XXXX-YYYY`). No personal data is recorded; answers and scores are
//! stored as JSON text columns so the stats summary can aggregate them with
//! `json_extract`.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{anyhow, Context};
use chrono::Utc;
use rand::Rng;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::scoring::{Axis, AxisScores};

/// Alphabet for result keys, with easily confused glyphs removed (0/O/I/l).
const ID_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Insert attempts before giving up on key collisions.
const MAX_ID_ATTEMPTS: u32 = 5;

/// Generate a result key in the `IDEO-XXXX-YYYY` format.
///
/// Uses the thread-local OS-seeded CSPRNG; the keyspace (32^8) makes
/// collisions rare, and [`ResultStore::save_result`] retries on the ones that
/// do occur.
pub fn generate_result_id() -> String {
    let mut rng = rand::thread_rng();
    let mut block = || -> String {
        (0..4)
            .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
            .collect()
    };
    format!("IDEO-{}-{}", block(), block())
}

/// Fields of a result about to be persisted.
#[derive(Debug, Clone)]
pub struct NewResult<'a> {
    pub answers: &'a BTreeMap<String, i64>,
    pub scores: &'a AxisScores,
    pub version: &'a str,
    pub profile_key: &'a str,
    pub profile_label: &'a str,
    pub user_locale: Option<&'a str>,
    pub device_type: Option<&'a str>,
}

/// A persisted result, re-hydrated from its row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResult {
    pub id: String,
    pub timestamp: String,
    pub version: String,
    pub answers: BTreeMap<String, i64>,
    pub scores: BTreeMap<String, f64>,
    pub profile_key: String,
    pub profile_label: String,
    pub user_locale: Option<String>,
    pub device_type: Option<String>,
}

/// Aggregate view over everything stored so far.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSummary {
    pub total: i64,
    pub profile_distribution: BTreeMap<String, i64>,
    /// Mean stored score per canonical axis; None until any row exists.
    pub axes_avg: BTreeMap<String, Option<f64>>,
    pub latest_timestamp: Option<String>,
}

/// SQLite-backed result store.
///
/// The connection is guarded by a mutex; handlers run store calls inside
/// `spawn_blocking`, so one store instance serves the whole server.
#[derive(Debug)]
pub struct ResultStore {
    conn: Mutex<Connection>,
}

impl ResultStore {
    /// Open (creating parent directories and the schema as needed).
    pub fn open(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating database directory for {}", path.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("opening results database {}", path.display()))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_db()?;
        Ok(store)
    }

    /// In-memory store, used by tests and ephemeral deployments.
    pub fn open_in_memory() -> Result<Self, anyhow::Error> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        store.init_db()?;
        Ok(store)
    }

    fn init_db(&self) -> Result<(), anyhow::Error> {
        let conn = self.lock_conn()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS results (
                id TEXT PRIMARY KEY,
                timestamp TEXT,
                version TEXT,
                answers TEXT,
                scores TEXT,
                profile_key TEXT,
                profile_label TEXT,
                user_locale TEXT,
                device_type TEXT
            )",
            [],
        )?;
        Ok(())
    }

    fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>, anyhow::Error> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("results database lock poisoned"))
    }

    /// Persist a result and return its generated key.
    ///
    /// On the rare primary-key collision a fresh key is generated, up to
    /// [`MAX_ID_ATTEMPTS`] times.
    pub fn save_result(&self, result: &NewResult<'_>) -> Result<String, anyhow::Error> {
        let answers_json = serde_json::to_string(result.answers)?;
        let scores_json = serde_json::to_string(result.scores)?;
        let timestamp = Utc::now().to_rfc3339();

        for _ in 0..MAX_ID_ATTEMPTS {
            let result_id = generate_result_id();
            let conn = self.lock_conn()?;
            let inserted = conn.execute(
                "INSERT INTO results (
                    id, timestamp, version, answers, scores,
                    profile_key, profile_label, user_locale, device_type
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    result_id,
                    timestamp,
                    result.version,
                    answers_json,
                    scores_json,
                    result.profile_key,
                    result.profile_label,
                    result.user_locale,
                    result.device_type,
                ],
            );
            match inserted {
                Ok(_) => return Ok(result_id),
                Err(e) if is_constraint_violation(&e) => continue,
                Err(e) => {
                    log::error!("failed to save result: {}", e);
                    return Err(e.into());
                }
            }
        }

        Err(anyhow!(
            "could not generate a unique result key after {} attempts",
            MAX_ID_ATTEMPTS
        ))
    }

    /// Fetch a stored result by key, or None when unknown.
    pub fn fetch_result(&self, result_id: &str) -> Result<Option<StoredResult>, anyhow::Error> {
        let conn = self.lock_conn()?;
        let row = conn
            .query_row(
                "SELECT id, timestamp, version, answers, scores,
                        profile_key, profile_label, user_locale, device_type
                 FROM results WHERE id = ?1",
                params![result_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, Option<String>>(7)?,
                        row.get::<_, Option<String>>(8)?,
                    ))
                },
            )
            .optional()?;

        let Some((
            id,
            timestamp,
            version,
            answers_json,
            scores_json,
            profile_key,
            profile_label,
            user_locale,
            device_type,
        )) = row
        else {
            return Ok(None);
        };

        let answers = answers_json
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?
            .unwrap_or_default();
        let scores = scores_json
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?
            .unwrap_or_default();

        Ok(Some(StoredResult {
            id,
            timestamp,
            version,
            answers,
            scores,
            profile_key,
            profile_label,
            user_locale,
            device_type,
        }))
    }

    /// Aggregate counts, per-profile distribution, per-axis mean scores, and
    /// the latest submission timestamp.
    pub fn stats_summary(&self) -> Result<StatsSummary, anyhow::Error> {
        let conn = self.lock_conn()?;

        let total: i64 = conn.query_row("SELECT COUNT(*) FROM results", [], |row| row.get(0))?;

        let latest_timestamp: Option<String> = conn
            .query_row(
                "SELECT timestamp FROM results ORDER BY timestamp DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        let mut profile_distribution = BTreeMap::new();
        {
            let mut stmt = conn
                .prepare("SELECT profile_key, COUNT(*) FROM results GROUP BY profile_key")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            for row in rows {
                let (key, qty) = row?;
                profile_distribution.insert(key, qty);
            }
        }

        let mut axes_avg = BTreeMap::new();
        for axis in Axis::ALL {
            let avg: Option<f64> = conn.query_row(
                &format!(
                    "SELECT AVG(CAST(json_extract(scores, '$.{}') AS REAL)) FROM results",
                    axis.as_str()
                ),
                [],
                |row| row.get(0),
            )?;
            axes_avg.insert(axis.as_str().to_string(), avg);
        }

        Ok(StatsSummary {
            total,
            profile_distribution,
            axes_avg,
            latest_timestamp,
        })
    }
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation
    )
}
