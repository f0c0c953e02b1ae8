//! libSQL backend — async `UserStore` implementation.
//!
//! One table, `registrations`, keyed by the decimal form of the user id with
//! the record stored as a JSON snapshot. Supports local file and in-memory
//! databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::registration::model::UserRegistration;
use crate::store::traits::UserStore;

/// libSQL registration store.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlStore {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlStore {
    /// Open (or create) a local database file and initialize the schema.
    pub async fn new_local(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Open(format!("Failed to create store directory: {e}")))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Open(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Open(format!("Failed to create connection: {e}")))?;

        let store = Self {
            db: Arc::new(db),
            conn,
        };
        store.init_schema().await?;
        info!(path = %path.display(), "Registration store opened");
        Ok(store)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| StoreError::Open(format!("Failed to create in-memory database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Open(format!("Failed to create connection: {e}")))?;

        let store = Self {
            db: Arc::new(db),
            conn,
        };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS registrations (
                    user_id TEXT PRIMARY KEY,
                    record TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                )",
                (),
            )
            .await
            .map_err(|e| StoreError::Open(format!("init_schema: {e}")))?;
        Ok(())
    }
}

/// Parse a stored snapshot, treating malformed JSON as absent.
fn parse_record(user_id: &str, json: &str) -> Option<UserRegistration> {
    match serde_json::from_str(json) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!(user_id, "Malformed stored registration, treating as missing: {e}");
            None
        }
    }
}

#[async_trait]
impl UserStore for LibSqlStore {
    async fn put(&self, user_id: i64, record: &UserRegistration) -> Result<(), StoreError> {
        let json = serde_json::to_string(record)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        self.conn
            .execute(
                "INSERT INTO registrations (user_id, record, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id) DO UPDATE SET
                    record = excluded.record,
                    updated_at = excluded.updated_at",
                params![user_id.to_string(), json, Utc::now().to_rfc3339()],
            )
            .await
            .map_err(|e| StoreError::Query(format!("put: {e}")))?;

        debug!(user_id, state = %record.state, "Registration persisted");
        Ok(())
    }

    async fn get(&self, user_id: i64) -> Result<Option<UserRegistration>, StoreError> {
        let mut rows = self
            .conn
            .query(
                "SELECT record FROM registrations WHERE user_id = ?1",
                params![user_id.to_string()],
            )
            .await
            .map_err(|e| StoreError::Query(format!("get: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let json: String = row
                    .get(0)
                    .map_err(|e| StoreError::Query(format!("get row: {e}")))?;
                Ok(parse_record(&user_id.to_string(), &json))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(StoreError::Query(format!("get: {e}"))),
        }
    }

    async fn load_all(&self) -> Result<Vec<(i64, UserRegistration)>, StoreError> {
        let mut rows = self
            .conn
            .query("SELECT user_id, record FROM registrations", ())
            .await
            .map_err(|e| StoreError::Query(format!("load_all: {e}")))?;

        let mut entries = Vec::new();
        loop {
            match rows.next().await {
                Ok(Some(row)) => {
                    let id_text: String = row
                        .get(0)
                        .map_err(|e| StoreError::Query(format!("load_all row: {e}")))?;
                    let json: String = row
                        .get(1)
                        .map_err(|e| StoreError::Query(format!("load_all row: {e}")))?;

                    let Ok(user_id) = id_text.parse::<i64>() else {
                        warn!(user_id = %id_text, "Skipping row with non-numeric user id");
                        continue;
                    };
                    if let Some(record) = parse_record(&id_text, &json) {
                        entries.push((user_id, record));
                    }
                }
                Ok(None) => break,
                Err(e) => return Err(StoreError::Query(format!("load_all: {e}"))),
            }
        }
        Ok(entries)
    }
}
