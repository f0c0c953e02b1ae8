//! `UserStore` trait — async interface for registration persistence.
//!
//! Writes are advisory: the in-memory registry stays authoritative during a
//! run, so a failed `put` is logged by the caller and swallowed. `get` and
//! `load_all` are only exercised at process restart.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::registration::model::UserRegistration;

/// Backend-agnostic registration store keyed by Telegram user id.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist a snapshot of the record. Called after every state mutation.
    async fn put(&self, user_id: i64, record: &UserRegistration) -> Result<(), StoreError>;

    /// Fetch one record. `Ok(None)` covers both "never seen" and "stored
    /// snapshot was malformed".
    async fn get(&self, user_id: i64) -> Result<Option<UserRegistration>, StoreError>;

    /// Fetch every readable record, for registry rehydration at startup.
    async fn load_all(&self) -> Result<Vec<(i64, UserRegistration)>, StoreError>;
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<i64, UserRegistration>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn put(&self, user_id: i64, record: &UserRegistration) -> Result<(), StoreError> {
        self.records
            .lock()
            .expect("memory store mutex poisoned")
            .insert(user_id, record.clone());
        Ok(())
    }

    async fn get(&self, user_id: i64) -> Result<Option<UserRegistration>, StoreError> {
        Ok(self
            .records
            .lock()
            .expect("memory store mutex poisoned")
            .get(&user_id)
            .cloned())
    }

    async fn load_all(&self) -> Result<Vec<(i64, UserRegistration)>, StoreError> {
        Ok(self
            .records
            .lock()
            .expect("memory store mutex poisoned")
            .iter()
            .map(|(id, record)| (*id, record.clone()))
            .collect())
    }
}
