//! Process-scoped registry of user registrations.
//!
//! Owns the user-id → record map. The map is the only shared mutable
//! resource; the lock never spans a send or store write.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::channel::{InboundKind, Update};
use crate::registration::machine::{self, MachineCtx, Outcome};
use crate::registration::model::UserRegistration;
use crate::registration::prompts::Prompts;
use crate::registration::signin::SigninLinks;

pub struct Registry {
    users: Mutex<HashMap<i64, UserRegistration>>,
    prompts: Prompts,
    links: SigninLinks,
}

impl Registry {
    pub fn new(prompts: Prompts, links: SigninLinks) -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            prompts,
            links,
        }
    }

    /// Load persisted records at startup. Later entries win on duplicate ids.
    pub fn rehydrate(&self, entries: Vec<(i64, UserRegistration)>) {
        let mut users = self.lock();
        for (user_id, record) in entries {
            users.insert(user_id, record);
        }
    }

    /// Number of known users.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Apply one inbound update: look up (or create) the record, run the
    /// transition, and return the outbound messages.
    ///
    /// An event from an unknown id creates a fresh record and triggers the
    /// opening prompt regardless of what was sent.
    pub fn handle(&self, update: &Update, now: DateTime<Utc>) -> Outcome {
        let ctx = MachineCtx {
            prompts: &self.prompts,
            links: &self.links,
        };
        let mut rng = rand::thread_rng();
        let mut users = self.lock();

        let is_new = !users.contains_key(&update.sender.user_id);
        let record = users.entry(update.sender.user_id).or_default();

        if is_new {
            tracing::info!(
                user_id = update.sender.user_id,
                "Starting registration for new user"
            );
            return machine::advance(record, &update.sender, now, &mut rng, ctx);
        }

        tracing::debug!(
            user_id = update.sender.user_id,
            state = %record.state,
            "Handling update"
        );

        match &update.kind {
            InboundKind::Text(text) => {
                machine::handle_text(record, &update.sender, text, now, &mut rng, ctx)
            }
            InboundKind::Command(_) => {
                machine::advance(record, &update.sender, now, &mut rng, ctx)
            }
        }
    }

    /// Record that a sign-in link was delivered. Called only after the
    /// transport send succeeded, so a failed send leaves the user eligible
    /// to request again immediately.
    pub fn confirm_signin_sent(&self, user_id: i64, now: DateTime<Utc>) {
        if let Some(record) = self.lock().get_mut(&user_id) {
            record.last_signin_request = Some(now);
        }
    }

    /// Snapshot a record for persistence.
    pub fn snapshot(&self, user_id: i64) -> Option<UserRegistration> {
        self.lock().get(&user_id).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<i64, UserRegistration>> {
        self.users.lock().expect("registry mutex poisoned")
    }
}
