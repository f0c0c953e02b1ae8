//! Per-user registration record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::channel::SenderIdentity;
use crate::registration::state::RegistrationState;

/// One registration record per Telegram user id.
///
/// Created on the user's first inbound event, mutated in place by every
/// subsequent event, never deleted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UserRegistration {
    /// Chosen or platform-derived name; empty until confirmed.
    pub display_name: String,
    pub tos_agreed: bool,
    pub subscription_opt_in: bool,
    pub state: RegistrationState,
    /// None until the first sign-in code is issued.
    pub last_signin_request: Option<DateTime<Utc>>,
}

impl UserRegistration {
    /// Name to show the user: the stored display name once set, otherwise
    /// the platform-derived "first last".
    pub fn full_name(&self, sender: &SenderIdentity) -> String {
        if !self.display_name.is_empty() {
            return self.display_name.clone();
        }
        sender.full_name()
    }
}

/// Trim and title-case a typed display name: "  john smith " → "John Smith".
///
/// Uppercases the first character of each whitespace-separated word and
/// collapses runs of whitespace to a single space.
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
