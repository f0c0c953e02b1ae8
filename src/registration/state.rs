//! Registration state machine — tracks which step the user is on.

use serde::{Deserialize, Serialize};

/// The steps of the registration dialog.
///
/// Progresses linearly: ConfirmFullName → AskTos → AskSubscription →
/// CreateAccount → Done, with one side branch — a rejected platform-derived
/// name detours through AskFullName before rejoining at AskTos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationState {
    ConfirmFullName,
    AskFullName,
    AskTos,
    AskSubscription,
    CreateAccount,
    Done,
}

impl RegistrationState {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: RegistrationState) -> bool {
        use RegistrationState::*;
        matches!(
            (self, target),
            (ConfirmFullName, AskFullName)
                | (ConfirmFullName, AskTos)
                | (AskFullName, AskTos)
                | (AskTos, AskSubscription)
                | (AskSubscription, CreateAccount)
                | (CreateAccount, Done)
        )
    }

    /// Whether this state is terminal (registration is done).
    ///
    /// Terminal records are retained so `/signin` can re-issue codes later.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }
}

impl Default for RegistrationState {
    fn default() -> Self {
        Self::ConfirmFullName
    }
}

impl std::fmt::Display for RegistrationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ConfirmFullName => "confirm_full_name",
            Self::AskFullName => "ask_full_name",
            Self::AskTos => "ask_tos",
            Self::AskSubscription => "ask_subscription",
            Self::CreateAccount => "create_account",
            Self::Done => "done",
        };
        write!(f, "{s}")
    }
}
