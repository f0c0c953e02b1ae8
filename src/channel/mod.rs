//! Telegram transport — inbound update types and outbound message shapes.

pub mod telegram;

pub use telegram::TelegramChannel;

use std::pin::Pin;

use futures::Stream;

/// Identity fields carried on every inbound update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderIdentity {
    /// Telegram numeric user id.
    pub user_id: i64,
    /// Chat to reply into (same as `user_id` for private chats).
    pub chat_id: i64,
    pub first_name: String,
    pub last_name: String,
}

impl SenderIdentity {
    /// "first last" as Telegram reports it, with empty parts dropped.
    pub fn full_name(&self) -> String {
        let mut parts = Vec::with_capacity(2);
        if !self.first_name.is_empty() {
            parts.push(self.first_name.as_str());
        }
        if !self.last_name.is_empty() {
            parts.push(self.last_name.as_str());
        }
        parts.join(" ")
    }
}

/// Bot commands the registration flow responds to.
///
/// Both funnel to the same "resume at current step" entry point — neither
/// resets an in-progress registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Signin,
}

/// What the user sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundKind {
    /// Free-text message (including unrecognized slash commands).
    Text(String),
    Command(Command),
}

/// One inbound event from the transport.
#[derive(Debug, Clone)]
pub struct Update {
    pub sender: SenderIdentity,
    pub kind: InboundKind,
}

/// Outbound message shapes the registration flow emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Plain text.
    Text(String),
    /// Text with a one-shot, auto-resizing Yes/No reply keyboard.
    YesNo(String),
    /// Text that also removes any visible reply keyboard.
    RemoveKeyboard(String),
}

impl Outbound {
    pub fn text(&self) -> &str {
        match self {
            Self::Text(t) | Self::YesNo(t) | Self::RemoveKeyboard(t) => t,
        }
    }
}

/// Stream of inbound updates produced by the long-poll loop.
pub type UpdateStream = Pin<Box<dyn Stream<Item = Update> + Send>>;
