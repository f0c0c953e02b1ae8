//! Telegram channel — long-polls the Bot API for updates.
//!
//! Native Bot API client over reqwest: a spawned `getUpdates` loop feeds an
//! update stream, and `send` maps [`Outbound`] shapes onto `sendMessage`
//! reply-markup payloads.

use secrecy::{ExposeSecret, SecretString};

use crate::channel::{Command, InboundKind, Outbound, SenderIdentity, Update, UpdateStream};
use crate::error::ChannelError;

/// Long-poll timeout passed to `getUpdates`.
const POLL_TIMEOUT_SECS: u64 = 30;

/// Telegram channel — connects to the Bot API via long-polling.
pub struct TelegramChannel {
    bot_token: SecretString,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(bot_token: SecretString) -> Self {
        Self {
            bot_token,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "https://api.telegram.org/bot{}/{method}",
            self.bot_token.expose_secret()
        )
    }

    /// Verify the token against `getMe`. Used at startup to fail fast.
    pub async fn health_check(&self) -> Result<(), ChannelError> {
        let resp = self
            .client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map_err(|e| ChannelError::StartupFailed {
                reason: e.to_string(),
            })?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ChannelError::StartupFailed {
                reason: format!("getMe returned {}", resp.status()),
            })
        }
    }

    /// Start the long-poll loop and return a stream of inbound updates.
    pub fn start(&self) -> UpdateStream {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let url = self.api_url("getUpdates");
        let client = self.client.clone();

        tokio::spawn(async move {
            let mut offset: i64 = 0;

            tracing::info!("Telegram channel listening for messages...");

            loop {
                let body = serde_json::json!({
                    "offset": offset,
                    "timeout": POLL_TIMEOUT_SECS,
                    "allowed_updates": ["message"]
                });

                let resp = match client.post(&url).json(&body).send().await {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!("Telegram poll error: {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                        continue;
                    }
                };

                let data: serde_json::Value = match resp.json().await {
                    Ok(d) => d,
                    Err(e) => {
                        tracing::warn!("Telegram parse error: {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                        continue;
                    }
                };

                if let Some(results) = data.get("result").and_then(serde_json::Value::as_array) {
                    for raw in results {
                        if let Some(uid) = raw.get("update_id").and_then(serde_json::Value::as_i64)
                        {
                            offset = uid + 1;
                        }

                        let Some(update) = parse_update(raw) else {
                            continue;
                        };

                        if tx.send(update).is_err() {
                            tracing::info!("Telegram listener channel closed");
                            return;
                        }
                    }
                }
            }
        });

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|update| (update, rx))
        });

        Box::pin(stream)
    }

    /// Send one outbound message to a chat.
    ///
    /// Failures are returned, never retried — the user's next message is the
    /// retry mechanism.
    pub async fn send(&self, chat_id: i64, message: &Outbound) -> Result<(), ChannelError> {
        let mut body = serde_json::json!({
            "chat_id": chat_id,
            "text": message.text(),
        });

        match message {
            Outbound::Text(_) => {}
            Outbound::YesNo(_) => {
                body["reply_markup"] = serde_json::json!({
                    "keyboard": [[{"text": "Yes"}, {"text": "No"}]],
                    "one_time_keyboard": true,
                    "resize_keyboard": true,
                });
            }
            Outbound::RemoveKeyboard(_) => {
                body["reply_markup"] = serde_json::json!({"remove_keyboard": true});
            }
        }

        let resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let err = resp.text().await.unwrap_or_default();
            return Err(ChannelError::SendFailed {
                reason: format!("sendMessage returned {status}: {err}"),
            });
        }

        Ok(())
    }
}

// ── Update parsing ──────────────────────────────────────────────────

/// Extract an [`Update`] from a raw `getUpdates` result entry.
///
/// Updates without a text body or a sender id are skipped.
fn parse_update(raw: &serde_json::Value) -> Option<Update> {
    let message = raw.get("message")?;
    let text = message.get("text").and_then(serde_json::Value::as_str)?;

    let from = message.get("from")?;
    let user_id = from.get("id").and_then(serde_json::Value::as_i64)?;
    let first_name = from
        .get("first_name")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_string();
    let last_name = from
        .get("last_name")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_string();

    let chat_id = message
        .get("chat")
        .and_then(|c| c.get("id"))
        .and_then(serde_json::Value::as_i64)
        .unwrap_or(user_id);

    Some(Update {
        sender: SenderIdentity {
            user_id,
            chat_id,
            first_name,
            last_name,
        },
        kind: classify_text(text),
    })
}

/// Map message text to a command or free text.
///
/// Commands may carry a bot mention (`/signin@SomeBot`); anything after the
/// command token is ignored. Unknown slash commands flow through as text.
fn classify_text(text: &str) -> InboundKind {
    let token = text
        .trim()
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .split('@')
        .next()
        .unwrap_or_default();

    match token {
        "/start" => InboundKind::Command(Command::Start),
        "/signin" => InboundKind::Command(Command::Signin),
        _ => InboundKind::Text(text.to_string()),
    }
}

// ── Tests ───────────────────────────────────────────────────────────
