use std::sync::Arc;

use chrono::Utc;
use futures::StreamExt;

use signin_bot::channel::TelegramChannel;
use signin_bot::config::Config;
use signin_bot::error::Result;
use signin_bot::registration::{Prompts, Registry, SigninLinks};
use signin_bot::store::{LibSqlStore, UserStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Config::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export SIGNIN_BOT_TOKEN=123456:ABC-...");
        std::process::exit(1);
    });

    run(config).await?;
    Ok(())
}

async fn run(config: Config) -> Result<()> {
    eprintln!("🔑 Sign-in Bot v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Service: {}", config.service_name);
    eprintln!("   Links:   {}/signin", config.base_url);

    // ── Store ────────────────────────────────────────────────────────────
    let store: Arc<dyn UserStore> = Arc::new(LibSqlStore::new_local(&config.db_path).await?);
    eprintln!("   Store:   {}", config.db_path.display());

    // ── Registry ─────────────────────────────────────────────────────────
    let registry = Registry::new(
        Prompts::new(config.service_name.clone(), config.tos_url.clone()),
        SigninLinks::new(config.base_url.clone()),
    );

    // Rehydrate persisted registrations from the last run.
    match store.load_all().await {
        Ok(entries) => registry.rehydrate(entries),
        Err(e) => tracing::warn!("Could not rehydrate registrations: {e}"),
    }
    if !registry.is_empty() {
        eprintln!("   Restored {} registrations", registry.len());
    }

    // ── Channel ──────────────────────────────────────────────────────────
    let channel = TelegramChannel::new(config.bot_token.clone());
    channel.health_check().await?;
    eprintln!("   Telegram: connected\n");

    let mut updates = channel.start();

    // ── Event loop ───────────────────────────────────────────────────────
    // Updates are processed sequentially; the registry lock never spans a
    // send or store write.
    while let Some(update) = updates.next().await {
        let now = Utc::now();
        let user_id = update.sender.user_id;
        let outcome = registry.handle(&update, now);

        let mut delivered = true;
        for message in &outcome.messages {
            if let Err(e) = channel.send(update.sender.chat_id, message).await {
                // Best-effort: the user's next message is the retry.
                tracing::warn!(user_id, "Send failed: {e}");
                delivered = false;
            }
        }

        // The cooldown timestamp only advances once the link actually went
        // out, so a transport failure keeps the user eligible to retry.
        if outcome.signin_issued && delivered {
            registry.confirm_signin_sent(user_id, now);
        }

        // Write-through persistence; failures leave memory authoritative.
        if let Some(record) = registry.snapshot(user_id) {
            if let Err(e) = store.put(user_id, &record).await {
                tracing::warn!(user_id, "Persist failed: {e}");
            }
        }
    }

    Ok(())
}
