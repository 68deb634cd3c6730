use anyhow::Context as _;
use jukebot::config::Config;
use jukebot::{Bot, console};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    let config =
        Config::load(&path).with_context(|| format!("loading configuration from {path}"))?;
    info!(
        commands = config.commands.len(),
        prefix = %config.bot.prefix,
        "Configuration loaded"
    );

    let bot = Bot::new(
        &config,
        console::CONSOLE_BOT_ID.to_string(),
        Arc::new(console::ConsoleVoice),
        Arc::new(console::ConsoleResolver),
    )?;

    let inbound = bot.inbound();
    tokio::spawn(console::run(inbound));

    info!("jukebot ready; reading commands from stdin");
    bot.run().await;
    info!("jukebot stopped");
    Ok(())
}
