//! jukebot: a command-driven chat automation agent with a media playback
//! scheduler.
//!
//! The agent listens on a chat transport, resolves prefixed messages against
//! a config-driven command table, and dispatches validated invocations to
//! registered handlers as independent tasks. The built-in playback module
//! maintains one actor-owned playback session per session id with a current
//! track, a pending queue, and a persistent volume.
//!
//! The chat and voice platforms are collaborators behind trait seams
//! ([`playback::provider`] and [`message::InboundMessage`]); the crate ships
//! a console transport as its local driver.

pub mod commands;
pub mod config;
pub mod console;
pub mod error;
pub mod gateway;
pub mod lifecycle;
pub mod message;
pub mod playback;
pub mod telemetry;

use commands::{HelpHandler, Registry, TerminateHandler};
use config::{CommandTable, Config, ConfigError};
use gateway::Gateway;
use lifecycle::Lifecycle;
use message::{AuthorId, InboundMessage};
use playback::PlaybackModule;
use playback::provider::{SourceResolver, VoiceProvider};
use playback::session::SessionSettings;
use std::sync::Arc;
use tokio::sync::{Notify, mpsc};

/// Capacity of the transport-to-gateway message channel.
const INBOUND_CHANNEL_CAPACITY: usize = 256;

/// A fully assembled agent: registry, playback module, and gateway.
pub struct Bot {
    inbound: mpsc::Sender<InboundMessage>,
    gateway: Gateway,
}

impl Bot {
    /// Compile the command table and wire up all modules.
    ///
    /// `bot_id` is the author id the agent posts under; inbound messages
    /// from that author are never dispatched.
    pub fn new(
        config: &Config,
        bot_id: AuthorId,
        voice: Arc<dyn VoiceProvider>,
        resolver: Arc<dyn SourceResolver>,
    ) -> Result<Self, ConfigError> {
        let table = Arc::new(CommandTable::compile(&config.commands)?);
        let lifecycle = Arc::new(Lifecycle::new(config.timeouts.teardown()));
        let shutdown = Arc::new(Notify::new());

        let mut registry = Registry::new(
            Arc::clone(&table),
            config.bot.prefix,
            config.dispatch.reply_on_error,
            Arc::clone(&lifecycle),
            Arc::clone(&shutdown),
        );
        registry.register("help", Box::new(HelpHandler));
        registry.register("terminate", Box::new(TerminateHandler));

        let module = PlaybackModule::new(
            voice,
            resolver,
            SessionSettings {
                default_track: config.bot.default_track.clone(),
                join_timeout: config.timeouts.join(),
                open_timeout: config.timeouts.open(),
            },
        );
        module.register(&mut registry, &lifecycle);

        let (inbound, rx) = mpsc::channel(INBOUND_CHANNEL_CAPACITY);
        let gateway = Gateway::new(Arc::new(registry), bot_id, rx, shutdown);
        Ok(Self { inbound, gateway })
    }

    /// Sender the chat transport feeds inbound messages into.
    pub fn inbound(&self) -> mpsc::Sender<InboundMessage> {
        self.inbound.clone()
    }

    /// Run the gateway loop until shutdown or transport close.
    pub async fn run(self) {
        self.gateway.run().await;
    }
}
