//! Inbound message pump.
//!
//! The gateway sits between the chat transport and the dispatcher: it drains
//! the transport's message channel, drops the bot's own messages, and hands
//! everything else to [`Registry::dispatch`]. It exits when the transport
//! channel closes or the shutdown signal fires.

use crate::commands::Registry;
use crate::message::{AuthorId, InboundMessage};
use std::sync::Arc;
use tokio::sync::{Notify, mpsc};
use tracing::{debug, info};

pub struct Gateway {
    registry: Arc<Registry>,
    /// Author id the bot posts under; its own messages are never dispatched.
    bot_id: AuthorId,
    rx: mpsc::Receiver<InboundMessage>,
    shutdown: Arc<Notify>,
}

impl Gateway {
    pub fn new(
        registry: Arc<Registry>,
        bot_id: AuthorId,
        rx: mpsc::Receiver<InboundMessage>,
        shutdown: Arc<Notify>,
    ) -> Self {
        Self {
            registry,
            bot_id,
            rx,
            shutdown,
        }
    }

    /// Drain messages until shutdown or transport close.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                _ = self.shutdown.notified() => {
                    info!("Shutdown signal received; stopping gateway");
                    break;
                }
                maybe = self.rx.recv() => {
                    let Some(msg) = maybe else {
                        info!("Transport channel closed; stopping gateway");
                        break;
                    };
                    if msg.author == self.bot_id {
                        debug!("Skipping own message");
                        continue;
                    }
                    self.registry.dispatch(msg).await;
                }
            }
        }
    }
}
