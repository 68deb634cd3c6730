//! Console transport and simulated voice stack for local runs.
//!
//! Stands in for a real chat/voice platform: stdin lines become inbound
//! messages, replies print to stdout, and "streams" are timers that raise a
//! finished event after a fixed simulated track length.

use crate::error::ProviderError;
use crate::message::{ChannelRef, InboundMessage, ReplySender};
use crate::playback::provider::{
    AudioSource, SourceResolver, StreamEvent, StreamHandle, VoiceConnection, VoiceProvider,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info};

/// Author id the agent posts under on the console transport.
pub const CONSOLE_BOT_ID: &str = "jukebot";

const SIMULATED_TRACK_LENGTH: Duration = Duration::from_secs(30);

/// Pump stdin lines into the gateway until EOF or gateway close.
pub async fn run(inbound: mpsc::Sender<InboundMessage>) {
    let (reply_tx, mut reply_rx) = mpsc::channel::<String>(64);
    tokio::spawn(async move {
        while let Some(text) = reply_rx.recv().await {
            println!("{text}");
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let msg = InboundMessage {
                    author: "console".to_string(),
                    session: "console".to_string(),
                    voice_channel: Some(ChannelRef("console".to_string())),
                    content: line,
                    reply: ReplySender::new(reply_tx.clone()),
                };
                if inbound.send(msg).await.is_err() {
                    break;
                }
            }
            Ok(None) => {
                info!("Console input closed");
                break;
            }
            Err(e) => {
                error!(error = %e, "Console read failed");
                break;
            }
        }
    }
}

pub struct ConsoleVoice;

#[async_trait]
impl VoiceProvider for ConsoleVoice {
    async fn join(&self, channel: &ChannelRef) -> Result<Box<dyn VoiceConnection>, ProviderError> {
        info!(channel = %channel.0, "Joined simulated voice channel");
        Ok(Box::new(ConsoleConnection {
            channel: channel.0.clone(),
        }))
    }
}

pub struct ConsoleResolver;

#[async_trait]
impl SourceResolver for ConsoleResolver {
    async fn open(&self, track: &str) -> Result<Box<dyn AudioSource>, ProviderError> {
        Ok(Box::new(ConsoleSource(track.to_string())))
    }
}

struct ConsoleSource(String);

impl AudioSource for ConsoleSource {
    fn track(&self) -> &str {
        &self.0
    }
}

struct ConsoleConnection {
    channel: String,
}

#[async_trait]
impl VoiceConnection for ConsoleConnection {
    async fn play(
        &self,
        source: Box<dyn AudioSource>,
        volume: f32,
        generation: u64,
        events: mpsc::Sender<StreamEvent>,
    ) -> Result<Box<dyn StreamHandle>, ProviderError> {
        info!(
            channel = %self.channel,
            track = %source.track(),
            volume,
            generation,
            "Streaming (simulated)"
        );
        let destroyed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&destroyed);
        tokio::spawn(async move {
            tokio::time::sleep(SIMULATED_TRACK_LENGTH).await;
            if !flag.load(Ordering::SeqCst) {
                let _ = events.send(StreamEvent::Finished { generation }).await;
            }
        });
        Ok(Box::new(ConsoleHandle {
            generation,
            destroyed,
        }))
    }

    async fn disconnect(&self) {
        info!(channel = %self.channel, "Left simulated voice channel");
    }
}

struct ConsoleHandle {
    generation: u64,
    destroyed: Arc<AtomicBool>,
}

impl StreamHandle for ConsoleHandle {
    fn pause(&self) {
        info!(generation = self.generation, "Stream paused");
    }

    fn resume(&self) {
        info!(generation = self.generation, "Stream resumed");
    }

    fn set_volume(&self, volume: f32) {
        info!(generation = self.generation, volume, "Stream volume changed");
    }

    fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
        info!(generation = self.generation, "Stream destroyed");
    }
}
