//! In-process test harness.
//!
//! Builds a full agent (command table, registry, playback module, gateway)
//! against a mock voice stack, feeds inbound messages through the gateway,
//! and records every provider interaction for assertions.

use async_trait::async_trait;
use jukebot::Bot;
use jukebot::config::Config;
use jukebot::error::ProviderError;
use jukebot::message::{ChannelRef, InboundMessage, ReplySender};
use jukebot::playback::provider::{
    AudioSource, SourceResolver, StreamEvent, StreamHandle, VoiceConnection, VoiceProvider,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

pub const BOT_ID: &str = "jukebot";

/// Full command table mirroring the shipped configuration.
pub const CONFIG: &str = r#"
[bot]
token = "test-token"
prefix = "!"
default_track = "default-track"

[[commands]]
name = "play"
handler = "play"
description = "Play a track, resume, or queue another track. Append -l to loop."
required_args = 0

    [[commands.args]]
    pattern = ".+"

    [[commands.args]]
    pattern = "^-l$"

[[commands]]
name = "pause"
handler = "pause"
description = "Toggle pause on the current track."

[[commands]]
name = "stop"
handler = "stop"
description = "Stop the current track, keeping the queue."

[[commands]]
name = "skip"
handler = "skip"
description = "Skip to the next queued track."

[[commands]]
name = "queue"
handler = "show_queue"
description = "Show the current track and queued tracks."

[[commands]]
name = "clearqueue"
handler = "empty_queue"
description = "Empty the music queue."

[[commands]]
name = "volume"
handler = "volume"
description = "Set playback volume, e.g. volume 0.5."
required_args = 1

    [[commands.args]]
    pattern = '^\d+(\.\d+)?$'

[[commands]]
name = "leave"
handler = "leave"
description = "Stop playback and leave the voice channel."

[[commands]]
name = "help"
handler = "help"
description = "List available commands."

[[commands]]
name = "terminate"
handler = "terminate"
description = "Run module teardown and exit."
"#;

/// Records provider interactions and keeps stream event senders so tests
/// can raise finished events for any generation.
#[derive(Default)]
pub struct Recorder {
    pub joins: Mutex<Vec<String>>,
    pub plays: Mutex<Vec<(String, f32, u64)>>,
    senders: Mutex<Vec<(u64, mpsc::Sender<StreamEvent>)>>,
    pub ops: Mutex<Vec<String>>,
}

impl Recorder {
    fn op(&self, op: impl Into<String>) {
        self.ops.lock().push(op.into());
    }

    pub async fn finish(&self, generation: u64) {
        let sender = self
            .senders
            .lock()
            .iter()
            .find(|(g, _)| *g == generation)
            .map(|(_, tx)| tx.clone())
            .expect("no stream with that generation");
        sender
            .send(StreamEvent::Finished { generation })
            .await
            .expect("event channel closed");
    }

    pub fn plays(&self) -> Vec<(String, f32, u64)> {
        self.plays.lock().clone()
    }

    pub fn ops(&self) -> Vec<String> {
        self.ops.lock().clone()
    }

    /// Wait until the recorder has seen `count` stream starts.
    pub async fn wait_plays(&self, count: usize) -> Vec<(String, f32, u64)> {
        for _ in 0..100 {
            let plays = self.plays();
            if plays.len() >= count {
                return plays;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {count} stream starts, saw {:?}", self.plays());
    }

    /// Wait until the recorder has seen the given operation.
    pub async fn wait_op(&self, op: &str) {
        for _ in 0..100 {
            if self.ops().iter().any(|o| o == op) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("operation {op:?} never recorded, saw {:?}", self.ops());
    }
}

struct MockSource(String);

impl AudioSource for MockSource {
    fn track(&self) -> &str {
        &self.0
    }
}

struct MockResolver;

#[async_trait]
impl SourceResolver for MockResolver {
    async fn open(&self, track: &str) -> Result<Box<dyn AudioSource>, ProviderError> {
        Ok(Box::new(MockSource(track.to_string())))
    }
}

struct MockVoice {
    recorder: Arc<Recorder>,
}

#[async_trait]
impl VoiceProvider for MockVoice {
    async fn join(&self, channel: &ChannelRef) -> Result<Box<dyn VoiceConnection>, ProviderError> {
        self.recorder.joins.lock().push(channel.0.clone());
        Ok(Box::new(MockConnection {
            recorder: Arc::clone(&self.recorder),
        }))
    }
}

struct MockConnection {
    recorder: Arc<Recorder>,
}

#[async_trait]
impl VoiceConnection for MockConnection {
    async fn play(
        &self,
        source: Box<dyn AudioSource>,
        volume: f32,
        generation: u64,
        events: mpsc::Sender<StreamEvent>,
    ) -> Result<Box<dyn StreamHandle>, ProviderError> {
        self.recorder
            .plays
            .lock()
            .push((source.track().to_string(), volume, generation));
        self.recorder.senders.lock().push((generation, events));
        Ok(Box::new(MockHandle {
            recorder: Arc::clone(&self.recorder),
            generation,
        }))
    }

    async fn disconnect(&self) {
        self.recorder.op("disconnect");
    }
}

struct MockHandle {
    recorder: Arc<Recorder>,
    generation: u64,
}

impl StreamHandle for MockHandle {
    fn pause(&self) {
        self.recorder.op(format!("pause:{}", self.generation));
    }

    fn resume(&self) {
        self.recorder.op(format!("resume:{}", self.generation));
    }

    fn set_volume(&self, volume: f32) {
        self.recorder
            .op(format!("volume:{}:{}", self.generation, volume));
    }

    fn destroy(&self) {
        self.recorder.op(format!("destroy:{}", self.generation));
    }
}

/// A running agent plus the channels and recorder to observe it.
pub struct Harness {
    pub inbound: mpsc::Sender<InboundMessage>,
    pub recorder: Arc<Recorder>,
    reply_tx: mpsc::Sender<String>,
    pub replies: mpsc::Receiver<String>,
}

impl Harness {
    pub fn spawn() -> Self {
        Self::spawn_with(CONFIG)
    }

    pub fn spawn_with(toml: &str) -> Self {
        let config = Config::from_toml(toml).expect("test config");
        let recorder = Arc::new(Recorder::default());
        let bot = Bot::new(
            &config,
            BOT_ID.to_string(),
            Arc::new(MockVoice {
                recorder: Arc::clone(&recorder),
            }),
            Arc::new(MockResolver),
        )
        .expect("bot assembly");
        let inbound = bot.inbound();
        tokio::spawn(bot.run());
        let (reply_tx, replies) = mpsc::channel(64);
        Self {
            inbound,
            recorder,
            reply_tx,
            replies,
        }
    }

    /// Send a message as the default test user from a voice channel.
    pub async fn say(&self, content: &str) {
        self.say_as("alice", content).await;
    }

    pub async fn say_as(&self, author: &str, content: &str) {
        self.inbound
            .send(InboundMessage {
                author: author.to_string(),
                session: "guild-1".to_string(),
                voice_channel: Some(ChannelRef("voice-1".to_string())),
                content: content.to_string(),
                reply: ReplySender::new(self.reply_tx.clone()),
            })
            .await
            .expect("gateway closed");
    }

    /// Await the next reply.
    pub async fn reply(&mut self) -> String {
        tokio::time::timeout(Duration::from_secs(1), self.replies.recv())
            .await
            .expect("no reply arrived")
            .expect("reply channel closed")
    }

    /// Assert no reply arrives within a short window.
    pub async fn expect_no_reply(&mut self) {
        tokio::time::sleep(Duration::from_millis(50)).await;
        if let Ok(text) = self.replies.try_recv() {
            panic!("unexpected reply: {text:?}");
        }
    }
}
