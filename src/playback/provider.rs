//! Collaborator contracts for voice channels and audio streaming.
//!
//! Concrete platform integrations implement these traits and are injected at
//! startup. The playback session only ever sees trait objects, so the core
//! state machine is testable without any real audio plumbing.

use crate::error::ProviderError;
use crate::message::ChannelRef;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Events raised by a live stream.
///
/// Every event carries the generation id of the stream that raised it; the
/// session ignores events whose generation no longer matches the current
/// item, which makes teardown after stop/skip/leave idempotent.
#[derive(Debug)]
pub enum StreamEvent {
    Debug { generation: u64, info: String },
    Error { generation: u64, message: String },
    Finished { generation: u64 },
}

impl StreamEvent {
    pub fn generation(&self) -> u64 {
        match self {
            Self::Debug { generation, .. }
            | Self::Error { generation, .. }
            | Self::Finished { generation } => *generation,
        }
    }
}

/// A playable source opened from a track reference.
pub trait AudioSource: Send + Sync {
    /// The track reference this source was opened from.
    fn track(&self) -> &str;
}

/// Streaming provider: resolves a track reference to a playable source.
///
/// Quality/filter selection (highest audio, audio only) is the provider's
/// concern, not the session's.
#[async_trait]
pub trait SourceResolver: Send + Sync {
    async fn open(&self, track: &str) -> Result<Box<dyn AudioSource>, ProviderError>;
}

/// Voice channel provider: owns the platform's audio sessions.
#[async_trait]
pub trait VoiceProvider: Send + Sync {
    async fn join(&self, channel: &ChannelRef) -> Result<Box<dyn VoiceConnection>, ProviderError>;
}

/// A live audio session on one voice channel.
#[async_trait]
pub trait VoiceConnection: Send + Sync {
    /// Start streaming a source at the given volume. Stream events are
    /// reported on `events`, tagged with `generation`.
    async fn play(
        &self,
        source: Box<dyn AudioSource>,
        volume: f32,
        generation: u64,
        events: mpsc::Sender<StreamEvent>,
    ) -> Result<Box<dyn StreamHandle>, ProviderError>;

    /// Release the audio session.
    async fn disconnect(&self);
}

/// Control handle for one active stream.
pub trait StreamHandle: Send + Sync {
    fn pause(&self);
    fn resume(&self);
    fn set_volume(&self, volume: f32);
    /// Tear the stream down. Must not raise a finished event.
    fn destroy(&self);
}
