//! Inbound message contract shared by the gateway and command handlers.
//!
//! The chat transport is an external collaborator; it feeds the gateway
//! opaque [`InboundMessage`]s and consumes plain-text replies through the
//! message's [`ReplySender`]. Nothing in here knows about any concrete
//! platform.

use tokio::sync::mpsc;

/// Opaque id of a message author.
pub type AuthorId = String;

/// Caller-supplied playback session key (one playback session per id).
pub type SessionId = String;

/// Opaque reference to a voice/audio channel the author is associated with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRef(pub String);

/// A single inbound chat message.
#[derive(Debug)]
pub struct InboundMessage {
    pub author: AuthorId,
    pub session: SessionId,
    /// Voice channel the author currently occupies, if any. Required for
    /// the play command to establish a connection.
    pub voice_channel: Option<ChannelRef>,
    pub content: String,
    pub reply: ReplySender,
}

/// Typed facade over the reply channel back to the originating conversation.
#[derive(Debug, Clone)]
pub struct ReplySender {
    tx: mpsc::Sender<String>,
}

impl ReplySender {
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx }
    }

    /// Send a plain-text reply. Errors only when the transport side is gone.
    pub async fn send(
        &self,
        text: impl Into<String>,
    ) -> Result<(), mpsc::error::SendError<String>> {
        self.tx.send(text.into()).await
    }
}
