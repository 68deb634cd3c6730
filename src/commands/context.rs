//! Handler trait and per-invocation context.

use crate::config::CommandTable;
use crate::error::HandlerResult;
use crate::lifecycle::Lifecycle;
use crate::message::{AuthorId, ChannelRef, ReplySender, SessionId};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Notify;

/// Invocation context passed to each command handler.
///
/// Owned rather than borrowed: the dispatcher spawns handlers as independent
/// tasks and does not wait for them, so everything a handler touches must
/// live for the duration of the task.
pub struct Context {
    /// Playback session key the message belongs to.
    pub session: SessionId,
    /// Author of the triggering message.
    pub author: AuthorId,
    /// Voice channel the author occupies, if any.
    pub voice_channel: Option<ChannelRef>,
    /// Validated positional arguments. Each has already passed its
    /// descriptor rule; case-insensitive arguments arrive lowercased.
    /// Trailing arguments beyond the configured rules are dropped.
    pub args: Vec<String>,
    /// Reply channel back to the originating conversation.
    pub reply: ReplySender,
    /// The command descriptor table (help listing).
    pub table: Arc<CommandTable>,
    /// Teardown hook coordinator (terminate).
    pub lifecycle: Arc<Lifecycle>,
    /// Shutdown signal observed by the gateway loop.
    pub shutdown: Arc<Notify>,
}

/// A registered command handler.
///
/// All handlers share one asynchronous-task contract; the dispatcher issues
/// the call without waiting. Serialization of shared state is the handler's
/// concern (the playback handlers forward into a per-session actor).
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, ctx: Context) -> HandlerResult;
}
