//! Media playback module.
//!
//! The module owns one [`session::PlaybackSession`] actor per session id,
//! created lazily on first command, and exposes thin command handlers that
//! forward into the owning actor. Teardown walks every live session, leaves
//! its voice channel, and waits for the actors to exit.

pub mod commands;
pub mod provider;
pub mod session;

use crate::commands::Registry;
use crate::lifecycle::Lifecycle;
use crate::message::SessionId;
use dashmap::DashMap;
use futures_util::future;
use provider::{SourceResolver, VoiceProvider};
use session::{PlaybackSession, SessionHandle, SessionSettings};
use std::sync::Arc;
use tracing::info;

/// Shared playback module state: the session map and provider seams.
pub struct PlaybackModule {
    sessions: DashMap<SessionId, SessionHandle>,
    voice: Arc<dyn VoiceProvider>,
    resolver: Arc<dyn SourceResolver>,
    settings: SessionSettings,
}

impl PlaybackModule {
    pub fn new(
        voice: Arc<dyn VoiceProvider>,
        resolver: Arc<dyn SourceResolver>,
        settings: SessionSettings,
    ) -> Arc<Self> {
        Arc::new(Self {
            sessions: DashMap::new(),
            voice,
            resolver,
            settings,
        })
    }

    /// Get the session actor for an id, spawning it on first use.
    pub fn session(&self, id: &SessionId) -> SessionHandle {
        self.sessions
            .entry(id.clone())
            .or_insert_with(|| {
                info!(session = %id, "Spawning playback session");
                PlaybackSession::spawn(
                    id.clone(),
                    Arc::clone(&self.voice),
                    Arc::clone(&self.resolver),
                    self.settings.clone(),
                )
            })
            .clone()
    }

    /// Bind the playback handlers into the registry and hook teardown.
    pub fn register(self: &Arc<Self>, registry: &mut Registry, lifecycle: &Lifecycle) {
        commands::register_all(self, registry);

        let module = Arc::clone(self);
        lifecycle.add_hook("playback-sessions", move || async move {
            module.shutdown_all().await;
        });
    }

    /// Leave every session's voice channel and stop the actors.
    async fn shutdown_all(&self) {
        let handles: Vec<SessionHandle> = self
            .sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        if handles.is_empty() {
            return;
        }
        info!(count = handles.len(), "Shutting down playback sessions");
        future::join_all(handles.iter().map(|h| h.shutdown())).await;
        self.sessions.clear();
    }
}
