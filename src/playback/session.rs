//! Playback session actor.
//!
//! One actor task per session owns the whole playback state (connection,
//! current item, queue, volume) and processes user commands and provider
//! stream events sequentially. A finished event arriving mid-transition can
//! therefore never observe or clobber a partially updated state; commands
//! and events simply queue behind each other.
//!
//! Derived states: Disconnected (no connection), ConnectedIdle (connection,
//! no current item), Playing, and Paused (current item's `paused` flag).
//! Looping is an attribute of the current item, not a separate state.

use crate::error::HandlerError;
use crate::message::{ChannelRef, ReplySender, SessionId};
use crate::playback::provider::{
    SourceResolver, StreamEvent, StreamHandle, VoiceConnection, VoiceProvider,
};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Per-session tuning derived from config.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Track synthesized when play runs with an empty queue and no args.
    pub default_track: String,
    pub join_timeout: Duration,
    pub open_timeout: Duration,
}

/// A user-issued playback command.
#[derive(Debug)]
pub enum PlaybackCommand {
    Play { args: Vec<String> },
    Pause,
    Stop,
    Skip,
    Leave,
    Volume(f32),
    ShowQueue,
    EmptyQueue,
}

/// Events consumed by the session actor.
enum SessionEvent {
    Command {
        cmd: PlaybackCommand,
        reply: Option<ReplySender>,
        voice_channel: Option<ChannelRef>,
    },
    /// Leave the voice channel and exit the actor (module teardown).
    Shutdown { ack: oneshot::Sender<()> },
    /// Read-only state snapshot, used by queue reporting tests.
    Snapshot { ack: oneshot::Sender<SessionSnapshot> },
}

/// Read-only view of the session state.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub connected: bool,
    pub current: Option<TrackSnapshot>,
    pub queue: Vec<String>,
    pub volume: f32,
}

#[derive(Debug, Clone)]
pub struct TrackSnapshot {
    pub track: String,
    pub looped: bool,
    pub paused: bool,
    pub generation: u64,
}

/// Cheap clonable handle to a session actor.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionEvent>,
}

impl SessionHandle {
    /// Enqueue a command for the actor. Fails only when the actor is gone.
    pub async fn command(
        &self,
        cmd: PlaybackCommand,
        reply: Option<ReplySender>,
        voice_channel: Option<ChannelRef>,
    ) -> Result<(), HandlerError> {
        self.tx
            .send(SessionEvent::Command {
                cmd,
                reply,
                voice_channel,
            })
            .await
            .map_err(|_| HandlerError::SessionClosed)
    }

    /// Leave the voice channel and stop the actor, awaiting completion.
    pub async fn shutdown(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(SessionEvent::Shutdown { ack }).await.is_ok() {
            let _ = done.await;
        }
    }

    /// Read-only snapshot of the session state. `None` if the actor is gone.
    pub async fn snapshot(&self) -> Option<SessionSnapshot> {
        let (ack, done) = oneshot::channel();
        self.tx.send(SessionEvent::Snapshot { ack }).await.ok()?;
        done.await.ok()
    }
}

/// The one track actively streaming, or queued to stream.
struct StreamItem {
    track: String,
    looped: bool,
    paused: bool,
    /// Monotonic id of the stream opened for this item; stream events with
    /// any other generation are stale and ignored.
    generation: u64,
    handle: Option<Box<dyn StreamHandle>>,
}

impl StreamItem {
    fn new(track: String, looped: bool) -> Self {
        Self {
            track,
            looped,
            paused: false,
            generation: 0,
            handle: None,
        }
    }
}

/// The session actor. Owns all playback state; never shared.
pub struct PlaybackSession {
    session: SessionId,
    voice: Arc<dyn VoiceProvider>,
    resolver: Arc<dyn SourceResolver>,
    settings: SessionSettings,
    connection: Option<Box<dyn VoiceConnection>>,
    current: Option<StreamItem>,
    queue: VecDeque<StreamItem>,
    volume: f32,
    next_generation: u64,
    events_tx: mpsc::Sender<StreamEvent>,
}

impl PlaybackSession {
    /// Spawn the actor task and return its handle.
    pub fn spawn(
        session: SessionId,
        voice: Arc<dyn VoiceProvider>,
        resolver: Arc<dyn SourceResolver>,
        settings: SessionSettings,
    ) -> SessionHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        let (events_tx, events_rx) = mpsc::channel(64);
        let actor = Self {
            session,
            voice,
            resolver,
            settings,
            connection: None,
            current: None,
            queue: VecDeque::new(),
            volume: 1.0,
            next_generation: 0,
            events_tx,
        };
        tokio::spawn(actor.run(cmd_rx, events_rx));
        SessionHandle { tx: cmd_tx }
    }

    /// The main actor loop. Commands and stream events are interleaved but
    /// each is handled to completion before the next.
    async fn run(
        mut self,
        mut cmd_rx: mpsc::Receiver<SessionEvent>,
        mut events_rx: mpsc::Receiver<StreamEvent>,
    ) {
        loop {
            tokio::select! {
                Some(event) = events_rx.recv() => self.handle_stream_event(event).await,
                maybe = cmd_rx.recv() => match maybe {
                    Some(SessionEvent::Command { cmd, reply, voice_channel }) => {
                        self.handle_command(cmd, reply.as_ref(), voice_channel.as_ref()).await;
                    }
                    Some(SessionEvent::Shutdown { ack }) => {
                        self.leave().await;
                        let _ = ack.send(());
                        break;
                    }
                    Some(SessionEvent::Snapshot { ack }) => {
                        let _ = ack.send(self.snapshot());
                    }
                    None => {
                        self.leave().await;
                        break;
                    }
                },
            }
        }
    }

    async fn handle_command(
        &mut self,
        cmd: PlaybackCommand,
        reply: Option<&ReplySender>,
        voice_channel: Option<&ChannelRef>,
    ) {
        match cmd {
            PlaybackCommand::Play { args } => self.play(&args, reply, voice_channel).await,
            PlaybackCommand::Pause => self.pause_toggle(),
            PlaybackCommand::Stop => self.stop(),
            PlaybackCommand::Skip => self.skip().await,
            PlaybackCommand::Leave => self.leave().await,
            PlaybackCommand::Volume(volume) => self.set_volume(volume, reply).await,
            PlaybackCommand::ShowQueue => self.show_queue(reply).await,
            PlaybackCommand::EmptyQueue => self.empty_queue(reply).await,
        }
    }

    /// The play command: connect, resume, enqueue, or start, depending on
    /// state. See the transition table in the module docs.
    async fn play(
        &mut self,
        args: &[String],
        reply: Option<&ReplySender>,
        voice_channel: Option<&ChannelRef>,
    ) {
        if self.connection.is_none() {
            // Caller must have an associated voice channel; otherwise the
            // command is silently ignored.
            let Some(channel) = voice_channel else {
                return;
            };
            match timeout(self.settings.join_timeout, self.voice.join(channel)).await {
                Ok(Ok(connection)) => {
                    info!(session = %self.session, channel = %channel.0, "Joined voice channel");
                    self.connection = Some(connection);
                }
                Ok(Err(e)) => {
                    warn!(session = %self.session, error = %e, "Voice join failed");
                    return;
                }
                Err(_) => {
                    warn!(
                        session = %self.session,
                        timeout = ?self.settings.join_timeout,
                        "Voice join timed out"
                    );
                    return;
                }
            }
        }

        match self.current.take() {
            Some(mut item) if item.paused && args.is_empty() => {
                item.paused = false;
                if item.handle.is_some() {
                    if let Some(handle) = item.handle.as_deref() {
                        handle.resume();
                    }
                    self.current = Some(item);
                } else {
                    // Loop restart: the finished handle is gone, so the
                    // resume path reopens a fresh stream for the same track.
                    self.start_stream(item, None).await;
                }
            }
            Some(item) => {
                self.current = Some(item);
                if let Some(track) = args.first() {
                    let queued = StreamItem::new(track.clone(), loop_requested(args));
                    if let Some(reply) = reply {
                        let _ = reply
                            .send(format!(
                                "Enqueued {} with loop = {}",
                                queued.track, queued.looped
                            ))
                            .await;
                    }
                    self.queue.push_back(queued);
                }
            }
            None => {
                let item = match self.queue.pop_front() {
                    Some(item) => item,
                    None => match args.first() {
                        Some(track) => StreamItem::new(track.clone(), loop_requested(args)),
                        None => StreamItem::new(self.settings.default_track.clone(), false),
                    },
                };
                self.start_stream(item, reply).await;
            }
        }
    }

    /// Open a source and start streaming it as the current item.
    ///
    /// On any failure the item is dropped and `current` stays empty; the
    /// error is logged and the state remains recoverable.
    async fn start_stream(&mut self, mut item: StreamItem, reply: Option<&ReplySender>) {
        let Some(connection) = self.connection.as_deref() else {
            return;
        };

        let source = match timeout(self.settings.open_timeout, self.resolver.open(&item.track))
            .await
        {
            Ok(Ok(source)) => source,
            Ok(Err(e)) => {
                error!(session = %self.session, track = %item.track, error = %e, "Failed to open stream source");
                return;
            }
            Err(_) => {
                error!(
                    session = %self.session,
                    track = %item.track,
                    timeout = ?self.settings.open_timeout,
                    "Stream open timed out"
                );
                return;
            }
        };

        self.next_generation += 1;
        item.generation = self.next_generation;
        item.paused = false;

        let started = timeout(
            self.settings.open_timeout,
            connection.play(source, self.volume, item.generation, self.events_tx.clone()),
        )
        .await;
        match started {
            Ok(Ok(handle)) => item.handle = Some(handle),
            Ok(Err(e)) => {
                error!(session = %self.session, track = %item.track, error = %e, "Failed to start stream");
                return;
            }
            Err(_) => {
                error!(
                    session = %self.session,
                    track = %item.track,
                    timeout = ?self.settings.open_timeout,
                    "Stream start timed out"
                );
                return;
            }
        }

        info!(
            session = %self.session,
            track = %item.track,
            looped = item.looped,
            generation = item.generation,
            "Now playing"
        );
        if let Some(reply) = reply {
            let _ = reply
                .send(format!(
                    "Now playing {} with loop = {}",
                    item.track, item.looped
                ))
                .await;
        }
        self.current = Some(item);
    }

    /// Pause/resume toggle. No-op without a connection and current item.
    fn pause_toggle(&mut self) {
        if self.connection.is_none() {
            return;
        }
        let Some(item) = self.current.as_mut() else {
            return;
        };
        let Some(handle) = item.handle.as_deref() else {
            return;
        };
        if item.paused {
            handle.resume();
            item.paused = false;
        } else {
            handle.pause();
            item.paused = true;
        }
    }

    /// Destroy the current stream, if any. Queue and connection untouched.
    fn stop(&mut self) {
        let Some(item) = self.current.take() else {
            return;
        };
        if let Some(handle) = item.handle {
            handle.destroy();
        }
    }

    /// Skip behaves exactly like a finished event with loop off, regardless
    /// of the actual loop flag.
    async fn skip(&mut self) {
        if self.connection.is_none() {
            return;
        }
        self.advance().await;
    }

    /// Stop the current stream and promote the queue head, if any.
    async fn advance(&mut self) {
        self.stop();
        if let Some(next) = self.queue.pop_front() {
            self.start_stream(next, None).await;
        }
    }

    /// Stop, then release the voice connection.
    async fn leave(&mut self) {
        self.stop();
        if let Some(connection) = self.connection.take() {
            connection.disconnect().await;
            info!(session = %self.session, "Left voice channel");
        }
    }

    /// Volume persists across tracks and applies to the live handle.
    async fn set_volume(&mut self, volume: f32, reply: Option<&ReplySender>) {
        if self.connection.is_none() {
            return;
        }
        let previous = self.volume;
        self.volume = volume;
        if let Some(handle) = self.current.as_ref().and_then(|c| c.handle.as_deref()) {
            handle.set_volume(volume);
        }
        if let Some(reply) = reply {
            let _ = reply
                .send(format!("Changed volume from {previous} to {volume}."))
                .await;
        }
    }

    async fn show_queue(&self, reply: Option<&ReplySender>) {
        let Some(reply) = reply else {
            return;
        };
        if let Some(item) = self.current.as_ref() {
            let _ = reply
                .send(format!("Currently playing {}", item.track))
                .await;
        }
        if self.queue.is_empty() {
            let _ = reply.send("The music queue is empty.").await;
        } else {
            let mut out = format!("Queue has {} items.", self.queue.len());
            for item in &self.queue {
                out.push('\n');
                out.push_str(&item.track);
            }
            let _ = reply.send(out).await;
        }
    }

    async fn empty_queue(&mut self, reply: Option<&ReplySender>) {
        self.queue.clear();
        if let Some(reply) = reply {
            let _ = reply.send("Emptied the music queue.").await;
        }
    }

    async fn handle_stream_event(&mut self, event: StreamEvent) {
        let generation = event.generation();
        if self.current.as_ref().map(|c| c.generation) != Some(generation) {
            debug!(session = %self.session, generation, "Ignoring stream event for stale generation");
            return;
        }
        match event {
            StreamEvent::Debug { info, .. } => {
                debug!(session = %self.session, %info, "Stream debug");
            }
            StreamEvent::Error { message, .. } => {
                error!(session = %self.session, %message, "Stream error");
            }
            StreamEvent::Finished { .. } => {
                let looped = self.current.as_ref().is_some_and(|c| c.looped);
                if looped {
                    // Looping restarts through the resume path: mark the
                    // item paused, drop the finished handle, and re-enter
                    // play with no arguments.
                    if let Some(item) = self.current.as_mut() {
                        item.paused = true;
                        if let Some(handle) = item.handle.take() {
                            handle.destroy();
                        }
                    }
                    self.play(&[], None, None).await;
                } else {
                    self.advance().await;
                }
            }
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            connected: self.connection.is_some(),
            current: self.current.as_ref().map(|item| TrackSnapshot {
                track: item.track.clone(),
                looped: item.looped,
                paused: item.paused,
                generation: item.generation,
            }),
            queue: self.queue.iter().map(|item| item.track.clone()).collect(),
            volume: self.volume,
        }
    }
}

/// The second validated argument `-l` requests looping for the track named
/// by the first.
fn loop_requested(args: &[String]) -> bool {
    args.get(1).is_some_and(|a| a == "-l")
}
