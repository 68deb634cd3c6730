//! Playback command handlers.
//!
//! Every handler here is a thin forwarder: it packages the invocation into a
//! [`PlaybackCommand`] and sends it to the owning session actor, which does
//! all the state work. A send failure means the actor is gone.

use super::PlaybackModule;
use super::session::PlaybackCommand;
use crate::commands::{Context, Handler, Registry};
use crate::error::{HandlerError, HandlerResult};
use async_trait::async_trait;
use std::sync::Arc;

/// Register the full playback handler set.
pub fn register_all(module: &Arc<PlaybackModule>, registry: &mut Registry) {
    registry.register("play", Box::new(PlayHandler::new(module)));
    registry.register("pause", Box::new(PauseHandler::new(module)));
    registry.register("stop", Box::new(StopHandler::new(module)));
    registry.register("skip", Box::new(SkipHandler::new(module)));
    registry.register("leave", Box::new(LeaveHandler::new(module)));
    registry.register("volume", Box::new(VolumeHandler::new(module)));
    registry.register("show_queue", Box::new(ShowQueueHandler::new(module)));
    registry.register("empty_queue", Box::new(EmptyQueueHandler::new(module)));
}

macro_rules! playback_handler {
    ($name:ident) => {
        pub struct $name {
            module: Arc<PlaybackModule>,
        }

        impl $name {
            pub fn new(module: &Arc<PlaybackModule>) -> Self {
                Self {
                    module: Arc::clone(module),
                }
            }
        }
    };
}

playback_handler!(PlayHandler);
playback_handler!(PauseHandler);
playback_handler!(StopHandler);
playback_handler!(SkipHandler);
playback_handler!(LeaveHandler);
playback_handler!(VolumeHandler);
playback_handler!(ShowQueueHandler);
playback_handler!(EmptyQueueHandler);

async fn forward(module: &PlaybackModule, ctx: Context, cmd: PlaybackCommand) -> HandlerResult {
    module
        .session(&ctx.session)
        .command(cmd, Some(ctx.reply), ctx.voice_channel)
        .await
}

#[async_trait]
impl Handler for PlayHandler {
    async fn handle(&self, ctx: Context) -> HandlerResult {
        let args = ctx.args.clone();
        forward(&self.module, ctx, PlaybackCommand::Play { args }).await
    }
}

#[async_trait]
impl Handler for PauseHandler {
    async fn handle(&self, ctx: Context) -> HandlerResult {
        forward(&self.module, ctx, PlaybackCommand::Pause).await
    }
}

#[async_trait]
impl Handler for StopHandler {
    async fn handle(&self, ctx: Context) -> HandlerResult {
        forward(&self.module, ctx, PlaybackCommand::Stop).await
    }
}

#[async_trait]
impl Handler for SkipHandler {
    async fn handle(&self, ctx: Context) -> HandlerResult {
        forward(&self.module, ctx, PlaybackCommand::Skip).await
    }
}

#[async_trait]
impl Handler for LeaveHandler {
    async fn handle(&self, ctx: Context) -> HandlerResult {
        forward(&self.module, ctx, PlaybackCommand::Leave).await
    }
}

#[async_trait]
impl Handler for VolumeHandler {
    async fn handle(&self, ctx: Context) -> HandlerResult {
        // The argument already matched the descriptor's numeric pattern.
        let volume: f32 = ctx
            .args
            .first()
            .and_then(|raw| raw.parse().ok())
            .ok_or_else(|| HandlerError::Internal("volume argument did not parse".to_string()))?;
        forward(&self.module, ctx, PlaybackCommand::Volume(volume)).await
    }
}

#[async_trait]
impl Handler for ShowQueueHandler {
    async fn handle(&self, ctx: Context) -> HandlerResult {
        forward(&self.module, ctx, PlaybackCommand::ShowQueue).await
    }
}

#[async_trait]
impl Handler for EmptyQueueHandler {
    async fn handle(&self, ctx: Context) -> HandlerResult {
        forward(&self.module, ctx, PlaybackCommand::EmptyQueue).await
    }
}
