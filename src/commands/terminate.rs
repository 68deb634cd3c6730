//! Built-in terminate command.

use super::context::{Context, Handler};
use crate::error::{HandlerError, HandlerResult};
use async_trait::async_trait;
use tracing::info;

/// Runs every registered teardown hook concurrently, awaits them, then
/// signals the gateway loop to exit. Takes no arguments.
pub struct TerminateHandler;

#[async_trait]
impl Handler for TerminateHandler {
    async fn handle(&self, ctx: Context) -> HandlerResult {
        info!("Terminating");
        ctx.lifecycle.shutdown().await;
        ctx.shutdown.notify_one();
        Err(HandlerError::Shutdown)
    }
}
