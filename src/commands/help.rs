//! Built-in help command.

use super::context::{Context, Handler};
use crate::error::HandlerResult;
use async_trait::async_trait;

/// Formats every descriptor's name and description into one reply block.
pub struct HelpHandler;

#[async_trait]
impl Handler for HelpHandler {
    async fn handle(&self, ctx: Context) -> HandlerResult {
        let mut out = String::from("```\n");
        for descriptor in ctx.table.iter() {
            out.push_str(&descriptor.name);
            out.push_str("\n\t");
            out.push_str(&descriptor.description);
            out.push('\n');
        }
        out.push_str("```");
        ctx.reply.send(out).await?;
        Ok(())
    }
}
