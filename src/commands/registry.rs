//! Command handler registry and dispatch.
//!
//! The `Registry` binds handler ids from the command table to handler
//! implementations and resolves raw inbound text to validated handler
//! invocations. All validation failures fail closed: the handler is never
//! invoked, no partial side effects occur, and by default no reply is sent.

use super::context::{Context, Handler};
use crate::config::CommandTable;
use crate::error::HandlerError;
use crate::lifecycle::Lifecycle;
use crate::message::{InboundMessage, ReplySender};
use crate::telemetry::{CommandTimer, spans};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{Instrument, debug, info, warn};

/// Registry of command handlers, keyed by handler id.
pub struct Registry {
    table: Arc<CommandTable>,
    handlers: HashMap<String, Box<dyn Handler>>,
    prefix: char,
    reply_on_error: bool,
    lifecycle: Arc<Lifecycle>,
    shutdown: Arc<tokio::sync::Notify>,
}

impl Registry {
    pub fn new(
        table: Arc<CommandTable>,
        prefix: char,
        reply_on_error: bool,
        lifecycle: Arc<Lifecycle>,
        shutdown: Arc<tokio::sync::Notify>,
    ) -> Self {
        Self {
            table,
            handlers: HashMap::new(),
            prefix,
            reply_on_error,
            lifecycle,
            shutdown,
        }
    }

    /// Register a handler under a handler id.
    ///
    /// A no-op (not an error) when no descriptor references the id or a
    /// registration already exists — registering twice leaves the first
    /// binding active.
    pub fn register(&mut self, handler_id: &str, handler: Box<dyn Handler>) {
        if !self.table.references(handler_id) {
            debug!(handler_id, "No descriptor references handler id; skipping registration");
            return;
        }
        if self.handlers.contains_key(handler_id) {
            debug!(handler_id, "Handler already registered; keeping existing binding");
            return;
        }
        self.handlers.insert(handler_id.to_string(), handler);
    }

    /// Whether a handler is bound for the given id.
    pub fn is_registered(&self, handler_id: &str) -> bool {
        self.handlers.contains_key(handler_id)
    }

    /// Resolve raw inbound text to a handler invocation.
    ///
    /// Returns true when a handler task was spawned. The dispatcher does not
    /// wait for handler completion; the teardown path (terminate) is the
    /// only waiting path.
    pub async fn dispatch(self: &Arc<Self>, msg: InboundMessage) -> bool {
        let mut tokens = msg.content.split_whitespace();
        let Some(first) = tokens.next() else {
            return false;
        };

        let mut chars = first.chars();
        if chars.next() != Some(self.prefix) {
            return false;
        }
        let name = chars.as_str();
        if name.is_empty() {
            return false;
        }

        let Some(descriptor) = self.table.by_name(name) else {
            debug!(command = %name, "Unknown command");
            self.report(&msg.reply, format!("Unknown command: {name}"))
                .await;
            return false;
        };
        if !self.handlers.contains_key(&descriptor.handler_id) {
            debug!(command = %descriptor.name, handler_id = %descriptor.handler_id, "No handler registered");
            return false;
        }

        let supplied: Vec<&str> = tokens.collect();
        if supplied.len() < descriptor.required_args {
            debug!(
                command = %descriptor.name,
                required = descriptor.required_args,
                supplied = supplied.len(),
                "Not enough arguments"
            );
            self.report(
                &msg.reply,
                format!(
                    "{} requires at least {} argument(s)",
                    descriptor.name, descriptor.required_args
                ),
            )
            .await;
            return false;
        }

        // Validate positional arguments up to the configured rule count.
        // Trailing arguments beyond the rules are intentionally dropped, not
        // rejected. The first failing rule aborts the whole dispatch.
        let mut args = Vec::with_capacity(descriptor.arg_rules.len().min(supplied.len()));
        for (position, rule) in descriptor.arg_rules.iter().enumerate() {
            let Some(raw) = supplied.get(position) else {
                break;
            };
            let arg = if rule.case_sensitive {
                (*raw).to_string()
            } else {
                raw.to_lowercase()
            };
            if !rule.pattern.is_match(&arg) {
                debug!(command = %descriptor.name, position, "Argument failed validation");
                self.report(
                    &msg.reply,
                    format!("Invalid argument {} for {}", position + 1, descriptor.name),
                )
                .await;
                return false;
            }
            args.push(arg);
        }

        let span = spans::command(&descriptor.name, &msg.session, &msg.author);
        let command = descriptor.name.clone();
        let handler_id = descriptor.handler_id.clone();
        let ctx = Context {
            session: msg.session,
            author: msg.author,
            voice_channel: msg.voice_channel,
            args,
            reply: msg.reply,
            table: Arc::clone(&self.table),
            lifecycle: Arc::clone(&self.lifecycle),
            shutdown: Arc::clone(&self.shutdown),
        };

        let registry = Arc::clone(self);
        tokio::spawn(
            async move {
                let _timer = CommandTimer::new(&command);
                let Some(handler) = registry.handlers.get(&handler_id) else {
                    return;
                };
                match handler.handle(ctx).await {
                    Ok(()) => {}
                    Err(HandlerError::Shutdown) => {
                        info!(command = %command, "Shutdown requested");
                    }
                    Err(e) => {
                        warn!(
                            command = %command,
                            error = %e,
                            error_code = e.error_code(),
                            "Command failed"
                        );
                    }
                }
            }
            .instrument(span),
        );

        true
    }

    async fn report(&self, reply: &ReplySender, text: String) {
        if self.reply_on_error {
            let _ = reply.send(text).await;
        }
    }
}
