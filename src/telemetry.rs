//! Telemetry utilities for command timing and dispatch spans.

use std::time::Instant;
use tracing::debug;

/// Guard for timing command execution.
///
/// Logs command latency when dropped, so handlers that bail early are still
/// accounted for.
pub struct CommandTimer {
    command: String,
    start: Instant,
}

impl CommandTimer {
    /// Start timing a command.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            start: Instant::now(),
        }
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        debug!(command = %self.command, elapsed_ms, "Command completed");
    }
}

/// Standardized span constructors for dispatch observability.
pub mod spans {
    use tracing::{Span, info_span};

    /// Create a span for a command execution.
    pub fn command(name: &str, session: &str, author: &str) -> Span {
        info_span!("command", name = %name, session = %session, author = %author)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_drop_does_not_panic() {
        let timer = CommandTimer::new("play");
        drop(timer);
    }
}
