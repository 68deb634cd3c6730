//! Command dispatch engine.
//!
//! This module contains the [`Handler`] trait, the per-invocation
//! [`Context`], and the [`Registry`] that resolves raw inbound text to
//! validated handler invocations, plus the built-in help and terminate
//! handlers. Playback handlers live in [`crate::playback`] and register
//! through the same registry.

mod context;
mod help;
mod registry;
mod terminate;

pub use context::{Context, Handler};
pub use help::HelpHandler;
pub use registry::Registry;
pub use terminate::TerminateHandler;
