//! A research assistant agent, which assembles company research tools,
//! redaction policies and model providers.
//!
//! The crate includes a CLI tool for using in the terminal. And you can also
//! use it as a library to bring the assistant into your own host apps.

#![deny(missing_docs)]

#[allow(unused_imports)]
#[macro_use]
extern crate tracing;

mod assistant;
mod redact;
pub mod tools;

pub use assistant::{ResearchAssistant, ResearchAssistantBuilder};
pub use redact::{DEFAULT_SENSITIVE_TERMS, REDACTION_MARKER, Redactor};

/// Re-exports of [`research_agent_core`] crate.
pub mod core {
    pub use research_agent_core::*;
}
