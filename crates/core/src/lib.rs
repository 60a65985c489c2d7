//! Core logic including the agent loop, action parsing, prompt assembly,
//! tool dispatch, configurations, etc.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod agent;
mod config;
mod model_client;
pub mod observation;
pub mod parser;
pub mod prompt;
pub mod tool;
pub mod transcript;

pub use agent::{
    AbortReason, Agent, AgentBuilder, CancelHandle, CancelSignal, TaskOutcome,
    TaskStatus, cancel_pair,
};
pub use config::AgentConfig;
pub use model_client::{ModelClient, ModelCompletion, ModelError};
pub use research_agent_model::ErrorKind as ModelErrorKind;
