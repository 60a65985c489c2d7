//! An abstraction layer for text-completion models.
//!
//! This crate establishes a unified protocol for the agent to obtain
//! completions from various supported LLMs, so that the agent can switch
//! between them without modifying the core codebase.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
