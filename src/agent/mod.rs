//! LLM-backed agents.
//!
//! This module provides the staged insight pipeline and the one-shot
//! question responder.

pub mod pipeline;
pub mod query;

pub use pipeline::{Pipeline, SilentObserver, StageObserver};
pub use query::QueryResponder;
