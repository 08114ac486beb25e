//! Use cases implemented by the application layer.

pub mod run_discussion;

pub use run_discussion::{DiscussionEngine, EngineError};
