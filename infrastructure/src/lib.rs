//! Infrastructure layer for roundtable
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer, plus configuration file loading.

pub mod config;
pub mod events;
pub mod logging;
pub mod providers;
pub mod storage;

// Re-export commonly used types
pub use config::{ConfigLoader, FileConfig, FileParticipantConfig};
pub use events::BroadcastEventSink;
pub use logging::JsonlEventLog;
pub use providers::{AnthropicClient, ChatCompletionsClient, GeminiClient, ProviderFactory};
pub use storage::InMemorySessionStore;
