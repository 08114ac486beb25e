//! Event sink adapters.

pub mod broadcast;

pub use broadcast::BroadcastEventSink;
