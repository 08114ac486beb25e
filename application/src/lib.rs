//! Application layer for roundtable
//!
//! This crate contains the discussion engine use case, the port definitions
//! it drives external collaborators through, and engine configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::EngineParams;
pub use ports::{
    capability::{
        CapabilityClient, CapabilityError, CapabilityFactory, ChatTurn, Generation,
        GenerationParams,
    },
    event_sink::{CompositeEventSink, EventSink, NoEventSink, RoundStatus, SessionEvent},
    session_store::{SessionPatch, SessionStore, StoreError},
};
pub use use_cases::run_discussion::{DiscussionEngine, EngineError};
