//! Application-layer configuration.

pub mod engine_params;

pub use engine_params::EngineParams;
