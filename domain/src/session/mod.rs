//! Session aggregate: the durable record, messages, and the transcript.

pub mod entities;
pub mod message;
pub mod transcript;
