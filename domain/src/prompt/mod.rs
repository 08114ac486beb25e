//! Engine-synthesized text: kickoff, turn instructions, failure notices,
//! and the closing summary.

pub mod template;

pub use template::PromptTemplate;
