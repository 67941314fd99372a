//! Moneta AI - the reasoning service behind ticker resolution.
//!
//! Implements `moneta_core::tickers::ReasoningClient` on top of rig-core's
//! Gemini provider. Prompt construction and answer parsing stay in
//! `moneta-core`; this crate only moves text to the model and back.

pub mod error;
pub mod gemini;

pub use error::AiError;
pub use gemini::{GeminiReasoningClient, DEFAULT_GEMINI_MODEL};
