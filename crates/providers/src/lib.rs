//! LLM provider implementations for TaskPilot.
//!
//! All providers implement the `taskpilot_core::Provider` trait.
//! The router selects the correct provider based on configuration.

mod http;
#[cfg(test)]
mod test_helpers;

pub mod gemini;
pub mod openai_compat;
pub mod router;

pub use gemini::GeminiProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use router::ProviderRouter;
