//! # TaskPilot Core
//!
//! Domain types, traits, and error definitions for the TaskPilot
//! plan-and-execute agent. This crate has **no framework dependencies**:
//! it defines the domain model that every other crate implements against.
//!
//! ## Design Philosophy
//!
//! Every boundary of the session is a trait here (model provider, step tool,
//! operator console, secret store). Implementations live in their own crates,
//! so a whole session can run against scripted fakes in tests.

pub mod console;
pub mod error;
pub mod message;
pub mod plan;
pub mod provider;
pub mod secret;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use console::{Block, Console};
pub use error::{
    CredentialError, Error, ExtractCause, ExtractError, ProviderError, Result, StepError,
    ToolError,
};
pub use message::{Message, Role};
pub use plan::{Plan, Step};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use secret::SecretStore;
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult};
