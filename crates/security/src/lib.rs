//! Credential handling for TaskPilot.
//!
//! Provides:
//! - **Secret stores**: process environment, `.env`-style key/value files,
//!   and an in-memory store for tests
//! - **Credential resolution**: env → file → hidden operator prompt, with the
//!   prompted value persisted for the next session
//! - **Redaction**: mask known secrets in text shown to the operator or sent
//!   back to the model

pub mod console;
pub mod credentials;
pub mod secrets;

pub use console::{RedactingConsole, redact_block};
pub use credentials::{CredentialResolver, ResolvedCredential};
pub use secrets::{DotenvStore, EnvStore, MemoryStore, redact_secrets};
