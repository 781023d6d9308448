//! SecretStore trait: where credentials come from and where they go.
//!
//! The model credential is read once at startup. Stores are chained by the
//! resolver in `taskpilot-security`; a store that cannot persist returns
//! `false` from [`SecretStore::is_writable`].

use crate::error::CredentialError;

pub trait SecretStore: Send + Sync {
    /// A short label for logs and error messages (e.g. "env", ".env").
    fn name(&self) -> &str;

    /// Look up a secret by key. `Ok(None)` means "not here".
    fn get(&self, key: &str) -> Result<Option<String>, CredentialError>;

    /// Persist a secret for future sessions.
    fn put(&self, key: &str, value: &str) -> Result<(), CredentialError>;

    /// Whether `put` actually stores anything.
    fn is_writable(&self) -> bool {
        true
    }
}
