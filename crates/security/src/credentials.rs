//! Credential resolution.
//!
//! Stores are consulted in order; the first non-empty value wins. When no
//! store has the credential and a console is available, the operator is
//! asked for it with input hidden, and the answer is persisted to the first
//! writable store so the next session finds it.

use std::sync::Arc;

use taskpilot_core::console::{Block, Console};
use taskpilot_core::error::CredentialError;
use taskpilot_core::secret::SecretStore;
use tracing::{debug, info, warn};

/// A credential value plus where it came from.
#[derive(Clone)]
pub struct ResolvedCredential {
    pub value: String,
    /// Store name, or `"prompt"` when the operator typed it.
    pub source: String,
}

impl std::fmt::Debug for ResolvedCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedCredential")
            .field("value", &"***")
            .field("source", &self.source)
            .finish()
    }
}

pub struct CredentialResolver {
    stores: Vec<Arc<dyn SecretStore>>,
    persist: bool,
}

impl CredentialResolver {
    pub fn new(stores: Vec<Arc<dyn SecretStore>>) -> Self {
        Self {
            stores,
            persist: true,
        }
    }

    /// Whether a prompted value is written back to a store.
    pub fn with_persist(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    /// Look the credential up, prompting the operator if necessary.
    pub fn resolve(
        &self,
        name: &str,
        console: Option<&dyn Console>,
    ) -> Result<ResolvedCredential, CredentialError> {
        for store in &self.stores {
            match store.get(name) {
                Ok(Some(value)) => {
                    debug!(credential = name, source = store.name(), "Credential found");
                    return Ok(ResolvedCredential {
                        value,
                        source: store.name().to_string(),
                    });
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(credential = name, source = store.name(), error = %e, "Store lookup failed")
                }
            }
        }

        let Some(console) = console else {
            return Err(CredentialError::Missing { name: name.into() });
        };

        console.show(Block::Warning(format!("{name} not found in environment")));
        let value = console
            .secret(&format!("Enter your {name}"))
            .map_err(|e| CredentialError::Prompt(e.to_string()))?;
        let value = value.trim().to_string();
        if value.is_empty() {
            return Err(CredentialError::Empty { name: name.into() });
        }

        if self.persist {
            self.store_first_writable(name, &value, console);
        }

        Ok(ResolvedCredential {
            value,
            source: "prompt".into(),
        })
    }

    // A failed write is reported but not fatal: the session can still run
    // with the value in hand.
    fn store_first_writable(&self, name: &str, value: &str, console: &dyn Console) {
        let Some(store) = self.stores.iter().find(|s| s.is_writable()) else {
            return;
        };
        match store.put(name, value) {
            Ok(()) => {
                info!(credential = name, store = store.name(), "Credential saved");
                console.show(Block::Success(format!("{name} saved to {}", store.name())));
            }
            Err(e) => {
                warn!(credential = name, error = %e, "Failed to save credential");
                console.show(Block::Warning(e.to_string()));
            }
        }
    }
}
