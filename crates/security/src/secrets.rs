//! Secret stores and redaction.
//!
//! [`DotenvStore`] keeps secrets in plain text, readable by anything that
//! understands `.env`. Other backends plug in behind [`SecretStore`].

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use taskpilot_core::error::CredentialError;
use taskpilot_core::secret::SecretStore;
use tracing::debug;

/// Read-only view of the process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvStore;

impl SecretStore for EnvStore {
    fn name(&self) -> &str {
        "env"
    }

    fn get(&self, key: &str) -> Result<Option<String>, CredentialError> {
        Ok(std::env::var(key).ok().filter(|v| !v.trim().is_empty()))
    }

    fn put(&self, _key: &str, _value: &str) -> Result<(), CredentialError> {
        Ok(())
    }

    fn is_writable(&self) -> bool {
        false
    }
}

/// A `KEY=value` file such as `.env`.
///
/// Reading tolerates blank lines, `#` comments, an `export ` prefix and
/// matching single or double quotes. When a key appears more than once the
/// last assignment wins, so appended values override older ones.
#[derive(Debug, Clone)]
pub struct DotenvStore {
    path: PathBuf,
}

impl DotenvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Parse `.env` content into key/value pairs.
pub fn parse_dotenv(content: &str) -> HashMap<String, String> {
    let mut values = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        values.insert(key.to_string(), unquote(value.trim()).to_string());
    }
    values
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

impl SecretStore for DotenvStore {
    fn name(&self) -> &str {
        ".env"
    }

    fn get(&self, key: &str) -> Result<Option<String>, CredentialError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CredentialError::Storage {
                    location: self.location(),
                    reason: e.to_string(),
                });
            }
        };
        Ok(parse_dotenv(&content)
            .remove(key)
            .filter(|v| !v.trim().is_empty()))
    }

    fn put(&self, key: &str, value: &str) -> Result<(), CredentialError> {
        let storage_error = |e: std::io::Error| CredentialError::Storage {
            location: self.location(),
            reason: e.to_string(),
        };

        let needs_newline = std::fs::read(&self.path)
            .map(|bytes| !bytes.is_empty() && !bytes.ends_with(b"\n"))
            .unwrap_or(false);

        let mut options = OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path).map_err(storage_error)?;

        let mut line = String::new();
        if needs_newline {
            line.push('\n');
        }
        line.push_str(&format!("{key}={value}\n"));
        file.write_all(line.as_bytes()).map_err(storage_error)?;

        debug!(path = %self.path.display(), key, "Appended credential");
        Ok(())
    }
}

/// In-memory store, mainly for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(key: &str, value: &str) -> Self {
        let store = Self::new();
        if let Ok(mut values) = store.values.lock() {
            values.insert(key.to_string(), value.to_string());
        }
        store
    }
}

impl SecretStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn get(&self, key: &str) -> Result<Option<String>, CredentialError> {
        Ok(self
            .values
            .lock()
            .ok()
            .and_then(|values| values.get(key).cloned()))
    }

    fn put(&self, key: &str, value: &str) -> Result<(), CredentialError> {
        let mut values = self.values.lock().map_err(|e| CredentialError::Storage {
            location: "memory".into(),
            reason: e.to_string(),
        })?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Replace every occurrence of each non-trivial secret with `[REDACTED]`.
///
/// Secrets shorter than 8 characters are left alone; masking them would
/// mangle ordinary words in command output.
pub fn redact_secrets(text: &str, secrets: &[String]) -> String {
    let mut redacted = text.to_string();
    for secret in secrets {
        if secret.len() >= 8 && redacted.contains(secret.as_str()) {
            redacted = redacted.replace(secret.as_str(), "[REDACTED]");
        }
    }
    redacted
}
