//! File write tool: create or overwrite a file with the given content.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use taskpilot_core::error::ToolError;
use taskpilot_core::tool::{Tool, ToolResult};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct FileWriteTool {
    /// Base for relative paths. `None` = the process working directory.
    base_dir: Option<PathBuf>,
}

impl FileWriteTool {
    pub fn new() -> Self {
        Self { base_dir: None }
    }

    /// Resolve relative paths against `dir`.
    pub fn in_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.base_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    fn failed(reason: String) -> ToolResult {
        ToolResult {
            call_id: String::new(),
            success: false,
            output: String::new(),
            error: reason,
            exit_code: None,
        }
    }
}

#[async_trait]
impl Tool for FileWriteTool {
    fn name(&self) -> &str {
        "file_write"
    }

    fn description(&self) -> &str {
        "Write content to a file. Creates the file if it doesn't exist, overwrites if it does."
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let path = arguments["path"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'path' argument".into()))?;

        let content = arguments["content"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'content' argument".into()))?;

        if path.trim().is_empty() {
            return Ok(Self::failed("Empty file path".into()));
        }

        let target = self.resolve(path);
        debug!(path = %target.display(), bytes = content.len(), "Writing file");

        // Ensure parent directory exists
        if let Some(parent) = target.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = tokio::fs::create_dir_all(parent).await
        {
            warn!(path = %target.display(), error = %e, "Failed to create parent directory");
            return Ok(Self::failed(e.to_string()));
        }

        match tokio::fs::write(&target, content).await {
            Ok(()) => Ok(ToolResult {
                call_id: String::new(),
                success: true,
                output: format!("Wrote {} bytes to {path}", content.len()),
                error: String::new(),
                exit_code: None,
            }),
            Err(e) => {
                warn!(path = %target.display(), error = %e, "Failed to write file");
                Ok(Self::failed(e.to_string()))
            }
        }
    }
}
