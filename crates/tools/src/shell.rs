//! Shell tool: run a command string through the system shell.
//!
//! Standard output and standard error are captured separately. No timeout:
//! a hung command hangs the step.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use taskpilot_core::error::ToolError;
use taskpilot_core::tool::{Tool, ToolResult};
use tokio::process::Command;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct ShellTool {
    /// Directory the command runs in. `None` = the process working directory.
    working_dir: Option<PathBuf>,
}

impl ShellTool {
    pub fn new() -> Self {
        Self { working_dir: None }
    }

    /// Run commands inside `dir`.
    pub fn in_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.working_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    fn command_for(&self, command: &str) -> Command {
        let mut cmd = if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", command]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", command]);
            c
        };
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

#[async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &str {
        "shell"
    }

    fn description(&self) -> &str {
        "Execute a shell command, capturing stdout and stderr separately"
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let command = arguments["command"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'command' argument".into()))?;

        debug!(command = %command, "Executing shell command");

        let output = self
            .command_for(command)
            .output()
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "shell".into(),
                reason: e.to_string(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let success = output.status.success();
        let exit_code = output.status.code();

        if !success {
            warn!(command = %command, exit_code = ?exit_code, "Command failed");
        }

        Ok(ToolResult {
            call_id: String::new(),
            success,
            output: stdout,
            error: stderr,
            exit_code,
        })
    }
}
