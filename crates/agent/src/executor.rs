//! Plan execution.
//!
//! Steps run strictly in order and execution stops at the first failure;
//! nothing after the failing step touches the machine. Every failure, from
//! a non-zero exit to a panicking tool, comes back as a [`StepError`] so
//! the session can turn it into a refinement request.

use std::sync::Arc;

use serde_json::json;
use taskpilot_core::console::{Block, Console};
use taskpilot_core::error::StepError;
use taskpilot_core::plan::{Plan, Step};
use taskpilot_core::tool::{ToolCall, ToolRegistry, ToolResult};
use tracing::{debug, info, warn};

/// Detail reported when every step succeeded.
pub const ALL_STEPS_OK: &str = "All steps completed successfully";

/// Outcome of running one plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// True only if every step succeeded.
    pub ok: bool,

    /// Success message, or the failing step's error detail verbatim.
    pub detail: String,

    /// Number of steps that completed successfully.
    pub completed: usize,

    pub failure: Option<StepFailure>,
}

/// The step that stopped execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    /// 1-based step number
    pub index: usize,
    pub description: String,
    pub error: StepError,
}

/// Runs plan steps through the `shell` and `file_write` tools.
pub struct PlanExecutor {
    registry: Arc<ToolRegistry>,
}

impl PlanExecutor {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub async fn execute(&self, plan: &Plan, console: &dyn Console) -> ExecutionResult {
        info!(steps = plan.len(), "Executing plan");

        for (i, step) in plan.steps.iter().enumerate() {
            let number = i + 1;
            console.show(Block::Heading(format!(
                "Executing Step {number}: {}",
                step.description()
            )));

            if let Err(error) = self.run_step(number, step, console).await {
                // The detail may echo secrets; the console shows it masked.
                warn!(step = number, "Step failed");
                return ExecutionResult {
                    ok: false,
                    detail: error.detail(),
                    completed: i,
                    failure: Some(StepFailure {
                        index: number,
                        description: step.description().to_string(),
                        error,
                    }),
                };
            }
        }

        ExecutionResult {
            ok: true,
            detail: ALL_STEPS_OK.into(),
            completed: plan.len(),
            failure: None,
        }
    }

    async fn run_step(
        &self,
        number: usize,
        step: &Step,
        console: &dyn Console,
    ) -> Result<(), StepError> {
        match step {
            Step::Command { command, .. } => {
                console.show(Block::panel("Executing Command", command));
                let result = self
                    .dispatch(number, "shell", json!({ "command": command }))
                    .await
                    .inspect_err(|e| {
                        console.show(Block::Failure(format!("Error executing step {number}: {e}")))
                    })?;

                if result.success {
                    if !result.output.trim().is_empty() {
                        console.show(Block::panel("Command Output", &result.output));
                    }
                    console.show(Block::Success("Command executed successfully".into()));
                    Ok(())
                } else {
                    if !result.error.is_empty() {
                        console.show(Block::panel("Command Error", &result.error));
                    }
                    console.show(Block::Failure(match result.exit_code {
                        Some(code) => format!("Command failed (exit code {code})"),
                        None => "Command failed (terminated by signal)".into(),
                    }));
                    Err(StepError::CommandFailed {
                        exit_code: result.exit_code,
                        stderr: result.error,
                    })
                }
            }
            Step::File {
                filename, content, ..
            } => {
                console.show(Block::Info(format!("Creating file: {filename}")));
                let result = self
                    .dispatch(
                        number,
                        "file_write",
                        json!({ "path": filename, "content": content }),
                    )
                    .await
                    .inspect_err(|e| {
                        console.show(Block::Failure(format!("Error executing step {number}: {e}")))
                    })?;

                if result.success {
                    console.show(Block::Success("File created successfully".into()));
                    Ok(())
                } else {
                    console.show(Block::Failure(format!(
                        "Error executing step {number}: {}",
                        result.error
                    )));
                    Err(StepError::WriteFailed {
                        path: filename.clone(),
                        reason: result.error,
                    })
                }
            }
        }
    }

    /// Run one tool call on its own task so that a panicking tool is caught
    /// instead of taking the session down.
    async fn dispatch(
        &self,
        number: usize,
        tool: &str,
        arguments: serde_json::Value,
    ) -> Result<ToolResult, StepError> {
        let call = ToolCall {
            id: format!("step-{number}"),
            name: tool.to_string(),
            arguments,
        };
        debug!(call_id = %call.id, tool, "Dispatching step");

        let registry = Arc::clone(&self.registry);
        let handle = tokio::spawn(async move { registry.execute(&call).await });

        match handle.await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => Err(StepError::Unexpected(e.to_string())),
            Err(e) if e.is_panic() => Err(StepError::Unexpected(format!("step panicked: {e}"))),
            Err(e) => Err(StepError::Unexpected(e.to_string())),
        }
    }
}
