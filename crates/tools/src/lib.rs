//! Step tools for TaskPilot.
//!
//! An approved plan acts on the machine through exactly two tools:
//! `shell` runs a command string and `file_write` replaces a file's content.
//! Neither is sandboxed; the operator approved every step beforehand.

pub mod file_write;
pub mod shell;

use std::path::Path;

use taskpilot_core::tool::ToolRegistry;

pub use file_write::FileWriteTool;
pub use shell::ShellTool;

/// Create the registry the plan executor dispatches steps through.
pub fn step_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(ShellTool::new()));
    registry.register(Box::new(FileWriteTool::new()));
    registry
}

/// Like [`step_registry`], but commands run in and relative paths resolve
/// against `dir` instead of the process working directory.
pub fn step_registry_in(dir: impl AsRef<Path>) -> ToolRegistry {
    let dir = dir.as_ref();
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(ShellTool::new().in_dir(dir)));
    registry.register(Box::new(FileWriteTool::new().in_dir(dir)));
    registry
}
