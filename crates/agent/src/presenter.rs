//! Renders a plan for operator review.

use taskpilot_core::console::{Block, Console};
use taskpilot_core::plan::{Plan, Step};

/// Shown instead of a step list when the model returned no steps.
pub const EMPTY_PLAN_NOTE: &str = "This plan has no steps; the task appears to be done already.";

/// Print the description and every step. Never asks anything.
pub fn present(plan: &Plan, console: &dyn Console) {
    console.show(Block::panel("Task Plan", &plan.description));

    if plan.is_empty() {
        console.show(Block::Info(EMPTY_PLAN_NOTE.into()));
        return;
    }

    for (i, step) in plan.steps.iter().enumerate() {
        console.show(Block::Heading(format!("Step {}: {}", i + 1, step.description())));
        match step {
            Step::Command { command, .. } => {
                console.show(Block::panel("Command to Execute", command));
            }
            Step::File {
                filename, content, ..
            } => {
                console.show(Block::panel(format!("Code to Save in {filename}"), content));
            }
        }
    }
}
