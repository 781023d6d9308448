//! Plan and Step: the unit of work produced by the model.
//!
//! A [`Plan`] is built by the extractor from one model response, presented,
//! executed, and then dropped. Refinement never patches a plan; it asks for a
//! new one.

use serde::{Deserialize, Serialize};

/// A step-by-step plan for one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Free-text summary of the approach
    pub description: String,

    /// Steps in execution order
    pub steps: Vec<Step>,
}

impl Plan {
    pub fn new(description: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            description: description.into(),
            steps,
        }
    }

    /// True when the model judged that nothing needs to be done.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }
}

/// One unit of work: a shell command or a whole-file write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Step {
    /// Run `command` through the system shell.
    Command {
        description: String,
        command: String,
    },

    /// Write `content` to `filename`, replacing any existing file.
    File {
        description: String,
        filename: String,
        content: String,
    },
}

impl Step {
    pub fn command(description: impl Into<String>, command: impl Into<String>) -> Self {
        Self::Command {
            description: description.into(),
            command: command.into(),
        }
    }

    pub fn file(
        description: impl Into<String>,
        filename: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::File {
            description: description.into(),
            filename: filename.into(),
            content: content.into(),
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::Command { description, .. } | Self::File { description, .. } => description,
        }
    }

    pub fn is_command(&self) -> bool {
        matches!(self, Self::Command { .. })
    }
}
