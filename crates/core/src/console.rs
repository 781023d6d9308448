//! Console trait: the operator-facing terminal.
//!
//! Presenter, executor and session controller all receive the console as an
//! explicit `&dyn Console`. Output is described as semantic [`Block`]s and
//! the implementation decides how to style them, so tests can record exactly
//! what the operator would have seen.

use std::io;

/// One piece of operator-visible output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Application banner shown once at startup
    Banner { title: String, subtitle: String },

    /// A section heading (e.g. "Step 2: Install deps")
    Heading(String),

    /// A boxed body of literal text (commands, file contents, output)
    Panel { title: String, body: String },

    /// Neutral progress line
    Info(String),

    /// Something completed
    Success(String),

    /// Something needs the operator's attention
    Warning(String),

    /// Something failed
    Failure(String),
}

impl Block {
    pub fn panel(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Panel {
            title: title.into(),
            body: body.into(),
        }
    }

    /// The text carried by this block, title included, for searching in tests
    /// and logs.
    pub fn text(&self) -> String {
        match self {
            Self::Banner { title, subtitle } => format!("{title}\n{subtitle}"),
            Self::Panel { title, body } => format!("{title}\n{body}"),
            Self::Heading(text)
            | Self::Info(text)
            | Self::Success(text)
            | Self::Warning(text)
            | Self::Failure(text) => text.clone(),
        }
    }
}

/// The operator's terminal: display plus the three kinds of questions the
/// session asks.
pub trait Console: Send + Sync {
    /// Display a block of output.
    fn show(&self, block: Block);

    /// Ask a yes/no question.
    fn confirm(&self, question: &str) -> io::Result<bool>;

    /// Ask for a line of free text.
    fn input(&self, prompt: &str) -> io::Result<String>;

    /// Ask for a line of text without echoing it.
    fn secret(&self, prompt: &str) -> io::Result<String>;
}
