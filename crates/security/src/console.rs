//! Console decorator that masks known secrets in everything shown.
//!
//! Command output, stderr panels and echoed feedback can all carry the
//! credential; wrapping the operator console once covers every one of them.

use std::io;

use taskpilot_core::console::{Block, Console};

use crate::secrets::redact_secrets;

pub struct RedactingConsole<'a> {
    inner: &'a dyn Console,
    secrets: Vec<String>,
}

impl<'a> RedactingConsole<'a> {
    pub fn new(inner: &'a dyn Console, secrets: Vec<String>) -> Self {
        Self { inner, secrets }
    }

    fn redact(&self, text: &str) -> String {
        redact_secrets(text, &self.secrets)
    }
}

/// Mask `secrets` in every string a block carries.
pub fn redact_block(block: Block, secrets: &[String]) -> Block {
    let mask = |text: String| redact_secrets(&text, secrets);
    match block {
        Block::Banner { title, subtitle } => Block::Banner {
            title: mask(title),
            subtitle: mask(subtitle),
        },
        Block::Heading(text) => Block::Heading(mask(text)),
        Block::Panel { title, body } => Block::Panel {
            title: mask(title),
            body: mask(body),
        },
        Block::Info(text) => Block::Info(mask(text)),
        Block::Success(text) => Block::Success(mask(text)),
        Block::Warning(text) => Block::Warning(mask(text)),
        Block::Failure(text) => Block::Failure(mask(text)),
    }
}

impl Console for RedactingConsole<'_> {
    fn show(&self, block: Block) {
        self.inner.show(redact_block(block, &self.secrets));
    }

    fn confirm(&self, question: &str) -> io::Result<bool> {
        self.inner.confirm(&self.redact(question))
    }

    fn input(&self, prompt: &str) -> io::Result<String> {
        self.inner.input(&self.redact(prompt))
    }

    fn secret(&self, prompt: &str) -> io::Result<String> {
        self.inner.secret(&self.redact(prompt))
    }
}
