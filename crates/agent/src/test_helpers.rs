//! Shared test helpers: a scripted provider and a scripted console.

use std::collections::VecDeque;
use std::io;
use std::sync::Mutex;

use taskpilot_core::console::{Block, Console};
use taskpilot_core::error::ProviderError;
use taskpilot_core::message::Message;
use taskpilot_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};

/// A mock provider that returns a sequence of scripted replies.
///
/// Each call to `complete` returns the next reply in the queue and records
/// the prompt it was given. Panics if more calls are made than replies
/// provided.
pub struct SequentialMockProvider {
    replies: Mutex<VecDeque<Result<ProviderResponse, ProviderError>>>,
    prompts: Mutex<Vec<String>>,
}

impl SequentialMockProvider {
    pub fn new(replies: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A provider whose every reply is a successful text response.
    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(make_text_response(t))).collect())
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// The last user message of every request, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let prompt = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        let call = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt);
            prompts.len()
        };

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("SequentialMockProvider: no reply scripted for call #{call}"))
    }
}

/// Create a simple text response.
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// A console that records everything shown and answers questions from a
/// script. Running out of answers is an `UnexpectedEof` error, like a
/// closed stdin.
#[derive(Default)]
pub struct ScriptedConsole {
    confirms: Mutex<VecDeque<bool>>,
    inputs: Mutex<VecDeque<String>>,
    shown: Mutex<Vec<Block>>,
    questions: Mutex<Vec<String>>,
}

impl ScriptedConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_confirms(self, answers: &[bool]) -> Self {
        self.confirms.lock().unwrap().extend(answers.iter().copied());
        self
    }

    pub fn with_inputs(self, answers: &[&str]) -> Self {
        self.inputs
            .lock()
            .unwrap()
            .extend(answers.iter().map(|s| s.to_string()));
        self
    }

    pub fn shown(&self) -> Vec<Block> {
        self.shown.lock().unwrap().clone()
    }

    /// All shown text joined by newlines, for `contains` checks.
    pub fn transcript(&self) -> String {
        self.shown()
            .iter()
            .map(Block::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }

    pub fn questions_asked(&self) -> usize {
        self.questions.lock().unwrap().len()
    }

    fn ask(&self, question: &str) {
        self.questions.lock().unwrap().push(question.to_string());
    }
}

fn exhausted(kind: &str) -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof, format!("no scripted {kind} left"))
}

impl Console for ScriptedConsole {
    fn show(&self, block: Block) {
        self.shown.lock().unwrap().push(block);
    }

    fn confirm(&self, question: &str) -> io::Result<bool> {
        self.ask(question);
        self.confirms
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| exhausted("confirm"))
    }

    fn input(&self, prompt: &str) -> io::Result<String> {
        self.ask(prompt);
        self.inputs
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| exhausted("input"))
    }

    fn secret(&self, prompt: &str) -> io::Result<String> {
        self.input(prompt)
    }
}
