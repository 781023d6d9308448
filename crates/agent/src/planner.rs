//! Model client and refinement loop.
//!
//! [`Planner`] owns the provider round trip and the two prompt templates.
//! Both the initial request and every refinement go through the same
//! extractor, and a refinement always asks for a brand-new plan.

use std::sync::Arc;

use taskpilot_core::error::{ExtractError, ProviderError};
use taskpilot_core::message::Message;
use taskpilot_core::plan::Plan;
use taskpilot_core::provider::{Provider, ProviderRequest};
use taskpilot_security::redact_secrets;
use thiserror::Error;
use tracing::{debug, info};

use crate::extract::extract;

/// The JSON shape every prompt asks the model to answer with.
pub const PLAN_SHAPE: &str = r#"{
  "plan_description": "Brief description of your approach",
  "steps": [
    {
      "description": "What this step does",
      "command": "actual shell command to run",
      "is_command": true
    },
    {
      "description": "What this file is for",
      "code": "complete file content with proper indentation",
      "filename": "example.py",
      "is_command": false
    }
  ]
}"#;

/// Why no plan came back from a planning round.
#[derive(Debug, Clone, Error)]
pub enum PlanningError {
    #[error(transparent)]
    Service(#[from] ProviderError),

    #[error("could not read a plan from the response: {0}")]
    Extract(#[from] ExtractError),
}

/// Talks to the model: one prompt in, one plan out.
pub struct Planner {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    system_prompt: Option<String>,
    /// Values masked out of every prompt before it leaves the machine.
    secrets: Vec<String>,
}

impl Planner {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            max_tokens: None,
            system_prompt: None,
            secrets: Vec::new(),
        }
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Send `prompt` as a system message ahead of every request.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Never send `secret` to the model, even if a failure detail echoes it.
    pub fn with_redacted(mut self, secret: impl Into<String>) -> Self {
        self.secrets.push(secret.into());
        self
    }

    /// One round trip. No retry at this layer.
    pub async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.system_prompt {
            messages.push(Message::system(system));
        }
        messages.push(Message::user(redact_secrets(prompt, &self.secrets)));

        let request = ProviderRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!(provider = self.provider.name(), model = %self.model, "Requesting plan");
        let response = self.provider.complete(request).await?;

        if let Some(usage) = &response.usage {
            info!(
                model = %response.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Model responded"
            );
        }
        Ok(response.message.content)
    }

    /// Ask for the first plan for `task`.
    pub async fn plan(&self, task: &str) -> Result<Plan, PlanningError> {
        let raw = self.generate(&initial_prompt(task)).await?;
        Ok(extract(&raw)?)
    }

    /// Ask for a replacement plan after a failure or negative feedback.
    pub async fn refine(&self, task: &str, detail: &str) -> Result<Plan, PlanningError> {
        let raw = self.generate(&refine_prompt(task, detail)).await?;
        Ok(extract(&raw)?)
    }
}

pub fn initial_prompt(task: &str) -> String {
    format!(
        r#"You are an AI task agent running on a local computer. Help the user perform this task:

"{task}"

Generate a step-by-step plan with specific commands to execute on their local system.
Your response should be in the following JSON format:
{PLAN_SHAPE}

Rules:
1. For code generation, include proper filenames and complete code (not snippets).
2. For commands, use standard shell commands that work cross-platform when possible.
3. If you need multiple commands in sequence, create separate steps.
4. Include error handling and validation steps where appropriate.
"#
    )
}

pub fn refine_prompt(task: &str, detail: &str) -> String {
    format!(
        r#"You are an AI task agent. The previous plan for this task failed.

Original task: "{task}"

Error details: {detail}

Generate a refined plan that addresses this error. Your response should be in the following JSON format:
{PLAN_SHAPE}

Make sure to fix the specific issue that caused the failure.
"#
    )
}
