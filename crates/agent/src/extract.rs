//! Plan extraction: free model text in, validated [`Plan`] out.
//!
//! Selection rules, in order:
//!
//! 1. A "```json" fence: everything up to the next "```", or to the end of
//!    the text if the fence is never closed.
//! 2. Any other "```" fence: the text between the first and second fence,
//!    minus an info-string line (`JSON`, `javascript`, ...) right after the
//!    opening fence.
//! 3. Otherwise the whole response.
//!
//! Only the first block counts. Whatever follows its closing fence is
//! ignored, even if it is another valid plan.

use serde::Deserialize;
use serde_json::Value;
use taskpilot_core::error::{ExtractCause, ExtractError};
use taskpilot_core::plan::{Plan, Step};

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Wire shape of a plan. Every field is optional so that absence can be
/// reported precisely instead of as a generic parse error.
#[derive(Debug, Deserialize)]
struct RawPlan {
    plan_description: Option<String>,
    steps: Option<Vec<RawStep>>,
}

#[derive(Debug, Deserialize)]
struct RawStep {
    description: Option<String>,
    command: Option<String>,
    #[serde(alias = "content")]
    code: Option<String>,
    filename: Option<String>,
    is_command: Option<Value>,
}

/// Extract and validate a plan from one raw model response.
pub fn extract(raw: &str) -> Result<Plan, ExtractError> {
    let selection = select_json(raw).trim();
    let fail = |cause| ExtractError::new(cause, raw);

    let parsed: RawPlan = serde_json::from_str(selection)
        .map_err(|e| fail(ExtractCause::MalformedJson(e.to_string())))?;

    let description = parsed.plan_description.ok_or_else(|| {
        fail(ExtractCause::MissingField {
            step: None,
            field: "plan_description",
        })
    })?;
    let raw_steps = parsed.steps.ok_or_else(|| {
        fail(ExtractCause::MissingField {
            step: None,
            field: "steps",
        })
    })?;

    let steps = raw_steps
        .into_iter()
        .enumerate()
        .map(|(i, step)| into_step(i + 1, step).map_err(fail))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Plan::new(description, steps))
}

/// Pick the part of the response that should hold the JSON document.
pub fn select_json(raw: &str) -> &str {
    if let Some(start) = raw.find(JSON_FENCE) {
        return until_fence(&raw[start + JSON_FENCE.len()..]);
    }
    if let Some(start) = raw.find(FENCE) {
        return strip_info_string(until_fence(&raw[start + FENCE.len()..]));
    }
    raw
}

fn until_fence(text: &str) -> &str {
    match text.find(FENCE) {
        Some(end) => &text[..end],
        None => text,
    }
}

fn strip_info_string(block: &str) -> &str {
    let Some((first, rest)) = block.split_once('\n') else {
        return block;
    };
    let first = first.trim();
    if first.is_empty() || first.contains(['{', '[']) {
        block
    } else {
        rest
    }
}

fn into_step(number: usize, raw: RawStep) -> Result<Step, ExtractCause> {
    let missing = |field| ExtractCause::MissingField {
        step: Some(number),
        field,
    };

    let is_command = match raw.is_command {
        None => return Err(missing("is_command")),
        Some(Value::Bool(b)) => b,
        Some(other) => {
            return Err(ExtractCause::UnknownVariant {
                step: number,
                found: other.to_string(),
            });
        }
    };
    let description = raw.description.ok_or_else(|| missing("description"))?;

    if is_command {
        let command = raw.command.ok_or_else(|| missing("command"))?;
        Ok(Step::command(description, command))
    } else {
        let filename = raw.filename.ok_or_else(|| missing("filename"))?;
        let content = raw.code.ok_or_else(|| missing("code"))?;
        Ok(Step::file(description, filename, content))
    }
}
