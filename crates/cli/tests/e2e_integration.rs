//! End-to-end tests for whole TaskPilot sessions.
//!
//! A scripted provider plays the model and a scripted console plays the
//! operator; steps really run, inside a temporary directory.

use std::collections::VecDeque;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use taskpilot_agent::{PlanExecutor, Planner, Session, SessionLimits, SessionReport, SessionState};
use taskpilot_core::console::{Block, Console};
use taskpilot_core::error::ProviderError;
use taskpilot_core::message::Message;
use taskpilot_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use taskpilot_security::RedactingConsole;

// ── Scripted model ───────────────────────────────────────────────────────

struct ScriptedProvider {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    fn prompt(&self, n: usize) -> String {
        self.prompts.lock().unwrap()[n].clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let prompt = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.prompts.lock().unwrap().push(prompt);
        let text = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("ScriptedProvider exhausted");
        Ok(ProviderResponse {
            message: Message::assistant(text),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: "mock".into(),
        })
    }
}

// ── Scripted operator ────────────────────────────────────────────────────

#[derive(Default)]
struct ScriptedConsole {
    confirms: Mutex<VecDeque<bool>>,
    inputs: Mutex<VecDeque<String>>,
    shown: Mutex<Vec<Block>>,
}

impl ScriptedConsole {
    fn answering(confirms: &[bool], inputs: &[&str]) -> Self {
        Self {
            confirms: Mutex::new(confirms.iter().copied().collect()),
            inputs: Mutex::new(inputs.iter().map(|s| s.to_string()).collect()),
            shown: Mutex::new(Vec::new()),
        }
    }

    fn shown(&self) -> Vec<Block> {
        self.shown.lock().unwrap().clone()
    }
}

impl Console for ScriptedConsole {
    fn show(&self, block: Block) {
        self.shown.lock().unwrap().push(block);
    }

    fn confirm(&self, _question: &str) -> io::Result<bool> {
        self.confirms
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no confirm left"))
    }

    fn input(&self, _prompt: &str) -> io::Result<String> {
        self.inputs
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no input left"))
    }

    fn secret(&self, prompt: &str) -> io::Result<String> {
        self.input(prompt)
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

const HELLO_PLAN: &str = r#"{
  "plan_description": "Create hello.txt containing Hello",
  "steps": [
    {"description": "Write the greeting", "code": "Hello", "filename": "hello.txt", "is_command": false}
  ]
}"#;

async fn run_session(
    provider: Arc<ScriptedProvider>,
    console: &dyn Console,
    dir: &Path,
    task: &str,
) -> SessionReport {
    let planner = Planner::new(provider, "mock", 0.2);
    let executor = PlanExecutor::new(Arc::new(taskpilot_tools::step_registry_in(dir)));
    Session::new(planner, executor)
        .with_limits(SessionLimits::default())
        .run(task, console)
        .await
        .expect("console never closes in these scenarios")
}

// ── Scenarios ────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_hello_file_reaches_done() {
    let dir = tempfile::tempdir().unwrap();
    let reply = format!("Sure! Here is the plan:\n```json\n{HELLO_PLAN}\n```\nLet me know.");
    let provider = Arc::new(ScriptedProvider::new(&[reply.as_str()]));
    let console = ScriptedConsole::answering(&[true, true], &[]);

    let report = run_session(
        provider.clone(),
        &console,
        dir.path(),
        "create a file hello.txt containing Hello",
    )
    .await;

    assert_eq!(
        report.transitions,
        vec![
            SessionState::AwaitingPlan,
            SessionState::AwaitingApproval,
            SessionState::Executing,
            SessionState::AwaitingOutcome,
            SessionState::Done,
        ]
    );
    assert_eq!(std::fs::read(dir.path().join("hello.txt")).unwrap(), b"Hello");
    assert_eq!(provider.calls(), 1);
    assert!(provider.prompt(0).contains("create a file hello.txt containing Hello"));
    assert!(
        console
            .shown()
            .contains(&Block::panel("Code to Save in hello.txt", "Hello"))
    );
}

#[cfg(unix)]
#[tokio::test]
async fn e2e_exit_one_goes_to_refining_and_stops_the_plan() {
    let dir = tempfile::tempdir().unwrap();
    let failing = r#"{
      "plan_description": "Fail first",
      "steps": [
        {"description": "Fail", "command": "exit 1", "is_command": true},
        {"description": "Never runs", "code": "x", "filename": "after.txt", "is_command": false}
      ]
    }"#;
    let provider = Arc::new(ScriptedProvider::new(&[failing, HELLO_PLAN]));
    // approve the failing plan, reject the refined one
    let console = ScriptedConsole::answering(&[true, false], &[]);

    let report = run_session(provider.clone(), &console, dir.path(), "do it").await;

    assert_eq!(
        report.transitions[..4],
        [
            SessionState::AwaitingPlan,
            SessionState::AwaitingApproval,
            SessionState::Executing,
            SessionState::Refining {
                detail: String::new()
            },
        ]
    );
    assert!(matches!(report.outcome, SessionState::Aborted { .. }));
    assert!(!dir.path().join("after.txt").exists());
    assert!(provider.prompt(1).contains("Original task: \"do it\""));
}

#[cfg(unix)]
#[tokio::test]
async fn e2e_stderr_feeds_the_refinement_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let failing = r#"{"plan_description": "p", "steps": [
        {"description": "Complain", "command": "echo 'disk full' >&2; exit 4", "is_command": true}
    ]}"#;
    let provider = Arc::new(ScriptedProvider::new(&[failing, HELLO_PLAN]));
    let console = ScriptedConsole::answering(&[true, true, true], &[]);

    let report = run_session(provider.clone(), &console, dir.path(), "t").await;

    assert!(report.is_done());
    assert_eq!(report.refinements, 1);
    assert!(provider.prompt(1).contains("Error details: disk full"));
    assert!(dir.path().join("hello.txt").exists());
}

#[tokio::test]
async fn e2e_fenced_and_bare_responses_behave_the_same() {
    let replies = [
        format!("```json\n{HELLO_PLAN}\n```"),
        format!("Plan below.\n```\n{HELLO_PLAN}\n```"),
        HELLO_PLAN.to_string(),
    ];

    for reply in &replies {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(ScriptedProvider::new(&[reply.as_str()]));
        let console = ScriptedConsole::answering(&[true, true], &[]);

        let report = run_session(provider, &console, dir.path(), "t").await;

        assert!(report.is_done(), "reply: {reply}");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("hello.txt")).unwrap(),
            "Hello"
        );
    }
}

#[tokio::test]
async fn e2e_only_the_first_fenced_block_counts() {
    let dir = tempfile::tempdir().unwrap();
    let sentinel = r#"{"plan_description": "other", "steps": [
        {"description": "s", "code": "x", "filename": "sentinel.txt", "is_command": false}
    ]}"#;
    let reply = format!("```json\n{HELLO_PLAN}\n```\nOr alternatively:\n```json\n{sentinel}\n```");
    let provider = Arc::new(ScriptedProvider::new(&[reply.as_str()]));
    let console = ScriptedConsole::answering(&[true, true], &[]);

    let report = run_session(provider, &console, dir.path(), "t").await;

    assert!(report.is_done());
    assert!(dir.path().join("hello.txt").exists());
    assert!(!dir.path().join("sentinel.txt").exists());
}

#[tokio::test]
async fn e2e_rejected_plan_aborts_without_side_effects() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(ScriptedProvider::new(&[HELLO_PLAN]));
    let console = ScriptedConsole::answering(&[false], &[]);

    let report = run_session(provider, &console, dir.path(), "t").await;

    assert!(matches!(report.outcome, SessionState::Aborted { .. }));
    assert!(!dir.path().join("hello.txt").exists());
}

#[tokio::test]
async fn e2e_feedback_drives_a_new_plan() {
    let dir = tempfile::tempdir().unwrap();
    let corrected = r#"{"plan_description": "Fix the greeting", "steps": [
        {"description": "Rewrite", "code": "Hello, world", "filename": "hello.txt", "is_command": false}
    ]}"#;
    let provider = Arc::new(ScriptedProvider::new(&[HELLO_PLAN, corrected]));
    // approve, not successful, approve refinement, successful
    let console =
        ScriptedConsole::answering(&[true, false, true, true], &["it should greet the world"]);

    let report = run_session(provider.clone(), &console, dir.path(), "greet").await;

    assert!(report.is_done());
    assert!(report.transitions.contains(&SessionState::Refining {
        detail: "it should greet the world".into()
    }));
    assert!(provider.prompt(1).contains("it should greet the world"));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("hello.txt")).unwrap(),
        "Hello, world"
    );
}

#[tokio::test]
async fn e2e_unparseable_reply_shows_raw_text() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(ScriptedProvider::new(&["I'd rather not.", "Still no."]));
    let console = ScriptedConsole::answering(&[true], &[]);

    let report = run_session(provider.clone(), &console, dir.path(), "t").await;

    assert_eq!(
        report.transitions,
        vec![
            SessionState::AwaitingPlan,
            SessionState::Aborted {
                reason: "Failed to generate a valid plan.".into()
            }
        ]
    );
    assert_eq!(provider.calls(), 2);
    assert!(
        console
            .shown()
            .contains(&Block::panel("Raw AI Response", "I'd rather not."))
    );
}

#[cfg(unix)]
#[tokio::test]
async fn e2e_credential_is_masked_in_command_output() {
    let dir = tempfile::tempdir().unwrap();
    let key = "sk-live-0123456789";
    let plan = format!(
        r#"{{"plan_description": "Show env", "steps": [
            {{"description": "Print it", "command": "echo GEMINI_API_KEY={key}", "is_command": true}}
        ]}}"#
    );
    let provider = Arc::new(ScriptedProvider::new(&[plan.as_str()]));
    let scripted = ScriptedConsole::answering(&[true, true], &[]);
    let console = RedactingConsole::new(&scripted, vec![key.to_string()]);

    let report = run_session(provider, &console, dir.path(), "show env").await;

    assert!(report.is_done());
    let shown = scripted.shown();
    assert!(shown.iter().all(|b| !b.text().contains(key)));
    assert!(shown.contains(&Block::panel(
        "Command Output",
        "GEMINI_API_KEY=[REDACTED]\n"
    )));
}
