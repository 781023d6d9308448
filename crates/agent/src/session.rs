//! Session controller: the plan → approve → execute → refine state machine.
//!
//! ```text
//! AwaitingPlan ─▶ AwaitingApproval ─▶ Executing ─▶ AwaitingOutcome ─▶ Done
//!      │               │   ▲              │              │
//!      ▼               ▼   │              ▼              ▼
//!   Aborted         Aborted└──────── Refining ◀──────────┘
//! ```
//!
//! The controller awaits exactly one model call or one step at a time.
//! `Done` and `Aborted` are terminal; every visited state is recorded.

use std::fmt;

use taskpilot_core::console::{Block, Console};
use taskpilot_core::error::Result;
use taskpilot_core::plan::Plan;
use tracing::{debug, info, warn};

use crate::executor::PlanExecutor;
use crate::planner::{Planner, PlanningError};
use crate::presenter::present;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    AwaitingPlan,
    AwaitingApproval,
    Executing,
    AwaitingOutcome,
    /// Asking for a new plan; `detail` is the step error or operator feedback.
    Refining { detail: String },
    Done,
    Aborted { reason: String },
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Aborted { .. })
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingPlan => f.write_str("AwaitingPlan"),
            Self::AwaitingApproval => f.write_str("AwaitingApproval"),
            Self::Executing => f.write_str("Executing"),
            Self::AwaitingOutcome => f.write_str("AwaitingOutcome"),
            Self::Refining { .. } => f.write_str("Refining"),
            Self::Done => f.write_str("Done"),
            Self::Aborted { .. } => f.write_str("Aborted"),
        }
    }
}

/// How a session ended and how it got there.
#[derive(Debug, Clone)]
pub struct SessionReport {
    /// `Done` or `Aborted`
    pub outcome: SessionState,

    /// Every visited state in order, the outcome included.
    pub transitions: Vec<SessionState>,

    /// Refinement requests made.
    pub refinements: u32,
}

impl SessionReport {
    pub fn is_done(&self) -> bool {
        self.outcome == SessionState::Done
    }
}

/// Bounds on how long a session keeps trying.
#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    /// Refinement rounds before giving up. 0 = unbounded.
    pub max_refinements: u32,

    /// Consecutive failed plan requests before giving up. The operator is
    /// asked before each retry.
    pub max_plan_attempts: u32,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_refinements: 10,
            max_plan_attempts: 2,
        }
    }
}

impl From<&taskpilot_config::SessionConfig> for SessionLimits {
    fn from(config: &taskpilot_config::SessionConfig) -> Self {
        Self {
            max_refinements: config.max_refinements,
            max_plan_attempts: config.max_plan_attempts.max(1),
        }
    }
}

pub struct Session {
    planner: Planner,
    executor: PlanExecutor,
    limits: SessionLimits,
}

impl Session {
    pub fn new(planner: Planner, executor: PlanExecutor) -> Self {
        Self {
            planner,
            executor,
            limits: SessionLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: SessionLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Drive one task until `Done` or `Aborted`.
    ///
    /// Errors only when the console itself fails (e.g. stdin closed); every
    /// planning and execution failure is handled inside the state machine.
    pub async fn run(&self, task: &str, console: &dyn Console) -> Result<SessionReport> {
        let mut state = SessionState::AwaitingPlan;
        let mut transitions = Vec::new();
        let mut plan: Option<Plan> = None;
        let mut refinements = 0u32;

        info!(task, "Starting session");

        loop {
            debug!(state = %state, "Session state");
            transitions.push(state.clone());

            state = match &state {
                SessionState::AwaitingPlan => {
                    console.show(Block::Info("Generating plan...".into()));
                    match self.obtain_plan(task, None, console).await? {
                        Some(new_plan) => {
                            plan = Some(new_plan);
                            SessionState::AwaitingApproval
                        }
                        None => aborted(console, "Failed to generate a valid plan."),
                    }
                }

                SessionState::AwaitingApproval => {
                    let current = current_plan(&plan)?;
                    present(current, console);
                    if console.confirm("Do you approve this plan?")? {
                        SessionState::Executing
                    } else {
                        aborted(console, "Plan rejected.")
                    }
                }

                SessionState::Executing => {
                    let current = current_plan(&plan)?;
                    console.show(Block::Info("Executing plan...".into()));
                    let result = self.executor.execute(current, console).await;
                    if result.ok {
                        SessionState::AwaitingOutcome
                    } else {
                        console.show(Block::Failure(format!("Task failed: {}", result.detail)));
                        SessionState::Refining {
                            detail: result.detail,
                        }
                    }
                }

                SessionState::AwaitingOutcome => {
                    console.show(Block::Success("Task completed!".into()));
                    if console.confirm("Was the task successful?")? {
                        console.show(Block::Success("Great! Task completed successfully.".into()));
                        SessionState::Done
                    } else {
                        let feedback = console.input("Please describe what went wrong")?;
                        SessionState::Refining { detail: feedback }
                    }
                }

                SessionState::Refining { detail } => {
                    let limit = self.limits.max_refinements;
                    if limit != 0 && refinements >= limit {
                        aborted(
                            console,
                            &format!("Giving up after {limit} refinement attempts."),
                        )
                    } else {
                        refinements += 1;
                        console.show(Block::Info("Refining the plan...".into()));
                        match self.obtain_plan(task, Some(detail), console).await? {
                            Some(new_plan) => {
                                plan = Some(new_plan);
                                SessionState::AwaitingApproval
                            }
                            None => aborted(console, "Failed to refine the plan."),
                        }
                    }
                }

                SessionState::Done | SessionState::Aborted { .. } => break,
            };
        }

        Ok(SessionReport {
            outcome: state,
            transitions,
            refinements,
        })
    }

    /// Request a plan, letting the operator retry up to `max_plan_attempts`
    /// consecutive failures. `None` means give up.
    async fn obtain_plan(
        &self,
        task: &str,
        detail: Option<&str>,
        console: &dyn Console,
    ) -> Result<Option<Plan>> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let outcome = match detail {
                None => self.planner.plan(task).await,
                Some(detail) => self.planner.refine(task, detail).await,
            };

            let error = match outcome {
                Ok(plan) => return Ok(Some(plan)),
                Err(error) => error,
            };
            warn!(attempt = attempts, error = %error, "Planning failed");
            report_planning_error(&error, console);

            if attempts >= self.limits.max_plan_attempts {
                return Ok(None);
            }
            if !console.confirm("Try generating the plan again?")? {
                return Ok(None);
            }
        }
    }
}

fn report_planning_error(error: &PlanningError, console: &dyn Console) {
    match error {
        PlanningError::Service(e) => {
            console.show(Block::Failure(format!("Model request failed: {e}")));
        }
        PlanningError::Extract(e) => {
            console.show(Block::Failure(format!("Error parsing AI response: {}", e.cause)));
            console.show(Block::panel("Raw AI Response", &e.raw));
        }
    }
}

fn aborted(console: &dyn Console, reason: &str) -> SessionState {
    console.show(Block::Warning(format!("{reason} Exiting.")));
    SessionState::Aborted {
        reason: reason.to_string(),
    }
}

fn current_plan(plan: &Option<Plan>) -> Result<&Plan> {
    plan.as_ref()
        .ok_or_else(|| taskpilot_core::Error::Internal("no plan in this state".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ScriptedConsole, SequentialMockProvider, make_text_response};
    use std::sync::Arc;
    use taskpilot_core::error::ProviderError;
    use SessionState::*;

    const WRITE_HELLO: &str = r#"{"plan_description": "Create hello.txt",
        "steps": [{"description": "Write", "code": "Hello", "filename": "hello.txt", "is_command": false}]}"#;
    const FAIL: &str = r#"{"plan_description": "Fail",
        "steps": [{"description": "Boom", "command": "exit 1", "is_command": true}]}"#;
    const EMPTY: &str = r#"{"plan_description": "Already done", "steps": []}"#;

    fn session(
        provider: Arc<SequentialMockProvider>,
        dir: &std::path::Path,
        limits: SessionLimits,
    ) -> Session {
        let planner = Planner::new(provider, "mock-model", 0.2);
        let executor = PlanExecutor::new(Arc::new(taskpilot_tools::step_registry_in(dir)));
        Session::new(planner, executor).with_limits(limits)
    }

    fn names(report: &SessionReport) -> Vec<String> {
        report.transitions.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn happy_path_reaches_done() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(SequentialMockProvider::texts(&[WRITE_HELLO]));
        let console = ScriptedConsole::new().with_confirms(&[true, true]);

        let report = session(provider, dir.path(), SessionLimits::default())
            .run("create hello.txt", &console)
            .await
            .unwrap();

        assert!(report.is_done());
        assert_eq!(
            report.transitions,
            vec![AwaitingPlan, AwaitingApproval, Executing, AwaitingOutcome, Done]
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("hello.txt")).unwrap(),
            "Hello"
        );
    }

    #[tokio::test]
    async fn rejection_aborts_without_executing() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(SequentialMockProvider::texts(&[WRITE_HELLO]));
        let console = ScriptedConsole::new().with_confirms(&[false]);

        let report = session(provider, dir.path(), SessionLimits::default())
            .run("t", &console)
            .await
            .unwrap();

        assert!(matches!(report.outcome, Aborted { .. }));
        assert_eq!(names(&report), ["AwaitingPlan", "AwaitingApproval", "Aborted"]);
        assert!(!dir.path().join("hello.txt").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failed_step_refines_with_detail() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(SequentialMockProvider::texts(&[FAIL, WRITE_HELLO]));
        // approve, approve refined plan, confirm success
        let console = ScriptedConsole::new().with_confirms(&[true, true, true]);

        let report = session(provider.clone(), dir.path(), SessionLimits::default())
            .run("t", &console)
            .await
            .unwrap();

        assert!(report.is_done());
        assert_eq!(report.refinements, 1);
        assert_eq!(report.transitions[3], Refining { detail: String::new() });
        assert_eq!(provider.call_count(), 2);
        assert!(provider.prompts()[1].contains("Original task: \"t\""));
    }

    #[tokio::test]
    async fn negative_feedback_is_sent_back() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(SequentialMockProvider::texts(&[WRITE_HELLO, WRITE_HELLO]));
        let console = ScriptedConsole::new()
            .with_confirms(&[true, false, false])
            .with_inputs(&["the file should say Hi"]);

        let report = session(provider.clone(), dir.path(), SessionLimits::default())
            .run("t", &console)
            .await
            .unwrap();

        assert_eq!(report.outcome, Aborted { reason: "Plan rejected.".into() });
        assert!(report.transitions.contains(&Refining {
            detail: "the file should say Hi".into()
        }));
        assert!(provider.prompts()[1].contains("Error details: the file should say Hi"));
    }

    #[tokio::test]
    async fn empty_plan_still_asks_for_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(SequentialMockProvider::texts(&[EMPTY]));
        let console = ScriptedConsole::new().with_confirms(&[true, true]);

        let report = session(provider, dir.path(), SessionLimits::default())
            .run("t", &console)
            .await
            .unwrap();

        assert!(report.is_done());
        assert!(console.questions().contains(&"Was the task successful?".to_string()));
    }

    #[tokio::test]
    async fn bad_response_can_be_retried_once() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(SequentialMockProvider::texts(&["no json here", WRITE_HELLO]));
        // retry, approve, success
        let console = ScriptedConsole::new().with_confirms(&[true, true, true]);

        let report = session(provider, dir.path(), SessionLimits::default())
            .run("t", &console)
            .await
            .unwrap();

        assert!(report.is_done());
        let transcript = console.transcript();
        assert!(transcript.contains("Raw AI Response\nno json here"));
    }

    #[tokio::test]
    async fn two_consecutive_planning_failures_abort() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(SequentialMockProvider::new(vec![
            Ok(make_text_response("nope")),
            Err(ProviderError::Timeout("120s".into())),
        ]));
        let console = ScriptedConsole::new().with_confirms(&[true]);

        let report = session(provider.clone(), dir.path(), SessionLimits::default())
            .run("t", &console)
            .await
            .unwrap();

        assert_eq!(names(&report), ["AwaitingPlan", "Aborted"]);
        assert_eq!(provider.call_count(), 2);
        assert!(console.transcript().contains("Request timed out"));
    }

    #[tokio::test]
    async fn declining_retry_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(SequentialMockProvider::texts(&["nope"]));
        let console = ScriptedConsole::new().with_confirms(&[false]);

        let report = session(provider.clone(), dir.path(), SessionLimits::default())
            .run("t", &console)
            .await
            .unwrap();

        assert!(matches!(report.outcome, Aborted { .. }));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn refinement_limit_is_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(SequentialMockProvider::texts(&[WRITE_HELLO, WRITE_HELLO]));
        let console = ScriptedConsole::new()
            .with_confirms(&[true, false, true, false])
            .with_inputs(&["wrong", "still wrong"]);
        let limits = SessionLimits {
            max_refinements: 1,
            max_plan_attempts: 2,
        };

        let report = session(provider.clone(), dir.path(), limits)
            .run("t", &console)
            .await
            .unwrap();

        assert_eq!(report.refinements, 1);
        assert_eq!(provider.call_count(), 2);
        match report.outcome {
            Aborted { reason } => assert!(reason.contains("1 refinement")),
            other => panic!("expected Aborted, got {other}"),
        }
    }

    #[tokio::test]
    async fn closed_console_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(SequentialMockProvider::texts(&[WRITE_HELLO]));
        let console = ScriptedConsole::new();

        let err = session(provider, dir.path(), SessionLimits::default())
            .run("t", &console)
            .await
            .unwrap_err();
        assert!(matches!(err, taskpilot_core::Error::Console(_)));
    }
}
