//! The TaskPilot session loop.
//!
//! A session follows a **Plan → Approve → Execute → Refine** cycle:
//!
//! 1. **Plan**: ask the model for a step-by-step plan ([`planner`]) and pull
//!    it out of the free-text reply ([`extract`])
//! 2. **Approve**: show the plan to the operator ([`presenter`])
//! 3. **Execute**: run the steps in order, stopping at the first failure
//!    ([`executor`])
//! 4. **Refine**: on failure or operator dissatisfaction, ask for a new plan
//!    with the failure detail and go back to step 2
//!
//! [`session`] ties these together as an explicit state machine.

pub mod executor;
pub mod extract;
pub mod planner;
pub mod presenter;
pub mod session;

#[cfg(test)]
mod test_helpers;

pub use executor::{ExecutionResult, PlanExecutor, StepFailure};
pub use extract::extract;
pub use planner::{Planner, PlanningError};
pub use presenter::present;
pub use session::{Session, SessionLimits, SessionReport, SessionState};
