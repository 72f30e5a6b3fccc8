//! Workflow state machine: Idle → Uploading → Previewing → Forecasting → Displaying, with an
//! error stage beside each network step.

pub mod session;
pub mod state;

pub use session::{PendingRequest, Services, Session};
pub use state::{reduce, transition, Event, SequenceToken, Stage, WorkflowState};
