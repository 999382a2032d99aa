//! The builder workspace: state, pure transitions and an effect runner.
//!
//! [`reduce`] is the only place state changes. [`AgentSession`] feeds it actions and runs the
//! [`Effect`]s it returns (model calls, the simulated deploy, archive export).

mod reducer;
mod session;
mod state;

pub use reducer::{Action, Effect, FAILURE_NOTICE, FALLBACK_REPLY, reduce};
pub use session::{AgentSession, Outcome};
pub use state::{
    DEVICES, DevicePreset, GREETING, MODELS, ModelOption, ProjectType, RightTab, WorkspaceState, find_device,
    find_model,
};
