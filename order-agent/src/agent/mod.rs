//! Agent control
//!
//! - `orchestrator`: start/stop/restart/status/silence and error escalation
//! - `cycle`: the poll → print → acknowledge worker
//! - `alert`: alarm pulse loop
//! - `status`: shared run state

pub mod alert;
mod cycle;
pub mod orchestrator;
pub mod status;

pub use alert::{AlertSignaler, AlertSink, TerminalBell};
pub use orchestrator::{Orchestrator, Services};
pub use status::{HEALTHY_MESSAGE, SharedStatus, StatusSnapshot};
