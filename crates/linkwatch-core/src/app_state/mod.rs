//! Application-wide state for the coordinator

mod context;

pub use context::*;

/// Top-level sequencing of the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppRunState {
    /// Bringing the network up, retrying until it succeeds.
    #[default]
    Startup,
    /// One-shot reporting and output setup after bring-up.
    DisplayInfo,
    /// Servicing inbound messages and button events.
    Idle,
}
