//! Pure flow logic: the step state machine, dependency resolution and
//! progress aggregation.
//!
//! Nothing here performs I/O. Backends and the tracker feed flow snapshots
//! in and read decisions out.

pub mod machine;
pub mod progress;
pub mod resolver;

#[cfg(test)]
mod tests;

pub use machine::{apply_commit, apply_control, apply_step_action, check_step_action};
pub use progress::{FlowOutcome, FlowProgress, PhaseProgress};
pub use resolver::Resolution;
