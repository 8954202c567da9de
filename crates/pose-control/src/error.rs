//! Error types for the pose controller.
//!
//! Configuration problems (bad gains or limits, computing before a goal is
//! loaded) are reported separately from the non-finite input guard so a host
//! can tell a wiring bug from a bad pose sample.

use core::fmt;

/// Errors returned by [`PoseController`](crate::PoseController) and its parameter types.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerError {
    /// A gain was zero, negative or not finite. The message names the gain.
    InvalidGain(&'static str),
    /// A saturation limit was zero, negative or not finite. The message names the limit.
    InvalidLimit(&'static str),
    /// `compute_control` was called before any goal was loaded.
    GoalNotSet,
    /// A pose or goal component was `NaN` or infinite. The message names the source.
    NonFiniteInput(&'static str),
}

impl ControllerError {
    /// Returns `true` for errors caused by how the controller was set up rather
    /// than by the sample being processed.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ControllerError::InvalidGain(_) | ControllerError::InvalidLimit(_) | ControllerError::GoalNotSet
        )
    }
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::InvalidGain(msg) => write!(f, "Invalid gain: {}", msg),
            ControllerError::InvalidLimit(msg) => write!(f, "Invalid limit: {}", msg),
            ControllerError::GoalNotSet => write!(f, "Goal not set: load a goal before computing control"),
            ControllerError::NonFiniteInput(msg) => write!(f, "Non-finite input: {}", msg),
        }
    }
}

impl core::error::Error for ControllerError {}
