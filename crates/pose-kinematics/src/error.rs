//! Error types for the kinematics library.

use core::fmt;

/// Errors that can occur while integrating unicycle kinematics.
#[derive(Debug, Clone, PartialEq)]
pub enum KinematicsError {
    /// Error for negative time delta.
    /// This variant is returned when a negative time delta is used for pose updates.
    NegativeTimeDelta(&'static str),
    /// Error for a `NaN` or infinite time delta.
    NonFiniteTimeDelta(&'static str),
}

impl fmt::Display for KinematicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KinematicsError::NegativeTimeDelta(msg) => write!(f, "Negative time delta: {}", msg),
            KinematicsError::NonFiniteTimeDelta(msg) => write!(f, "Non-finite time delta: {}", msg),
        }
    }
}

impl core::error::Error for KinematicsError {}
