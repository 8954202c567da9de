//! Controller gains and actuator limits.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ControllerError;

/// Default linear velocity limit (m/s).
pub const DEFAULT_V_MAX: f64 = 0.5;

/// Default angular velocity limit (rad/s).
pub const DEFAULT_OM_MAX: f64 = 1.0;

/// The three gains of the pose-stabilization law.
///
/// `k1` scales the forward speed with distance, `k2` the turn towards the line
/// of sight and `k3` the correction of the final heading.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainParams {
    k1: f64,
    k2: f64,
    k3: f64,
}

impl GainParams {
    /// Construct a validated set of gains.
    ///
    /// # Errors
    ///
    /// Returns `Err(ControllerError::InvalidGain)` naming the first gain that is
    /// not a positive finite number.
    pub fn new(k1: f64, k2: f64, k3: f64) -> Result<Self, ControllerError> {
        let gains = GainParams { k1, k2, k3 };
        gains.validate()?;
        Ok(gains)
    }

    /// Check the gains. Values built through `new` always pass; deserialized
    /// values may not.
    pub fn validate(&self) -> Result<(), ControllerError> {
        if !is_positive(self.k1) {
            return Err(ControllerError::InvalidGain("k1 must be positive and finite"));
        }
        if !is_positive(self.k2) {
            return Err(ControllerError::InvalidGain("k2 must be positive and finite"));
        }
        if !is_positive(self.k3) {
            return Err(ControllerError::InvalidGain("k3 must be positive and finite"));
        }
        Ok(())
    }

    /// Distance gain.
    pub fn k1(&self) -> f64 {
        self.k1
    }

    /// Bearing gain.
    pub fn k2(&self) -> f64 {
        self.k2
    }

    /// Heading gain.
    pub fn k3(&self) -> f64 {
        self.k3
    }
}

/// Symmetric saturation limits applied to the controller output.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    v_max: f64,
    om_max: f64,
}

impl Limits {
    /// Construct validated limits.
    ///
    /// # Errors
    ///
    /// Returns `Err(ControllerError::InvalidLimit)` if either limit is not a
    /// positive finite number.
    pub fn new(v_max: f64, om_max: f64) -> Result<Self, ControllerError> {
        let limits = Limits { v_max, om_max };
        limits.validate()?;
        Ok(limits)
    }

    /// Check the limits.
    pub fn validate(&self) -> Result<(), ControllerError> {
        if !is_positive(self.v_max) {
            return Err(ControllerError::InvalidLimit("v_max must be positive and finite"));
        }
        if !is_positive(self.om_max) {
            return Err(ControllerError::InvalidLimit("om_max must be positive and finite"));
        }
        Ok(())
    }

    /// Linear velocity limit (m/s).
    pub fn v_max(&self) -> f64 {
        self.v_max
    }

    /// Angular velocity limit (rad/s).
    pub fn om_max(&self) -> f64 {
        self.om_max
    }
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            v_max: DEFAULT_V_MAX,
            om_max: DEFAULT_OM_MAX,
        }
    }
}

// NaN fails the comparison, infinity fails is_finite
fn is_positive(value: f64) -> bool {
    value > 0.0 && value.is_finite()
}
