#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![doc = "A `no_std` pose-stabilization controller for unicycle robots."]
#![doc = ""]
#![doc = "Given the current pose and a goal pose, [`PoseController`] computes a forward and a"]
#![doc = "yaw-rate command from the bearing error `alpha`, the distance `rho` and the heading"]
#![doc = "error `delta`, then saturates both commands independently. The `alpha = 0`"]
#![doc = "singularity of the angular law is removed with the normalized sinc."]

use core::f64::consts::PI;
use core::fmt;
use libm::{atan2, cos, sin, sqrt};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use pose_kinematics::{Pose2D, Twist, wrap_to_pi};

pub mod diagnostics;
pub mod error;
pub mod params;

pub use diagnostics::{DiagnosticSample, DiagnosticSink, GoalTolerance, NullSink};
pub use error::ControllerError;
pub use params::{DEFAULT_OM_MAX, DEFAULT_V_MAX, GainParams, Limits};

/// Normalized sinc, `sin(PI * a) / (PI * a)` with `sinc(0) = 1`.
///
/// This is the normalized convention, not `sin(a) / a`.
pub fn sinc(a: f64) -> f64 {
    if a == 0.0 {
        return 1.0;
    }
    let x = PI * a;
    sin(x) / x
}

/// The pose the controller drives the robot to.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GoalPose {
    /// Goal x position (m).
    pub x: f64,
    /// Goal y position (m).
    pub y: f64,
    /// Goal heading (rad), any range.
    pub theta: f64,
}

impl GoalPose {
    /// Construct a goal pose. The heading does not need to be normalized.
    pub const fn new(x: f64, y: f64, theta: f64) -> Self {
        GoalPose { x, y, theta }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.theta.is_finite()
    }
}

impl From<Pose2D> for GoalPose {
    fn from(pose: Pose2D) -> Self {
        GoalPose::new(pose.x, pose.y, pose.theta)
    }
}

impl fmt::Display for GoalPose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(x_g: {:.2}, y_g: {:.2}, θ_g: {:.2} rad)", self.x, self.y, self.theta)
    }
}

/// Saturated velocity command produced by one control computation.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlOutput {
    /// Linear velocity (m/s), within `[-v_max, v_max]`.
    pub v: f64,
    /// Angular velocity (rad/s), within `[-om_max, om_max]`.
    pub om: f64,
}

impl From<ControlOutput> for Twist {
    fn from(out: ControlOutput) -> Self {
        Twist::new(out.v, out.om)
    }
}

/// Whether a goal has been loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// No goal loaded; computing control fails with [`ControllerError::GoalNotSet`].
    Unconfigured,
    /// A goal is loaded; control can be computed any number of times.
    Ready,
}

/// Pose-stabilization controller for a unicycle robot.
///
/// Gains and limits are fixed at construction. The goal is replaced with
/// [`load_goal`](PoseController::load_goal). Every computation starts from
/// scratch; no error history is kept between calls.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseController {
    gains: GainParams,
    limits: Limits,
    goal: Option<GoalPose>,
}

impl PoseController {
    /// Construct a controller with no goal loaded.
    ///
    /// # Errors
    ///
    /// Returns `Err(ControllerError::InvalidGain)` or `Err(ControllerError::InvalidLimit)`
    /// if the parameters are not positive and finite. Both are checked again here
    /// so deserialized parameters cannot slip through.
    pub fn new(gains: GainParams, limits: Limits) -> Result<Self, ControllerError> {
        gains.validate()?;
        limits.validate()?;
        Ok(PoseController {
            gains,
            limits,
            goal: None,
        })
    }

    /// Construct a controller from raw gains with the default limits
    /// (`v_max = 0.5`, `om_max = 1.0`).
    pub fn from_gains(k1: f64, k2: f64, k3: f64) -> Result<Self, ControllerError> {
        Self::new(GainParams::new(k1, k2, k3)?, Limits::default())
    }

    /// Replace the goal. Moves the controller to [`ControllerState::Ready`].
    pub fn load_goal(&mut self, goal: GoalPose) {
        self.goal = Some(goal);
    }

    /// Drop the goal. Moves the controller back to [`ControllerState::Unconfigured`].
    pub fn clear_goal(&mut self) {
        self.goal = None;
    }

    /// The current goal, if one is loaded.
    pub fn goal(&self) -> Option<GoalPose> {
        self.goal
    }

    /// The current state.
    pub fn state(&self) -> ControllerState {
        match self.goal {
            Some(_) => ControllerState::Ready,
            None => ControllerState::Unconfigured,
        }
    }

    /// The gains.
    pub fn gains(&self) -> &GainParams {
        &self.gains
    }

    /// The saturation limits.
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Compute the error terms `alpha`, `delta` and `rho` for a pose.
    ///
    /// # Errors
    ///
    /// Returns `Err(ControllerError::GoalNotSet)` when no goal is loaded and
    /// `Err(ControllerError::NonFiniteInput)` when the pose or goal has a `NaN` or
    /// infinite component.
    pub fn diagnostics(&self, pose: Pose2D) -> Result<DiagnosticSample, ControllerError> {
        let goal = self.goal.ok_or(ControllerError::GoalNotSet)?;
        if !pose.is_finite() {
            return Err(ControllerError::NonFiniteInput("pose"));
        }
        if !goal.is_finite() {
            return Err(ControllerError::NonFiniteInput("goal"));
        }

        let dx = goal.x - pose.x;
        let dy = goal.y - pose.y;

        let alpha = wrap_to_pi(atan2(dy, dx) - pose.theta);
        let rho = sqrt(dy * dy + dx * dx);
        // alpha is already wrapped; the second wrap is kept as-is
        let delta = wrap_to_pi(wrap_to_pi(alpha) - goal.theta + pose.theta);

        Ok(DiagnosticSample { alpha, delta, rho })
    }

    /// Compute the saturated velocity command for a pose, discarding diagnostics.
    ///
    /// # Errors
    ///
    /// See [`diagnostics`](PoseController::diagnostics).
    pub fn compute_control(&self, pose: Pose2D) -> Result<ControlOutput, ControllerError> {
        self.compute_control_with(pose, &mut NullSink)
    }

    /// Compute the saturated velocity command for a pose and hand the error
    /// terms to `sink`.
    ///
    /// The sink is called once, before the output is returned, and cannot
    /// influence the output.
    ///
    /// # Errors
    ///
    /// See [`diagnostics`](PoseController::diagnostics). The sink is not called on error.
    pub fn compute_control_with<S>(&self, pose: Pose2D, sink: &mut S) -> Result<ControlOutput, ControllerError>
    where
        S: DiagnosticSink + ?Sized,
    {
        let sample = self.diagnostics(pose)?;
        sink.record(sample);

        let (v, om) = control_law(&self.gains, &sample);

        Ok(ControlOutput {
            v: v.clamp(-self.limits.v_max(), self.limits.v_max()),
            om: om.clamp(-self.limits.om_max(), self.limits.om_max()),
        })
    }
}

/// Unsaturated `(V, om)` for a set of error terms.
fn control_law(gains: &GainParams, sample: &DiagnosticSample) -> (f64, f64) {
    let DiagnosticSample { alpha, delta, rho } = *sample;
    let (k1, k2, k3) = (gains.k1(), gains.k2(), gains.k3());

    let v = k1 * rho * cos(alpha);
    let om = k2 * alpha + k1 * sinc(alpha) * cos(alpha) * (alpha + k3 * delta);
    (v, om)
}
