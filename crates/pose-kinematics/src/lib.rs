#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![doc = "A `no_std` library for planar unicycle kinematics."]
#![doc = ""]
#![doc = "This crate provides the robot pose and twist types, angle wrapping into `(-PI, PI]`,"]
#![doc = "and a forward Euler step of the unicycle model used to simulate a robot under command."]

use core::f64::consts::{PI, TAU};
use core::fmt;
use libm::{cos, fmod, sin, sqrt};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod error;
pub use error::KinematicsError;

/// Wrap an angle into the half-open interval `(-PI, PI]`.
///
/// Angles already inside the interval are returned unchanged, so the function is
/// idempotent bit for bit. `-PI` maps to `PI`. Non-finite inputs produce `NaN`.
///
/// # Arguments
///
/// * `angle`: The angle in radians, any range.
///
/// # Returns
///
/// The equivalent angle in `(-PI, PI]`.
pub fn wrap_to_pi(angle: f64) -> f64 {
    if angle > -PI && angle <= PI {
        return angle;
    }

    let mut r = fmod(PI - angle, TAU);
    if r < 0.0 {
        r += TAU;
    }
    let wrapped = PI - r;

    // r can round up to TAU for inputs just above an odd multiple of PI
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}

/// A 2‑D pose `(x, y, θ)` in meters and radians (θ measured counter‑clockwise
/// from the x‑axis in the world frame).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose2D {
    /// World‑frame x position (m).
    pub x: f64,
    /// World‑frame y position (m).
    pub y: f64,
    /// Heading (rad). Any range is accepted; [`integrate`] keeps it in `(-PI, PI]`.
    pub theta: f64,
}

impl Pose2D {
    /// Construct a new pose.
    ///
    /// # Arguments
    ///
    /// * `x`: World-frame x position in meters.
    /// * `y`: World-frame y position in meters.
    /// * `theta`: Heading in radians.
    pub const fn new(x: f64, y: f64, theta: f64) -> Self {
        Pose2D { x, y, theta }
    }

    /// Euclidean distance between the positions of two poses, ignoring heading.
    pub fn distance_to(&self, other: &Pose2D) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        sqrt(dx * dx + dy * dy)
    }

    /// Returns `true` if every component is finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.theta.is_finite()
    }
}

impl fmt::Display for Pose2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(x: {:.2}, y: {:.2}, θ: {:.2} rad)", self.x, self.y, self.theta)
    }
}

/// A velocity command for a unicycle: forward speed and yaw rate in the robot
/// base frame.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Twist {
    /// Linear velocity along the robot's x-axis (m/s).
    pub v: f64,
    /// Angular velocity around the robot's z-axis (rad/s).
    pub omega: f64,
}

impl Twist {
    /// Construct a new twist.
    ///
    /// # Arguments
    ///
    /// * `v`: Linear velocity along the robot's x-axis (m/s).
    /// * `omega`: Angular velocity around the robot's z-axis (rad/s).
    pub const fn new(v: f64, omega: f64) -> Self {
        Twist { v, omega }
    }

    /// A twist commanding the robot to stand still.
    pub const fn zero() -> Self {
        Twist { v: 0.0, omega: 0.0 }
    }
}

impl fmt::Display for Twist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(v: {:.2} m/s, ω: {:.2} rad/s)", self.v, self.omega)
    }
}

/// Advance a unicycle pose by one forward Euler step.
///
/// The twist is assumed constant over `dt`. The heading of the returned pose is
/// wrapped into `(-PI, PI]`.
///
/// # Arguments
///
/// * `pose`: The robot's current pose.
/// * `twist`: The velocity command applied over the step.
/// * `dt`: The step length in seconds.
///
/// # Errors
///
/// Returns `Err(KinematicsError::NegativeTimeDelta)` if `dt` is negative.
/// Returns `Err(KinematicsError::NonFiniteTimeDelta)` if `dt` is `NaN` or infinite.
pub fn integrate(pose: Pose2D, twist: Twist, dt: f64) -> Result<Pose2D, KinematicsError> {
    if !dt.is_finite() {
        return Err(KinematicsError::NonFiniteTimeDelta("must be finite"));
    }
    if dt < 0.0 {
        return Err(KinematicsError::NegativeTimeDelta("must be non-negative"));
    }

    Ok(Pose2D {
        x: pose.x + twist.v * cos(pose.theta) * dt,
        y: pose.y + twist.v * sin(pose.theta) * dt,
        theta: wrap_to_pi(pose.theta + twist.omega * dt),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_wrap_to_pi_values() {
        assert_eq!(wrap_to_pi(0.0), 0.0);
        assert_eq!(wrap_to_pi(PI), PI); // PI is inside (-PI, PI]
        assert_eq!(wrap_to_pi(-PI), PI); // -PI is not
        assert!((wrap_to_pi(3.0 * PI) - PI).abs() < EPSILON);
        assert!((wrap_to_pi(-3.0 * PI) - PI).abs() < EPSILON);
        assert!((wrap_to_pi(2.5 * PI) - 0.5 * PI).abs() < EPSILON);
        assert!((wrap_to_pi(-2.5 * PI) - -0.5 * PI).abs() < EPSILON);
        assert!((wrap_to_pi(7.0) - (7.0 - TAU)).abs() < EPSILON);
        assert!((wrap_to_pi(-7.0) - (TAU - 7.0)).abs() < EPSILON);
        assert!((wrap_to_pi(TAU) - 0.0).abs() < EPSILON);
    }

    #[test]
    fn test_wrap_to_pi_range_and_idempotence() {
        let mut a = -50.0;
        while a < 50.0 {
            let w = wrap_to_pi(a);
            assert!(w > -PI && w <= PI, "wrap_to_pi({}) = {} out of range", a, w);
            assert_eq!(wrap_to_pi(w), w);
            // same direction on the unit circle
            assert!((cos(w) - cos(a)).abs() < 1e-9);
            assert!((sin(w) - sin(a)).abs() < 1e-9);
            a += 0.173;
        }
    }

    #[test]
    fn test_wrap_to_pi_non_finite() {
        assert!(wrap_to_pi(f64::NAN).is_nan());
        assert!(wrap_to_pi(f64::INFINITY).is_nan());
        assert!(wrap_to_pi(f64::NEG_INFINITY).is_nan());
    }

    #[test]
    fn test_distance_to() {
        let a = Pose2D::new(0.0, 0.0, 1.0);
        let b = Pose2D::new(3.0, 4.0, -2.0);
        assert!((a.distance_to(&b) - 5.0).abs() < EPSILON);
        assert!((b.distance_to(&a) - 5.0).abs() < EPSILON);
        assert_eq!(a.distance_to(&a), 0.0);
    }

    #[test]
    fn test_is_finite() {
        assert!(Pose2D::new(1.0, -2.0, 3.0).is_finite());
        assert!(!Pose2D::new(f64::NAN, 0.0, 0.0).is_finite());
        assert!(!Pose2D::new(0.0, f64::INFINITY, 0.0).is_finite());
        assert!(!Pose2D::new(0.0, 0.0, f64::NEG_INFINITY).is_finite());
    }

    #[test]
    fn test_integrate_straight_no_rotation() {
        let pose = Pose2D::new(0.0, 0.0, 0.0);
        let new_pose = integrate(pose, Twist::new(1.0, 0.0), 1.0).unwrap();
        assert!((new_pose.x - 1.0).abs() < EPSILON);
        assert!((new_pose.y - 0.0).abs() < EPSILON);
        assert!((new_pose.theta - 0.0).abs() < EPSILON);
    }

    #[test]
    fn test_integrate_straight_with_initial_rotation() {
        let pose = Pose2D::new(1.0, 1.0, PI / 2.0); // At (1,1), facing along Y-axis
        let new_pose = integrate(pose, Twist::new(1.0, 0.0), 2.0).unwrap();
        assert!((new_pose.x - 1.0).abs() < EPSILON);
        assert!((new_pose.y - 3.0).abs() < EPSILON);
        assert!((new_pose.theta - PI / 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_integrate_reverse() {
        let pose = Pose2D::new(0.0, 0.0, 0.0);
        let new_pose = integrate(pose, Twist::new(-0.5, 0.0), 2.0).unwrap();
        assert!((new_pose.x - (-1.0)).abs() < EPSILON);
        assert!((new_pose.y - 0.0).abs() < EPSILON);
    }

    #[test]
    fn test_integrate_heading_wraps() {
        let pose = Pose2D::new(0.0, 0.0, 3.0);
        // 3.0 + 0.5 = 3.5 rad, past PI
        let new_pose = integrate(pose, Twist::new(0.0, 0.5), 1.0).unwrap();
        assert!((new_pose.theta - (3.5 - TAU)).abs() < EPSILON);
        assert_eq!(new_pose.x, 0.0);
        assert_eq!(new_pose.y, 0.0);
    }

    #[test]
    fn test_integrate_combined_motion() {
        let pose = Pose2D::new(1.0, 2.0, PI / 4.0);
        let new_pose = integrate(pose, Twist::new(1.0, PI / 2.0), 0.5).unwrap();
        // Euler step moves along the initial heading, then turns
        let expected_x = 1.0 + (2.0_f64.sqrt() / 4.0);
        let expected_y = 2.0 + (2.0_f64.sqrt() / 4.0);
        assert!((new_pose.x - expected_x).abs() < EPSILON);
        assert!((new_pose.y - expected_y).abs() < EPSILON);
        assert!((new_pose.theta - PI / 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_integrate_zero_dt_is_identity() {
        let pose = Pose2D::new(1.0, -1.0, 0.3);
        assert_eq!(integrate(pose, Twist::new(3.0, 2.0), 0.0).unwrap(), pose);
    }

    #[test]
    fn test_integrate_negative_dt() {
        let result = integrate(Pose2D::default(), Twist::new(1.0, 0.0), -0.1);
        assert!(matches!(result, Err(KinematicsError::NegativeTimeDelta("must be non-negative"))));
    }

    #[test]
    fn test_integrate_non_finite_dt() {
        let result = integrate(Pose2D::default(), Twist::new(1.0, 0.0), f64::NAN);
        assert!(matches!(result, Err(KinematicsError::NonFiniteTimeDelta("must be finite"))));
        let result = integrate(Pose2D::default(), Twist::new(1.0, 0.0), f64::INFINITY);
        assert!(matches!(result, Err(KinematicsError::NonFiniteTimeDelta(_))));
    }
}
