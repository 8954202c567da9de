//! Per-computation error terms and the sink they are handed to.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The intermediate error terms of one control computation.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DiagnosticSample {
    /// Bearing error: angle from the robot heading to the line of sight to the goal (rad).
    pub alpha: f64,
    /// Goal heading error expressed through the line-of-sight frame (rad).
    pub delta: f64,
    /// Distance to the goal (m).
    pub rho: f64,
}

impl DiagnosticSample {
    /// Returns `true` when all three terms are inside the tolerance band.
    pub fn within(&self, tolerance: &GoalTolerance) -> bool {
        self.rho < tolerance.rho && self.alpha.abs() < tolerance.alpha && self.delta.abs() < tolerance.delta
    }
}

/// Thresholds under which a host may treat the goal as reached.
///
/// The controller never consults this itself; its output is the raw saturated
/// law all the way to the goal.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalTolerance {
    /// Distance threshold (m).
    pub rho: f64,
    /// Bearing error threshold (rad).
    pub alpha: f64,
    /// Heading error threshold (rad).
    pub delta: f64,
}

impl Default for GoalTolerance {
    fn default() -> Self {
        GoalTolerance {
            rho: 0.05,
            alpha: 0.1,
            delta: 0.1,
        }
    }
}

/// Receives the diagnostic sample of every control computation.
///
/// Closures taking a [`DiagnosticSample`] implement this trait, so a host can
/// pass `&mut |s: DiagnosticSample| ...` directly.
pub trait DiagnosticSink {
    /// Record one sample. Called once per computation, before the output is returned.
    fn record(&mut self, sample: DiagnosticSample);
}

impl<F> DiagnosticSink for F
where
    F: FnMut(DiagnosticSample),
{
    fn record(&mut self, sample: DiagnosticSample) {
        self(sample)
    }
}

/// A sink that discards every sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&mut self, _sample: DiagnosticSample) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_within_default_tolerance() {
        let tol = GoalTolerance::default();
        assert!(DiagnosticSample { alpha: 0.05, delta: -0.05, rho: 0.01 }.within(&tol));
        assert!(!DiagnosticSample { alpha: 0.05, delta: -0.05, rho: 0.05 }.within(&tol));
        assert!(!DiagnosticSample { alpha: -0.2, delta: 0.0, rho: 0.0 }.within(&tol));
        assert!(!DiagnosticSample { alpha: 0.0, delta: 0.11, rho: 0.0 }.within(&tol));
    }

    #[test]
    fn test_within_rejects_nan() {
        let tol = GoalTolerance::default();
        assert!(!DiagnosticSample { alpha: f64::NAN, delta: 0.0, rho: 0.0 }.within(&tol));
    }

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        let mut sink = |s: DiagnosticSample| seen.push(s);
        sink.record(DiagnosticSample { alpha: 1.0, delta: 2.0, rho: 3.0 });
        sink.record(DiagnosticSample::default());
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].rho, 3.0);
    }
}
