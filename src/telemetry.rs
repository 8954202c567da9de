//! Controller telemetry: one scalar topic per error term.

use pose_control::{DiagnosticSample, DiagnosticSink};

use crate::bus::Topic;

pub const ALPHA_TOPIC: &str = "/controller/alpha";
pub const DELTA_TOPIC: &str = "/controller/delta";
pub const RHO_TOPIC: &str = "/controller/rho";

/// A value tagged with the host time (s since the control task started).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stamped<T> {
    pub t: f64,
    pub value: T,
}

#[derive(Debug, Clone)]
pub struct Telemetry {
    pub alpha: Topic<Stamped<f64>>,
    pub delta: Topic<Stamped<f64>>,
    pub rho: Topic<Stamped<f64>>,
}

impl Telemetry {
    pub fn new(capacity: usize) -> Self {
        Telemetry {
            alpha: Topic::new(ALPHA_TOPIC, capacity),
            delta: Topic::new(DELTA_TOPIC, capacity),
            rho: Topic::new(RHO_TOPIC, capacity),
        }
    }

    /// A sink that stamps samples with `t` and publishes them here.
    pub fn sink(&self, t: f64) -> TelemetrySink<'_> {
        TelemetrySink {
            telemetry: self,
            t,
            last: None,
        }
    }
}

pub struct TelemetrySink<'a> {
    telemetry: &'a Telemetry,
    t: f64,
    last: Option<DiagnosticSample>,
}

impl TelemetrySink<'_> {
    /// The sample recorded during this tick, if the computation got that far.
    pub fn last(&self) -> Option<DiagnosticSample> {
        self.last
    }
}

impl DiagnosticSink for TelemetrySink<'_> {
    fn record(&mut self, sample: DiagnosticSample) {
        let t = self.t;
        self.telemetry.alpha.publish(Stamped { t, value: sample.alpha });
        self.telemetry.delta.publish(Stamped { t, value: sample.delta });
        self.telemetry.rho.publish(Stamped { t, value: sample.rho });
        self.last = Some(sample);
    }
}
