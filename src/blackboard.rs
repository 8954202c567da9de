use parking_lot::RwLock;
use std::{sync::Arc, time::Instant};

use pose_control::{DiagnosticSample, GoalPose};
use pose_kinematics::{Pose2D, Twist};

#[derive(Debug, Clone)]
pub struct State {
    pub pose: Pose2D,
    /// Last command published by the control task.
    pub twist: Twist,
    pub diagnostics: Option<DiagnosticSample>,
    pub goal: Option<GoalPose>,
    pub goals_reached: usize,
    pub last_cmd_ts: Instant,
    pub faults: Vec<String>,
}

impl Default for State {
    fn default() -> Self {
        State {
            pose: Pose2D::default(),
            twist: Twist::zero(),
            diagnostics: None,
            goal: None,
            goals_reached: 0,
            last_cmd_ts: Instant::now(),
            faults: Vec::new(),
        }
    }
}

pub type Blackboard = Arc<RwLock<State>>;

pub fn snapshot(bb: &Blackboard) -> State {
    (*bb.read()).clone()
}

pub fn touch_cmd(bb: &Blackboard) {
    bb.write().last_cmd_ts = Instant::now();
}

pub fn raise_fault(bb: &Blackboard, msg: &str) {
    let mut g = bb.write();
    if !g.faults.iter().any(|s| s == msg) {
        g.faults.push(msg.to_string());
    }
}

pub fn clear_fault(bb: &Blackboard, msg: &str) {
    bb.write().faults.retain(|s| s != msg);
}
