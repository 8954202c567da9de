//! Operator goal input on stdin.
//!
//! One command per line:
//! - `x y theta`: replace the active goal
//! - `+ x y theta`: queue a goal
//! - `clear`: drop every goal

use std::io::BufRead;
use std::thread::JoinHandle;

use tokio::sync::mpsc;
use tracing::{info, warn};

use pose_control::GoalPose;

use crate::control::GoalCommand;

pub fn parse_goal_command(line: &str) -> Option<GoalCommand> {
    let line = line.trim();
    if line.eq_ignore_ascii_case("clear") {
        return Some(GoalCommand::Clear);
    }

    let (enqueue, rest) = match line.strip_prefix('+') {
        Some(rest) => (true, rest),
        None => (false, line),
    };

    let values: Vec<f64> = rest
        .split_whitespace()
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    let [x, y, theta] = values[..] else {
        return None;
    };

    let goal = GoalPose::new(x, y, theta);
    Some(if enqueue { GoalCommand::Enqueue(goal) } else { GoalCommand::Replace(goal) })
}

/// Read commands from stdin until EOF or until the control task goes away.
pub fn spawn_operator_input(goal_tx: mpsc::Sender<GoalCommand>) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new().name("operator".into()).spawn(move || {
        info!("Operator input ready: `x y theta`, `+ x y theta` or `clear`");
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match parse_goal_command(&line) {
                Some(cmd) => {
                    if goal_tx.blocking_send(cmd).is_err() {
                        break;
                    }
                }
                None => warn!(input = %line.trim(), "Unrecognised goal command"),
            }
        }
    })
}
