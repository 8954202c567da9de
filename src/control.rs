use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info};

use pose_control::{ControllerError, ControllerState, GoalPose, GoalTolerance, PoseController};
use pose_kinematics::{Pose2D, Twist};

use crate::blackboard::{Blackboard, raise_fault};
use crate::bus::Topic;
use crate::goal_queue::GoalQueue;
use crate::telemetry::Telemetry;

/// Goal updates from a planner or operator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GoalCommand {
    /// Replace the active goal immediately.
    Replace(GoalPose),
    /// Visit after the goals already queued.
    Enqueue(GoalPose),
    /// Drop the active goal and everything queued.
    Clear,
}

/// Sole owner of the controller. Goal updates and control ticks run on the
/// same task, so a tick never sees a half-applied goal.
pub struct ControlTask {
    bb: Blackboard,
    controller: PoseController,
    goals: GoalQueue,
    tolerance: Option<GoalTolerance>,
    cmd_vel: Topic<Twist>,
    telemetry: Telemetry,
    idle_logged: bool,
}

impl ControlTask {
    pub fn new(
        bb: Blackboard,
        controller: PoseController,
        goals: GoalQueue,
        tolerance: Option<GoalTolerance>,
        cmd_vel: Topic<Twist>,
        telemetry: Telemetry,
    ) -> Self {
        Self {
            bb,
            controller,
            goals,
            tolerance,
            cmd_vel,
            telemetry,
            idle_logged: false,
        }
    }

    pub async fn run(
        mut self,
        period: Duration,
        pose_rx: &mut broadcast::Receiver<Arc<Pose2D>>,
        goal_rx: &mut mpsc::Receiver<GoalCommand>,
        shutdown: Arc<AtomicBool>,
    ) -> anyhow::Result<()> {
        info!(period_ms = period.as_millis() as u64, queued = self.goals.len(), "Control task started.");
        let epoch = Instant::now();
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut current_pose: Option<Arc<Pose2D>> = None;

        while !shutdown.load(Ordering::Relaxed) {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick(current_pose.as_deref(), epoch.elapsed().as_secs_f64());
                }
                Ok(new_pose) = pose_rx.recv() => {
                    current_pose = Some(new_pose);
                }
                Some(cmd) = goal_rx.recv() => {
                    self.apply(cmd);
                }
            }
        }

        info!("Control task stopped.");
        Ok(())
    }

    pub fn apply(&mut self, cmd: GoalCommand) {
        match cmd {
            GoalCommand::Replace(goal) => self.load(goal),
            GoalCommand::Enqueue(goal) => {
                self.goals.push(goal);
                info!(queued = self.goals.len(), "Goal queued: {}", goal);
            }
            GoalCommand::Clear => {
                self.controller.clear_goal();
                self.goals.clear();
                self.bb.write().goal = None;
                info!("Goals cleared");
            }
        }
    }

    /// Run one control step at host time `t` and publish the command.
    ///
    /// Returns the published twist, or `None` when no pose has arrived yet.
    pub fn tick(&mut self, pose: Option<&Pose2D>, t: f64) -> Option<Twist> {
        if self.controller.state() == ControllerState::Unconfigured {
            if let Some(goal) = self.goals.next_goal() {
                self.load(goal);
            }
        }

        let pose = *pose?;
        let mut sink = self.telemetry.sink(t);
        let result = self.controller.compute_control_with(pose, &mut sink);
        let sample = sink.last();

        let twist = match result {
            Ok(out) => {
                self.idle_logged = false;
                if let Some(s) = sample {
                    debug!(t, v = out.v, om = out.om, alpha = s.alpha, delta = s.delta, rho = s.rho, "Computed control");
                }
                match (self.tolerance, sample) {
                    (Some(tol), Some(s)) if s.within(&tol) => {
                        self.goal_reached(t);
                        Twist::zero()
                    }
                    _ => Twist::from(out),
                }
            }
            Err(ControllerError::GoalNotSet) => {
                if !self.idle_logged {
                    info!("No goal loaded, holding position");
                    self.idle_logged = true;
                }
                Twist::zero()
            }
            Err(e) => {
                error!(%e, x = pose.x, y = pose.y, th = pose.theta, "Control computation failed, commanding stop");
                raise_fault(&self.bb, &e.to_string());
                Twist::zero()
            }
        };

        self.cmd_vel.publish(twist);
        {
            let mut state = self.bb.write();
            state.twist = twist;
            if sample.is_some() {
                state.diagnostics = sample;
            }
        }
        Some(twist)
    }

    fn load(&mut self, goal: GoalPose) {
        self.controller.load_goal(goal);
        self.bb.write().goal = Some(goal);
        self.idle_logged = false;
        info!("Goal loaded: {}", goal);
    }

    fn goal_reached(&mut self, t: f64) {
        let goal = self.controller.goal();
        self.controller.clear_goal();
        let reached = {
            let mut state = self.bb.write();
            state.goal = None;
            state.goals_reached += 1;
            state.goals_reached
        };
        info!(t, reached, remaining = self.goals.len(), "Goal reached: {:?}", goal);
        if self.goals.is_empty() {
            info!("Goal queue empty");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blackboard::snapshot;

    fn task(goals: Vec<GoalPose>, tolerance: Option<GoalTolerance>) -> (ControlTask, Blackboard) {
        let bb: Blackboard = Arc::default();
        let controller = PoseController::from_gains(0.4, 0.8, 0.8).unwrap();
        let task = ControlTask::new(
            bb.clone(),
            controller,
            GoalQueue::from_goals(goals),
            tolerance,
            Topic::new("/cmd_vel", 8),
            Telemetry::new(8),
        );
        (task, bb)
    }

    #[test]
    fn test_no_pose_publishes_nothing() {
        let (mut task, _) = task(vec![GoalPose::new(1.0, 1.0, 0.0)], None);
        let mut cmd_rx = task.cmd_vel.subscribe();
        assert_eq!(task.tick(None, 0.0), None);
        assert!(cmd_rx.try_recv().is_err());
        // the queued goal is still picked up
        assert_eq!(task.controller.goal(), Some(GoalPose::new(1.0, 1.0, 0.0)));
    }

    #[test]
    fn test_tick_publishes_command_and_telemetry() {
        let (mut task, bb) = task(vec![GoalPose::new(1.0, 1.0, 0.0)], None);
        let mut cmd_rx = task.cmd_vel.subscribe();
        let mut rho_rx = task.telemetry.rho.subscribe();
        let mut alpha_rx = task.telemetry.alpha.subscribe();

        let twist = task.tick(Some(&Pose2D::new(0.0, 0.0, 0.0)), 0.25).unwrap();
        assert!((twist.v - 0.4).abs() < 1e-4);
        assert!((twist.omega - 0.729485).abs() < 1e-4);
        assert_eq!(*cmd_rx.try_recv().unwrap(), twist);

        let rho = rho_rx.try_recv().unwrap();
        assert_eq!(rho.t, 0.25);
        assert!((rho.value - 2.0_f64.sqrt()).abs() < 1e-9);
        assert!((alpha_rx.try_recv().unwrap().value - std::f64::consts::FRAC_PI_4).abs() < 1e-9);

        let state = snapshot(&bb);
        assert_eq!(state.twist, twist);
        assert_eq!(state.goal, Some(GoalPose::new(1.0, 1.0, 0.0)));
        assert!(state.diagnostics.is_some());
    }

    #[test]
    fn test_idle_without_goal_commands_stop() {
        let (mut task, bb) = task(vec![], None);
        let twist = task.tick(Some(&Pose2D::new(0.0, 0.0, 0.0)), 0.0).unwrap();
        assert_eq!(twist, Twist::zero());
        assert!(snapshot(&bb).faults.is_empty());
    }

    #[test]
    fn test_goal_reached_advances_queue() {
        let goals = vec![GoalPose::new(1.0, 1.0, 0.0), GoalPose::new(2.0, 0.0, 0.0)];
        let (mut task, bb) = task(goals, Some(GoalTolerance::default()));

        let twist = task.tick(Some(&Pose2D::new(1.0, 1.0, 0.0)), 1.0).unwrap();
        assert_eq!(twist, Twist::zero());
        assert_eq!(task.controller.state(), ControllerState::Unconfigured);
        assert_eq!(snapshot(&bb).goals_reached, 1);

        // the next tick loads the second goal and drives towards it
        let twist = task.tick(Some(&Pose2D::new(1.0, 1.0, 0.0)), 1.05).unwrap();
        assert_eq!(task.controller.goal(), Some(GoalPose::new(2.0, 0.0, 0.0)));
        assert!(twist != Twist::zero());
    }

    #[test]
    fn test_without_tolerance_goal_is_held() {
        let (mut task, bb) = task(vec![GoalPose::new(1.0, 1.0, 0.0)], None);
        task.tick(Some(&Pose2D::new(1.0, 1.0, 0.0)), 1.0).unwrap();
        assert_eq!(task.controller.state(), ControllerState::Ready);
        assert_eq!(snapshot(&bb).goals_reached, 0);
    }

    #[test]
    fn test_non_finite_pose_stops_and_faults() {
        let (mut task, bb) = task(vec![GoalPose::new(1.0, 1.0, 0.0)], None);
        let mut rho_rx = task.telemetry.rho.subscribe();
        let twist = task.tick(Some(&Pose2D::new(f64::NAN, 0.0, 0.0)), 0.0).unwrap();
        assert_eq!(twist, Twist::zero());
        assert!(rho_rx.try_recv().is_err());
        assert_eq!(snapshot(&bb).faults, vec!["Non-finite input: pose".to_string()]);
    }

    #[test]
    fn test_goal_commands() {
        let (mut task, bb) = task(vec![GoalPose::new(1.0, 1.0, 0.0)], None);

        task.apply(GoalCommand::Replace(GoalPose::new(5.0, 5.0, 1.0)));
        assert_eq!(task.controller.goal(), Some(GoalPose::new(5.0, 5.0, 1.0)));
        assert_eq!(snapshot(&bb).goal, Some(GoalPose::new(5.0, 5.0, 1.0)));

        task.apply(GoalCommand::Enqueue(GoalPose::new(6.0, 6.0, 0.0)));
        assert_eq!(task.goals.len(), 2);

        task.apply(GoalCommand::Clear);
        assert_eq!(task.controller.state(), ControllerState::Unconfigured);
        assert!(task.goals.is_empty());
        assert_eq!(snapshot(&bb).goal, None);
    }

    #[tokio::test]
    async fn test_run_applies_goal_and_stops_on_shutdown() {
        let (task, bb) = task(vec![], None);
        let cmd_vel = task.cmd_vel.clone();
        let mut cmd_rx = cmd_vel.subscribe();
        let pose_topic: Topic<Pose2D> = Topic::new("/pose", 4);
        let mut pose_rx = pose_topic.subscribe();
        let (goal_tx, mut goal_rx) = mpsc::channel(4);
        let shutdown = Arc::new(AtomicBool::new(false));

        let handle = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                task.run(Duration::from_millis(5), &mut pose_rx, &mut goal_rx, shutdown).await
            })
        };

        goal_tx.send(GoalCommand::Replace(GoalPose::new(10.0, 0.0, 0.0))).await.unwrap();
        pose_topic.publish(Pose2D::new(0.0, 0.0, 0.0));

        // wait for a command computed against the new goal
        let mut saturated = false;
        for _ in 0..200 {
            match cmd_rx.recv().await {
                Ok(twist) if twist.v == 0.5 => {
                    saturated = true;
                    break;
                }
                _ => {}
            }
        }
        assert!(saturated);
        assert_eq!(snapshot(&bb).goal, Some(GoalPose::new(10.0, 0.0, 0.0)));

        shutdown.store(true, Ordering::Relaxed);
        handle.await.unwrap().unwrap();
    }
}
