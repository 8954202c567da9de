//! Simulated unicycle plant and the actuator that feeds it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::RwLock;
use spin_sleep::SpinSleeper;
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{error, info, warn};

use pose_kinematics::{Pose2D, Twist, integrate};

use crate::blackboard::{Blackboard, raise_fault, touch_cmd};
use crate::bus::Topic;

/// The twist the plant is currently executing.
pub type AppliedTwist = Arc<RwLock<Twist>>;

/// Integrate the applied twist every `dt_s` seconds and publish the pose.
pub fn spawn_plant(
    bb: Blackboard,
    applied: AppliedTwist,
    pose_topic: Topic<Pose2D>,
    initial_pose: Pose2D,
    dt_s: f64,
    shutdown: Arc<AtomicBool>,
) -> std::io::Result<JoinHandle<()>> {
    info!("Spawning plant thread...");
    std::thread::Builder::new().name("plant".into()).spawn(move || {
        info!(%initial_pose, dt_s, topic = pose_topic.name(), "Plant thread started.");
        let sleeper = SpinSleeper::new(10_000);
        let period = Duration::from_secs_f64(dt_s);
        let mut pose = initial_pose;

        while !shutdown.load(Ordering::Relaxed) {
            let twist = *applied.read();
            pose = match step(pose, twist, dt_s) {
                Some(p) => p,
                None => {
                    raise_fault(&bb, "plant integration failed");
                    break;
                }
            };
            pose_topic.publish(pose);
            bb.write().pose = pose;
            sleeper.sleep(period);
        }
        info!(%pose, "Plant thread stopped.");
    })
}

fn step(pose: Pose2D, twist: Twist, dt_s: f64) -> Option<Pose2D> {
    match integrate(pose, twist, dt_s) {
        Ok(p) => Some(p),
        Err(e) => {
            error!(%e, "Plant integration failed");
            None
        }
    }
}

/// Forward commands from `cmd_vel` to the plant and stamp the blackboard.
pub fn spawn_actuator(
    bb: Blackboard,
    applied: AppliedTwist,
    cmd_vel: &Topic<Twist>,
    shutdown: Arc<AtomicBool>,
) -> std::io::Result<JoinHandle<()>> {
    info!("Spawning actuator thread...");
    let mut twist_rx = cmd_vel.subscribe();
    let topic = cmd_vel.name();
    std::thread::Builder::new().name("actuator".into()).spawn(move || {
        info!(topic, "Actuator thread started.");
        let sleeper = SpinSleeper::new(1_000);

        while !shutdown.load(Ordering::Relaxed) {
            match twist_rx.try_recv() {
                Ok(twist) => {
                    *applied.write() = *twist;
                    touch_cmd(&bb);
                }
                Err(TryRecvError::Lagged(n)) => warn!(skipped = n, "Actuator fell behind cmd_vel"),
                Err(TryRecvError::Closed) => break,
                Err(TryRecvError::Empty) => {}
            }
            sleeper.sleep(Duration::from_micros(1_000));
        }
        // leave the plant stationary
        *applied.write() = Twist::zero();
        info!("Actuator thread stopped.");
    })
}

/// Stop the plant. Used by the watchdog when commands go stale.
pub fn trigger_estop(applied: &AppliedTwist) {
    *applied.write() = Twist::zero();
}
