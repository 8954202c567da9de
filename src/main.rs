mod blackboard; // shared robot state snapshot
mod bus; // named broadcast topics
mod control; // the control task owning the PoseController
mod goal_queue;
mod operator;
mod settings;
mod sim; // simulated plant and actuator threads
mod telemetry;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Context, anyhow};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use pose_kinematics::{Pose2D, Twist};

use blackboard::{Blackboard, clear_fault, raise_fault, snapshot};
use bus::Topic;
use control::ControlTask;
use goal_queue::GoalQueue;
use settings::{DEFAULT_CONFIG_PATH, load_settings};
use sim::AppliedTwist;
use telemetry::Telemetry;

const POSE_TOPIC: &str = "/pose";
const CMD_VEL_TOPIC: &str = "/cmd_vel";
const CMD_TIMEOUT_FAULT: &str = "cmd_vel timeout";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let settings = load_settings(&config_path).with_context(|| format!("loading settings from {}", config_path))?;
    let controller = settings.controller.build().context("building pose controller")?;

    info!(
        k1 = controller.gains().k1(),
        k2 = controller.gains().k2(),
        k3 = controller.gains().k3(),
        v_max = controller.limits().v_max(),
        om_max = controller.limits().om_max(),
        goals = settings.goals.len(),
        "Pose stabilizer started."
    );

    let bb: Blackboard = Arc::default();
    let shutdown = Arc::new(AtomicBool::new(false));
    let applied: AppliedTwist = Arc::default();

    let pose_topic: Topic<Pose2D> = Topic::new(POSE_TOPIC, 16);
    let cmd_vel: Topic<Twist> = Topic::new(CMD_VEL_TOPIC, 4);
    let telemetry = Telemetry::new(16);
    let mut pose_rx = pose_topic.subscribe();
    let (goal_tx, mut goal_rx) = mpsc::channel(8);

    let actuator = sim::spawn_actuator(bb.clone(), applied.clone(), &cmd_vel, shutdown.clone())?;
    let plant = sim::spawn_plant(
        bb.clone(),
        applied.clone(),
        pose_topic,
        settings.sim.initial_pose,
        settings.sim.dt_s,
        shutdown.clone(),
    )?;
    // not joined: blocks on stdin until EOF
    operator::spawn_operator_input(goal_tx)?;

    let task = ControlTask::new(
        bb.clone(),
        controller,
        GoalQueue::from_goals(settings.goals.iter().copied()),
        settings.goal_tolerance,
        cmd_vel,
        telemetry,
    );
    let period = Duration::from_secs_f64(1.0 / settings.timing.control_rate_hz);
    let timeout = Duration::from_millis(settings.timing.watchdog_timeout_ms);

    tokio::select! {
        res = async {
            tokio::try_join!(
                task.run(period, &mut pose_rx, &mut goal_rx, shutdown.clone()),
                watchdog(bb.clone(), applied.clone(), timeout, shutdown.clone()),
            )
        } => {
            if let Err(e) = res {
                error!("Control loop failed: {:?}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => info!("Ctrl-C received, shutting down."),
        _ = run_limit(settings.timing.run_for_s) => info!("Run duration elapsed, shutting down."),
    }

    shutdown.store(true, Ordering::Relaxed);
    actuator.join().map_err(|_| anyhow!("actuator thread panicked"))?;
    plant.join().map_err(|_| anyhow!("plant thread panicked"))?;

    let state = snapshot(&bb);
    info!(
        final_pose = %state.pose,
        goals_reached = state.goals_reached,
        faults = ?state.faults,
        "Pose stabilizer stopped."
    );
    Ok(())
}

async fn run_limit(run_for_s: Option<f64>) {
    match run_for_s {
        Some(secs) => tokio::time::sleep(Duration::from_secs_f64(secs)).await,
        None => std::future::pending().await,
    }
}

/// Stop the plant when the actuator has not seen a command for `timeout`.
async fn watchdog(
    bb: Blackboard,
    applied: AppliedTwist,
    timeout: Duration,
    shutdown: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    info!(timeout_ms = timeout.as_millis() as u64, "Watchdog task started.");
    let mut tick = tokio::time::interval(timeout / 4);
    let mut tripped = false;

    while !shutdown.load(Ordering::Relaxed) {
        tick.tick().await;
        let last_cmd_ts = snapshot(&bb).last_cmd_ts;
        let age = Instant::now() - last_cmd_ts;
        if age > timeout {
            if !tripped {
                warn!(?age, "Command velocity timeout! Triggering E-stop.");
                tripped = true;
            }
            sim::trigger_estop(&applied);
            raise_fault(&bb, CMD_TIMEOUT_FAULT);
        } else if tripped {
            info!("Command velocity restored.");
            clear_fault(&bb, CMD_TIMEOUT_FAULT);
            tripped = false;
        }
    }
    Ok(())
}
