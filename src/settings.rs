use config::{Config, ConfigError, Environment, File, FileFormat};
use pose_control::{
    ControllerError, DEFAULT_OM_MAX, DEFAULT_V_MAX, GainParams, GoalPose, GoalTolerance, Limits, PoseController,
};
use pose_kinematics::Pose2D;
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Environment overrides look like `POSE__CONTROLLER__K1=0.5`.
const ENV_PREFIX: &str = "POSE";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("invalid controller parameters: {0}")]
    Controller(#[from] ControllerError),

    #[error("invalid timing parameters: {0}")]
    Timing(&'static str),

    #[error("invalid simulation parameters: {0}")]
    Sim(&'static str),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub controller: ControllerSettings,

    /// When set, a goal counts as reached once alpha, delta and rho are all
    /// inside the band, and the next queued goal is loaded.
    #[serde(default)]
    pub goal_tolerance: Option<GoalTolerance>,

    /// Goals visited in order.
    #[serde(default)]
    pub goals: Vec<GoalPose>,

    #[serde(default)]
    pub sim: SimSettings,

    #[serde(default)]
    pub timing: TimingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ControllerSettings {
    pub k1: f64,
    pub k2: f64,
    pub k3: f64,
    #[serde(default = "default_v_max")]
    pub v_max: f64,
    #[serde(default = "default_om_max")]
    pub om_max: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    pub initial_pose: Pose2D,
    /// Plant integration step (s).
    pub dt_s: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    pub control_rate_hz: f64,
    pub watchdog_timeout_ms: u64,
    /// Stop after this many seconds. Runs until Ctrl-C when absent.
    pub run_for_s: Option<f64>,
}

fn default_v_max() -> f64 {
    DEFAULT_V_MAX
}

fn default_om_max() -> f64 {
    DEFAULT_OM_MAX
}

impl Default for SimSettings {
    fn default() -> Self {
        SimSettings {
            initial_pose: Pose2D::default(),
            dt_s: 0.01,
        }
    }
}

impl Default for TimingSettings {
    fn default() -> Self {
        TimingSettings {
            control_rate_hz: 20.0,
            watchdog_timeout_ms: 200,
            run_for_s: None,
        }
    }
}

impl ControllerSettings {
    pub fn build(&self) -> Result<PoseController, ControllerError> {
        let gains = GainParams::new(self.k1, self.k2, self.k3)?;
        let limits = Limits::new(self.v_max, self.om_max)?;
        PoseController::new(gains, limits)
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.controller.build()?;

        if !(self.timing.control_rate_hz > 0.0 && self.timing.control_rate_hz.is_finite()) {
            return Err(SettingsError::Timing("control_rate_hz must be positive and finite"));
        }
        if self.timing.watchdog_timeout_ms == 0 {
            return Err(SettingsError::Timing("watchdog_timeout_ms must be non-zero"));
        }
        if let Some(run_for) = self.timing.run_for_s {
            if !(run_for > 0.0 && run_for.is_finite()) {
                return Err(SettingsError::Timing("run_for_s must be positive and finite"));
            }
        }
        if !(self.sim.dt_s > 0.0 && self.sim.dt_s.is_finite()) {
            return Err(SettingsError::Sim("dt_s must be positive and finite"));
        }
        if !self.sim.initial_pose.is_finite() {
            return Err(SettingsError::Sim("initial_pose must be finite"));
        }
        Ok(())
    }
}

/// Load settings from a TOML file, layered with `POSE__`-prefixed environment
/// variables, and validate them.
pub fn load_settings(path: &str) -> Result<Settings, SettingsError> {
    info!("Attempting to load configuration from {}", path);

    let built = Config::builder()
        .add_source(File::new(path, FileFormat::Toml).required(true))
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__").try_parsing(true))
        .build();

    match built.and_then(|c| c.try_deserialize::<Settings>()) {
        Ok(settings) => {
            settings.validate()?;
            info!("Successfully loaded configuration: {:?}", settings);
            Ok(settings)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            Err(e.into())
        }
    }
}
