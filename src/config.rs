//! Engine configuration: data locations, worker count, scoring reference scales.
//! Defaults are usable as-is; `from_env` overlays `EVA_FITTING_*` variables.

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::data::activity::DEFAULT_ACTIVITY_PROFILES_PATH;
use crate::data::snapshot::DEFAULT_STATIC_DATA_PATH;
use crate::dogma::stats::ApplicationTarget;
use crate::error::{FittingError, FittingResult};

pub const ENV_STATIC_DATA: &str = "EVA_FITTING_STATIC_DATA";
pub const ENV_ACTIVITY_PROFILES: &str = "EVA_FITTING_ACTIVITY_PROFILES";
pub const ENV_WORKERS: &str = "EVA_FITTING_WORKERS";

/// Skill points trained per minute with no attribute remap or implants.
pub const DEFAULT_SP_PER_MINUTE: f64 = 30.0;

/// Raw values that map to a score of 100 (or 0 for "lower is better" scales).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceScales {
    pub dps: f64,
    pub effective_hp: f64,
    /// Seconds of holding against the threat DPS that count as a full tank score.
    pub tank_duration_s: f64,
    pub velocity: f64,
    /// Align time scoring zero.
    pub align_time_s: f64,
    /// Capacitor lasting this long under load scores 100.
    pub capacitor_duration_s: f64,
    /// Total fitting cost scoring zero.
    pub cost_isk: f64,
    pub lock_range: f64,
    pub locked_targets: f64,
    pub drone_bandwidth: f64,
}

impl Default for ReferenceScales {
    fn default() -> Self {
        Self {
            dps: 800.0,
            effective_hp: 50_000.0,
            tank_duration_s: 300.0,
            velocity: 2_500.0,
            align_time_s: 15.0,
            capacitor_duration_s: 300.0,
            cost_isk: 250_000_000.0,
            lock_range: 80_000.0,
            locked_targets: 7.0,
            drone_bandwidth: 50.0,
        }
    }
}

impl ReferenceScales {
    fn entries(&self) -> [(&'static str, f64); 10] {
        [
            ("dps", self.dps),
            ("effective_hp", self.effective_hp),
            ("tank_duration_s", self.tank_duration_s),
            ("velocity", self.velocity),
            ("align_time_s", self.align_time_s),
            ("capacitor_duration_s", self.capacitor_duration_s),
            ("cost_isk", self.cost_isk),
            ("lock_range", self.lock_range),
            ("locked_targets", self.locked_targets),
            ("drone_bandwidth", self.drone_bandwidth),
        ]
    }
}

/// Price assumptions when the provider has no market price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceFallbacks {
    pub hull_isk: f64,
    pub module_isk: f64,
}

impl Default for PriceFallbacks {
    fn default() -> Self {
        Self {
            hull_isk: 20_000_000.0,
            module_isk: 1_500_000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub static_data_path: PathBuf,
    /// None means the built-in profiles.
    pub activity_profiles_path: Option<PathBuf>,
    /// Batch worker threads; 0 uses the global rayon pool.
    pub workers: usize,
    pub sp_per_minute: f64,
    pub reference_scales: ReferenceScales,
    pub price_fallbacks: PriceFallbacks,
    pub application_target: ApplicationTarget,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            static_data_path: PathBuf::from(DEFAULT_STATIC_DATA_PATH),
            activity_profiles_path: None,
            workers: 0,
            sp_per_minute: DEFAULT_SP_PER_MINUTE,
            reference_scales: ReferenceScales::default(),
            price_fallbacks: PriceFallbacks::default(),
            application_target: ApplicationTarget::default(),
        }
    }
}

impl EngineConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> FittingResult<Self> {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    /// Overlay `EVA_FITTING_*` values returned by `lookup`, then validate.
    pub fn with_overrides<F>(mut self, lookup: F) -> FittingResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_STATIC_DATA).filter(|v| !v.trim().is_empty()) {
            self.static_data_path = PathBuf::from(path);
        }
        if let Some(path) = lookup(ENV_ACTIVITY_PROFILES).filter(|v| !v.trim().is_empty()) {
            self.activity_profiles_path = Some(PathBuf::from(path));
        }
        if let Some(raw) = lookup(ENV_WORKERS) {
            self.workers = raw.trim().parse().map_err(|_| {
                FittingError::Configuration(format!("{ENV_WORKERS} must be a non-negative integer, got '{raw}'"))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> FittingResult<()> {
        if !(self.sp_per_minute.is_finite() && self.sp_per_minute > 0.0) {
            return Err(FittingError::Configuration(format!(
                "sp_per_minute must be positive, got {}",
                self.sp_per_minute
            )));
        }
        for (name, value) in self.reference_scales.entries() {
            if !(value.is_finite() && value > 0.0) {
                return Err(FittingError::Configuration(format!(
                    "reference scale '{name}' must be positive, got {value}"
                )));
            }
        }
        let fallbacks = self.price_fallbacks;
        if [fallbacks.hull_isk, fallbacks.module_isk]
            .iter()
            .any(|price| !price.is_finite() || *price < 0.0)
        {
            return Err(FittingError::Configuration(
                "price fallbacks must be non-negative".into(),
            ));
        }
        Ok(())
    }

    /// Activity profiles path to load, falling back to the conventional location when it exists.
    pub fn resolved_activity_profiles_path(&self) -> Option<PathBuf> {
        self.activity_profiles_path.clone().or_else(|| {
            let default = PathBuf::from(DEFAULT_ACTIVITY_PROFILES_PATH);
            default.exists().then_some(default)
        })
    }
}
