//! Activity profiles: per-activity weighting vectors, threat assumptions and required skills.
//! The registry is immutable once built; reloading produces a new registry.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dogma::attributes::SkillId;
use crate::dogma::stats::ApplicationTarget;
use crate::error::{FittingError, FittingResult};

pub const DEFAULT_ACTIVITY_PROFILES_PATH: &str = "data/activity_profiles.yaml";

const BUILTIN_PROFILES: &str = include_str!("../../data/activity_profiles.yaml");

/// Relative importance of each scoring dimension. Weights are non-negative and need not sum to 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityWeights {
    #[serde(default)]
    pub dps: f64,
    #[serde(default)]
    pub tank: f64,
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub range: f64,
    #[serde(default)]
    pub tracking: f64,
    #[serde(default)]
    pub capacitor: f64,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub skill_accessibility: f64,
}

impl ActivityWeights {
    pub fn entries(&self) -> [(&'static str, f64); 8] {
        [
            ("dps", self.dps),
            ("tank", self.tank),
            ("speed", self.speed),
            ("range", self.range),
            ("tracking", self.tracking),
            ("capacitor", self.capacitor),
            ("cost", self.cost),
            ("skill_accessibility", self.skill_accessibility),
        ]
    }

    pub fn total(&self) -> f64 {
        self.entries().iter().map(|(_, weight)| weight).sum()
    }

    /// Every weight finite and non-negative, and at least one positive.
    pub fn validate(&self, context: &str) -> Result<(), String> {
        for (name, weight) in self.entries() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(format!("{context}: weight '{name}' must be a finite non-negative number, got {weight}"));
            }
        }
        if self.total() <= 0.0 {
            return Err(format!("{context}: at least one weight must be positive"));
        }
        Ok(())
    }
}

/// What the fitting is expected to face in this activity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThreatProfile {
    /// Incoming DPS the tank has to hold against.
    pub expected_incoming_dps: f64,
    /// Metres.
    pub engagement_range: f64,
    /// Metres.
    pub target_signature_radius: f64,
    /// Metres per second.
    #[serde(default)]
    pub target_transversal: f64,
}

impl Default for ThreatProfile {
    fn default() -> Self {
        Self {
            expected_incoming_dps: 200.0,
            engagement_range: 10_000.0,
            target_signature_radius: 125.0,
            target_transversal: 150.0,
        }
    }
}

impl ThreatProfile {
    pub fn application_target(&self) -> ApplicationTarget {
        ApplicationTarget {
            distance: self.engagement_range,
            transversal_velocity: self.target_transversal,
            signature_radius: self.target_signature_radius,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillPriority {
    Critical,
    Important,
    Beneficial,
}

impl SkillPriority {
    pub fn weight(self) -> f64 {
        match self {
            Self::Critical => 10.0,
            Self::Important => 7.0,
            Self::Beneficial => 4.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Important => "important",
            Self::Beneficial => "beneficial",
        }
    }
}

impl fmt::Display for SkillPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiredSkill {
    pub skill_id: SkillId,
    pub name: String,
    pub level: u8,
    /// Training time multiplier.
    #[serde(default = "default_rank")]
    pub rank: u8,
    pub priority: SkillPriority,
}

fn default_rank() -> u8 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityProfile {
    pub activity_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub weights: ActivityWeights,
    #[serde(default)]
    pub threat: ThreatProfile,
    #[serde(default)]
    pub required_skills: Vec<RequiredSkill>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityProfilesFile {
    #[serde(default)]
    pub profiles: Vec<ActivityProfile>,
}

/// Anything that can hand over a complete set of activity profiles.
pub trait ActivityProfileSource {
    fn get_activity_profiles(&self) -> FittingResult<Vec<ActivityProfile>>;
}

/// Profiles compiled into the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinActivityProfiles;

impl ActivityProfileSource for BuiltinActivityProfiles {
    fn get_activity_profiles(&self) -> FittingResult<Vec<ActivityProfile>> {
        let file: ActivityProfilesFile = serde_yaml::from_str(BUILTIN_PROFILES)?;
        Ok(file.profiles)
    }
}

/// Profiles read from a YAML file on every call.
#[derive(Debug, Clone)]
pub struct ActivityProfileFile {
    pub path: PathBuf,
}

impl ActivityProfileSource for ActivityProfileFile {
    fn get_activity_profiles(&self) -> FittingResult<Vec<ActivityProfile>> {
        let raw = fs::read_to_string(&self.path).map_err(|source| FittingError::Io {
            path: self.path.clone(),
            source,
        })?;
        let file: ActivityProfilesFile = serde_yaml::from_str(&raw)?;
        Ok(file.profiles)
    }
}

/// Validated, immutable set of activity profiles keyed by activity ID.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityRegistry {
    profiles: BTreeMap<String, ActivityProfile>,
}

impl ActivityRegistry {
    /// Build a registry, rejecting an empty set, duplicate IDs and invalid weights.
    pub fn from_profiles(profiles: Vec<ActivityProfile>) -> FittingResult<Self> {
        if profiles.is_empty() {
            return Err(FittingError::Configuration(
                "activity profile registry is empty".into(),
            ));
        }
        let mut by_id = BTreeMap::new();
        for profile in profiles {
            if profile.activity_id.trim().is_empty() {
                return Err(FittingError::Configuration(format!(
                    "activity profile '{}' has an empty activity_id",
                    profile.name
                )));
            }
            profile
                .weights
                .validate(&format!("activity '{}'", profile.activity_id))
                .map_err(FittingError::Configuration)?;
            if let Some(skill) = profile.required_skills.iter().find(|s| s.level == 0 || s.level > 5) {
                return Err(FittingError::Configuration(format!(
                    "activity '{}': required skill {} has level {} outside 1..=5",
                    profile.activity_id, skill.skill_id, skill.level
                )));
            }
            let id = profile.activity_id.clone();
            if by_id.insert(id.clone(), profile).is_some() {
                return Err(FittingError::Configuration(format!(
                    "duplicate activity_id '{id}'"
                )));
            }
        }
        Ok(Self { profiles: by_id })
    }

    pub fn from_source(source: &dyn ActivityProfileSource) -> FittingResult<Self> {
        let registry = Self::from_profiles(source.get_activity_profiles()?)?;
        tracing::info!(profiles = registry.len(), "loaded activity profile registry");
        Ok(registry)
    }

    pub fn builtin() -> FittingResult<Self> {
        Self::from_source(&BuiltinActivityProfiles)
    }

    pub fn from_yaml_str(raw: &str) -> FittingResult<Self> {
        let file: ActivityProfilesFile = serde_yaml::from_str(raw)?;
        Self::from_profiles(file.profiles)
    }

    pub fn load(path: impl AsRef<Path>) -> FittingResult<Self> {
        Self::from_source(&ActivityProfileFile {
            path: path.as_ref().to_path_buf(),
        })
    }

    pub fn get(&self, activity_id: &str) -> Option<&ActivityProfile> {
        self.profiles.get(activity_id)
    }

    pub fn contains(&self, activity_id: &str) -> bool {
        self.profiles.contains_key(activity_id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActivityProfile> {
        self.profiles.values()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
