//! Required-skill gaps: what is missing, how long it takes to train, and what it is worth.

use serde::Serialize;

use crate::data::activity::{ActivityProfile, RequiredSkill, SkillPriority};
use crate::dogma::attributes::SkillId;
use crate::dogma::fitting::{SkillSet, MAX_SKILL_LEVEL};

/// Skill points for level 1 of a rank 1 skill.
pub const BASE_SKILL_POINTS: f64 = 250.0;

/// Cumulative skill points to reach `level`: `250 * rank * sqrt(32)^(level - 1)`.
pub fn skill_points_for_level(rank: u8, level: u8) -> f64 {
    let level = level.min(MAX_SKILL_LEVEL);
    if level == 0 {
        return 0.0;
    }
    BASE_SKILL_POINTS * f64::from(rank) * 32f64.sqrt().powi(i32::from(level) - 1)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillGap {
    pub skill_id: SkillId,
    pub name: String,
    pub current_level: u8,
    pub required_level: u8,
    pub priority: SkillPriority,
    pub missing_skill_points: f64,
    pub training_time_minutes: f64,
    /// Estimated effectiveness gain in percent once trained.
    pub effectiveness_gain: f64,
}

impl SkillGap {
    pub fn sort_key(&self) -> f64 {
        self.priority.weight() * self.effectiveness_gain
    }
}

fn gap_for(skill: &RequiredSkill, skills: &SkillSet, sp_per_minute: f64) -> Option<SkillGap> {
    let current_level = skills.level(skill.skill_id);
    let required_level = skill.level.min(MAX_SKILL_LEVEL);
    if current_level >= required_level {
        return None;
    }
    let missing_skill_points = skill_points_for_level(skill.rank, required_level)
        - skill_points_for_level(skill.rank, current_level);
    let training_time_minutes = if sp_per_minute > 0.0 {
        missing_skill_points / sp_per_minute
    } else {
        0.0
    };
    // Share of the requirement still missing, scaled by how much the activity depends on it.
    let missing_share = f64::from(required_level - current_level) / f64::from(required_level);
    let effectiveness_gain = missing_share * skill.priority.weight() * 10.0;

    Some(SkillGap {
        skill_id: skill.skill_id,
        name: skill.name.clone(),
        current_level,
        required_level,
        priority: skill.priority,
        missing_skill_points,
        training_time_minutes,
        effectiveness_gain,
    })
}

/// Unmet required skills, most valuable first (`priority weight * gain`, then skill ID).
pub fn analyze_skill_gaps(profile: &ActivityProfile, skills: &SkillSet, sp_per_minute: f64) -> Vec<SkillGap> {
    let mut gaps: Vec<SkillGap> = profile
        .required_skills
        .iter()
        .filter_map(|skill| gap_for(skill, skills, sp_per_minute))
        .collect();
    gaps.sort_by(|left, right| {
        right
            .sort_key()
            .total_cmp(&left.sort_key())
            .then_with(|| left.skill_id.cmp(&right.skill_id))
    });
    gaps
}

/// Trained share of the profile's required skill points, 0-100. No requirements scores 100.
pub fn skill_accessibility(profile: &ActivityProfile, skills: &SkillSet) -> f64 {
    let mut required = 0.0;
    let mut trained = 0.0;
    for skill in &profile.required_skills {
        let target = skill.level.min(MAX_SKILL_LEVEL);
        required += skill_points_for_level(skill.rank, target);
        trained += skill_points_for_level(skill.rank, skills.level(skill.skill_id).min(target));
    }
    if required <= 0.0 {
        return 100.0;
    }
    (trained / required * 100.0).clamp(0.0, 100.0)
}

/// Human-readable training time, e.g. "3d 4h" or "45m".
pub fn format_training_time(minutes: f64) -> String {
    let total = minutes.max(0.0).round() as u64;
    let (days, hours, mins) = (total / 1_440, (total % 1_440) / 60, total % 60);
    match (days, hours) {
        (0, 0) => format!("{mins}m"),
        (0, _) => format!("{hours}h {mins}m"),
        _ => format!("{days}d {hours}h"),
    }
}
