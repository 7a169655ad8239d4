//! Rule-based advice for a scored fitting.

use crate::dogma::engine::ComprehensiveFittingStats;
use crate::effectiveness::metrics::DetailedMetrics;
use crate::effectiveness::scoring::CategoryScores;
use crate::effectiveness::skill_gap::{format_training_time, SkillGap};

pub const RESOURCE_WARNING_PERCENTAGE: f64 = 95.0;
pub const LOW_CATEGORY_SCORE: f64 = 40.0;
/// Capacitor lasting less than this under load is called out.
pub const SHORT_CAPACITOR_SECONDS: f64 = 60.0;

fn category_advice(category: &str) -> &'static str {
    match category {
        "damage" => "fit damage modules or weapons that apply better at the expected range",
        "survivability" => "add buffer or active tank, or resist modules for the expected damage",
        "mobility" => "consider a propulsion module or fewer mass-adding modules",
        "utility" => "targeting range and drone capability are limited for this activity",
        "cost" => "cheaper meta modules would reduce the loss if the ship dies",
        "accessibility" => "required skills are far from trained; train them before flying this",
        _ => "review the fitting",
    }
}

pub fn generate_recommendations(
    stats: &ComprehensiveFittingStats,
    metrics: &DetailedMetrics,
    categories: &CategoryScores,
    skill_gaps: &[SkillGap],
) -> Vec<String> {
    let mut out = Vec::new();

    if !stats.fitting.is_valid {
        out.push(format!(
            "Fitting exceeds hull limits: {}",
            stats.fitting.violations.join("; ")
        ));
    }
    if metrics.cpu_percentage > RESOURCE_WARNING_PERCENTAGE {
        out.push(format!(
            "CPU usage at {:.1}%: train CPU Management or fit a co-processor",
            metrics.cpu_percentage
        ));
    }
    if metrics.powergrid_percentage > RESOURCE_WARNING_PERCENTAGE {
        out.push(format!(
            "Powergrid usage at {:.1}%: train Power Grid Management or fit a power diagnostic system",
            metrics.powergrid_percentage
        ));
    }

    let skipped = stats.diagnostics.skipped_type_ids();
    if !skipped.is_empty() {
        out.push(format!(
            "{} item(s) could not be resolved and were left out of the calculation: {:?}",
            skipped.len(),
            skipped
        ));
    }

    if let Some(gap) = skill_gaps.first() {
        out.push(format!(
            "Train {} to level {} ({}, {} priority) for an estimated {:.0}% effectiveness gain",
            gap.name,
            gap.required_level,
            format_training_time(gap.training_time_minutes),
            gap.priority,
            gap.effectiveness_gain
        ));
    }

    if stats.weapons.weapon_count == 0 && stats.drones.active_count == 0 {
        out.push("No weapons or drones fitted: the fitting deals no damage".to_string());
    }
    if let Some(seconds) = metrics.capacitor_duration_s {
        if seconds < SHORT_CAPACITOR_SECONDS {
            out.push(format!(
                "Capacitor runs dry in {seconds:.0}s with all active modules running"
            ));
        }
    }

    for (category, score) in categories.entries() {
        if score < LOW_CATEGORY_SCORE {
            out.push(format!(
                "Low {category} score ({score:.0}): {}",
                category_advice(category)
            ));
        }
    }

    out.extend(stats.stacking.recommendations.iter().cloned());
    out
}
