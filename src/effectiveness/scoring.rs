//! Saturating 0-100 normalization of detailed metrics against reference scales.

use serde::Serialize;

use crate::config::ReferenceScales;
use crate::data::activity::ActivityWeights;
use crate::effectiveness::metrics::DetailedMetrics;

pub const MAX_SCORE: f64 = 100.0;

/// Clamp into `[0, 100]`; NaN scores as zero.
pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, MAX_SCORE)
    }
}

/// `value / reference` as a score: reaching the reference scores 100.
pub fn saturating(value: f64, reference: f64) -> f64 {
    if reference <= 0.0 {
        return 0.0;
    }
    clamp_score(value / reference * MAX_SCORE)
}

/// Lower is better: zero scores 100, `reference` or more scores 0.
pub fn inverse(value: f64, reference: f64) -> f64 {
    if reference <= 0.0 {
        return 0.0;
    }
    clamp_score((1.0 - value / reference) * MAX_SCORE)
}

/// One score per activity weight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DimensionScores {
    pub dps: f64,
    pub tank: f64,
    pub speed: f64,
    pub range: f64,
    pub tracking: f64,
    pub capacitor: f64,
    pub cost: f64,
    pub skill_accessibility: f64,
}

impl DimensionScores {
    pub fn from_metrics(metrics: &DetailedMetrics, scales: &ReferenceScales, skill_accessibility: f64) -> Self {
        let duration_score = match metrics.sustainable_tank_duration_s {
            None => MAX_SCORE,
            Some(seconds) => saturating(seconds, scales.tank_duration_s),
        };
        let capacitor = if metrics.capacitor_stable {
            MAX_SCORE
        } else {
            saturating(metrics.capacitor_duration_s.unwrap_or(0.0), scales.capacitor_duration_s)
        };

        Self {
            dps: saturating(metrics.applied_dps, scales.dps),
            tank: clamp_score(
                0.5 * saturating(metrics.resist_adjusted_ehp, scales.effective_hp) + 0.5 * duration_score,
            ),
            speed: clamp_score(
                0.7 * saturating(metrics.max_velocity, scales.velocity)
                    + 0.3 * inverse(metrics.align_time_s, scales.align_time_s),
            ),
            range: clamp_score(metrics.range_factor * MAX_SCORE),
            tracking: clamp_score(metrics.tracking_factor * MAX_SCORE),
            capacitor,
            cost: inverse(metrics.cost.total_isk, scales.cost_isk),
            skill_accessibility: clamp_score(skill_accessibility),
        }
    }

    /// `Σ score·w / Σ w`, clamped. Zero total weight scores zero.
    pub fn weighted(&self, weights: &ActivityWeights) -> f64 {
        let total = weights.total();
        if total.is_nan() || total <= 0.0 {
            return 0.0;
        }
        let sum = self.dps * weights.dps
            + self.tank * weights.tank
            + self.speed * weights.speed
            + self.range * weights.range
            + self.tracking * weights.tracking
            + self.capacitor * weights.capacitor
            + self.cost * weights.cost
            + self.skill_accessibility * weights.skill_accessibility;
        clamp_score(sum / total)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CategoryScores {
    pub damage: f64,
    pub survivability: f64,
    pub mobility: f64,
    pub utility: f64,
    pub cost: f64,
    pub accessibility: f64,
}

impl CategoryScores {
    pub fn from_dimensions(dimensions: &DimensionScores, metrics: &DetailedMetrics, scales: &ReferenceScales) -> Self {
        let utility = (saturating(metrics.lock_range, scales.lock_range)
            + saturating(f64::from(metrics.max_locked_targets), scales.locked_targets)
            + saturating(metrics.drone_bandwidth, scales.drone_bandwidth))
            / 3.0;

        Self {
            damage: clamp_score(0.6 * dimensions.dps + 0.2 * dimensions.range + 0.2 * dimensions.tracking),
            survivability: clamp_score(0.7 * dimensions.tank + 0.3 * dimensions.capacitor),
            mobility: dimensions.speed,
            utility: clamp_score(utility),
            cost: dimensions.cost,
            accessibility: dimensions.skill_accessibility,
        }
    }

    pub fn entries(&self) -> [(&'static str, f64); 6] {
        [
            ("damage", self.damage),
            ("survivability", self.survivability),
            ("mobility", self.mobility),
            ("utility", self.utility),
            ("cost", self.cost),
            ("accessibility", self.accessibility),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturating_and_inverse_clamp() {
        assert_eq!(saturating(1e9, 800.0), 100.0);
        assert_eq!(saturating(-5.0, 800.0), 0.0);
        assert_eq!(saturating(400.0, 800.0), 50.0);
        assert_eq!(inverse(0.0, 10.0), 100.0);
        assert_eq!(inverse(25.0, 10.0), 0.0);
        assert_eq!(clamp_score(f64::NAN), 0.0);
        assert_eq!(clamp_score(f64::INFINITY), 100.0);
    }

    #[test]
    fn weighted_score_is_a_weighted_mean() {
        let scores = DimensionScores {
            dps: 100.0,
            tank: 50.0,
            ..DimensionScores::default()
        };
        let weights = ActivityWeights {
            dps: 1.0,
            tank: 3.0,
            ..ActivityWeights::default()
        };
        assert_eq!(scores.weighted(&weights), 62.5);
        assert_eq!(scores.weighted(&ActivityWeights::default()), 0.0);
    }
}
