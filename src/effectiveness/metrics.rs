//! Raw fitting numbers an activity cares about, derived from engine output and a threat profile.

use serde::Serialize;

use crate::config::PriceFallbacks;
use crate::data::activity::ThreatProfile;
use crate::data::provider::StaticDataProvider;
use crate::dogma::attributes::TypeId;
use crate::dogma::engine::ComprehensiveFittingStats;
use crate::dogma::fitting::ModuleFit;
use crate::dogma::stats::{ApplicationTarget, WeaponStats};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CostEstimate {
    pub hull_isk: f64,
    pub modules_isk: f64,
    pub total_isk: f64,
    /// Items priced with a fallback because the provider had no price.
    pub estimated_items: usize,
}

/// Hull plus module prices. Charges are consumables and not counted.
pub fn estimate_fitting_cost<P: StaticDataProvider + ?Sized>(
    provider: &P,
    ship_type_id: TypeId,
    modules: &[ModuleFit],
    fallbacks: &PriceFallbacks,
) -> CostEstimate {
    let mut estimated_items = 0;
    let mut price_or = |type_id: TypeId, fallback: f64| match provider.get_type_price(type_id) {
        Some(price) if price.is_finite() && price >= 0.0 => price,
        _ => {
            estimated_items += 1;
            fallback
        }
    };

    let hull_isk = price_or(ship_type_id, fallbacks.hull_isk);
    let modules_isk: f64 = modules
        .iter()
        .map(|module| price_or(module.type_id, fallbacks.module_isk))
        .sum();

    CostEstimate {
        hull_isk,
        modules_isk,
        total_isk: hull_isk + modules_isk,
        estimated_items,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailedMetrics {
    /// Fitted weapons plus drones, before application.
    pub effective_dps: f64,
    /// Against the activity's threat target.
    pub applied_dps: f64,
    pub burst_dps: f64,
    pub sustained_dps: f64,
    pub volley: f64,
    /// DPS-weighted range application at the threat's engagement range, in `[0, 1]`.
    pub range_factor: f64,
    /// DPS-weighted tracking application against the threat target, in `[0, 1]`.
    pub tracking_factor: f64,
    pub effective_hp: f64,
    pub resist_adjusted_ehp: f64,
    pub sustainable_repair_rate: f64,
    /// Seconds until destroyed under the threat DPS; None when the tank holds indefinitely.
    pub sustainable_tank_duration_s: Option<f64>,
    pub max_velocity: f64,
    pub align_time_s: f64,
    pub capacitor_stable: bool,
    pub capacitor_duration_s: Option<f64>,
    pub lock_range: f64,
    pub max_locked_targets: u32,
    pub drone_bandwidth: f64,
    pub cpu_percentage: f64,
    pub powergrid_percentage: f64,
    pub cost: CostEstimate,
    /// None when the fitting does no damage.
    pub cost_per_dps: Option<f64>,
    pub cost_per_ehp: Option<f64>,
}

fn dps_weighted_factor(weapons: &[WeaponStats], factor: impl Fn(&WeaponStats) -> f64) -> f64 {
    let total: f64 = weapons.iter().map(|w| w.dps).sum();
    if total <= 0.0 {
        return 0.0;
    }
    weapons.iter().map(|w| factor(w) * w.dps).sum::<f64>() / total
}

pub fn derive_metrics(
    stats: &ComprehensiveFittingStats,
    threat: &ThreatProfile,
    cost: CostEstimate,
) -> DetailedMetrics {
    let target: ApplicationTarget = threat.application_target();
    let weapons = &stats.weapons;
    let tank = &stats.tank;

    let incoming = threat.expected_incoming_dps;
    let net_damage = incoming - tank.sustainable_repair_rate;
    let sustainable_tank_duration_s =
        (incoming > 0.0 && net_damage > 0.0).then(|| tank.resist_adjusted_ehp / net_damage);

    let effective_dps = weapons.total_dps;
    let ratio = |denominator: f64| (denominator > 0.0).then(|| cost.total_isk / denominator);

    DetailedMetrics {
        effective_dps,
        applied_dps: weapons.applied_dps_against(&target),
        burst_dps: weapons.burst_dps,
        sustained_dps: weapons.sustained_dps,
        volley: weapons.volley,
        range_factor: dps_weighted_factor(&weapons.weapons, |w| w.range_factor(&target)),
        tracking_factor: dps_weighted_factor(&weapons.weapons, |w| w.tracking_factor(&target)),
        effective_hp: tank.effective_hp,
        resist_adjusted_ehp: tank.resist_adjusted_ehp,
        sustainable_repair_rate: tank.sustainable_repair_rate,
        sustainable_tank_duration_s,
        max_velocity: stats.navigation.max_velocity,
        align_time_s: stats.navigation.align_time,
        capacitor_stable: stats.capacitor.is_stable,
        capacitor_duration_s: stats.capacitor.time_to_empty,
        lock_range: stats.targeting.lock_range,
        max_locked_targets: stats.targeting.max_locked_targets,
        drone_bandwidth: stats.drones.bandwidth,
        cpu_percentage: stats.fitting.cpu.percentage,
        powergrid_percentage: stats.fitting.powergrid.percentage,
        cost,
        cost_per_dps: ratio(effective_dps),
        cost_per_ehp: ratio(tank.effective_hp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::{SkillBonus, TypeEffect};
    use crate::dogma::attributes::AttributeId;
    use crate::dogma::fitting::SlotType;

    struct Prices;

    impl StaticDataProvider for Prices {
        fn type_name(&self, _type_id: TypeId) -> Option<String> {
            None
        }
        fn get_type_attributes(&self, _type_id: TypeId) -> Option<Vec<(AttributeId, f64)>> {
            None
        }
        fn get_type_effects(&self, _type_id: TypeId) -> Option<Vec<TypeEffect>> {
            None
        }
        fn get_ship_skill_bonuses(&self, _ship_type_id: TypeId) -> Vec<SkillBonus> {
            Vec::new()
        }
        fn get_type_price(&self, type_id: TypeId) -> Option<f64> {
            match type_id {
                1 => Some(10_000_000.0),
                2 => Some(-5.0),
                _ => None,
            }
        }
    }

    #[test]
    fn cost_uses_fallbacks_for_unpriced_and_invalid_prices() {
        let modules = [
            ModuleFit::online(2, SlotType::Low),
            ModuleFit::online(3, SlotType::Low).with_charge(1),
        ];
        let cost = estimate_fitting_cost(&Prices, 1, &modules, &PriceFallbacks::default());
        assert_eq!(cost.hull_isk, 10_000_000.0);
        assert_eq!(cost.modules_isk, 3_000_000.0);
        assert_eq!(cost.total_isk, 13_000_000.0);
        assert_eq!(cost.estimated_items, 2);
    }
}
