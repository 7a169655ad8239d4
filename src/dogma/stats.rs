//! Subsystem statistics derived from a ship's final attributes and its resolved modules.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dogma::attributes::*;
use crate::dogma::diagnostics::Diagnostics;
use crate::dogma::fitting::{ModuleFit, SlotType};

/// Signature resolution the turret tracking formula is normalized against.
pub const TURRET_SIGNATURE_RESOLUTION: f64 = 40_000.0;
/// `-ln(0.25)`: align time is the time to reach 75% of max velocity.
pub const ALIGN_TIME_FACTOR: f64 = std::f64::consts::LN_2 * 2.0;
/// Capacitor and shield recharge peak at 25% and deliver 2.5x the average rate.
pub const PEAK_RECHARGE_FACTOR: f64 = 2.5;
const RESOURCE_EPSILON: f64 = 1e-9;

/// Reference target used for applied damage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApplicationTarget {
    /// Metres.
    pub distance: f64,
    /// Metres per second.
    pub transversal_velocity: f64,
    /// Metres.
    pub signature_radius: f64,
}

impl Default for ApplicationTarget {
    fn default() -> Self {
        Self {
            distance: 10_000.0,
            transversal_velocity: 150.0,
            signature_radius: 125.0,
        }
    }
}

/// A fitted module with its type attributes and, for weapons, its charge's attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedModule {
    pub fit: ModuleFit,
    pub attributes: AttributeMap,
    pub charge_attributes: Option<AttributeMap>,
}

impl ResolvedModule {
    pub fn attr(&self, attribute_id: AttributeId) -> f64 {
        value(&self.attributes, attribute_id)
    }

    /// Cycle time in seconds from duration or rate of fire, None when the module does not cycle.
    pub fn cycle_time_s(&self) -> Option<f64> {
        let ms = match self.attr(DURATION) {
            d if d > 0.0 => d,
            _ => self.attr(RATE_OF_FIRE),
        };
        (ms > 0.0).then_some(ms / 1000.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponKind {
    Turret,
    Launcher,
    Drone,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeaponStats {
    pub type_id: TypeId,
    pub charge_type_id: Option<TypeId>,
    pub kind: WeaponKind,
    pub volley: f64,
    pub dps: f64,
    pub sustained_dps: f64,
    pub cycle_time_s: f64,
    pub optimal_range: f64,
    pub falloff: f64,
    pub tracking_speed: f64,
}

impl WeaponStats {
    /// Fraction of raw damage landing on `target`, in `[0, 1]`.
    /// Tracking weapons use `0.5^((angular * 40000 / (tracking * sig))^2 + (excess / falloff)^2)`;
    /// others are limited by range only.
    pub fn application_factor(&self, target: &ApplicationTarget) -> f64 {
        (self.tracking_factor(target) * self.range_factor(target)).clamp(0.0, 1.0)
    }

    /// Range part of the application formula. Zero optimal and falloff means unlimited range.
    pub fn range_factor(&self, target: &ApplicationTarget) -> f64 {
        let unlimited_range = self.optimal_range <= 0.0 && self.falloff <= 0.0;
        let excess = (target.distance - self.optimal_range).max(0.0);
        if unlimited_range || excess == 0.0 {
            1.0
        } else if self.falloff > 0.0 {
            0.5_f64.powf((excess / self.falloff).powi(2))
        } else {
            0.0
        }
    }

    /// Tracking part of the application formula; 1 for weapons that do not track.
    pub fn tracking_factor(&self, target: &ApplicationTarget) -> f64 {
        if self.tracking_speed <= 0.0 || target.distance <= 0.0 {
            return 1.0;
        }
        let angular = target.transversal_velocity / target.distance;
        let signature = target.signature_radius.max(1.0);
        let term = angular * TURRET_SIGNATURE_RESOLUTION / (self.tracking_speed * signature);
        0.5_f64.powf(term * term)
    }

    pub fn applied_dps(&self, target: &ApplicationTarget) -> f64 {
        self.dps * self.application_factor(target)
    }
}

fn damage_sum(attributes: &AttributeMap) -> f64 {
    [EM_DAMAGE, THERMAL_DAMAGE, KINETIC_DAMAGE, EXPLOSIVE_DAMAGE]
        .iter()
        .map(|id| value(attributes, *id))
        .sum()
}

fn is_weapon(module: &ResolvedModule) -> bool {
    module.fit.online
        && module.fit.slot_type == SlotType::High
        && module.attr(RATE_OF_FIRE) > 0.0
        && (module.fit.charge_type_id.is_some()
            || module.attributes.contains_key(&DAMAGE_MULTIPLIER)
            || damage_sum(&module.attributes) > 0.0)
}

/// Weapon stats for a high-slot weapon. An unresolved charge counts as zero damage.
pub fn weapon_from_module(module: &ResolvedModule, ship: &AttributeMap) -> Option<WeaponStats> {
    if !is_weapon(module) {
        return None;
    }
    let raw_damage = match (&module.fit.charge_type_id, &module.charge_attributes) {
        (Some(_), Some(charge)) => damage_sum(charge),
        (Some(_), None) => 0.0,
        (None, _) => damage_sum(&module.attributes),
    };
    let multiplier = value_or(&module.attributes, DAMAGE_MULTIPLIER, 1.0)
        * value_or(ship, DAMAGE_MULTIPLIER, 1.0);
    let volley = raw_damage * multiplier;
    let cycle_time_s =
        module.attr(RATE_OF_FIRE) * value_or(ship, SPEED_MULTIPLIER, 1.0) / 1000.0;
    let dps = if cycle_time_s > 0.0 { volley / cycle_time_s } else { 0.0 };

    let tracking_speed = module.attr(TRACKING_SPEED);
    let kind = if tracking_speed > 0.0 {
        WeaponKind::Turret
    } else {
        WeaponKind::Launcher
    };
    let optimal_range = match (kind, &module.charge_attributes) {
        (WeaponKind::Launcher, Some(charge)) if value(charge, MAX_RANGE) > 0.0 => {
            value(charge, MAX_RANGE)
        }
        _ => module.attr(MAX_RANGE),
    };

    Some(WeaponStats {
        type_id: module.fit.type_id,
        charge_type_id: module.fit.charge_type_id,
        kind,
        volley,
        dps,
        sustained_dps: sustained_dps(module, volley, cycle_time_s, dps),
        cycle_time_s,
        optimal_range,
        falloff: module.attr(FALLOFF),
        tracking_speed,
    })
}

/// DPS including reloads: `volley * clip / (clip * cycle + reload)`.
fn sustained_dps(module: &ResolvedModule, volley: f64, cycle_time_s: f64, dps: f64) -> f64 {
    let reload_s = module.attr(RELOAD_TIME) / 1000.0;
    let charge_volume = module
        .charge_attributes
        .as_ref()
        .map(|charge| value(charge, VOLUME))
        .unwrap_or(0.0);
    if reload_s <= 0.0 || charge_volume <= 0.0 || cycle_time_s <= 0.0 {
        return dps;
    }
    let charges_per_cycle = module.attr(CHARGE_RATE).max(1.0);
    let cycles = ((module.attr(CAPACITY) / charge_volume) / charges_per_cycle).floor();
    if cycles < 1.0 {
        return dps;
    }
    volley * cycles / (cycles * cycle_time_s + reload_s)
}

fn drone_weapon(module: &ResolvedModule) -> Option<WeaponStats> {
    let cycle_time_s = module.attr(RATE_OF_FIRE) / 1000.0;
    if cycle_time_s <= 0.0 {
        return None;
    }
    let volley = damage_sum(&module.attributes) * value_or(&module.attributes, DAMAGE_MULTIPLIER, 1.0);
    let dps = volley / cycle_time_s;
    Some(WeaponStats {
        type_id: module.fit.type_id,
        charge_type_id: None,
        kind: WeaponKind::Drone,
        volley,
        dps,
        sustained_dps: dps,
        cycle_time_s,
        optimal_range: module.attr(MAX_RANGE),
        falloff: module.attr(FALLOFF),
        tracking_speed: module.attr(TRACKING_SPEED),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeaponPerformance {
    pub weapons: Vec<WeaponStats>,
    /// Fitted turrets and launchers; zero means the DPS figures are a true zero.
    pub weapon_count: usize,
    /// Fitted weapons plus active drones.
    pub total_dps: f64,
    pub applied_dps: f64,
    /// Fitted weapons only, ignoring reloads.
    pub burst_dps: f64,
    pub sustained_dps: f64,
    pub volley: f64,
    /// DPS-weighted optimal range of fitted weapons.
    pub optimal_range: f64,
    pub falloff: f64,
    /// DPS-weighted tracking of fitted turrets.
    pub tracking: f64,
}

impl WeaponPerformance {
    pub fn applied_dps_against(&self, target: &ApplicationTarget) -> f64 {
        self.weapons.iter().map(|w| w.applied_dps(target)).sum()
    }
}

fn dps_weighted(weapons: &[&WeaponStats], field: impl Fn(&WeaponStats) -> f64) -> f64 {
    let total: f64 = weapons.iter().map(|w| w.dps).sum();
    if total <= 0.0 {
        return match weapons.len() {
            0 => 0.0,
            n => weapons.iter().map(|w| field(w)).sum::<f64>() / n as f64,
        };
    }
    weapons.iter().map(|w| field(w) * w.dps).sum::<f64>() / total
}

pub fn weapon_performance(
    fitted: Vec<WeaponStats>,
    drones: Vec<WeaponStats>,
    target: &ApplicationTarget,
) -> WeaponPerformance {
    let fitted_refs: Vec<&WeaponStats> = fitted.iter().collect();
    let turrets: Vec<&WeaponStats> = fitted
        .iter()
        .filter(|w| w.kind == WeaponKind::Turret)
        .collect();

    let burst_dps: f64 = fitted.iter().map(|w| w.dps).sum();
    let drone_dps: f64 = drones.iter().map(|w| w.dps).sum();
    let optimal_range = dps_weighted(&fitted_refs, |w| w.optimal_range);
    let falloff = dps_weighted(&fitted_refs, |w| w.falloff);
    let tracking = dps_weighted(&turrets, |w| w.tracking_speed);

    let weapon_count = fitted.len();
    let sustained_dps: f64 = fitted.iter().map(|w| w.sustained_dps).sum();
    let volley: f64 = fitted.iter().map(|w| w.volley).sum();

    let mut weapons = fitted;
    weapons.extend(drones);
    let applied_dps = weapons.iter().map(|w| w.applied_dps(target)).sum();

    WeaponPerformance {
        weapons,
        weapon_count,
        total_dps: burst_dps + drone_dps,
        applied_dps,
        burst_dps,
        sustained_dps,
        volley,
        optimal_range,
        falloff,
        tracking,
    }
}

/// Resistances as fractions in `[0, 1]` (1 - resonance).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ResistProfile {
    pub em: f64,
    pub thermal: f64,
    pub kinetic: f64,
    pub explosive: f64,
}

impl ResistProfile {
    pub fn from_resonances(ship: &AttributeMap, ids: [AttributeId; 4]) -> Self {
        let resist = |id| (1.0 - value_or(ship, id, 1.0)).clamp(0.0, 1.0);
        Self {
            em: resist(ids[0]),
            thermal: resist(ids[1]),
            kinetic: resist(ids[2]),
            explosive: resist(ids[3]),
        }
    }

    pub fn average(&self) -> f64 {
        (self.em + self.thermal + self.kinetic + self.explosive) / 4.0
    }

    /// HP multiplier against evenly split damage.
    pub fn omni_multiplier(&self) -> f64 {
        let resonance = (1.0 - self.average()).max(0.01);
        1.0 / resonance
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TankStats {
    pub shield_hp: f64,
    pub armor_hp: f64,
    pub hull_hp: f64,
    pub shield_resists: ResistProfile,
    pub armor_resists: ResistProfile,
    pub hull_resists: ResistProfile,
    /// Shield + armor + hull.
    pub effective_hp: f64,
    /// Each layer scaled by its omni resist multiplier.
    pub resist_adjusted_ehp: f64,
    pub shield_repair_rate: f64,
    pub armor_repair_rate: f64,
    pub passive_shield_regen: f64,
    /// HP/s sustainable with the capacitor available, including passive regen.
    pub sustainable_repair_rate: f64,
}

pub fn tank_stats(
    ship: &AttributeMap,
    modules: &[ResolvedModule],
    capacitor: &CapacitorStats,
) -> TankStats {
    let shield_hp = value(ship, SHIELD_CAPACITY);
    let armor_hp = value(ship, ARMOR_HP);
    let hull_hp = value(ship, STRUCTURE_HP);

    let shield_resists = ResistProfile::from_resonances(
        ship,
        [
            SHIELD_EM_RESONANCE,
            SHIELD_THERMAL_RESONANCE,
            SHIELD_KINETIC_RESONANCE,
            SHIELD_EXPLOSIVE_RESONANCE,
        ],
    );
    let armor_resists = ResistProfile::from_resonances(
        ship,
        [
            ARMOR_EM_RESONANCE,
            ARMOR_THERMAL_RESONANCE,
            ARMOR_KINETIC_RESONANCE,
            ARMOR_EXPLOSIVE_RESONANCE,
        ],
    );
    let hull_resists = ResistProfile::from_resonances(
        ship,
        [
            STRUCTURE_EM_RESONANCE,
            STRUCTURE_THERMAL_RESONANCE,
            STRUCTURE_KINETIC_RESONANCE,
            STRUCTURE_EXPLOSIVE_RESONANCE,
        ],
    );

    let mut shield_repair_rate = 0.0;
    let mut armor_repair_rate = 0.0;
    for module in modules.iter().filter(|m| m.fit.is_active()) {
        let Some(cycle) = module.cycle_time_s() else {
            continue;
        };
        shield_repair_rate += module.attr(SHIELD_BONUS) / cycle;
        armor_repair_rate += module.attr(ARMOR_DAMAGE_AMOUNT) / cycle;
    }

    let shield_recharge_s = value(ship, SHIELD_RECHARGE_RATE) / 1000.0;
    let passive_shield_regen = if shield_recharge_s > 0.0 {
        PEAK_RECHARGE_FACTOR * shield_hp / shield_recharge_s
    } else {
        0.0
    };

    let sustainable_repair_rate =
        (shield_repair_rate + armor_repair_rate) * capacitor.sustain_fraction() + passive_shield_regen;

    TankStats {
        shield_hp,
        armor_hp,
        hull_hp,
        effective_hp: shield_hp + armor_hp + hull_hp,
        resist_adjusted_ehp: shield_hp * shield_resists.omni_multiplier()
            + armor_hp * armor_resists.omni_multiplier()
            + hull_hp * hull_resists.omni_multiplier(),
        shield_resists,
        armor_resists,
        hull_resists,
        shield_repair_rate,
        armor_repair_rate,
        passive_shield_regen,
        sustainable_repair_rate,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct NavigationStats {
    pub max_velocity: f64,
    pub agility: f64,
    /// Kilograms.
    pub mass: f64,
    /// Seconds to enter warp: `ln(4) * agility * mass / 1e6`.
    pub align_time: f64,
    pub signature_radius: f64,
    pub warp_speed: f64,
}

pub fn navigation_stats(ship: &AttributeMap) -> NavigationStats {
    let agility = value(ship, AGILITY);
    let mass = value(ship, MASS);
    NavigationStats {
        max_velocity: value(ship, MAX_VELOCITY),
        agility,
        mass,
        align_time: ALIGN_TIME_FACTOR * agility * mass / 1_000_000.0,
        signature_radius: value(ship, SIGNATURE_RADIUS),
        warp_speed: value(ship, WARP_SPEED_MULTIPLIER),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TargetingStats {
    pub max_locked_targets: u32,
    pub lock_range: f64,
    pub scan_resolution: f64,
    /// Strongest of the four sensor strengths.
    pub sensor_strength: f64,
}

pub fn targeting_stats(ship: &AttributeMap) -> TargetingStats {
    let sensor_strength = [
        SCAN_RADAR_STRENGTH,
        SCAN_LADAR_STRENGTH,
        SCAN_MAGNETOMETRIC_STRENGTH,
        SCAN_GRAVIMETRIC_STRENGTH,
    ]
    .iter()
    .map(|id| value(ship, *id))
    .fold(0.0, f64::max);

    TargetingStats {
        max_locked_targets: value(ship, MAX_LOCKED_TARGETS).max(0.0).floor() as u32,
        lock_range: value(ship, MAX_TARGET_RANGE),
        scan_resolution: value(ship, SCAN_RESOLUTION),
        sensor_strength,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CapacitorStats {
    pub capacity: f64,
    /// Seconds.
    pub recharge_time: f64,
    /// GJ/s at the 25% peak: `capacity / (recharge_time / 2.5)`.
    pub peak_recharge_rate: f64,
    /// GJ/s drawn by active modules.
    pub usage_rate: f64,
    /// `usage_rate - peak_recharge_rate`; positive drains.
    pub net_usage: f64,
    pub is_stable: bool,
    /// Seconds until empty from full, None when stable.
    pub time_to_empty: Option<f64>,
}

impl CapacitorStats {
    /// Share of active module cycles the capacitor can keep running.
    pub fn sustain_fraction(&self) -> f64 {
        if self.is_stable || self.usage_rate <= 0.0 {
            1.0
        } else {
            (self.peak_recharge_rate / self.usage_rate).clamp(0.0, 1.0)
        }
    }
}

pub fn capacitor_stats(ship: &AttributeMap, modules: &[ResolvedModule]) -> CapacitorStats {
    let capacity = value(ship, CAPACITOR_CAPACITY);
    let recharge_time = value(ship, RECHARGE_RATE) / 1000.0;
    let peak_recharge_rate = if recharge_time > 0.0 {
        capacity / (recharge_time / PEAK_RECHARGE_FACTOR)
    } else {
        0.0
    };

    let usage_rate: f64 = modules
        .iter()
        .filter(|m| m.fit.is_active())
        .filter_map(|m| m.cycle_time_s().map(|cycle| m.attr(CAPACITOR_NEED) / cycle))
        .sum();

    let net_usage = usage_rate - peak_recharge_rate;
    let is_stable = net_usage <= 0.0;
    let time_to_empty = (!is_stable).then(|| capacity / net_usage);

    CapacitorStats {
        capacity,
        recharge_time,
        peak_recharge_rate,
        usage_rate,
        net_usage,
        is_stable,
        time_to_empty,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DroneStats {
    pub bay_capacity: f64,
    pub bay_used: f64,
    pub bandwidth: f64,
    pub bandwidth_used: f64,
    pub max_active: u32,
    pub active_count: u32,
    pub drone_dps: f64,
}

/// Drone bay usage and the drones that can actually launch. Active drones are admitted in
/// fitting order while bandwidth and the active-drone limit allow; the rest are reported.
pub fn drone_stats(
    ship: &AttributeMap,
    modules: &[ResolvedModule],
    diagnostics: &mut Diagnostics,
) -> (DroneStats, Vec<WeaponStats>) {
    let bandwidth = value(ship, DRONE_BANDWIDTH);
    let max_active = value_or(ship, MAX_ACTIVE_DRONES, DEFAULT_MAX_ACTIVE_DRONES)
        .max(0.0)
        .floor() as u32;

    let mut stats = DroneStats {
        bay_capacity: value(ship, DRONE_CAPACITY),
        bandwidth,
        max_active,
        ..DroneStats::default()
    };
    let mut weapons = Vec::new();

    for drone in modules.iter().filter(|m| m.fit.slot_type == SlotType::Drone) {
        stats.bay_used += drone.attr(VOLUME);
        if !drone.fit.is_active() {
            continue;
        }
        let needed = drone.attr(DRONE_BANDWIDTH_USED);
        if stats.active_count >= max_active || stats.bandwidth_used + needed > bandwidth + RESOURCE_EPSILON {
            diagnostics.fitting_constraint(
                Some(drone.fit.type_id),
                format!(
                    "drone {} cannot launch: {}/{} active, {:.0}/{:.0} Mbit/s bandwidth",
                    drone.fit.type_id, stats.active_count, max_active, stats.bandwidth_used, bandwidth
                ),
            );
            continue;
        }
        stats.active_count += 1;
        stats.bandwidth_used += needed;
        if let Some(weapon) = drone_weapon(drone) {
            stats.drone_dps += weapon.dps;
            weapons.push(weapon);
        }
    }

    (stats, weapons)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ResourceUsage {
    pub used: f64,
    pub total: f64,
    pub percentage: f64,
}

impl ResourceUsage {
    pub fn new(used: f64, total: f64) -> Self {
        let percentage = if total > 0.0 {
            used / total * 100.0
        } else if used > 0.0 {
            100.0
        } else {
            0.0
        };
        Self {
            used,
            total,
            percentage,
        }
    }

    pub fn within_limit(&self) -> bool {
        self.used <= self.total + RESOURCE_EPSILON
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SlotUsage {
    pub used: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FittingUsage {
    pub cpu: ResourceUsage,
    pub powergrid: ResourceUsage,
    pub calibration: ResourceUsage,
    pub drone_bay: ResourceUsage,
    pub slots: BTreeMap<SlotType, SlotUsage>,
    /// True when every resource and slot is within the hull's limits.
    pub is_valid: bool,
    pub violations: Vec<String>,
}

/// CPU and powergrid count online modules only; calibration and slots count every fitted module.
pub fn fitting_usage(ship: &AttributeMap, modules: &[ResolvedModule], drones: &DroneStats) -> FittingUsage {
    let online = || modules.iter().filter(|m| m.fit.online);
    let cpu = ResourceUsage::new(online().map(|m| m.attr(CPU)).sum(), value(ship, CPU_OUTPUT));
    let powergrid =
        ResourceUsage::new(online().map(|m| m.attr(POWER)).sum(), value(ship, POWER_OUTPUT));
    let calibration = ResourceUsage::new(
        modules
            .iter()
            .filter(|m| m.fit.slot_type == SlotType::Rig)
            .map(|m| m.attr(UPGRADE_COST))
            .sum(),
        value(ship, UPGRADE_CAPACITY),
    );
    let drone_bay = ResourceUsage::new(drones.bay_used, drones.bay_capacity);

    let mut violations = Vec::new();
    for (name, usage) in [
        ("cpu", &cpu),
        ("powergrid", &powergrid),
        ("calibration", &calibration),
        ("drone bay", &drone_bay),
    ] {
        if !usage.within_limit() {
            violations.push(format!("{name} over limit: {:.1} / {:.1}", usage.used, usage.total));
        }
    }

    let mut slots = BTreeMap::new();
    for slot_type in SlotType::FITTED {
        let Some(attribute) = slot_type.capacity_attribute() else {
            continue;
        };
        let used = modules.iter().filter(|m| m.fit.slot_type == slot_type).count() as u32;
        let total = value(ship, attribute).max(0.0).floor() as u32;
        if used > total {
            violations.push(format!("{slot_type} slots over limit: {used} / {total}"));
        }
        slots.insert(slot_type, SlotUsage { used, total });
    }

    FittingUsage {
        cpu,
        powergrid,
        calibration,
        drone_bay,
        slots,
        is_valid: violations.is_empty(),
        violations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) {
        assert!((a - b).abs() <= tol, "expected {b}, got {a}");
    }

    fn attrs(pairs: &[(AttributeId, f64)]) -> AttributeMap {
        pairs.iter().copied().collect()
    }

    fn resolved(fit: ModuleFit, pairs: &[(AttributeId, f64)]) -> ResolvedModule {
        ResolvedModule {
            fit,
            attributes: attrs(pairs),
            charge_attributes: None,
        }
    }

    fn turret(optimal: f64, falloff: f64, tracking: f64) -> WeaponStats {
        WeaponStats {
            type_id: 1,
            charge_type_id: None,
            kind: WeaponKind::Turret,
            volley: 100.0,
            dps: 50.0,
            sustained_dps: 50.0,
            cycle_time_s: 2.0,
            optimal_range: optimal,
            falloff,
            tracking_speed: tracking,
        }
    }

    #[test]
    fn application_is_full_inside_optimal_with_no_transversal() {
        let target = ApplicationTarget {
            distance: 1_000.0,
            transversal_velocity: 0.0,
            signature_radius: 125.0,
        };
        assert_eq!(turret(5_000.0, 2_000.0, 0.3).application_factor(&target), 1.0);
    }

    #[test]
    fn application_halves_at_one_falloff() {
        let target = ApplicationTarget {
            distance: 7_000.0,
            transversal_velocity: 0.0,
            signature_radius: 125.0,
        };
        approx_eq(turret(5_000.0, 2_000.0, 0.3).application_factor(&target), 0.5, 1e-12);
    }

    #[test]
    fn missiles_without_falloff_miss_beyond_range() {
        let mut launcher = turret(20_000.0, 0.0, 0.0);
        launcher.kind = WeaponKind::Launcher;
        let near = ApplicationTarget { distance: 19_000.0, ..ApplicationTarget::default() };
        let far = ApplicationTarget { distance: 21_000.0, ..ApplicationTarget::default() };
        assert_eq!(launcher.application_factor(&near), 1.0);
        assert_eq!(launcher.application_factor(&far), 0.0);
    }

    #[test]
    fn unresolved_charge_counts_as_zero_damage_weapon() {
        let module = resolved(
            ModuleFit::online(10, SlotType::High).with_charge(99),
            &[(RATE_OF_FIRE, 2_000.0), (DAMAGE_MULTIPLIER, 2.0)],
        );
        let weapon = weapon_from_module(&module, &AttributeMap::new()).expect("weapon");
        assert_eq!(weapon.volley, 0.0);
        assert_eq!(weapon.dps, 0.0);
    }

    #[test]
    fn weapon_dps_uses_ship_multipliers() {
        let mut module = resolved(
            ModuleFit::online(10, SlotType::High).with_charge(20),
            &[(RATE_OF_FIRE, 2_000.0), (DAMAGE_MULTIPLIER, 2.0), (TRACKING_SPEED, 0.3)],
        );
        module.charge_attributes = Some(attrs(&[(EM_DAMAGE, 6.0), (KINETIC_DAMAGE, 4.0)]));
        let ship = attrs(&[(DAMAGE_MULTIPLIER, 1.5), (SPEED_MULTIPLIER, 0.5)]);
        let weapon = weapon_from_module(&module, &ship).expect("weapon");
        approx_eq(weapon.volley, 30.0, 1e-12);
        approx_eq(weapon.cycle_time_s, 1.0, 1e-12);
        approx_eq(weapon.dps, 30.0, 1e-12);
        assert_eq!(weapon.kind, WeaponKind::Turret);
    }

    #[test]
    fn sustained_dps_accounts_for_reload() {
        let mut module = resolved(
            ModuleFit::online(10, SlotType::High).with_charge(20),
            &[
                (RATE_OF_FIRE, 1_000.0),
                (CAPACITY, 1.0),
                (RELOAD_TIME, 10_000.0),
            ],
        );
        module.charge_attributes = Some(attrs(&[(EM_DAMAGE, 10.0), (VOLUME, 0.1)]));
        let weapon = weapon_from_module(&module, &AttributeMap::new()).expect("weapon");
        // 10 shots in 10 s then a 10 s reload.
        approx_eq(weapon.dps, 10.0, 1e-12);
        approx_eq(weapon.sustained_dps, 5.0, 1e-12);
    }

    #[test]
    fn offline_and_non_high_modules_are_not_weapons() {
        let offline = resolved(ModuleFit::offline(1, SlotType::High), &[(RATE_OF_FIRE, 1_000.0), (EM_DAMAGE, 5.0)]);
        let mid = resolved(ModuleFit::online(1, SlotType::Mid), &[(RATE_OF_FIRE, 1_000.0), (EM_DAMAGE, 5.0)]);
        assert!(weapon_from_module(&offline, &AttributeMap::new()).is_none());
        assert!(weapon_from_module(&mid, &AttributeMap::new()).is_none());
    }

    #[test]
    fn capacitor_peak_and_stability() {
        let ship = attrs(&[(CAPACITOR_CAPACITY, 500.0), (RECHARGE_RATE, 250_000.0)]);
        let booster = resolved(
            ModuleFit::active(5, SlotType::Mid),
            &[(CAPACITOR_NEED, 40.0), (DURATION, 4_000.0)],
        );
        let cap = capacitor_stats(&ship, &[booster]);
        approx_eq(cap.peak_recharge_rate, 5.0, 1e-12);
        approx_eq(cap.usage_rate, 10.0, 1e-12);
        assert!(!cap.is_stable);
        approx_eq(cap.time_to_empty.expect("drains"), 100.0, 1e-9);
        approx_eq(cap.sustain_fraction(), 0.5, 1e-12);

        let idle = capacitor_stats(&ship, &[]);
        assert!(idle.is_stable);
        assert_eq!(idle.time_to_empty, None);
    }

    #[test]
    fn tank_sums_pools_and_scales_reps_by_capacitor() {
        let ship = attrs(&[
            (SHIELD_CAPACITY, 400.0),
            (ARMOR_HP, 300.0),
            (STRUCTURE_HP, 200.0),
            (ARMOR_EM_RESONANCE, 0.5),
            (ARMOR_THERMAL_RESONANCE, 0.5),
            (ARMOR_KINETIC_RESONANCE, 0.5),
            (ARMOR_EXPLOSIVE_RESONANCE, 0.5),
        ]);
        let repairer = resolved(
            ModuleFit::active(6, SlotType::Low),
            &[(ARMOR_DAMAGE_AMOUNT, 60.0), (DURATION, 6_000.0)],
        );
        let capacitor = CapacitorStats {
            is_stable: false,
            usage_rate: 4.0,
            peak_recharge_rate: 1.0,
            ..CapacitorStats::default()
        };
        let tank = tank_stats(&ship, &[repairer], &capacitor);
        assert_eq!(tank.effective_hp, 900.0);
        approx_eq(tank.armor_resists.average(), 0.5, 1e-12);
        approx_eq(tank.resist_adjusted_ehp, 400.0 + 600.0 + 200.0, 1e-9);
        approx_eq(tank.armor_repair_rate, 10.0, 1e-12);
        approx_eq(tank.sustainable_repair_rate, 2.5, 1e-12);
    }

    #[test]
    fn align_time_follows_agility_and_mass() {
        let nav = navigation_stats(&attrs(&[(AGILITY, 3.0), (MASS, 1_000_000.0)]));
        approx_eq(nav.align_time, 3.0 * 4.0_f64.ln(), 1e-12);
    }

    #[test]
    fn drones_respect_bandwidth_and_active_limit() {
        let ship = attrs(&[(DRONE_BANDWIDTH, 25.0), (DRONE_CAPACITY, 50.0), (MAX_ACTIVE_DRONES, 5.0)]);
        let drone = |id| {
            resolved(
                ModuleFit::active(id, SlotType::Drone),
                &[
                    (VOLUME, 10.0),
                    (DRONE_BANDWIDTH_USED, 10.0),
                    (RATE_OF_FIRE, 4_000.0),
                    (KINETIC_DAMAGE, 20.0),
                ],
            )
        };
        let mut diagnostics = Diagnostics::default();
        let (stats, weapons) = drone_stats(&ship, &[drone(1), drone(2), drone(3)], &mut diagnostics);
        assert_eq!(stats.active_count, 2);
        assert_eq!(stats.bandwidth_used, 20.0);
        assert_eq!(stats.bay_used, 30.0);
        approx_eq(stats.drone_dps, 10.0, 1e-12);
        assert_eq!(weapons.len(), 2);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn fitting_usage_flags_overloaded_resources_and_slots() {
        let ship = attrs(&[(CPU_OUTPUT, 100.0), (POWER_OUTPUT, 50.0), (HI_SLOTS, 1.0)]);
        let gun = |online| {
            let fit = if online {
                ModuleFit::online(1, SlotType::High)
            } else {
                ModuleFit::offline(1, SlotType::High)
            };
            resolved(fit, &[(CPU, 60.0), (POWER, 10.0)])
        };
        let usage = fitting_usage(&ship, &[gun(true), gun(false)], &DroneStats::default());
        approx_eq(usage.cpu.percentage, 60.0, 1e-12);
        assert_eq!(usage.slots[&SlotType::High], SlotUsage { used: 2, total: 1 });
        assert!(!usage.is_valid);
        assert_eq!(usage.violations.len(), 1);
    }
}
