//! Attribute identifiers and the attribute snapshots produced by each pipeline stage.
//! IDs match the game's static data export so snapshots can be fed straight from it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type TypeId = u32;
pub type AttributeId = u32;
pub type EffectId = u32;
pub type SkillId = u32;
/// Stacking group identifier. Values `<= 0` mean "not stack-penalized".
pub type StackingGroupId = i32;

/// Ordered attribute map. BTreeMap keeps iteration (and therefore float summation) order stable.
pub type AttributeMap = BTreeMap<AttributeId, f64>;

pub const MASS: AttributeId = 4;
pub const CAPACITOR_NEED: AttributeId = 6;
pub const STRUCTURE_HP: AttributeId = 9;
pub const POWER_OUTPUT: AttributeId = 11;
pub const LOW_SLOTS: AttributeId = 12;
pub const MED_SLOTS: AttributeId = 13;
pub const HI_SLOTS: AttributeId = 14;
pub const POWER: AttributeId = 30;
pub const MAX_VELOCITY: AttributeId = 37;
pub const CAPACITY: AttributeId = 38;
pub const CPU_OUTPUT: AttributeId = 48;
pub const CPU: AttributeId = 50;
/// Cycle time of a weapon in milliseconds.
pub const RATE_OF_FIRE: AttributeId = 51;
pub const MAX_RANGE: AttributeId = 54;
/// Capacitor recharge time in milliseconds.
pub const RECHARGE_RATE: AttributeId = 55;
pub const CHARGE_RATE: AttributeId = 56;
pub const DAMAGE_MULTIPLIER: AttributeId = 64;
pub const SHIELD_BONUS: AttributeId = 68;
pub const AGILITY: AttributeId = 70;
/// Activation cycle duration in milliseconds.
pub const DURATION: AttributeId = 73;
pub const MAX_TARGET_RANGE: AttributeId = 76;
pub const ARMOR_DAMAGE_AMOUNT: AttributeId = 84;
pub const STRUCTURE_KINETIC_RESONANCE: AttributeId = 109;
pub const STRUCTURE_THERMAL_RESONANCE: AttributeId = 110;
pub const STRUCTURE_EXPLOSIVE_RESONANCE: AttributeId = 111;
pub const STRUCTURE_EM_RESONANCE: AttributeId = 113;
pub const EM_DAMAGE: AttributeId = 114;
pub const EXPLOSIVE_DAMAGE: AttributeId = 116;
pub const KINETIC_DAMAGE: AttributeId = 117;
pub const THERMAL_DAMAGE: AttributeId = 118;
pub const FALLOFF: AttributeId = 158;
pub const TRACKING_SPEED: AttributeId = 160;
pub const VOLUME: AttributeId = 161;
pub const MAX_LOCKED_TARGETS: AttributeId = 192;
/// Ship-level rate-of-fire multiplier (lower is faster).
pub const SPEED_MULTIPLIER: AttributeId = 204;
pub const SCAN_RADAR_STRENGTH: AttributeId = 208;
pub const SCAN_LADAR_STRENGTH: AttributeId = 209;
pub const SCAN_MAGNETOMETRIC_STRENGTH: AttributeId = 210;
pub const SCAN_GRAVIMETRIC_STRENGTH: AttributeId = 211;
pub const SHIELD_CAPACITY: AttributeId = 263;
pub const ARMOR_HP: AttributeId = 265;
pub const ARMOR_EM_RESONANCE: AttributeId = 267;
pub const ARMOR_EXPLOSIVE_RESONANCE: AttributeId = 268;
pub const ARMOR_KINETIC_RESONANCE: AttributeId = 269;
pub const ARMOR_THERMAL_RESONANCE: AttributeId = 270;
pub const SHIELD_EM_RESONANCE: AttributeId = 271;
pub const SHIELD_EXPLOSIVE_RESONANCE: AttributeId = 272;
pub const SHIELD_KINETIC_RESONANCE: AttributeId = 273;
pub const SHIELD_THERMAL_RESONANCE: AttributeId = 274;
pub const DRONE_CAPACITY: AttributeId = 283;
pub const MAX_ACTIVE_DRONES: AttributeId = 352;
pub const TECH_LEVEL: AttributeId = 422;
/// Passive shield recharge time in milliseconds.
pub const SHIELD_RECHARGE_RATE: AttributeId = 479;
pub const CAPACITOR_CAPACITY: AttributeId = 482;
pub const SIGNATURE_RADIUS: AttributeId = 552;
pub const SCAN_RESOLUTION: AttributeId = 564;
pub const WARP_SPEED_MULTIPLIER: AttributeId = 600;
pub const META_LEVEL: AttributeId = 633;
pub const UPGRADE_CAPACITY: AttributeId = 1132;
pub const RIG_SLOTS: AttributeId = 1137;
pub const UPGRADE_COST: AttributeId = 1153;
pub const DRONE_BANDWIDTH: AttributeId = 1271;
pub const DRONE_BANDWIDTH_USED: AttributeId = 1272;
pub const MAX_SUBSYSTEMS: AttributeId = 1367;
/// Weapon reload time in milliseconds.
pub const RELOAD_TIME: AttributeId = 1795;
pub const SERVICE_SLOTS: AttributeId = 2056;

/// Default number of drones a character may control at once when the hull does not say otherwise.
pub const DEFAULT_MAX_ACTIVE_DRONES: f64 = 5.0;

/// Attribute metadata from the static data export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub attribute_id: AttributeId,
    pub name: String,
    #[serde(default)]
    pub default_value: f64,
    #[serde(default = "default_true")]
    pub high_is_good: bool,
    /// Stackable attributes are exempt from stacking penalties.
    #[serde(default)]
    pub stackable: bool,
    #[serde(default)]
    pub unit: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Read an attribute, falling back to `default` when absent.
pub fn value_or(attributes: &AttributeMap, attribute_id: AttributeId, default: f64) -> f64 {
    attributes.get(&attribute_id).copied().unwrap_or(default)
}

/// Read an attribute, falling back to zero when absent.
pub fn value(attributes: &AttributeMap, attribute_id: AttributeId) -> f64 {
    value_or(attributes, attribute_id, 0.0)
}

/// The hull's attribute map at each pipeline stage. Each stage is a separate snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShipAttributes {
    pub type_id: TypeId,
    pub type_name: String,
    pub base_attributes: AttributeMap,
    pub skill_modified_attributes: AttributeMap,
    pub final_attributes: AttributeMap,
}

impl ShipAttributes {
    pub fn final_value(&self, attribute_id: AttributeId) -> f64 {
        value(&self.final_attributes, attribute_id)
    }

    /// Attributes whose final value differs from the base value, with (base, final).
    pub fn changed_attributes(&self) -> BTreeMap<AttributeId, (f64, f64)> {
        self.final_attributes
            .iter()
            .filter_map(|(id, final_value)| {
                let base = value(&self.base_attributes, *id);
                (base != *final_value).then_some((*id, (base, *final_value)))
            })
            .collect()
    }
}
