//! Per-call inputs to the dogma pipeline: fitted modules, trained skills, implants and fleet boosts.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dogma::attributes::{
    AttributeId, SkillId, TypeId, HI_SLOTS, LOW_SLOTS, MAX_SUBSYSTEMS, MED_SLOTS, RIG_SLOTS,
    SERVICE_SLOTS,
};
use crate::dogma::modifier::Modifier;

pub const MAX_SKILL_LEVEL: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotType {
    High,
    Mid,
    Low,
    Rig,
    Subsystem,
    Service,
    /// Drone bay entry; occupies bay volume rather than a slot.
    Drone,
}

impl SlotType {
    pub const FITTED: [SlotType; 6] = [
        SlotType::High,
        SlotType::Mid,
        SlotType::Low,
        SlotType::Rig,
        SlotType::Subsystem,
        SlotType::Service,
    ];

    /// Hull attribute that holds the slot count, None for the drone bay.
    pub const fn capacity_attribute(self) -> Option<AttributeId> {
        match self {
            Self::High => Some(HI_SLOTS),
            Self::Mid => Some(MED_SLOTS),
            Self::Low => Some(LOW_SLOTS),
            Self::Rig => Some(RIG_SLOTS),
            Self::Subsystem => Some(MAX_SUBSYSTEMS),
            Self::Service => Some(SERVICE_SLOTS),
            Self::Drone => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Mid => "mid",
            Self::Low => "low",
            Self::Rig => "rig",
            Self::Subsystem => "subsystem",
            Self::Service => "service",
            Self::Drone => "drone",
        }
    }
}

impl fmt::Display for SlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A module instance attached to a fitting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModuleFit {
    pub type_id: TypeId,
    pub slot_type: SlotType,
    #[serde(default = "default_true")]
    pub online: bool,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub charge_type_id: Option<TypeId>,
}

fn default_true() -> bool {
    true
}

impl ModuleFit {
    /// Online but not activated.
    pub fn online(type_id: TypeId, slot_type: SlotType) -> Self {
        Self {
            type_id,
            slot_type,
            online: true,
            active: false,
            charge_type_id: None,
        }
    }

    pub fn active(type_id: TypeId, slot_type: SlotType) -> Self {
        Self {
            active: true,
            ..Self::online(type_id, slot_type)
        }
    }

    pub fn offline(type_id: TypeId, slot_type: SlotType) -> Self {
        Self {
            online: false,
            ..Self::online(type_id, slot_type)
        }
    }

    pub fn with_charge(self, charge_type_id: TypeId) -> Self {
        Self {
            charge_type_id: Some(charge_type_id),
            ..self
        }
    }

    /// Active implies online: an offline module never counts as active.
    pub fn is_active(&self) -> bool {
        self.online && self.active
    }
}

/// Trained skill levels. Levels above 5 are clamped on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillSet {
    #[serde(default)]
    levels: BTreeMap<SkillId, u8>,
}

impl SkillSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, skill_id: SkillId, level: u8) -> Self {
        self.set_level(skill_id, level);
        self
    }

    pub fn set_level(&mut self, skill_id: SkillId, level: u8) {
        self.levels.insert(skill_id, level.min(MAX_SKILL_LEVEL));
    }

    pub fn level(&self, skill_id: SkillId) -> u8 {
        self.levels
            .get(&skill_id)
            .copied()
            .unwrap_or(0)
            .min(MAX_SKILL_LEVEL)
    }

    /// Every skill trained to level 5.
    pub fn all_level_five<I>(skill_ids: I) -> Self
    where
        I: IntoIterator<Item = SkillId>,
    {
        let mut skills = Self::new();
        for skill_id in skill_ids {
            skills.set_level(skill_id, MAX_SKILL_LEVEL);
        }
        skills
    }

    pub fn iter(&self) -> impl Iterator<Item = (SkillId, u8)> + '_ {
        self.levels.iter().map(|(id, level)| (*id, *level))
    }
}

impl FromIterator<(SkillId, u8)> for SkillSet {
    fn from_iter<T: IntoIterator<Item = (SkillId, u8)>>(iter: T) -> Self {
        let mut skills = Self::new();
        for (skill_id, level) in iter {
            skills.set_level(skill_id, level);
        }
        skills
    }
}

/// Implant slot (1..=10) → attribute modifiers granted by the implant in that slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImplantSet {
    #[serde(default)]
    pub slots: BTreeMap<u8, Vec<Modifier>>,
}

impl ImplantSet {
    pub fn with_implant(mut self, slot: u8, modifiers: Vec<Modifier>) -> Self {
        self.slots.insert(slot, modifiers);
        self
    }

    pub fn modifiers(&self) -> impl Iterator<Item = Modifier> + '_ {
        self.slots.values().flatten().copied()
    }
}

/// Fleet boost type → attribute modifiers applied to the ship.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetBoosts {
    #[serde(default)]
    pub boosts: BTreeMap<String, Vec<Modifier>>,
}

impl FleetBoosts {
    pub fn with_boost(mut self, boost_type: impl Into<String>, modifiers: Vec<Modifier>) -> Self {
        self.boosts.insert(boost_type.into(), modifiers);
        self
    }

    pub fn modifiers(&self) -> impl Iterator<Item = Modifier> + '_ {
        self.boosts.values().flatten().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skill_levels_are_clamped() {
        let skills = SkillSet::new().with_level(3300, 9).with_level(3301, 2);
        assert_eq!(skills.level(3300), 5);
        assert_eq!(skills.level(3301), 2);
        assert_eq!(skills.level(9999), 0);
    }

    #[test]
    fn offline_modules_are_never_active() {
        let module = ModuleFit {
            active: true,
            ..ModuleFit::offline(1, SlotType::Mid)
        };
        assert!(!module.is_active());
        assert!(ModuleFit::active(1, SlotType::Mid).is_active());
    }

    #[test]
    fn implant_and_boost_modifiers_iterate_in_key_order() {
        let implants = ImplantSet::default()
            .with_implant(7, vec![Modifier::percent(37, 5.0)])
            .with_implant(2, vec![Modifier::percent(37, 3.0)]);
        let values: Vec<f64> = implants.modifiers().map(|m| m.value).collect();
        assert_eq!(values, vec![3.0, 5.0]);

        let boosts = FleetBoosts::default().with_boost("skirmish", vec![Modifier::percent(552, -10.0)]);
        assert_eq!(boosts.modifiers().count(), 1);
    }

    #[test]
    fn module_fit_deserializes_with_defaults() {
        let module: ModuleFit =
            serde_json::from_str(r#"{"type_id": 2881, "slot_type": "high"}"#).expect("parse");
        assert!(module.online);
        assert!(!module.active);
        assert_eq!(module.charge_type_id, None);
    }
}
