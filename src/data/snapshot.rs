//! Startup-loaded static data snapshot and the handle that shares it.
//! Load once, share via Arc with every engine; reloading builds a new snapshot and swaps it in whole.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::data::provider::{EffectCategory, EffectModifier, SkillBonus, StaticDataProvider, TypeEffect};
use crate::dogma::attributes::{
    AttributeDefinition, AttributeId, AttributeMap, EffectId, StackingGroupId, TypeId,
};
use crate::error::{FittingError, FittingResult};

pub const DEFAULT_STATIC_DATA_PATH: &str = "data/static_data.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectDefinition {
    pub effect_id: EffectId,
    #[serde(default)]
    pub name: String,
    pub category: EffectCategory,
    #[serde(default)]
    pub is_offensive: bool,
    #[serde(default)]
    pub is_assistance: bool,
    /// Explicit group; when absent the stacking group table decides.
    #[serde(default)]
    pub stacking_group_id: Option<StackingGroupId>,
    #[serde(default)]
    pub modifiers: Vec<EffectModifier>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackingGroup {
    pub stacking_group_id: StackingGroupId,
    #[serde(default)]
    pub name: String,
    pub effect_ids: Vec<EffectId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeRecord {
    pub type_id: TypeId,
    pub name: String,
    #[serde(default)]
    pub attributes: AttributeMap,
    #[serde(default)]
    pub effect_ids: Vec<EffectId>,
    #[serde(default)]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShipSkillBonus {
    pub ship_type_id: TypeId,
    pub skill_id: u32,
    pub attribute_id: AttributeId,
    pub bonus_per_level: f64,
}

/// On-disk layout of a static data export.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticDataFile {
    #[serde(default)]
    pub data_version: Option<String>,
    #[serde(default)]
    pub attributes: Vec<AttributeDefinition>,
    #[serde(default)]
    pub effects: Vec<EffectDefinition>,
    #[serde(default)]
    pub stacking_groups: Vec<StackingGroup>,
    #[serde(default)]
    pub types: Vec<TypeRecord>,
    #[serde(default)]
    pub ship_skill_bonuses: Vec<ShipSkillBonus>,
}

/// Indexed, immutable static data. Implements [StaticDataProvider].
#[derive(Debug, Clone, Default)]
pub struct StaticDataSnapshot {
    pub data_version: Option<String>,
    attributes: BTreeMap<AttributeId, AttributeDefinition>,
    effects: BTreeMap<EffectId, EffectDefinition>,
    stacking_groups: BTreeMap<StackingGroupId, StackingGroup>,
    effect_groups: HashMap<EffectId, StackingGroupId>,
    types: BTreeMap<TypeId, TypeRecord>,
    skill_bonuses: HashMap<TypeId, Vec<SkillBonus>>,
}

impl StaticDataSnapshot {
    pub fn from_file(file: StaticDataFile) -> Self {
        let mut effect_groups = HashMap::new();
        for group in &file.stacking_groups {
            for effect_id in &group.effect_ids {
                effect_groups
                    .entry(*effect_id)
                    .or_insert(group.stacking_group_id);
            }
        }

        let mut skill_bonuses: HashMap<TypeId, Vec<SkillBonus>> = HashMap::new();
        for bonus in &file.ship_skill_bonuses {
            skill_bonuses
                .entry(bonus.ship_type_id)
                .or_default()
                .push(SkillBonus {
                    skill_id: bonus.skill_id,
                    attribute_id: bonus.attribute_id,
                    bonus_per_level: bonus.bonus_per_level,
                });
        }

        Self {
            data_version: file.data_version,
            attributes: file
                .attributes
                .into_iter()
                .map(|a| (a.attribute_id, a))
                .collect(),
            effects: file.effects.into_iter().map(|e| (e.effect_id, e)).collect(),
            stacking_groups: file
                .stacking_groups
                .into_iter()
                .map(|g| (g.stacking_group_id, g))
                .collect(),
            effect_groups,
            types: file.types.into_iter().map(|t| (t.type_id, t)).collect(),
            skill_bonuses,
        }
    }

    pub fn from_json_str(raw: &str) -> FittingResult<Self> {
        let file: StaticDataFile = serde_json::from_str(raw)?;
        Ok(Self::from_file(file))
    }

    /// Load a static data export from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> FittingResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| FittingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot = Self::from_json_str(&raw)?;
        tracing::info!(
            path = %path.display(),
            types = snapshot.types.len(),
            effects = snapshot.effects.len(),
            data_version = snapshot.data_version.as_deref().unwrap_or("unknown"),
            "loaded static data snapshot"
        );
        Ok(snapshot)
    }

    pub fn type_record(&self, type_id: TypeId) -> Option<&TypeRecord> {
        self.types.get(&type_id)
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeRecord> {
        self.types.values()
    }

    pub fn effect(&self, effect_id: EffectId) -> Option<&EffectDefinition> {
        self.effects.get(&effect_id)
    }

    pub fn effects(&self) -> impl Iterator<Item = &EffectDefinition> {
        self.effects.values()
    }

    pub fn attribute_definitions(&self) -> impl Iterator<Item = &AttributeDefinition> {
        self.attributes.values()
    }

    pub fn stacking_groups(&self) -> impl Iterator<Item = &StackingGroup> {
        self.stacking_groups.values()
    }

    pub fn skill_bonus_hulls(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.skill_bonuses.keys().copied()
    }

    /// Group an effect is penalized in: its explicit group, else stacking group table membership.
    pub fn stacking_group_for(&self, effect_id: EffectId) -> Option<StackingGroupId> {
        self.effects
            .get(&effect_id)
            .and_then(|effect| effect.stacking_group_id)
            .or_else(|| self.effect_groups.get(&effect_id).copied())
    }

    fn resolve_effect(&self, effect: &EffectDefinition) -> TypeEffect {
        TypeEffect {
            effect_id: effect.effect_id,
            category: effect.category,
            is_offensive: effect.is_offensive,
            is_assistance: effect.is_assistance,
            stacking_group_id: self.stacking_group_for(effect.effect_id),
            modifiers: effect.modifiers.clone(),
        }
    }
}

impl StaticDataProvider for StaticDataSnapshot {
    fn type_name(&self, type_id: TypeId) -> Option<String> {
        self.types.get(&type_id).map(|record| record.name.clone())
    }

    fn get_type_attributes(&self, type_id: TypeId) -> Option<Vec<(AttributeId, f64)>> {
        self.types
            .get(&type_id)
            .map(|record| record.attributes.iter().map(|(id, v)| (*id, *v)).collect())
    }

    /// Effect IDs without a definition are dropped; the type itself still resolves.
    fn get_type_effects(&self, type_id: TypeId) -> Option<Vec<TypeEffect>> {
        let record = self.types.get(&type_id)?;
        Some(
            record
                .effect_ids
                .iter()
                .filter_map(|effect_id| self.effects.get(effect_id))
                .map(|effect| self.resolve_effect(effect))
                .collect(),
        )
    }

    fn get_ship_skill_bonuses(&self, ship_type_id: TypeId) -> Vec<SkillBonus> {
        self.skill_bonuses
            .get(&ship_type_id)
            .cloned()
            .unwrap_or_default()
    }

    fn get_attribute_definition(&self, attribute_id: AttributeId) -> Option<AttributeDefinition> {
        self.attributes.get(&attribute_id).cloned()
    }

    fn get_type_price(&self, type_id: TypeId) -> Option<f64> {
        self.types.get(&type_id).and_then(|record| record.price)
    }
}

/// Shared, swappable reference to an immutable snapshot. Readers clone the Arc and keep
/// a consistent view for the whole calculation; [SnapshotHandle::replace] never mutates
/// a snapshot in place.
#[derive(Debug)]
pub struct SnapshotHandle<T> {
    inner: RwLock<Arc<T>>,
}

impl<T> SnapshotHandle<T> {
    pub fn new(snapshot: T) -> Self {
        Self {
            inner: RwLock::new(Arc::new(snapshot)),
        }
    }

    pub fn current(&self) -> Arc<T> {
        let guard = self
            .inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    /// Swap in a new snapshot, returning the previous one.
    pub fn replace(&self, snapshot: T) -> Arc<T> {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let previous = std::mem::replace(&mut *guard, Arc::new(snapshot));
        tracing::info!("replaced shared snapshot");
        previous
    }
}
