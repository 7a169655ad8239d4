//! Static data provider: the read-only source of type attributes, effects and hull skill bonuses.
//! The engine only talks to this trait; [crate::data::StaticDataSnapshot] is the in-memory
//! implementation and [crate::data::ResolvedFittingData] the prefetched one.

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dogma::attributes::{
    AttributeDefinition, AttributeId, EffectId, SkillId, StackingGroupId, TypeId,
};
use crate::dogma::modifier::ModifierOp;

/// When an effect applies to its module's ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectCategory {
    /// Applies while the module is fitted and online.
    Passive,
    /// Applies while the module is online.
    Online,
    /// Applies only while the module is activated.
    Active,
}

impl EffectCategory {
    pub fn applies(self, online: bool, active: bool) -> bool {
        match self {
            Self::Passive | Self::Online => online,
            Self::Active => online && active,
        }
    }
}

/// One attribute change carried by an effect: the ship's `modified_attribute_id` is changed by
/// the module's own `modifying_attribute_id` value using `op`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectModifier {
    pub modified_attribute_id: AttributeId,
    pub modifying_attribute_id: AttributeId,
    pub op: ModifierOp,
}

/// An effect carried by a module type, with its stacking group already resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeEffect {
    pub effect_id: EffectId,
    pub category: EffectCategory,
    #[serde(default)]
    pub is_offensive: bool,
    #[serde(default)]
    pub is_assistance: bool,
    #[serde(default)]
    pub stacking_group_id: Option<StackingGroupId>,
    #[serde(default)]
    pub modifiers: Vec<EffectModifier>,
}

impl TypeEffect {
    /// Offensive and assistance effects target other ships and never modify the fitting ship.
    pub fn targets_self(&self) -> bool {
        !self.is_offensive && !self.is_assistance
    }
}

/// Per-level hull bonus: `value * bonus_per_level * level / 100` is added to the attribute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkillBonus {
    pub skill_id: SkillId,
    pub attribute_id: AttributeId,
    pub bonus_per_level: f64,
}

/// Synchronous read access to static data. Lookups return None for unknown types.
pub trait StaticDataProvider: Send + Sync {
    fn type_name(&self, type_id: TypeId) -> Option<String>;

    fn get_type_attributes(&self, type_id: TypeId) -> Option<Vec<(AttributeId, f64)>>;

    fn get_type_effects(&self, type_id: TypeId) -> Option<Vec<TypeEffect>>;

    fn get_ship_skill_bonuses(&self, ship_type_id: TypeId) -> Vec<SkillBonus>;

    fn get_attribute_definition(&self, _attribute_id: AttributeId) -> Option<AttributeDefinition> {
        None
    }

    /// Estimated market price in ISK, when the provider knows one.
    fn get_type_price(&self, _type_id: TypeId) -> Option<f64> {
        None
    }
}

impl<P: StaticDataProvider + ?Sized> StaticDataProvider for Arc<P> {
    fn type_name(&self, type_id: TypeId) -> Option<String> {
        (**self).type_name(type_id)
    }

    fn get_type_attributes(&self, type_id: TypeId) -> Option<Vec<(AttributeId, f64)>> {
        (**self).get_type_attributes(type_id)
    }

    fn get_type_effects(&self, type_id: TypeId) -> Option<Vec<TypeEffect>> {
        (**self).get_type_effects(type_id)
    }

    fn get_ship_skill_bonuses(&self, ship_type_id: TypeId) -> Vec<SkillBonus> {
        (**self).get_ship_skill_bonuses(ship_type_id)
    }

    fn get_attribute_definition(&self, attribute_id: AttributeId) -> Option<AttributeDefinition> {
        (**self).get_attribute_definition(attribute_id)
    }

    fn get_type_price(&self, type_id: TypeId) -> Option<f64> {
        (**self).get_type_price(type_id)
    }
}

/// Asynchronous counterpart used by hosted deployments where static data sits behind I/O.
/// Results are gathered by [crate::data::prefetch_fitting] before any calculation starts.
pub trait AsyncStaticDataProvider: Send + Sync {
    fn type_name(&self, type_id: TypeId) -> impl Future<Output = Option<String>> + Send;

    fn get_type_attributes(
        &self,
        type_id: TypeId,
    ) -> impl Future<Output = Option<Vec<(AttributeId, f64)>>> + Send;

    fn get_type_effects(
        &self,
        type_id: TypeId,
    ) -> impl Future<Output = Option<Vec<TypeEffect>>> + Send;

    fn get_ship_skill_bonuses(
        &self,
        ship_type_id: TypeId,
    ) -> impl Future<Output = Vec<SkillBonus>> + Send;

    fn get_attribute_definition(
        &self,
        attribute_id: AttributeId,
    ) -> impl Future<Output = Option<AttributeDefinition>> + Send;

    fn get_type_price(&self, type_id: TypeId) -> impl Future<Output = Option<f64>> + Send;
}
