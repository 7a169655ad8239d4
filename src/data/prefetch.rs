//! Resolve every static data lookup one fitting needs before any calculation starts.

use std::collections::{BTreeSet, HashMap};

use crate::data::provider::{AsyncStaticDataProvider, SkillBonus, StaticDataProvider, TypeEffect};
use crate::dogma::attributes::{AttributeDefinition, AttributeId, TypeId};
use crate::dogma::engine::FittingRequest;
use crate::error::{FittingError, FittingResult, PipelineStage};

/// Fully awaited static data for one fitting. A synchronous provider, so the engine runs on it
/// without touching the asynchronous source again.
#[derive(Debug, Clone, Default)]
pub struct ResolvedFittingData {
    names: HashMap<TypeId, String>,
    attributes: HashMap<TypeId, Vec<(AttributeId, f64)>>,
    effects: HashMap<TypeId, Vec<TypeEffect>>,
    skill_bonuses: HashMap<TypeId, Vec<SkillBonus>>,
    definitions: HashMap<AttributeId, AttributeDefinition>,
    prices: HashMap<TypeId, f64>,
}

impl ResolvedFittingData {
    pub fn contains_type(&self, type_id: TypeId) -> bool {
        self.attributes.contains_key(&type_id)
    }

    pub fn type_count(&self) -> usize {
        self.attributes.len()
    }
}

impl StaticDataProvider for ResolvedFittingData {
    fn type_name(&self, type_id: TypeId) -> Option<String> {
        self.names.get(&type_id).cloned()
    }

    fn get_type_attributes(&self, type_id: TypeId) -> Option<Vec<(AttributeId, f64)>> {
        self.attributes.get(&type_id).cloned()
    }

    fn get_type_effects(&self, type_id: TypeId) -> Option<Vec<TypeEffect>> {
        self.effects.get(&type_id).cloned()
    }

    fn get_ship_skill_bonuses(&self, ship_type_id: TypeId) -> Vec<SkillBonus> {
        self.skill_bonuses
            .get(&ship_type_id)
            .cloned()
            .unwrap_or_default()
    }

    fn get_attribute_definition(&self, attribute_id: AttributeId) -> Option<AttributeDefinition> {
        self.definitions.get(&attribute_id).cloned()
    }

    fn get_type_price(&self, type_id: TypeId) -> Option<f64> {
        self.prices.get(&type_id).copied()
    }
}

async fn fetch_type<A: AsyncStaticDataProvider>(
    provider: &A,
    type_id: TypeId,
    data: &mut ResolvedFittingData,
) -> bool {
    let Some(attributes) = provider.get_type_attributes(type_id).await else {
        return false;
    };
    data.attributes.insert(type_id, attributes);
    if let Some(name) = provider.type_name(type_id).await {
        data.names.insert(type_id, name);
    }
    if let Some(effects) = provider.get_type_effects(type_id).await {
        data.effects.insert(type_id, effects);
    }
    if let Some(price) = provider.get_type_price(type_id).await {
        data.prices.insert(type_id, price);
    }
    true
}

/// Await the hull, every module and charge, the hull's skill bonuses and the definitions of
/// every attribute a modifier targets. Unknown modules and charges are left out so the engine
/// reports them; an unknown hull fails here.
pub async fn prefetch_fitting<A: AsyncStaticDataProvider>(
    provider: &A,
    request: &FittingRequest,
) -> FittingResult<ResolvedFittingData> {
    let mut data = ResolvedFittingData::default();
    let ship_type_id = request.ship_type_id;

    if !fetch_type(provider, ship_type_id, &mut data).await {
        return Err(FittingError::not_found(ship_type_id, PipelineStage::Prefetch));
    }
    data.skill_bonuses.insert(
        ship_type_id,
        provider.get_ship_skill_bonuses(ship_type_id).await,
    );

    let type_ids: BTreeSet<TypeId> = request
        .modules
        .iter()
        .flat_map(|module| std::iter::once(module.type_id).chain(module.charge_type_id))
        .filter(|type_id| *type_id != ship_type_id)
        .collect();
    let mut missing = 0usize;
    for type_id in type_ids {
        if !fetch_type(provider, type_id, &mut data).await {
            missing += 1;
        }
    }

    let attribute_ids: BTreeSet<AttributeId> = data
        .effects
        .values()
        .flatten()
        .flat_map(|effect| effect.modifiers.iter().map(|m| m.modified_attribute_id))
        .chain(
            request
                .implants
                .iter()
                .flat_map(|implants| implants.modifiers().map(|m| m.attribute_id)),
        )
        .chain(
            request
                .boosts
                .iter()
                .flat_map(|boosts| boosts.modifiers().map(|m| m.attribute_id)),
        )
        .collect();
    for attribute_id in attribute_ids {
        if let Some(definition) = provider.get_attribute_definition(attribute_id).await {
            data.definitions.insert(attribute_id, definition);
        }
    }

    tracing::debug!(
        ship_type_id,
        types = data.type_count(),
        missing,
        definitions = data.definitions.len(),
        "prefetched fitting data"
    );
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dogma::attributes::MAX_VELOCITY;

    #[test]
    fn resolved_data_answers_synchronously() {
        let mut data = ResolvedFittingData::default();
        data.attributes.insert(1, vec![(MAX_VELOCITY, 300.0)]);
        data.names.insert(1, "Hull".into());

        assert!(data.contains_type(1));
        assert_eq!(data.type_name(1).as_deref(), Some("Hull"));
        assert_eq!(data.get_type_attributes(1), Some(vec![(MAX_VELOCITY, 300.0)]));
        assert!(data.get_ship_skill_bonuses(1).is_empty());
        assert_eq!(data.get_type_effects(2), None);
    }
}
