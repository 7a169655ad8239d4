//! The dogma pipeline: base attributes → skills → module effects → stacking → merge → derived stats.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::data::provider::StaticDataProvider;
use crate::dogma::attributes::{AttributeId, AttributeMap, ShipAttributes, TypeId};
use crate::dogma::diagnostics::Diagnostics;
use crate::dogma::fitting::{FleetBoosts, ImplantSet, ModuleFit, SkillSet, SlotType};
use crate::dogma::modifier::{Modifier, ModifierOp, ModifierStack};
use crate::dogma::stacking::{calculate_stacking_penalties, StackableModule, StackingAnalysis};
use crate::dogma::stats::{
    capacitor_stats, drone_stats, fitting_usage, navigation_stats, tank_stats, targeting_stats,
    weapon_from_module, weapon_performance, ApplicationTarget, CapacitorStats, DroneStats,
    FittingUsage, NavigationStats, ResolvedModule, TankStats, TargetingStats, WeaponPerformance,
};
use crate::error::{FittingError, FittingResult, PipelineStage};

/// Everything the pipeline derives for one fitting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComprehensiveFittingStats {
    pub ship: ShipAttributes,
    pub weapons: WeaponPerformance,
    pub tank: TankStats,
    pub navigation: NavigationStats,
    pub targeting: TargetingStats,
    pub capacitor: CapacitorStats,
    pub drones: DroneStats,
    pub fitting: FittingUsage,
    pub stacking: StackingAnalysis,
    /// Non-fatal findings. Empty means the fitting was computed without caveats.
    pub diagnostics: Diagnostics,
}

impl ComprehensiveFittingStats {
    pub fn is_partial(&self) -> bool {
        self.diagnostics.has_partial_data()
    }
}

/// Serializable form of one `calculate_fitting_stats` call, used by batch evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FittingRequest {
    pub ship_type_id: TypeId,
    #[serde(default)]
    pub modules: Vec<ModuleFit>,
    #[serde(default)]
    pub skills: SkillSet,
    #[serde(default)]
    pub implants: Option<ImplantSet>,
    #[serde(default)]
    pub boosts: Option<FleetBoosts>,
}

impl FittingRequest {
    pub fn new(ship_type_id: TypeId, modules: Vec<ModuleFit>, skills: SkillSet) -> Self {
        Self {
            ship_type_id,
            modules,
            skills,
            implants: None,
            boosts: None,
        }
    }
}

/// Stateless calculation engine around an injected static data provider.
/// Cloning is cheap and clones share the provider.
#[derive(Debug)]
pub struct DogmaEngine<P> {
    provider: Arc<P>,
    application_target: ApplicationTarget,
}

impl<P> Clone for DogmaEngine<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            application_target: self.application_target,
        }
    }
}

/// Collected module effects: stacking rows plus the operation each row came from.
struct CollectedEffects {
    rows: Vec<StackableModule>,
    ops: Vec<(ModifierOp, AttributeId)>,
}

impl<P: StaticDataProvider> DogmaEngine<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            application_target: ApplicationTarget::default(),
        }
    }

    /// Reference target used for applied DPS.
    pub fn with_application_target(mut self, target: ApplicationTarget) -> Self {
        self.application_target = target;
        self
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    pub fn application_target(&self) -> ApplicationTarget {
        self.application_target
    }

    pub fn calculate_fitting(&self, request: &FittingRequest) -> FittingResult<ComprehensiveFittingStats> {
        self.calculate_fitting_stats(
            request.ship_type_id,
            &request.modules,
            &request.skills,
            request.implants.as_ref(),
            request.boosts.as_ref(),
        )
    }

    /// Run the full pipeline. Fails only when the hull is unknown; unresolvable modules and
    /// charges are excluded and reported in [ComprehensiveFittingStats::diagnostics].
    pub fn calculate_fitting_stats(
        &self,
        ship_type_id: TypeId,
        modules: &[ModuleFit],
        skills: &SkillSet,
        implants: Option<&ImplantSet>,
        boosts: Option<&FleetBoosts>,
    ) -> FittingResult<ComprehensiveFittingStats> {
        let base_attributes = self.load_base_attributes(ship_type_id)?;
        let type_name = self
            .provider
            .type_name(ship_type_id)
            .unwrap_or_else(|| format!("Type {ship_type_id}"));

        let skill_modified_attributes = self.apply_skills(ship_type_id, &base_attributes, skills);

        let mut diagnostics = Diagnostics::default();
        let resolved = self.resolve_modules(modules, &mut diagnostics);
        let collected = self.collect_module_effects(&resolved);
        tracing::debug!(
            ship_type_id,
            modules = modules.len(),
            resolved = resolved.len(),
            rows = collected.rows.len(),
            "collected module effects"
        );

        let stacking = calculate_stacking_penalties(&collected.rows);
        tracing::debug!(
            ship_type_id,
            groups = stacking.groups.len(),
            efficiency = stacking.efficiency_percentage,
            "applied stacking penalties"
        );

        let final_attributes = self.merge_modifiers(
            &skill_modified_attributes,
            &stacking,
            &collected,
            implants,
            boosts,
        );

        let ship = ShipAttributes {
            type_id: ship_type_id,
            type_name,
            base_attributes,
            skill_modified_attributes,
            final_attributes,
        };

        let resolved = self.resolve_charges(resolved, &mut diagnostics);
        let stats = self.derive_stats(ship, resolved, stacking, diagnostics);
        tracing::debug!(
            ship_type_id,
            dps = stats.weapons.total_dps,
            ehp = stats.tank.effective_hp,
            valid = stats.fitting.is_valid,
            diagnostics = stats.diagnostics.len(),
            "derived fitting stats"
        );
        Ok(stats)
    }

    fn load_base_attributes(&self, ship_type_id: TypeId) -> FittingResult<AttributeMap> {
        let attributes = self
            .provider
            .get_type_attributes(ship_type_id)
            .ok_or_else(|| FittingError::not_found(ship_type_id, PipelineStage::LoadBaseAttributes))?;
        let attributes: AttributeMap = attributes.into_iter().collect();
        tracing::debug!(ship_type_id, attributes = attributes.len(), "loaded base attributes");
        Ok(attributes)
    }

    /// Hull skill bonuses, applied in provider order against the running value.
    fn apply_skills(&self, ship_type_id: TypeId, base: &AttributeMap, skills: &SkillSet) -> AttributeMap {
        let mut attributes = base.clone();
        let mut applied = 0usize;
        for bonus in self.provider.get_ship_skill_bonuses(ship_type_id) {
            let level = skills.level(bonus.skill_id);
            if level == 0 {
                continue;
            }
            if let Some(current) = attributes.get_mut(&bonus.attribute_id) {
                *current += *current * bonus.bonus_per_level * f64::from(level) / 100.0;
                applied += 1;
            }
        }
        tracing::debug!(ship_type_id, applied, "applied skill bonuses");
        attributes
    }

    fn resolve_modules(&self, modules: &[ModuleFit], diagnostics: &mut Diagnostics) -> Vec<ResolvedModule> {
        modules
            .iter()
            .filter_map(|fit| match self.provider.get_type_attributes(fit.type_id) {
                Some(attributes) => Some(ResolvedModule {
                    fit: *fit,
                    attributes: attributes.into_iter().collect(),
                    charge_attributes: None,
                }),
                None => {
                    diagnostics.partial_data(
                        PipelineStage::CollectModuleEffects,
                        fit.type_id,
                        format!("module type {} not found; excluded from fitting", fit.type_id),
                    );
                    None
                }
            })
            .collect()
    }

    /// One stacking row per (module, self-targeting effect, modifier) that applies in the
    /// module's current state. Only multiplicative operations on non-stackable attributes keep
    /// their stacking group.
    fn collect_module_effects(&self, modules: &[ResolvedModule]) -> CollectedEffects {
        let mut collected = CollectedEffects {
            rows: Vec::new(),
            ops: Vec::new(),
        };

        for module in modules.iter().filter(|m| m.fit.slot_type != SlotType::Drone) {
            let effects = self.provider.get_type_effects(module.fit.type_id).unwrap_or_default();
            for effect in effects
                .iter()
                .filter(|e| e.targets_self() && e.category.applies(module.fit.online, module.fit.active))
            {
                for modifier in &effect.modifiers {
                    let Some(raw) = module.attributes.get(&modifier.modifying_attribute_id) else {
                        continue;
                    };
                    let penalized = modifier.op.is_stackable()
                        && !self.attribute_is_stackable(modifier.modified_attribute_id);
                    let stacking_group_id = if penalized {
                        effect.stacking_group_id.unwrap_or(0)
                    } else {
                        0
                    };
                    collected.rows.push(StackableModule {
                        module_type_id: module.fit.type_id,
                        effect_id: effect.effect_id,
                        attribute_id: modifier.modified_attribute_id,
                        stacking_group_id,
                        // Non-multiplicative operations pass through unchanged.
                        bonus_amount: modifier.op.to_percent_bonus(*raw),
                    });
                    collected.ops.push((modifier.op, modifier.modified_attribute_id));
                }
            }
        }
        collected
    }

    fn attribute_is_stackable(&self, attribute_id: AttributeId) -> bool {
        self.provider
            .get_attribute_definition(attribute_id)
            .is_some_and(|definition| definition.stackable)
    }

    fn merge_modifiers(
        &self,
        attributes: &AttributeMap,
        stacking: &StackingAnalysis,
        collected: &CollectedEffects,
        implants: Option<&ImplantSet>,
        boosts: Option<&FleetBoosts>,
    ) -> AttributeMap {
        let mut stack = ModifierStack::new();
        for bonus in stacking.in_input_order() {
            let Some((op, attribute_id)) = collected.ops.get(bonus.input_index) else {
                continue;
            };
            let (op, value) = op.from_percent_bonus(bonus.penalized_bonus);
            stack.add(Modifier::new(*attribute_id, op, value));
        }
        if let Some(implants) = implants {
            stack.add_many(implants.modifiers());
        }
        if let Some(boosts) = boosts {
            stack.add_many(boosts.modifiers());
        }

        let defaults: AttributeMap = stacking
            .bonuses
            .iter()
            .map(|b| b.attribute_id)
            .chain(implants.into_iter().flat_map(|i| i.modifiers().map(|m| m.attribute_id)))
            .chain(boosts.into_iter().flat_map(|b| b.modifiers().map(|m| m.attribute_id)))
            .filter(|id| !attributes.contains_key(id))
            .filter_map(|id| {
                self.provider
                    .get_attribute_definition(id)
                    .map(|definition| (id, definition.default_value))
            })
            .collect();

        stack.apply(attributes, &defaults)
    }

    fn resolve_charges(&self, modules: Vec<ResolvedModule>, diagnostics: &mut Diagnostics) -> Vec<ResolvedModule> {
        modules
            .into_iter()
            .map(|mut module| {
                if let Some(charge_type_id) = module.fit.charge_type_id {
                    match self.provider.get_type_attributes(charge_type_id) {
                        Some(attributes) => {
                            module.charge_attributes = Some(attributes.into_iter().collect());
                        }
                        None => diagnostics.partial_data(
                            PipelineStage::ResolveCharges,
                            charge_type_id,
                            format!(
                                "charge type {charge_type_id} for module {} not found; counted as no damage",
                                module.fit.type_id
                            ),
                        ),
                    }
                }
                module
            })
            .collect()
    }

    fn derive_stats(
        &self,
        ship: ShipAttributes,
        modules: Vec<ResolvedModule>,
        stacking: StackingAnalysis,
        mut diagnostics: Diagnostics,
    ) -> ComprehensiveFittingStats {
        let attributes = &ship.final_attributes;

        let fitted_weapons = modules
            .iter()
            .filter_map(|module| weapon_from_module(module, attributes))
            .collect();
        let (drones, drone_weapons) = drone_stats(attributes, &modules, &mut diagnostics);
        let weapons = weapon_performance(fitted_weapons, drone_weapons, &self.application_target);

        let capacitor = capacitor_stats(attributes, &modules);
        let tank = tank_stats(attributes, &modules, &capacitor);
        let fitting = fitting_usage(attributes, &modules, &drones);
        for violation in &fitting.violations {
            diagnostics.fitting_constraint(None, violation.clone());
        }

        ComprehensiveFittingStats {
            navigation: navigation_stats(attributes),
            targeting: targeting_stats(attributes),
            weapons,
            tank,
            capacitor,
            drones,
            fitting,
            stacking,
            diagnostics,
            ship,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::{EffectCategory, EffectModifier, SkillBonus, TypeEffect};
    use crate::dogma::attributes::*;
    use crate::dogma::diagnostics::DiagnosticKind;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FixtureProvider {
        types: HashMap<TypeId, Vec<(AttributeId, f64)>>,
        effects: HashMap<TypeId, Vec<TypeEffect>>,
        bonuses: Vec<SkillBonus>,
    }

    impl StaticDataProvider for FixtureProvider {
        fn type_name(&self, type_id: TypeId) -> Option<String> {
            self.types.contains_key(&type_id).then(|| format!("Fixture {type_id}"))
        }

        fn get_type_attributes(&self, type_id: TypeId) -> Option<Vec<(AttributeId, f64)>> {
            self.types.get(&type_id).cloned()
        }

        fn get_type_effects(&self, type_id: TypeId) -> Option<Vec<TypeEffect>> {
            self.effects.get(&type_id).cloned()
        }

        fn get_ship_skill_bonuses(&self, _ship_type_id: TypeId) -> Vec<SkillBonus> {
            self.bonuses.clone()
        }
    }

    const HULL: TypeId = 1;
    const SPEED_MOD: TypeId = 10;

    fn velocity_effect(group: Option<StackingGroupId>) -> TypeEffect {
        TypeEffect {
            effect_id: 100,
            category: EffectCategory::Passive,
            is_offensive: false,
            is_assistance: false,
            stacking_group_id: group,
            modifiers: vec![EffectModifier {
                modified_attribute_id: MAX_VELOCITY,
                modifying_attribute_id: SPEED_MULTIPLIER,
                op: ModifierOp::PostMultiply,
            }],
        }
    }

    fn provider() -> FixtureProvider {
        let mut provider = FixtureProvider::default();
        provider.types.insert(
            HULL,
            vec![(MAX_VELOCITY, 100.0), (LOW_SLOTS, 4.0), (CPU_OUTPUT, 100.0), (POWER_OUTPUT, 50.0)],
        );
        provider
            .types
            .insert(SPEED_MOD, vec![(SPEED_MULTIPLIER, 1.1), (CPU, 10.0)]);
        provider.effects.insert(SPEED_MOD, vec![velocity_effect(Some(7))]);
        provider.bonuses.push(SkillBonus {
            skill_id: 3300,
            attribute_id: MAX_VELOCITY,
            bonus_per_level: 5.0,
        });
        provider
    }

    fn engine() -> DogmaEngine<FixtureProvider> {
        DogmaEngine::new(Arc::new(provider()))
    }

    #[test]
    fn unknown_hull_is_not_found_at_load_stage() {
        let err = engine()
            .calculate_fitting_stats(999, &[], &SkillSet::new(), None, None)
            .unwrap_err();
        match err {
            FittingError::NotFound { type_id, stage } => {
                assert_eq!(type_id, 999);
                assert_eq!(stage, PipelineStage::LoadBaseAttributes);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn skill_bonus_uses_value_times_bonus_times_level() {
        let skills = SkillSet::new().with_level(3300, 4);
        let stats = engine()
            .calculate_fitting_stats(HULL, &[], &skills, None, None)
            .expect("stats");
        // 100 + 100 * 5 * 4 / 100
        assert_eq!(stats.ship.skill_modified_attributes[&MAX_VELOCITY], 120.0);
        assert_eq!(stats.ship.base_attributes[&MAX_VELOCITY], 100.0);
    }

    #[test]
    fn same_group_modules_are_penalized() {
        let modules = vec![ModuleFit::online(SPEED_MOD, SlotType::Low); 2];
        let stats = engine()
            .calculate_fitting_stats(HULL, &modules, &SkillSet::new(), None, None)
            .expect("stats");
        let expected = 100.0 * 1.1 * (1.0 + 0.1 * crate::dogma::stacking::penalty_factor(1));
        assert!((stats.ship.final_value(MAX_VELOCITY) - expected).abs() < 1e-9);
        assert_eq!(stats.stacking.groups.len(), 1);
    }

    #[test]
    fn offline_modules_add_no_effects_but_use_slots() {
        let modules = vec![ModuleFit::offline(SPEED_MOD, SlotType::Low)];
        let stats = engine()
            .calculate_fitting_stats(HULL, &modules, &SkillSet::new(), None, None)
            .expect("stats");
        assert_eq!(stats.ship.final_value(MAX_VELOCITY), 100.0);
        assert_eq!(stats.fitting.slots[&SlotType::Low].used, 1);
        assert_eq!(stats.fitting.cpu.used, 0.0);
    }

    #[test]
    fn unknown_module_is_skipped_with_diagnostic() {
        let modules = vec![
            ModuleFit::online(SPEED_MOD, SlotType::Low),
            ModuleFit::online(4242, SlotType::Low),
        ];
        let stats = engine()
            .calculate_fitting_stats(HULL, &modules, &SkillSet::new(), None, None)
            .expect("partial success");
        assert!(stats.is_partial());
        assert_eq!(stats.diagnostics.skipped_type_ids(), vec![4242]);
        assert!((stats.ship.final_value(MAX_VELOCITY) - 110.0).abs() < 1e-9);
    }

    #[test]
    fn implants_then_boosts_apply_after_modules() {
        let implants = ImplantSet::default().with_implant(6, vec![Modifier::percent(MAX_VELOCITY, 10.0)]);
        let boosts = FleetBoosts::default().with_boost("speed", vec![Modifier::add(MAX_VELOCITY, 5.0)]);
        let stats = engine()
            .calculate_fitting_stats(HULL, &[], &SkillSet::new(), Some(&implants), Some(&boosts))
            .expect("stats");
        // Flat additions land in the pre pass: (100 + 5) * 1.1
        assert!((stats.ship.final_value(MAX_VELOCITY) - 115.5).abs() < 1e-9);
    }

    #[test]
    fn overloaded_fitting_reports_constraint() {
        let modules = vec![ModuleFit::online(SPEED_MOD, SlotType::Low); 5];
        let stats = engine()
            .calculate_fitting_stats(HULL, &modules, &SkillSet::new(), None, None)
            .expect("stats");
        assert!(!stats.fitting.is_valid);
        assert!(stats
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::FittingConstraint));
        assert!(!stats.is_partial());
    }

    #[test]
    fn no_weapons_is_a_true_zero() {
        let stats = engine()
            .calculate_fitting_stats(HULL, &[], &SkillSet::new(), None, None)
            .expect("stats");
        assert_eq!(stats.weapons.weapon_count, 0);
        assert_eq!(stats.weapons.total_dps, 0.0);
    }
}
