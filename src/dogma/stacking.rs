//! Stacking penalty engine.
//!
//! Bonuses in the same stacking group that modify the same attribute compete for one
//! diminishing-returns curve: the strongest bonus applies in full, the n-th strongest is scaled by
//! `exp(-(n-1)^2 / 7.1289)`. Entries with group `<= 0` are passed through untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dogma::attributes::{AttributeId, EffectId, StackingGroupId, TypeId};

/// `2.67^2`, the denominator of the stacking exponent.
pub const STACKING_PENALTY_DENOMINATOR: f64 = 7.1289;

const CROWDED_GROUP_SIZE: usize = 3;
const HEAVY_AVERAGE_PENALTY_PERCENTAGE: f64 = 50.0;
const OPTIMAL_COUNT_SEARCH_LIMIT: usize = 10;

/// Penalty factor for a zero-based position within a sorted stacking group.
pub fn penalty_factor(position: usize) -> f64 {
    if position == 0 {
        return 1.0;
    }
    let i = position as f64;
    (-(i * i) / STACKING_PENALTY_DENOMINATOR).exp()
}

/// One (module, effect) contribution to a stacking calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StackableModule {
    pub module_type_id: TypeId,
    pub effect_id: EffectId,
    pub attribute_id: AttributeId,
    pub stacking_group_id: StackingGroupId,
    pub bonus_amount: f64,
}

impl StackableModule {
    /// Group this entry is penalized in, or None when it bypasses penalties.
    pub fn effective_group(&self) -> Option<StackingGroupId> {
        (self.stacking_group_id > 0).then_some(self.stacking_group_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PenalizedBonus {
    pub module_type_id: TypeId,
    pub effect_id: EffectId,
    pub attribute_id: AttributeId,
    /// Normalized group: malformed IDs are reported as 0.
    pub stacking_group_id: StackingGroupId,
    /// Zero-based position within the sorted group; None for unpenalized entries.
    pub position: Option<usize>,
    pub penalty_factor: f64,
    pub original_bonus: f64,
    pub penalized_bonus: f64,
    /// Index of the entry in the input slice.
    pub input_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackingGroupSummary {
    pub stacking_group_id: StackingGroupId,
    pub attribute_id: AttributeId,
    pub module_count: usize,
    pub total_original_bonus: f64,
    pub total_penalized_bonus: f64,
    /// Mean of `(1 - penalty factor) * 100` over the group's entries.
    pub average_penalty_percentage: f64,
    /// Whether the input listed this group's entries strongest-first.
    pub input_sorted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackingAnalysis {
    /// Penalized groups by ascending (group, attribute) in position order, then unpenalized entries in input order.
    pub bonuses: Vec<PenalizedBonus>,
    pub groups: Vec<StackingGroupSummary>,
    pub total_original_bonus: f64,
    pub total_penalized_bonus: f64,
    pub efficiency_percentage: f64,
    pub recommendations: Vec<String>,
}

impl StackingAnalysis {
    /// Penalized bonuses reordered to match the input slice.
    pub fn in_input_order(&self) -> Vec<PenalizedBonus> {
        let mut ordered = self.bonuses.clone();
        ordered.sort_by_key(|bonus| bonus.input_index);
        ordered
    }

    /// First summary for `stacking_group_id`, lowest attribute ID first.
    pub fn group(&self, stacking_group_id: StackingGroupId) -> Option<&StackingGroupSummary> {
        self.groups
            .iter()
            .find(|group| group.stacking_group_id == stacking_group_id)
    }

    pub fn group_for_attribute(
        &self,
        stacking_group_id: StackingGroupId,
        attribute_id: AttributeId,
    ) -> Option<&StackingGroupSummary> {
        self.groups.iter().find(|group| {
            group.stacking_group_id == stacking_group_id && group.attribute_id == attribute_id
        })
    }
}

/// Apply stacking penalties to a flat list of contributions. Never fails.
///
/// Entries compete only when they share both stacking group and modified attribute, so one
/// effect touching several attributes is never penalized against itself.
pub fn calculate_stacking_penalties(modules: &[StackableModule]) -> StackingAnalysis {
    let mut grouped: BTreeMap<(StackingGroupId, AttributeId), Vec<(usize, &StackableModule)>> =
        BTreeMap::new();
    let mut unpenalized = Vec::new();

    for (index, module) in modules.iter().enumerate() {
        match module.effective_group() {
            Some(group) => grouped
                .entry((group, module.attribute_id))
                .or_default()
                .push((index, module)),
            None => unpenalized.push(PenalizedBonus {
                module_type_id: module.module_type_id,
                effect_id: module.effect_id,
                attribute_id: module.attribute_id,
                stacking_group_id: 0,
                position: None,
                penalty_factor: 1.0,
                original_bonus: module.bonus_amount,
                penalized_bonus: module.bonus_amount,
                input_index: index,
            }),
        }
    }

    let mut bonuses = Vec::with_capacity(modules.len());
    let mut groups = Vec::with_capacity(grouped.len());
    let mut recommendations = Vec::new();

    for ((group_id, attribute_id), mut entries) in grouped {
        let input_sorted = entries
            .windows(2)
            .all(|pair| pair[0].1.bonus_amount.abs() >= pair[1].1.bonus_amount.abs());

        entries.sort_by(|(left_index, left), (right_index, right)| {
            right
                .bonus_amount
                .abs()
                .total_cmp(&left.bonus_amount.abs())
                .then_with(|| left.module_type_id.cmp(&right.module_type_id))
                .then_with(|| left.effect_id.cmp(&right.effect_id))
                .then_with(|| left_index.cmp(right_index))
        });

        let mut group_original = 0.0;
        let mut group_penalized = 0.0;
        let mut penalty_sum = 0.0;
        for (position, (index, module)) in entries.iter().enumerate() {
            let factor = penalty_factor(position);
            let penalized = module.bonus_amount * factor;
            group_original += module.bonus_amount.abs();
            group_penalized += penalized.abs();
            penalty_sum += (1.0 - factor) * 100.0;
            bonuses.push(PenalizedBonus {
                module_type_id: module.module_type_id,
                effect_id: module.effect_id,
                attribute_id: module.attribute_id,
                stacking_group_id: group_id,
                position: Some(position),
                penalty_factor: factor,
                original_bonus: module.bonus_amount,
                penalized_bonus: penalized,
                input_index: *index,
            });
        }

        let summary = StackingGroupSummary {
            stacking_group_id: group_id,
            attribute_id,
            module_count: entries.len(),
            total_original_bonus: group_original,
            total_penalized_bonus: group_penalized,
            average_penalty_percentage: penalty_sum / entries.len() as f64,
            input_sorted,
        };
        recommendations.extend(group_recommendations(&summary));
        groups.push(summary);
    }

    bonuses.extend(unpenalized);

    let total_original_bonus: f64 = bonuses.iter().map(|b| b.original_bonus.abs()).sum();
    let total_penalized_bonus: f64 = bonuses.iter().map(|b| b.penalized_bonus.abs()).sum();
    let efficiency_percentage = if total_original_bonus > 0.0 {
        total_penalized_bonus / total_original_bonus * 100.0
    } else {
        100.0
    };

    StackingAnalysis {
        bonuses,
        groups,
        total_original_bonus,
        total_penalized_bonus,
        efficiency_percentage,
        recommendations,
    }
}

fn group_recommendations(summary: &StackingGroupSummary) -> Vec<String> {
    let id = format!(
        "{} (attribute {})",
        summary.stacking_group_id, summary.attribute_id
    );
    let mut out = Vec::new();
    if summary.module_count > CROWDED_GROUP_SIZE {
        out.push(format!(
            "Stacking group {id}: {} modules stacked; the fourth and later modules keep at most {:.1}% of their bonus",
            summary.module_count,
            penalty_factor(CROWDED_GROUP_SIZE) * 100.0
        ));
    }
    if summary.average_penalty_percentage > HEAVY_AVERAGE_PENALTY_PERCENTAGE {
        out.push(format!(
            "Stacking group {id}: average penalty {:.1}% exceeds {HEAVY_AVERAGE_PENALTY_PERCENTAGE:.0}%; spread bonuses across other attributes",
            summary.average_penalty_percentage
        ));
    }
    if !summary.input_sorted {
        out.push(format!(
            "Stacking group {id}: modules are not listed strongest-first; order them by bonus so the strongest take the smallest penalty"
        ));
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PenaltyTableRow {
    /// One-based module position.
    pub position: usize,
    pub effectiveness_percentage: f64,
    pub penalty_percentage: f64,
}

/// Effectiveness of the 1st..=`max_position` module in a stacking group.
pub fn stacking_penalty_table(max_position: usize) -> Vec<PenaltyTableRow> {
    (1..=max_position)
        .map(|position| {
            let effectiveness = penalty_factor(position - 1) * 100.0;
            PenaltyTableRow {
                position,
                effectiveness_percentage: effectiveness,
                penalty_percentage: 100.0 - effectiveness,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleCountReasoning {
    Optimal,
    DiminishingButAcceptable,
    SpecializedOnly,
}

impl ModuleCountReasoning {
    pub fn for_count(count: usize) -> Self {
        match count {
            0..=3 => Self::Optimal,
            4..=6 => Self::DiminishingButAcceptable,
            _ => Self::SpecializedOnly,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Optimal => "Optimal: every module keeps most of its bonus",
            Self::DiminishingButAcceptable => {
                "Diminishing returns but acceptable for a focused fitting"
            }
            Self::SpecializedOnly => "Only worthwhile for highly specialized fittings",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OptimalModuleCount {
    pub count: usize,
    /// Penalized bonus per unit of cost at `count`.
    pub efficiency: f64,
    pub total_bonus: f64,
    pub reasoning: ModuleCountReasoning,
}

/// Brute-force the module count (1..=10) with the best penalized bonus per unit cost.
/// A non-positive or non-finite cost is treated as a unit cost. Ties keep the smaller count.
pub fn calculate_optimal_module_count(base_bonus: f64, cost_per_module: f64) -> OptimalModuleCount {
    let cost = if cost_per_module.is_finite() && cost_per_module > 0.0 {
        cost_per_module
    } else {
        1.0
    };

    let mut best: Option<OptimalModuleCount> = None;
    let mut total_bonus = 0.0;
    for count in 1..=OPTIMAL_COUNT_SEARCH_LIMIT {
        total_bonus += base_bonus * penalty_factor(count - 1);
        let efficiency = total_bonus / (count as f64 * cost);
        let better = best.map_or(true, |current| efficiency > current.efficiency);
        if better {
            best = Some(OptimalModuleCount {
                count,
                efficiency,
                total_bonus,
                reasoning: ModuleCountReasoning::for_count(count),
            });
        }
    }

    best.unwrap_or(OptimalModuleCount {
        count: 1,
        efficiency: base_bonus / cost,
        total_bonus: base_bonus,
        reasoning: ModuleCountReasoning::Optimal,
    })
}
