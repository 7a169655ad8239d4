//! Attribute modifier operations and their two-pass composition.
//!
//! Every contribution to a ship attribute (module effects after stacking penalties,
//! implants, fleet boosts) is a [Modifier] tagged with a [ModifierOp]. Contributions are
//! accumulated per attribute into [ModifierTotals] and composed in two passes:
//!
//! ```text
//! pre:  v = assign.unwrap_or(base) * pre_multiply + add
//! post: v = post_assign.unwrap_or(v * post_multiply * post_percent), then floor/ceiling
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dogma::attributes::{AttributeId, AttributeMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifierPhase {
    Pre,
    Post,
}

/// How a modifier value combines with the attribute it targets.
/// Declaration order is application order within each phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierOp {
    /// Replace the base value before anything else applies.
    PreAssign,
    PreMultiply,
    PreDivide,
    /// Flat addition.
    Add,
    /// Flat subtraction.
    Subtract,
    PostMultiply,
    PostDivide,
    /// Percentage bonus: `v * (1 + value / 100)`.
    PostPercent,
    /// Replace the composed value.
    PostAssign,
    /// Raise the value to at least `value`.
    SetIfHigher,
    /// Cap the value at `value`.
    SetIfLower,
}

impl ModifierOp {
    pub const fn phase(self) -> ModifierPhase {
        match self {
            Self::PreAssign | Self::PreMultiply | Self::PreDivide | Self::Add | Self::Subtract => {
                ModifierPhase::Pre
            }
            Self::PostMultiply
            | Self::PostDivide
            | Self::PostPercent
            | Self::PostAssign
            | Self::SetIfHigher
            | Self::SetIfLower => ModifierPhase::Post,
        }
    }

    /// Only relative (multiplicative) operations take part in stacking penalties.
    pub const fn is_stackable(self) -> bool {
        matches!(
            self,
            Self::PreMultiply
                | Self::PreDivide
                | Self::PostMultiply
                | Self::PostDivide
                | Self::PostPercent
        )
    }

    /// Express a raw modifier value as a signed percentage bonus for the stacking engine.
    /// Non-stackable operations pass through unchanged.
    pub fn to_percent_bonus(self, value: f64) -> f64 {
        match self {
            Self::PreMultiply | Self::PostMultiply => (value - 1.0) * 100.0,
            Self::PreDivide | Self::PostDivide if value != 0.0 => (1.0 / value - 1.0) * 100.0,
            Self::PreDivide | Self::PostDivide => 0.0,
            _ => value,
        }
    }

    /// Inverse of [ModifierOp::to_percent_bonus], producing the value to apply.
    /// Divisions come back as the equivalent multiplier.
    pub fn from_percent_bonus(self, bonus: f64) -> (ModifierOp, f64) {
        match self {
            Self::PreMultiply | Self::PreDivide => (Self::PreMultiply, 1.0 + bonus / 100.0),
            Self::PostMultiply | Self::PostDivide => (Self::PostMultiply, 1.0 + bonus / 100.0),
            other => (other, bonus),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    pub attribute_id: AttributeId,
    pub op: ModifierOp,
    pub value: f64,
}

impl Modifier {
    pub fn new(attribute_id: AttributeId, op: ModifierOp, value: f64) -> Self {
        Self {
            attribute_id,
            op,
            value,
        }
    }

    pub fn add(attribute_id: AttributeId, value: f64) -> Self {
        Self::new(attribute_id, ModifierOp::Add, value)
    }

    pub fn percent(attribute_id: AttributeId, value: f64) -> Self {
        Self::new(attribute_id, ModifierOp::PostPercent, value)
    }

    pub fn post_multiply(attribute_id: AttributeId, value: f64) -> Self {
        Self::new(attribute_id, ModifierOp::PostMultiply, value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModifierTotals {
    pub pre_assign: Option<f64>,
    pub pre_multiply: f64,
    pub add: f64,
    pub post_multiply: f64,
    pub post_percent: f64,
    pub post_assign: Option<f64>,
    pub floor: Option<f64>,
    pub ceiling: Option<f64>,
}

impl Default for ModifierTotals {
    fn default() -> Self {
        Self {
            pre_assign: None,
            pre_multiply: 1.0,
            add: 0.0,
            post_multiply: 1.0,
            post_percent: 1.0,
            post_assign: None,
            floor: None,
            ceiling: None,
        }
    }
}

impl ModifierTotals {
    pub fn apply(&mut self, op: ModifierOp, value: f64) {
        match op {
            ModifierOp::PreAssign => self.pre_assign = Some(value),
            ModifierOp::PreMultiply => self.pre_multiply *= value,
            ModifierOp::PreDivide => {
                if value != 0.0 {
                    self.pre_multiply /= value;
                }
            }
            ModifierOp::Add => self.add += value,
            ModifierOp::Subtract => self.add -= value,
            ModifierOp::PostMultiply => self.post_multiply *= value,
            ModifierOp::PostDivide => {
                if value != 0.0 {
                    self.post_multiply /= value;
                }
            }
            ModifierOp::PostPercent => self.post_percent *= 1.0 + value / 100.0,
            ModifierOp::PostAssign => self.post_assign = Some(value),
            ModifierOp::SetIfHigher => {
                self.floor = Some(self.floor.map_or(value, |floor| floor.max(value)));
            }
            ModifierOp::SetIfLower => {
                self.ceiling = Some(self.ceiling.map_or(value, |ceiling| ceiling.min(value)));
            }
        }
    }

    pub fn compose_pre(&self, base: f64) -> f64 {
        self.pre_assign.unwrap_or(base) * self.pre_multiply + self.add
    }

    pub fn compose_post(&self, value: f64) -> f64 {
        let mut value = self
            .post_assign
            .unwrap_or(value * self.post_multiply * self.post_percent);
        if let Some(floor) = self.floor {
            value = value.max(floor);
        }
        if let Some(ceiling) = self.ceiling {
            value = value.min(ceiling);
        }
        value
    }

    pub fn compose(&self, base: f64) -> f64 {
        self.compose_post(self.compose_pre(base))
    }
}

/// Per-attribute modifier accumulator. Insertion order matters only for assignments
/// (the last assignment wins), so callers push module, implant, then boost modifiers.
#[derive(Debug, Clone, Default)]
pub struct ModifierStack {
    totals: BTreeMap<AttributeId, ModifierTotals>,
}

impl ModifierStack {
    pub fn new() -> Self {
        Self {
            totals: BTreeMap::new(),
        }
    }

    pub fn add(&mut self, modifier: Modifier) {
        self.totals
            .entry(modifier.attribute_id)
            .or_default()
            .apply(modifier.op, modifier.value);
    }

    pub fn add_many<I>(&mut self, modifiers: I)
    where
        I: IntoIterator<Item = Modifier>,
    {
        for modifier in modifiers {
            self.add(modifier);
        }
    }

    pub fn totals_for(&self, attribute_id: AttributeId) -> Option<ModifierTotals> {
        self.totals.get(&attribute_id).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Produce a new attribute map: the pre pass over every attribute, then the post pass.
    /// Attributes only present as modifier targets start from `defaults` (or zero).
    pub fn apply(&self, attributes: &AttributeMap, defaults: &AttributeMap) -> AttributeMap {
        let mut pre: AttributeMap = attributes.clone();
        for (attribute_id, totals) in &self.totals {
            let base = attributes
                .get(attribute_id)
                .or_else(|| defaults.get(attribute_id))
                .copied()
                .unwrap_or(0.0);
            pre.insert(*attribute_id, totals.compose_pre(base));
        }

        let mut post = pre;
        for (attribute_id, totals) in &self.totals {
            if let Some(value) = post.get_mut(attribute_id) {
                *value = totals.compose_post(*value);
            }
        }
        post
    }
}
