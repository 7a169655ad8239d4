pub mod attributes;
pub mod diagnostics;
pub mod engine;
pub mod fitting;
pub mod modifier;
pub mod stacking;
pub mod stats;

pub use attributes::{AttributeDefinition, AttributeId, AttributeMap, ShipAttributes, TypeId};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use engine::{ComprehensiveFittingStats, DogmaEngine, FittingRequest};
pub use fitting::{FleetBoosts, ImplantSet, ModuleFit, SkillSet, SlotType};
pub use modifier::{Modifier, ModifierOp, ModifierStack};
pub use stacking::{
    calculate_optimal_module_count, calculate_stacking_penalties, penalty_factor,
    stacking_penalty_table, StackableModule, StackingAnalysis,
};
pub use stats::ApplicationTarget;
