//! Ship-fitting calculation engine: dogma attribute pipeline with exact stacking penalties,
//! derived subsystem stats, and effectiveness scoring against activity profiles.

pub mod config;
pub mod data;
pub mod dogma;
pub mod effectiveness;
pub mod error;
pub mod parallel;

pub use config::EngineConfig;
pub use dogma::{ComprehensiveFittingStats, DogmaEngine};
pub use effectiveness::{FittingEffectiveness, FittingEffectivenessCalculator};
pub use error::{FittingError, FittingResult, PipelineStage};
