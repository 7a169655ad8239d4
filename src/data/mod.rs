pub mod activity;
pub mod prefetch;
pub mod provider;
pub mod snapshot;
pub mod validate;

pub use activity::{
    ActivityProfile, ActivityProfileSource, ActivityRegistry, ActivityWeights, RequiredSkill,
    SkillPriority, ThreatProfile,
};
pub use prefetch::{prefetch_fitting, ResolvedFittingData};
pub use provider::{AsyncStaticDataProvider, EffectCategory, SkillBonus, StaticDataProvider, TypeEffect};
pub use snapshot::{SnapshotHandle, StaticDataSnapshot};
pub use validate::{validate_activity_registry, validate_static_data, ValidationReport, ValidationSeverity};
