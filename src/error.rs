use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::dogma::attributes::TypeId;

/// Pipeline stage a fatal error or diagnostic originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    LoadBaseAttributes,
    CollectModuleEffects,
    ResolveCharges,
    DeriveStats,
    Prefetch,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoadBaseAttributes => "load base attributes",
            Self::CollectModuleEffects => "collect module effects",
            Self::ResolveCharges => "resolve charges",
            Self::DeriveStats => "derive stats",
            Self::Prefetch => "prefetch",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum FittingError {
    #[error("type {type_id} not found during {stage}")]
    NotFound { type_id: TypeId, stage: PipelineStage },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("unable to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl FittingError {
    pub fn not_found(type_id: TypeId, stage: PipelineStage) -> Self {
        Self::NotFound { type_id, stage }
    }

    /// True for errors that mean the fitting could not be computed at all,
    /// as opposed to configuration problems raised before any calculation.
    pub fn is_calculation_failure(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::InvalidArgument(_))
    }
}

pub type FittingResult<T> = std::result::Result<T, FittingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_type_and_stage() {
        let err = FittingError::not_found(587, PipelineStage::LoadBaseAttributes);
        assert_eq!(
            err.to_string(),
            "type 587 not found during load base attributes"
        );
        assert!(err.is_calculation_failure());
    }

    #[test]
    fn configuration_error_is_not_a_calculation_failure() {
        let err = FittingError::Configuration("no activity profiles".into());
        assert!(!err.is_calculation_failure());
    }
}
