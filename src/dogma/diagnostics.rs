//! Non-fatal findings collected while computing a fitting. Anything recorded here means
//! "computed with caveats": the calculation finished, but some input was skipped or clipped.

use std::fmt;

use serde::Serialize;

use crate::dogma::attributes::TypeId;
use crate::error::PipelineStage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A module or charge type could not be resolved and was excluded.
    PartialDataWarning,
    /// The fitting breaks a hull limit (resources, slots, drone bandwidth).
    FittingConstraint,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PartialDataWarning => "partial_data",
            Self::FittingConstraint => "fitting_constraint",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub stage: PipelineStage,
    pub type_id: Option<TypeId>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn push(
        &mut self,
        kind: DiagnosticKind,
        stage: PipelineStage,
        type_id: Option<TypeId>,
        message: impl Into<String>,
    ) {
        self.entries.push(Diagnostic {
            kind,
            stage,
            type_id,
            message: message.into(),
        });
    }

    /// Record an unresolvable type and log it.
    pub fn partial_data(&mut self, stage: PipelineStage, type_id: TypeId, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(type_id, stage = %stage, "{message}");
        self.push(DiagnosticKind::PartialDataWarning, stage, Some(type_id), message);
    }

    pub fn fitting_constraint(&mut self, type_id: Option<TypeId>, message: impl Into<String>) {
        self.push(
            DiagnosticKind::FittingConstraint,
            PipelineStage::DeriveStats,
            type_id,
            message,
        );
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn has_partial_data(&self) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.kind == DiagnosticKind::PartialDataWarning)
    }

    /// Type IDs excluded from the calculation, in the order they were skipped.
    pub fn skipped_type_ids(&self) -> Vec<TypeId> {
        self.entries
            .iter()
            .filter(|entry| entry.kind == DiagnosticKind::PartialDataWarning)
            .filter_map(|entry| entry.type_id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skipped_type_ids_only_lists_partial_data() {
        let mut diagnostics = Diagnostics::default();
        diagnostics.partial_data(PipelineStage::CollectModuleEffects, 42, "unknown module");
        diagnostics.fitting_constraint(Some(7), "over cpu");
        diagnostics.partial_data(PipelineStage::ResolveCharges, 43, "unknown charge");

        assert_eq!(diagnostics.len(), 3);
        assert!(diagnostics.has_partial_data());
        assert_eq!(diagnostics.skipped_type_ids(), vec![42, 43]);
    }
}
