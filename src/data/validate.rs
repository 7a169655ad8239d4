use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::data::activity::ActivityProfile;
use crate::data::snapshot::StaticDataSnapshot;
use crate::dogma::attributes::{AttributeId, CPU_OUTPUT, HI_SLOTS, LOW_SLOTS, MED_SLOTS, POWER_OUTPUT};
use crate::dogma::fitting::MAX_SKILL_LEVEL;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationSeverity {
    Error,
    Warning,
    Info,
}

impl ValidationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationDiagnostic {
    pub severity: ValidationSeverity,
    pub context: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn push(
        &mut self,
        severity: ValidationSeverity,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(ValidationDiagnostic {
            severity,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == ValidationSeverity::Error)
    }

    pub fn count(&self, severity: ValidationSeverity) -> usize {
        self.diagnostics
            .iter()
            .filter(|diag| diag.severity == severity)
            .count()
    }
}

const HULL_REQUIRED_ATTRIBUTES: &[(AttributeId, &str)] = &[
    (CPU_OUTPUT, "cpuOutput"),
    (POWER_OUTPUT, "powerOutput"),
    (HI_SLOTS, "hiSlots"),
    (MED_SLOTS, "medSlots"),
    (LOW_SLOTS, "lowSlots"),
];

/// Consistency checks over a loaded static data snapshot.
/// A type counts as a hull when it carries skill bonuses or any slot-count attribute.
pub fn validate_static_data(snapshot: &StaticDataSnapshot) -> ValidationReport {
    let mut report = ValidationReport::default();

    let known_attributes: HashSet<AttributeId> = snapshot
        .attribute_definitions()
        .map(|definition| definition.attribute_id)
        .collect();
    let bonus_hulls: HashSet<_> = snapshot.skill_bonus_hulls().collect();

    for effect in snapshot.effects() {
        let context = format!("effect[{}]", effect.effect_id);
        if effect.modifiers.is_empty() {
            report.push(ValidationSeverity::Info, &context, "effect has no modifiers");
        }
        if known_attributes.is_empty() {
            continue;
        }
        for modifier in &effect.modifiers {
            for attribute_id in [modifier.modified_attribute_id, modifier.modifying_attribute_id] {
                if !known_attributes.contains(&attribute_id) {
                    report.push(
                        ValidationSeverity::Warning,
                        &context,
                        format!("modifier references undefined attribute {attribute_id}"),
                    );
                }
            }
        }
    }

    for group in snapshot.stacking_groups() {
        let context = format!("stacking_group[{}]", group.stacking_group_id);
        if group.stacking_group_id <= 0 {
            report.push(
                ValidationSeverity::Warning,
                &context,
                "group id <= 0 is never penalized",
            );
        }
        for effect_id in &group.effect_ids {
            if snapshot.effect(*effect_id).is_none() {
                report.push(
                    ValidationSeverity::Error,
                    &context,
                    format!("group names unknown effect {effect_id}"),
                );
            }
        }
    }

    for record in snapshot.types() {
        let context = format!("type[{}]", record.type_id);
        if record.name.trim().is_empty() {
            report.push(ValidationSeverity::Info, &context, "type has no name");
        }
        for effect_id in &record.effect_ids {
            if snapshot.effect(*effect_id).is_none() {
                report.push(
                    ValidationSeverity::Warning,
                    &context,
                    format!("unknown effect {effect_id} will be ignored"),
                );
            }
        }
        if let Some(price) = record.price {
            if !price.is_finite() || price < 0.0 {
                report.push(
                    ValidationSeverity::Warning,
                    &context,
                    format!("invalid price {price}"),
                );
            }
        }

        let is_hull = bonus_hulls.contains(&record.type_id)
            || [HI_SLOTS, MED_SLOTS, LOW_SLOTS]
                .iter()
                .any(|id| record.attributes.contains_key(id));
        if is_hull {
            for (attribute_id, name) in HULL_REQUIRED_ATTRIBUTES {
                if !record.attributes.contains_key(attribute_id) {
                    report.push(
                        ValidationSeverity::Warning,
                        &context,
                        format!("hull is missing {name} ({attribute_id})"),
                    );
                }
            }
        }
    }

    for hull in &bonus_hulls {
        if snapshot.type_record(*hull).is_none() {
            report.push(
                ValidationSeverity::Error,
                format!("ship_skill_bonuses[{hull}]"),
                "skill bonuses for unknown hull",
            );
        }
    }

    report
}

/// Checks over raw profiles, reporting every problem instead of stopping at the first.
pub fn validate_activity_registry(profiles: &[ActivityProfile]) -> ValidationReport {
    let mut report = ValidationReport::default();
    if profiles.is_empty() {
        report.push(ValidationSeverity::Error, "profiles", "no activity profiles");
        return report;
    }

    let mut seen_ids = HashSet::new();
    for (index, profile) in profiles.iter().enumerate() {
        let context = format!("profiles[{index}]");
        if profile.activity_id.trim().is_empty() {
            report.push(ValidationSeverity::Error, &context, "empty activity_id");
        } else if !seen_ids.insert(profile.activity_id.as_str()) {
            report.push(
                ValidationSeverity::Error,
                &context,
                format!("duplicate activity_id '{}'", profile.activity_id),
            );
        }

        if let Err(message) = profile.weights.validate(&profile.activity_id) {
            report.push(ValidationSeverity::Error, &context, message);
        }

        let threat = &profile.threat;
        for (name, value) in [
            ("expected_incoming_dps", threat.expected_incoming_dps),
            ("engagement_range", threat.engagement_range),
            ("target_signature_radius", threat.target_signature_radius),
            ("target_transversal", threat.target_transversal),
        ] {
            if !value.is_finite() || value < 0.0 {
                report.push(
                    ValidationSeverity::Warning,
                    format!("{context}.threat.{name}"),
                    format!("expected a non-negative number, got {value}"),
                );
            }
        }

        if profile.required_skills.is_empty() {
            report.push(ValidationSeverity::Info, &context, "no required skills");
        }
        for (skill_index, skill) in profile.required_skills.iter().enumerate() {
            let skill_context = format!("{context}.required_skills[{skill_index}]");
            if skill.level == 0 || skill.level > MAX_SKILL_LEVEL {
                report.push(
                    ValidationSeverity::Error,
                    &skill_context,
                    format!("level {} outside 1..=5", skill.level),
                );
            }
            if skill.rank == 0 {
                report.push(
                    ValidationSeverity::Warning,
                    &skill_context,
                    "rank 0 trains instantly",
                );
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::activity::{ActivityWeights, RequiredSkill, SkillPriority, ThreatProfile};

    #[test]
    fn flags_unknown_group_members_and_incomplete_hulls() {
        let raw = r#"{
            "attributes": [{"attribute_id": 37, "name": "maxVelocity"}],
            "effects": [{"effect_id": 1, "category": "passive", "modifiers": [
                {"modified_attribute_id": 37, "modifying_attribute_id": 20, "op": "post_percent"}
            ]}],
            "stacking_groups": [{"stacking_group_id": 3, "effect_ids": [1, 99]}],
            "types": [{"type_id": 587, "name": "Hull", "attributes": {"14": 4.0}}]
        }"#;
        let snapshot = StaticDataSnapshot::from_json_str(raw).expect("parse");
        let report = validate_static_data(&snapshot);

        assert!(report.has_errors());
        assert_eq!(report.count(ValidationSeverity::Error), 1);
        assert!(report
            .diagnostics
            .iter()
            .any(|d| d.message.contains("undefined attribute 20")));
        assert!(report
            .diagnostics
            .iter()
            .any(|d| d.context == "type[587]" && d.message.contains("cpuOutput")));
    }

    #[test]
    fn reports_every_profile_problem() {
        let bad = ActivityProfile {
            activity_id: "bad".into(),
            name: "Bad".into(),
            description: String::new(),
            weights: ActivityWeights::default(),
            threat: ThreatProfile {
                engagement_range: -1.0,
                ..ThreatProfile::default()
            },
            required_skills: vec![RequiredSkill {
                skill_id: 3300,
                name: "Gunnery".into(),
                level: 7,
                rank: 1,
                priority: SkillPriority::Critical,
            }],
        };
        let report = validate_activity_registry(&[bad.clone(), bad]);
        // zero weights twice, bad level twice, duplicate id once
        assert_eq!(report.count(ValidationSeverity::Error), 5);
        assert_eq!(report.count(ValidationSeverity::Warning), 2);
    }
}
