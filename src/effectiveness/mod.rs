//! Fitting effectiveness: engine output scored against activity profiles.

pub mod metrics;
pub mod ranking;
pub mod recommendations;
pub mod scoring;
pub mod skill_gap;

use std::sync::Arc;

use serde::Serialize;

use crate::config::EngineConfig;
use crate::data::activity::{ActivityProfile, ActivityRegistry, ActivityWeights};
use crate::data::provider::StaticDataProvider;
use crate::data::snapshot::StaticDataSnapshot;
use crate::dogma::attributes::TypeId;
use crate::dogma::diagnostics::Diagnostics;
use crate::dogma::engine::{ComprehensiveFittingStats, DogmaEngine, FittingRequest};
use crate::dogma::fitting::{ModuleFit, SkillSet};
use crate::error::{FittingError, FittingResult};

pub use metrics::{derive_metrics, estimate_fitting_cost, CostEstimate, DetailedMetrics};
pub use ranking::{rank_comparisons, ActivityComparison, Suitability};
pub use recommendations::generate_recommendations;
pub use scoring::{CategoryScores, DimensionScores};
pub use skill_gap::{analyze_skill_gaps, format_training_time, skill_accessibility, skill_points_for_level, SkillGap};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FittingEffectiveness {
    pub ship_type_id: TypeId,
    pub activity_id: String,
    /// Weighted mean of the dimension scores, in `[0, 100]`.
    pub overall_score: f64,
    pub category_scores: CategoryScores,
    pub dimension_scores: DimensionScores,
    pub weights: ActivityWeights,
    pub metrics: DetailedMetrics,
    pub skill_gaps: Vec<SkillGap>,
    pub recommendations: Vec<String>,
    /// Carried over from the engine so callers can tell "computed with caveats".
    pub diagnostics: Diagnostics,
}

/// Cross-activity ranking plus the requested activity IDs that are not registered.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActivityComparisonReport {
    pub comparisons: Vec<ActivityComparison>,
    pub unknown_activity_ids: Vec<String>,
}

/// Scores for one activity, short of skill gaps and recommendations.
struct ActivityScore {
    metrics: DetailedMetrics,
    dimensions: DimensionScores,
    categories: CategoryScores,
    overall: f64,
}

pub struct FittingEffectivenessCalculator<P> {
    engine: DogmaEngine<P>,
    registry: Arc<ActivityRegistry>,
    config: EngineConfig,
}

impl<P> Clone for FittingEffectivenessCalculator<P> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            registry: Arc::clone(&self.registry),
            config: self.config.clone(),
        }
    }
}

impl<P: StaticDataProvider> FittingEffectivenessCalculator<P> {
    pub fn new(engine: DogmaEngine<P>, registry: Arc<ActivityRegistry>) -> Self {
        Self {
            engine,
            registry,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn engine(&self) -> &DogmaEngine<P> {
        &self.engine
    }

    pub fn registry(&self) -> &Arc<ActivityRegistry> {
        &self.registry
    }

    fn activity(&self, activity_id: &str) -> FittingResult<&ActivityProfile> {
        self.registry.get(activity_id).ok_or_else(|| {
            FittingError::InvalidArgument(format!("unknown activity '{activity_id}'"))
        })
    }

    pub fn calculate_fitting_effectiveness(
        &self,
        ship_type_id: TypeId,
        modules: &[ModuleFit],
        skills: &SkillSet,
        activity_id: &str,
        weight_override: Option<&ActivityWeights>,
    ) -> FittingResult<FittingEffectiveness> {
        let request = FittingRequest::new(ship_type_id, modules.to_vec(), skills.clone());
        self.evaluate_request(&request, activity_id, weight_override)
    }

    /// Like [Self::calculate_fitting_effectiveness] with implants and boosts from the request.
    /// The activity and any weight override are checked before the engine runs.
    pub fn evaluate_request(
        &self,
        request: &FittingRequest,
        activity_id: &str,
        weight_override: Option<&ActivityWeights>,
    ) -> FittingResult<FittingEffectiveness> {
        let profile = self.activity(activity_id)?;
        let weights = match weight_override {
            Some(weights) => {
                weights
                    .validate("weight override")
                    .map_err(FittingError::InvalidArgument)?;
                *weights
            }
            None => profile.weights,
        };

        let stats = self.engine.calculate_fitting(request)?;
        let score = self.score(&stats, request, profile, &weights);
        let skill_gaps = analyze_skill_gaps(profile, &request.skills, self.config.sp_per_minute);
        let recommendations =
            generate_recommendations(&stats, &score.metrics, &score.categories, &skill_gaps);

        tracing::debug!(
            ship_type_id = request.ship_type_id,
            activity_id,
            overall = score.overall,
            gaps = skill_gaps.len(),
            "scored fitting"
        );

        Ok(FittingEffectiveness {
            ship_type_id: request.ship_type_id,
            activity_id: profile.activity_id.clone(),
            overall_score: score.overall,
            category_scores: score.categories,
            dimension_scores: score.dimensions,
            weights,
            metrics: score.metrics,
            skill_gaps,
            recommendations,
            diagnostics: stats.diagnostics,
        })
    }

    /// Score one fitting for each requested activity and rank the results. The engine runs
    /// once; unknown activity IDs are reported instead of failing the whole comparison.
    pub fn compare_fitting_across_activities(
        &self,
        ship_type_id: TypeId,
        modules: &[ModuleFit],
        skills: &SkillSet,
        activity_ids: &[&str],
    ) -> FittingResult<ActivityComparisonReport> {
        let request = FittingRequest::new(ship_type_id, modules.to_vec(), skills.clone());
        let stats = self.engine.calculate_fitting(&request)?;

        let mut report = ActivityComparisonReport::default();
        let mut comparisons = Vec::with_capacity(activity_ids.len());
        for activity_id in activity_ids {
            let Some(profile) = self.registry.get(activity_id) else {
                tracing::warn!(activity_id, "skipping unknown activity in comparison");
                report.unknown_activity_ids.push(activity_id.to_string());
                continue;
            };
            let score = self.score(&stats, &request, profile, &profile.weights);
            comparisons.push(ActivityComparison::new(
                profile.activity_id.clone(),
                profile.name.clone(),
                score.overall,
                score.categories,
            ));
        }
        report.comparisons = rank_comparisons(comparisons);
        Ok(report)
    }

    /// Compare against every registered activity.
    pub fn compare_all_activities(
        &self,
        ship_type_id: TypeId,
        modules: &[ModuleFit],
        skills: &SkillSet,
    ) -> FittingResult<ActivityComparisonReport> {
        let ids: Vec<&str> = self.registry.ids().collect();
        self.compare_fitting_across_activities(ship_type_id, modules, skills, &ids)
    }

    fn score(
        &self,
        stats: &ComprehensiveFittingStats,
        request: &FittingRequest,
        profile: &ActivityProfile,
        weights: &ActivityWeights,
    ) -> ActivityScore {
        let cost = estimate_fitting_cost(
            self.engine.provider().as_ref(),
            request.ship_type_id,
            &request.modules,
            &self.config.price_fallbacks,
        );
        let metrics = derive_metrics(stats, &profile.threat, cost);
        let scales = &self.config.reference_scales;
        let dimensions =
            DimensionScores::from_metrics(&metrics, scales, skill_accessibility(profile, &request.skills));
        let categories = CategoryScores::from_dimensions(&dimensions, &metrics, scales);
        let overall = dimensions.weighted(weights);
        ActivityScore {
            metrics,
            dimensions,
            categories,
            overall,
        }
    }
}

impl FittingEffectivenessCalculator<StaticDataSnapshot> {
    /// Load the static data and activity profiles named by `config` and wire up a calculator.
    /// Without a profiles path the built-in profiles are used.
    pub fn from_config(config: EngineConfig) -> FittingResult<Self> {
        config.validate()?;
        let snapshot = StaticDataSnapshot::load(&config.static_data_path)?;
        let registry = match config.resolved_activity_profiles_path() {
            Some(path) => ActivityRegistry::load(path)?,
            None => ActivityRegistry::builtin()?,
        };
        let engine =
            DogmaEngine::new(Arc::new(snapshot)).with_application_target(config.application_target);
        Ok(Self::new(engine, Arc::new(registry)).with_config(config))
    }
}
