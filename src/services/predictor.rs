use std::sync::Arc;

use crate::artifacts::{load_json, ArtifactPaths};
use crate::error::{PredictorError, Result};
use crate::models::{MatchupStats, PredictionLabel, PredictionResult};
use crate::services::assembler::{FeatureAssembler, FeatureVector};
use crate::services::classifier::{Classifier, LogisticModel};
use crate::services::encoder::EncodingSchema;
use crate::services::scaler::ScalingParameters;
use crate::services::stats_repository::StatsRepository;
use crate::utils::{format_stat, validate_team_name};

/// Turns a classifier output into a labelled, explained result.
pub struct PredictionService;

impl PredictionService {
    pub fn predict(
        features: &FeatureVector,
        stats: MatchupStats,
        model: &dyn Classifier,
    ) -> Result<PredictionResult> {
        let label = PredictionLabel::from_class(model.predict(features)?);
        Ok(PredictionResult {
            label,
            contributing_stats: stats,
            rationale: Self::rationale(&stats, label),
            unknown_categories: Vec::new(),
        })
    }

    /// Two comparisons (goals scored, goals allowed) and a conclusion naming the
    /// predicted side. Ties go to the home team.
    pub fn rationale(stats: &MatchupStats, label: PredictionLabel) -> Vec<String> {
        let visitor_goals = format_stat(stats.visitor_goals_avg);
        let home_goals = format_stat(stats.home_goals_avg);
        let visitor_allowed = format_stat(stats.visitor_allowed_avg);
        let home_allowed = format_stat(stats.home_allowed_avg);

        let scored = if stats.visitor_goals_avg > stats.home_goals_avg {
            format!(
                "Visitor team has a higher average goals scored, {}, compared to the home team, {}.",
                visitor_goals, home_goals
            )
        } else {
            format!(
                "Home team has a higher average goals scored, {}, compared to the visitor team, {}.",
                home_goals, visitor_goals
            )
        };

        let allowed = if stats.visitor_allowed_avg < stats.home_allowed_avg {
            format!(
                "Visitor team has a lower average goals allowed, {}, compared to the home team, {}.",
                visitor_allowed, home_allowed
            )
        } else {
            format!(
                "Home team has a lower average goals allowed, {}, compared to the visitor team, {}.",
                home_allowed, visitor_allowed
            )
        };

        let conclusion = format!(
            "Based on these statistics, the model predicts that the {} team will win.",
            label.side()
        );

        vec![scored, allowed, conclusion]
    }
}

/// Serving pipeline. Built once at startup, read-only afterwards, so it can be
/// shared across request handlers behind an `Arc` without locking.
pub struct MatchupPredictor {
    repository: StatsRepository,
    encoder: EncodingSchema,
    scaler: ScalingParameters,
    model: Arc<dyn Classifier>,
}

impl MatchupPredictor {
    pub fn new(
        repository: StatsRepository,
        encoder: EncodingSchema,
        scaler: ScalingParameters,
        model: Arc<dyn Classifier>,
    ) -> Self {
        Self {
            repository,
            encoder,
            scaler,
            model,
        }
    }

    /// Load the processed table and the persisted encoder, scaler and model.
    pub fn load(paths: &ArtifactPaths) -> Result<Self> {
        let games = crate::artifacts::read_processed(&paths.processed_data)?;
        let encoder: EncodingSchema = load_json(&paths.encoder_path())?;
        let scaler: ScalingParameters = load_json(&paths.scaler_path())?;
        let model: LogisticModel = load_json(&paths.model_path())?;

        let repository = StatsRepository::from_games(&games);
        if repository.is_empty() {
            return Err(PredictorError::Data(format!(
                "no games in {}",
                paths.processed_data.display()
            )));
        }

        tracing::info!(
            "Loaded model {} with {} features over {} team records",
            model.model_version,
            model.feature_names.len(),
            repository.len()
        );

        Ok(Self::new(
            repository,
            encoder,
            scaler,
            Arc::new(model),
        ))
    }

    pub fn repository(&self) -> &StatsRepository {
        &self.repository
    }

    pub fn predict_matchup(&self, visitor_team: &str, home_team: &str) -> Result<PredictionResult> {
        for team in [visitor_team, home_team] {
            if !validate_team_name(team) {
                return Err(PredictorError::InvalidInput(format!(
                    "invalid team name '{}'",
                    team
                )));
            }
        }

        let assembler = FeatureAssembler::new(
            &self.repository,
            &self.encoder,
            &self.scaler,
            self.model.feature_schema(),
        );
        let matchup = assembler.assemble(visitor_team, home_team)?;

        let mut result = PredictionService::predict(&matchup.features, matchup.stats, self.model.as_ref())?;
        result.unknown_categories = matchup.unknown_categories;

        tracing::info!(
            "Predicted {} at {}: {}",
            visitor_team,
            home_team,
            result.label.as_str()
        );
        Ok(result)
    }
}
