//! Builds the model-ready feature vector for one matchup.
//!
//! Serve-time scaling: none here. The four rolling averages and the indicator
//! columns are emitted raw; the trained model carries its own scaling
//! parameters for exactly those columns and applies them inside `predict`.
//! The preprocessing scaler only covers the label-adjacent columns (goals and
//! goal difference), which are never served, so a trained schema that names
//! one of them is rejected instead of being zero-filled.

use serde::Serialize;
use std::collections::HashMap;

use crate::error::{PredictorError, Result};
use crate::models::{MatchupStats, TeamRole};
use crate::services::encoder::{EncodingSchema, FeatureEncoder};
use crate::services::scaler::ScalingParameters;
use crate::services::stats_repository::StatsRepository;

/// Named feature values in the exact order of a trained schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    names: Vec<String>,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn new(names: Vec<String>, values: Vec<f64>) -> Result<Self> {
        if names.len() != values.len() {
            return Err(PredictorError::InvalidInput(format!(
                "{} feature names for {} values",
                names.len(),
                values.len()
            )));
        }
        Ok(Self { names, values })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

}

/// Everything assembled for one request.
#[derive(Debug, Clone)]
pub struct Matchup {
    pub features: FeatureVector,
    pub stats: MatchupStats,
    /// Messages for team identities the encoder did not know
    pub unknown_categories: Vec<String>,
}

/// Borrows the shared serving state; never mutates it.
pub struct FeatureAssembler<'a> {
    repository: &'a StatsRepository,
    encoder_schema: &'a EncodingSchema,
    scaler_params: &'a ScalingParameters,
    trained_schema: &'a [String],
}

impl<'a> FeatureAssembler<'a> {
    pub fn new(
        repository: &'a StatsRepository,
        encoder_schema: &'a EncodingSchema,
        scaler_params: &'a ScalingParameters,
        trained_schema: &'a [String],
    ) -> Self {
        Self {
            repository,
            encoder_schema,
            scaler_params,
            trained_schema,
        }
    }

    /// The reconciled feature vector for one matchup, together with the stats
    /// it was built from and any encoder warnings.
    pub fn assemble(&self, visitor_team: &str, home_team: &str) -> Result<Matchup> {
        let visitor = self.repository.lookup(visitor_team, TeamRole::Visitor)?;
        let home = self.repository.lookup(home_team, TeamRole::Home)?;
        let stats = MatchupStats::from_records(visitor, home);

        let encoded = FeatureEncoder::transform(&[visitor_team, home_team], self.encoder_schema)?;
        let unknown_categories = encoded.unknown.iter().map(|e| e.to_string()).collect();

        let mut assembled = encoded.columns;
        assembled.extend(stats.columns().iter().map(|(n, v)| (n.to_string(), *v)));

        let features = self.reconcile(assembled)?;

        Ok(Matchup {
            features,
            stats,
            unknown_categories,
        })
    }

    /// Align assembled columns to the trained schema: trained indicator columns
    /// that were not assembled are 0, untrained columns are dropped, order follows
    /// the schema. A trained non-indicator column that was not assembled means
    /// historical data the model needs is missing, which is fatal.
    pub fn reconcile(&self, assembled: Vec<(String, f64)>) -> Result<FeatureVector> {
        let assembled_len = assembled.len();
        let mut by_name: HashMap<String, f64> = assembled.into_iter().collect();

        let mut values = Vec::with_capacity(self.trained_schema.len());
        for name in self.trained_schema {
            match by_name.remove(name) {
                Some(value) => values.push(value),
                None if self.encoder_schema.is_indicator(name) => values.push(0.0),
                None if self.scaler_params.column(name).is_some() => {
                    return Err(PredictorError::SchemaMismatch(format!(
                        "trained feature '{}' is a label-adjacent column and is not available at serving time",
                        name
                    )));
                }
                None => {
                    return Err(PredictorError::SchemaMismatch(format!(
                        "trained feature '{}' has no historical source",
                        name
                    )));
                }
            }
        }

        if !by_name.is_empty() {
            tracing::debug!(
                "Dropped {} of {} assembled columns not in the trained schema",
                by_name.len(),
                assembled_len
            );
        }

        FeatureVector::new(self.trained_schema.to_vec(), values)
    }
}

#[cfg(test)]
impl FeatureVector {
    fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ProcessedGame, HOME_ALLOWED_AVG, HOME_GOALS_AVG, VISITOR_ALLOWED_AVG, VISITOR_GOALS_AVG,
    };
    use crate::services::scaler::FeatureScaler;
    use chrono::NaiveDate;

    fn game(day: u32, visitor: &str, home: &str, avgs: [f64; 4]) -> ProcessedGame {
        ProcessedGame {
            date: NaiveDate::from_ymd_opt(2023, 1, day).unwrap(),
            visitor_team: visitor.to_string(),
            home_team: home.to_string(),
            visitor_goals: 0.0,
            home_goals: 0.0,
            goal_difference: 0.0,
            visitor_won: 0,
            visitor_goals_avg: avgs[0],
            visitor_allowed_avg: avgs[1],
            home_goals_avg: avgs[2],
            home_allowed_avg: avgs[3],
        }
    }

    struct Fixture {
        repository: StatsRepository,
        encoder: EncodingSchema,
        scaler: ScalingParameters,
    }

    fn fixture() -> Fixture {
        let games = vec![
            game(1, "Boston Bruins", "Dallas Stars", [3.0, 2.0, 2.5, 3.5]),
            game(2, "Dallas Stars", "Boston Bruins", [1.0, 4.0, 2.0, 1.0]),
            game(3, "Boston Bruins", "Dallas Stars", [3.5, 2.0, 2.1, 3.0]),
            // Seen in history but not when the encoder was fit
            game(4, "Seattle Kraken", "Dallas Stars", [2.2, 2.4, 2.3, 2.9]),
        ];
        let encoder = FeatureEncoder::new(&["Visitor Team", "Home Team"])
            .fit(&[
                vec!["Boston Bruins", "Dallas Stars"],
                vec!["Dallas Stars", "Boston Bruins"],
            ])
            .unwrap();
        let goals = [1.0, 2.0, 4.0];
        let scaler = FeatureScaler::fit(&[("Goal Difference", &goals[..])]).unwrap();
        Fixture {
            repository: StatsRepository::from_games(&games),
            encoder,
            scaler,
        }
    }

    fn trained_schema(encoder: &EncodingSchema) -> Vec<String> {
        let mut schema: Vec<String> = [VISITOR_GOALS_AVG, VISITOR_ALLOWED_AVG, HOME_GOALS_AVG, HOME_ALLOWED_AVG]
            .iter()
            .map(|s| s.to_string())
            .collect();
        schema.extend(encoder.feature_names());
        schema
    }

    #[test]
    fn test_assembled_keys_match_trained_schema_in_order() {
        let fx = fixture();
        let schema = trained_schema(&fx.encoder);
        let assembler = FeatureAssembler::new(&fx.repository, &fx.encoder, &fx.scaler, &schema);

        for (visitor, home) in [
            ("Boston Bruins", "Dallas Stars"),
            ("Dallas Stars", "Boston Bruins"),
        ] {
            let features = assembler.assemble(visitor, home).unwrap().features;
            assert_eq!(features.names(), schema.as_slice());
        }
    }

    #[test]
    fn test_uses_latest_averages_and_indicators() {
        let fx = fixture();
        let schema = trained_schema(&fx.encoder);
        let assembler = FeatureAssembler::new(&fx.repository, &fx.encoder, &fx.scaler, &schema);

        let features = assembler.assemble("Boston Bruins", "Dallas Stars").unwrap().features;
        assert_eq!(features.get(VISITOR_GOALS_AVG), Some(3.5));
        assert_eq!(features.get(HOME_GOALS_AVG), Some(2.3));
        assert_eq!(features.get("Visitor Team_Boston Bruins"), Some(1.0));
        assert_eq!(features.get("Visitor Team_Dallas Stars"), Some(0.0));
        assert_eq!(features.get("Home Team_Dallas Stars"), Some(1.0));
    }

    #[test]
    fn test_team_unknown_to_encoder_gets_zero_block() {
        let fx = fixture();
        let schema = trained_schema(&fx.encoder);
        let assembler = FeatureAssembler::new(&fx.repository, &fx.encoder, &fx.scaler, &schema);

        let matchup = assembler
            .assemble("Seattle Kraken", "Dallas Stars")
            .unwrap();
        assert_eq!(matchup.features.get("Visitor Team_Boston Bruins"), Some(0.0));
        assert_eq!(matchup.features.get("Visitor Team_Dallas Stars"), Some(0.0));
        assert_eq!(matchup.features.get(VISITOR_GOALS_AVG), Some(2.2));
        assert_eq!(matchup.unknown_categories.len(), 1);
        assert!(matchup.unknown_categories[0].contains("Seattle Kraken"));
    }

    #[test]
    fn test_unknown_team_fails() {
        let fx = fixture();
        let schema = trained_schema(&fx.encoder);
        let assembler = FeatureAssembler::new(&fx.repository, &fx.encoder, &fx.scaler, &schema);

        assert!(matches!(
            assembler.assemble("Quebec Nordiques", "Dallas Stars"),
            Err(PredictorError::UnknownTeam { .. })
        ));
        // Seattle only ever played as visitor
        assert!(matches!(
            assembler.assemble("Boston Bruins", "Seattle Kraken"),
            Err(PredictorError::UnknownTeam { role: TeamRole::Home, .. })
        ));
    }

    #[test]
    fn test_reconcile_zero_fills_and_drops() {
        let fx = fixture();
        let schema = vec![
            "Home Team_Vegas Golden Knights".to_string(),
            HOME_GOALS_AVG.to_string(),
        ];
        let assembler = FeatureAssembler::new(&fx.repository, &fx.encoder, &fx.scaler, &schema);

        let features = assembler
            .reconcile(vec![
                (HOME_GOALS_AVG.to_string(), 2.5),
                ("Extra".to_string(), 9.0),
            ])
            .unwrap();
        assert_eq!(features.names(), schema.as_slice());
        assert_eq!(features.values(), &[0.0, 2.5]);
    }

    #[test]
    fn test_reconcile_rejects_missing_historical_column() {
        let fx = fixture();
        let schema = vec![HOME_GOALS_AVG.to_string(), "Goal Difference".to_string()];
        let assembler = FeatureAssembler::new(&fx.repository, &fx.encoder, &fx.scaler, &schema);
        assert!(matches!(
            assembler.assemble("Boston Bruins", "Dallas Stars"),
            Err(PredictorError::SchemaMismatch(_))
        ));

        let schema = vec!["Rest Days".to_string()];
        let assembler = FeatureAssembler::new(&fx.repository, &fx.encoder, &fx.scaler, &schema);
        assert!(matches!(
            assembler.assemble("Boston Bruins", "Dallas Stars"),
            Err(PredictorError::SchemaMismatch(_))
        ));
    }
}
