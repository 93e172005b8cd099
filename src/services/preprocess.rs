//! Raw box scores to the processed table plus the fitted encoder and scaler.

use std::collections::HashMap;

use crate::error::{PredictorError, Result};
use crate::models::{GameRecord, ProcessedGame, CATEGORICAL_COLUMNS, LABEL_ADJACENT_COLUMNS};
use crate::services::encoder::{EncodingSchema, FeatureEncoder};
use crate::services::scaler::{FeatureScaler, ScalingParameters};
use crate::utils::rolling_mean;

/// Games per rolling average.
pub const ROLLING_WINDOW: usize = 5;

pub struct PreprocessOutput {
    pub games: Vec<ProcessedGame>,
    pub encoder: EncodingSchema,
    pub scaler: ScalingParameters,
}

pub fn preprocess(mut raw: Vec<GameRecord>) -> Result<PreprocessOutput> {
    if raw.is_empty() {
        return Err(PredictorError::Data("no games to preprocess".to_string()));
    }
    if let Some(row) = raw
        .iter()
        .position(|g| g.visitor_team.trim().is_empty() || g.home_team.trim().is_empty())
    {
        return Err(PredictorError::Data(format!(
            "row {} has an empty team name",
            row + 1
        )));
    }

    // Stable: same-day games keep their scraped order
    raw.sort_by_key(|g| g.date);

    let visitor_goals: Vec<f64> = raw.iter().map(|g| f64::from(g.visitor_goals)).collect();
    let home_goals: Vec<f64> = raw.iter().map(|g| f64::from(g.home_goals)).collect();
    let goal_difference: Vec<f64> = visitor_goals
        .iter()
        .zip(&home_goals)
        .map(|(v, h)| v - h)
        .collect();

    let (visitor_goals_avg, visitor_allowed_avg) =
        grouped_rolling(&raw, |g| &g.visitor_team, &visitor_goals, &home_goals);
    let (home_goals_avg, home_allowed_avg) =
        grouped_rolling(&raw, |g| &g.home_team, &home_goals, &visitor_goals);

    let categories: Vec<Vec<&str>> = raw
        .iter()
        .map(|g| vec![g.visitor_team.as_str(), g.home_team.as_str()])
        .collect();
    let encoder = FeatureEncoder::new(&CATEGORICAL_COLUMNS).fit(&categories)?;

    let label_adjacent: Vec<(&str, &[f64])> = LABEL_ADJACENT_COLUMNS
        .iter()
        .copied()
        .zip([&visitor_goals[..], &home_goals[..], &goal_difference[..]])
        .collect();
    let scaler = FeatureScaler::fit(&label_adjacent)?;

    let mut games = Vec::with_capacity(raw.len());
    for (i, game) in raw.iter().enumerate() {
        let scaled = FeatureScaler::transform(
            &[visitor_goals[i], home_goals[i], goal_difference[i]],
            &scaler,
        )?;
        games.push(ProcessedGame {
            date: game.date,
            visitor_team: game.visitor_team.clone(),
            home_team: game.home_team.clone(),
            visitor_goals: scaled[0],
            home_goals: scaled[1],
            goal_difference: scaled[2],
            visitor_won: u8::from(game.visitor_goals > game.home_goals),
            visitor_goals_avg: visitor_goals_avg[i],
            visitor_allowed_avg: visitor_allowed_avg[i],
            home_goals_avg: home_goals_avg[i],
            home_allowed_avg: home_allowed_avg[i],
        });
    }

    tracing::info!(
        "Preprocessed {} games, {} indicator columns",
        games.len(),
        encoder.width()
    );

    Ok(PreprocessOutput {
        games,
        encoder,
        scaler,
    })
}

/// Rolling means of `scored` and `allowed` over each team's games in table order,
/// where the team is picked by `key`.
fn grouped_rolling<'a, F>(
    games: &'a [GameRecord],
    key: F,
    scored: &[f64],
    allowed: &[f64],
) -> (Vec<f64>, Vec<f64>)
where
    F: Fn(&'a GameRecord) -> &'a String,
{
    let mut groups: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, game) in games.iter().enumerate() {
        groups.entry(key(game).as_str()).or_default().push(i);
    }

    let mut scored_avg = vec![0.0; games.len()];
    let mut allowed_avg = vec![0.0; games.len()];
    for idx in groups.values() {
        let team_scored: Vec<f64> = idx.iter().map(|&i| scored[i]).collect();
        let team_allowed: Vec<f64> = idx.iter().map(|&i| allowed[i]).collect();
        for ((&i, s), a) in idx
            .iter()
            .zip(rolling_mean(&team_scored, ROLLING_WINDOW))
            .zip(rolling_mean(&team_allowed, ROLLING_WINDOW))
        {
            scored_avg[i] = s;
            allowed_avg[i] = a;
        }
    }
    (scored_avg, allowed_avg)
}
