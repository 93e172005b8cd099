use anyhow::{Context, Result};
use std::path::Path;

use crate::artifacts::{self, ArtifactPaths};
use crate::models::TeamRole;
use crate::services::{
    preprocess, stratified_split, training_schema, training_set, Classifier,
    ClassificationReport, EncodingSchema, FeatureScaler, FeatureVector, LogisticModel,
    MatchupPredictor, ScalingParameters, StatsRepository, TrainingConfig,
};
use crate::utils::{closest_match, format_stat};

pub fn preprocess_data(paths: &ArtifactPaths, input: Option<&Path>) -> Result<()> {
    let input = input.unwrap_or(paths.raw_data.as_path());

    println!("🧹 Preprocessing {}...", input.display());

    let raw = artifacts::read_games(input)
        .with_context(|| format!("failed to read raw games from {}", input.display()))?;
    let output = preprocess(raw)?;

    artifacts::write_processed(&paths.processed_data, &output.games)?;
    artifacts::store_json(&paths.encoder_path(), &output.encoder)?;
    artifacts::store_json(&paths.scaler_path(), &output.scaler)?;

    for warning in output.scaler.degenerate_columns() {
        println!("⚠️  {}", warning);
    }

    println!("✅ Processed {} games", output.games.len());
    println!("   Table:   {}", paths.processed_data.display());
    println!(
        "   Encoder: {} ({} indicator columns)",
        paths.encoder_path().display(),
        output.encoder.width()
    );
    println!(
        "   Scaler:  {} ({})",
        paths.scaler_path().display(),
        output.scaler.column_names().join(", ")
    );

    Ok(())
}

pub fn train_model(paths: &ArtifactPaths) -> Result<()> {
    let games = artifacts::read_processed(&paths.processed_data)?;
    let encoder: EncodingSchema = artifacts::load_json(&paths.encoder_path())
        .context("encoder not found; run `nhl-predictor preprocess` first")?;
    let config = TrainingConfig::default();

    println!("🏋️  Training on {} games...", games.len());

    let (rows, labels) = training_set(&games, &encoder)?;
    let (train, test) = stratified_split(&labels, config.test_fraction, config.seed);

    let model = LogisticModel::fit(
        training_schema(&encoder),
        &select(&rows, &train),
        &select(&labels, &train),
        &config,
    )?;

    println!("📊 Held-out report ({} games):\n", test.len());
    let report = evaluate_rows(&model, &select(&rows, &test), &select(&labels, &test))?;
    println!("{}", report);

    artifacts::store_json(&paths.model_path(), &model)?;
    println!(
        "✅ Saved {} ({} features) to {}",
        model.model_version,
        model.feature_names.len(),
        paths.model_path().display()
    );

    Ok(())
}

pub fn evaluate_model(paths: &ArtifactPaths) -> Result<()> {
    let games = artifacts::read_processed(&paths.processed_data)?;
    let encoder: EncodingSchema = artifacts::load_json(&paths.encoder_path())?;
    let model: LogisticModel = artifacts::load_json(&paths.model_path())
        .context("model not found; run `nhl-predictor train` first")?;

    println!("🧪 Evaluating {} on {} games...\n", model.model_version, games.len());

    let (rows, labels) = training_set(&games, &encoder)?;
    let report = evaluate_rows(&model, &rows, &labels)?;
    println!("{}", report);

    Ok(())
}

pub fn predict_matchup(paths: &ArtifactPaths, visitor_team: &str, home_team: &str) -> Result<()> {
    let predictor = MatchupPredictor::load(paths)?;

    println!("🔮 {} at {}", visitor_team, home_team);

    let result = predictor.predict_matchup(visitor_team, home_team)?;
    let stats = result.contributing_stats;

    println!("\n🏒 Prediction: {}\n", result.label.as_str());
    println!(
        "   Visitor: {} scored | {} allowed",
        format_stat(stats.visitor_goals_avg),
        format_stat(stats.visitor_allowed_avg)
    );
    println!(
        "   Home:    {} scored | {} allowed\n",
        format_stat(stats.home_goals_avg),
        format_stat(stats.home_allowed_avg)
    );
    for line in &result.rationale {
        println!("   • {}", line);
    }
    for warning in &result.unknown_categories {
        println!("⚠️  {}", warning);
    }

    Ok(())
}

pub fn query_team(paths: &ArtifactPaths, team_name: &str) -> Result<()> {
    let games = artifacts::read_processed(&paths.processed_data)?;
    let encoder: EncodingSchema = artifacts::load_json(&paths.encoder_path())?;
    let scaler: ScalingParameters = artifacts::load_json(&paths.scaler_path())?;
    let repository = StatsRepository::from_games(&games);

    println!("🔍 Searching for team: {}", team_name);

    let mut known: Vec<&str> = repository.teams(TeamRole::Visitor);
    known.extend(repository.teams(TeamRole::Home));
    known.sort_unstable();
    known.dedup();

    let team = match known.iter().find(|t| t.eq_ignore_ascii_case(team_name)) {
        Some(&exact) => exact,
        None => match closest_match(team_name, known.iter().copied()) {
            Some(close) => {
                println!("💡 No exact match, showing '{}'", close);
                close
            }
            None => {
                println!("❌ No teams found matching '{}'", team_name);
                println!("\n💡 Known teams:");
                for team in &known {
                    println!("   • {}", team);
                }
                return Ok(());
            }
        },
    };

    for role in [TeamRole::Visitor, TeamRole::Home] {
        println!("\n📊 As {} team:", role);

        let latest = match repository.lookup(team, role) {
            Ok(record) => record,
            Err(_) => {
                println!("   No games played as {}", role);
                continue;
            }
        };
        println!(
            "   Rolling averages: {} scored | {} allowed",
            format_stat(latest.goals_avg),
            format_stat(latest.allowed_avg)
        );

        if !encoder.contains(role.category_column(), team) {
            println!("   ⚠️  Not in the encoder; predictions zero its indicator");
        }

        println!("   Recent games:");
        for record in repository.history(team, role, 5) {
            let game = &games[record.as_of];
            let goals = FeatureScaler::inverse_transform(
                &[game.visitor_goals, game.home_goals, game.goal_difference],
                &scaler,
            )?;
            let opponent = match role {
                TeamRole::Visitor => format!("at {}", game.home_team),
                TeamRole::Home => format!("vs {}", game.visitor_team),
            };
            println!(
                "   {} {} ({:.0}-{:.0})",
                game.date.format("%m/%d"),
                opponent,
                goals[0],
                goals[1]
            );
        }
    }

    Ok(())
}

fn select<T: Clone>(items: &[T], idx: &[usize]) -> Vec<T> {
    idx.iter().map(|&i| items[i].clone()).collect()
}

fn evaluate_rows(model: &LogisticModel, rows: &[Vec<f64>], labels: &[u8]) -> Result<ClassificationReport> {
    let mut predicted = Vec::with_capacity(rows.len());
    for row in rows {
        let features = FeatureVector::new(model.feature_schema().to_vec(), row.clone())?;
        predicted.push(model.predict(&features)?);
    }
    tracing::debug!("Evaluated {} rows", rows.len());
    Ok(ClassificationReport::from_predictions(labels, &predicted))
}
