mod api;
mod artifacts;
mod cli;
mod error;
mod models;
mod services;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::artifacts::ArtifactPaths;

#[derive(Parser)]
#[command(name = "nhl-predictor")]
#[command(about = "Predicts NHL matchup winners from rolling team statistics")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
    /// Build the processed table, encoder and scaler from raw box scores
    Preprocess {
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Train the classifier on the processed table
    Train,
    /// Report classifier metrics over the whole processed table
    Evaluate,
    /// Predict a single matchup
    Predict {
        #[arg(short, long)]
        visitor: String,
        #[arg(long)]
        home: String,
    },
    /// Query team statistics
    Team {
        #[arg(short, long)]
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let paths = ArtifactPaths::from_env();

    match cli.command {
        Some(Commands::Serve { port }) => {
            tracing::info!("Starting NHL predictor API server on port {}", port);
            api::serve(port, &paths).await?;
        }
        Some(Commands::Preprocess { input }) => {
            tracing::info!("Preprocessing raw game data...");
            cli::preprocess_data(&paths, input.as_deref())?;
        }
        Some(Commands::Train) => {
            tracing::info!("Training classifier...");
            cli::train_model(&paths)?;
        }
        Some(Commands::Evaluate) => {
            tracing::info!("Evaluating classifier...");
            cli::evaluate_model(&paths)?;
        }
        Some(Commands::Predict { visitor, home }) => {
            tracing::info!("Predicting {} at {}", visitor, home);
            cli::predict_matchup(&paths, &visitor, &home)?;
        }
        Some(Commands::Team { name }) => {
            tracing::info!("Querying team: {}", name);
            cli::query_team(&paths, &name)?;
        }
        None => {
            // Default to serving
            tracing::info!("Starting NHL predictor API server on port 3000");
            api::serve(3000, &paths).await?;
        }
    }

    Ok(())
}
