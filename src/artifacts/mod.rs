//! Locations and load/store of the data tables and fitted artifacts.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PredictorError, Result};
use crate::models::{GameRecord, ProcessedGame};

pub const ENCODER_FILE: &str = "encoder.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const MODEL_FILE: &str = "model.json";

#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub raw_data: PathBuf,
    pub processed_data: PathBuf,
    pub model_dir: PathBuf,
}

impl ArtifactPaths {
    pub fn from_env() -> Self {
        let raw_data = env::var("NHL_RAW_DATA")
            .unwrap_or_else(|_| "data/raw/nhl_game_data.csv".to_string());
        let processed_data = env::var("NHL_PROCESSED_DATA")
            .unwrap_or_else(|_| "data/processed/cleaned_nhl_game_data.csv".to_string());
        let model_dir = env::var("NHL_MODEL_DIR").unwrap_or_else(|_| "models".to_string());

        Self {
            raw_data: raw_data.into(),
            processed_data: processed_data.into(),
            model_dir: model_dir.into(),
        }
    }

    pub fn encoder_path(&self) -> PathBuf {
        self.model_dir.join(ENCODER_FILE)
    }

    pub fn scaler_path(&self) -> PathBuf {
        self.model_dir.join(SCALER_FILE)
    }

    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join(MODEL_FILE)
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Raw box scores, `Date,Visitor Team,Home Team,Visitor Goals,Home Goals`.
pub fn read_games(path: &Path) -> Result<Vec<GameRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let games = reader
        .deserialize::<GameRecord>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    tracing::info!("Read {} games from {}", games.len(), path.display());
    Ok(games)
}

pub fn read_processed(path: &Path) -> Result<Vec<ProcessedGame>> {
    let mut reader = csv::Reader::from_path(path)?;
    let games = reader
        .deserialize::<ProcessedGame>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    tracing::info!("Read {} processed games from {}", games.len(), path.display());
    Ok(games)
}

pub fn write_processed(path: &Path, games: &[ProcessedGame]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    for game in games {
        writer.serialize(game)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn store_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    tracing::debug!("Stored {}", path.display());
    Ok(())
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json = fs::read_to_string(path).map_err(|e| {
        PredictorError::Data(format!("cannot read artifact {}: {}", path.display(), e))
    })?;
    Ok(serde_json::from_str(&json)?)
}
