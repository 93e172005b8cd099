use thiserror::Error;

use crate::models::TeamRole;

pub type Result<T> = std::result::Result<T, PredictorError>;

#[derive(Debug, Error)]
pub enum PredictorError {
    /// No historical record exists for the team in the requested role.
    #[error("unknown team '{team}' as {role}{}", suggestion.as_ref().map_or(String::new(), |s| format!(" (did you mean '{}'?)", s)))]
    UnknownTeam {
        team: String,
        role: TeamRole,
        suggestion: Option<String>,
    },

    /// A transform-time value the encoder never saw during fit.
    #[error("category '{value}' was not seen for column '{column}' when the encoder was fit")]
    UnknownCategory { column: String, value: String },

    /// A fit-time column with zero variance.
    #[error("column '{column}' has zero variance; left unscaled")]
    DegenerateColumn { column: String },

    #[error("feature schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("data error: {0}")]
    Data(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
