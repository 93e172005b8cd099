use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// Column names shared by the processed table, the encoder and the model schema
pub const VISITOR_TEAM: &str = "Visitor Team";
pub const HOME_TEAM: &str = "Home Team";
pub const VISITOR_GOALS: &str = "Visitor Goals";
pub const HOME_GOALS: &str = "Home Goals";
pub const GOAL_DIFFERENCE: &str = "Goal Difference";
pub const VISITOR_GOALS_AVG: &str = "Visitor_Goals_Avg";
pub const VISITOR_ALLOWED_AVG: &str = "Visitor_Allowed_Avg";
pub const HOME_GOALS_AVG: &str = "Home_Goals_Avg";
pub const HOME_ALLOWED_AVG: &str = "Home_Allowed_Avg";

/// Categorical columns one-hot encoded for the model, in encoding order.
pub const CATEGORICAL_COLUMNS: [&str; 2] = [VISITOR_TEAM, HOME_TEAM];

/// Label-adjacent columns standardized during preprocessing.
pub const LABEL_ADJACENT_COLUMNS: [&str; 3] = [VISITOR_GOALS, HOME_GOALS, GOAL_DIFFERENCE];

/// The four rolling averages fed to the model, in table order.
pub const ROLLING_AVERAGE_COLUMNS: [&str; 4] = [
    VISITOR_GOALS_AVG,
    VISITOR_ALLOWED_AVG,
    HOME_GOALS_AVG,
    HOME_ALLOWED_AVG,
];

/// One box score as scraped: `Date,Visitor Team,Home Team,Visitor Goals,Home Goals`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Visitor Team")]
    pub visitor_team: String,
    #[serde(rename = "Home Team")]
    pub home_team: String,
    #[serde(rename = "Visitor Goals")]
    pub visitor_goals: u32,
    #[serde(rename = "Home Goals")]
    pub home_goals: u32,
}

/// A row of the processed table. Row position is the chronological ordinal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedGame {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Visitor Team")]
    pub visitor_team: String,
    #[serde(rename = "Home Team")]
    pub home_team: String,
    /// Standardized visitor goals
    #[serde(rename = "Visitor Goals")]
    pub visitor_goals: f64,
    /// Standardized home goals
    #[serde(rename = "Home Goals")]
    pub home_goals: f64,
    /// Standardized goal difference
    #[serde(rename = "Goal Difference")]
    pub goal_difference: f64,
    /// 1 when the visitor outscored the home team, computed before scaling
    #[serde(rename = "Visitor Win")]
    pub visitor_won: u8,
    #[serde(rename = "Visitor_Goals_Avg")]
    pub visitor_goals_avg: f64,
    #[serde(rename = "Visitor_Allowed_Avg")]
    pub visitor_allowed_avg: f64,
    #[serde(rename = "Home_Goals_Avg")]
    pub home_goals_avg: f64,
    #[serde(rename = "Home_Allowed_Avg")]
    pub home_allowed_avg: f64,
}

impl ProcessedGame {
    pub fn rolling_averages(&self) -> [f64; 4] {
        [
            self.visitor_goals_avg,
            self.visitor_allowed_avg,
            self.home_goals_avg,
            self.home_allowed_avg,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamRole {
    Visitor,
    Home,
}

impl TeamRole {
    /// The categorical column that identifies a team in this role.
    pub fn category_column(self) -> &'static str {
        match self {
            TeamRole::Visitor => VISITOR_TEAM,
            TeamRole::Home => HOME_TEAM,
        }
    }
}

impl fmt::Display for TeamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeamRole::Visitor => write!(f, "visitor"),
            TeamRole::Home => write!(f, "home"),
        }
    }
}

/// Rolling averages for one team in one role at one point of the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStatsRecord {
    pub team_identity: String,
    pub role: TeamRole,
    pub goals_avg: f64,
    pub allowed_avg: f64,
    /// Ordinal position in the chronological history
    pub as_of: usize,
}

/// The four averages a matchup prediction is built from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchupStats {
    pub visitor_goals_avg: f64,
    pub visitor_allowed_avg: f64,
    pub home_goals_avg: f64,
    pub home_allowed_avg: f64,
}

impl MatchupStats {
    pub fn from_records(visitor: &TeamStatsRecord, home: &TeamStatsRecord) -> Self {
        Self {
            visitor_goals_avg: visitor.goals_avg,
            visitor_allowed_avg: visitor.allowed_avg,
            home_goals_avg: home.goals_avg,
            home_allowed_avg: home.allowed_avg,
        }
    }

    /// Named columns in `ROLLING_AVERAGE_COLUMNS` order.
    pub fn columns(&self) -> [(&'static str, f64); 4] {
        [
            (VISITOR_GOALS_AVG, self.visitor_goals_avg),
            (VISITOR_ALLOWED_AVG, self.visitor_allowed_avg),
            (HOME_GOALS_AVG, self.home_goals_avg),
            (HOME_ALLOWED_AVG, self.home_allowed_avg),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredictionLabel {
    VisitorWins,
    HomeWins,
}

impl PredictionLabel {
    /// Class 1 is a visitor win; anything else is a home win.
    pub fn from_class(class: u8) -> Self {
        if class == 1 {
            PredictionLabel::VisitorWins
        } else {
            PredictionLabel::HomeWins
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PredictionLabel::VisitorWins => "Visitor Wins",
            PredictionLabel::HomeWins => "Home Wins",
        }
    }

    pub fn side(self) -> &'static str {
        match self {
            PredictionLabel::VisitorWins => "visitor",
            PredictionLabel::HomeWins => "home",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: PredictionLabel,
    pub contributing_stats: MatchupStats,
    pub rationale: Vec<String>,
    /// Warnings for teams the encoder never saw; their indicator block is all zeros
    pub unknown_categories: Vec<String>,
}

// API request/response types
#[derive(Debug, Clone, Deserialize)]
pub struct PredictRequest {
    pub visitor_team: String,
    pub home_team: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitorStats {
    pub visitor_goals_avg: f64,
    pub visitor_allowed_avg: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeStats {
    pub home_goals_avg: f64,
    pub home_allowed_avg: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: String,
    pub visitor_stats: VisitorStats,
    pub home_stats: HomeStats,
    /// Not a model feature; always null
    pub goal_difference: Option<f64>,
    pub explanation: String,
    pub unknown_categories: Vec<String>,
}

impl From<PredictionResult> for PredictResponse {
    fn from(result: PredictionResult) -> Self {
        let stats = result.contributing_stats;
        Self {
            prediction: result.label.as_str().to_string(),
            visitor_stats: VisitorStats {
                visitor_goals_avg: stats.visitor_goals_avg,
                visitor_allowed_avg: stats.visitor_allowed_avg,
            },
            home_stats: HomeStats {
                home_goals_avg: stats.home_goals_avg,
                home_allowed_avg: stats.home_allowed_avg,
            },
            goal_difference: None,
            explanation: result.rationale.join(" "),
            unknown_categories: result.unknown_categories,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnownTeams {
    pub visitor: Vec<String>,
    pub home: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: Utc::now(),
        }
    }
}
