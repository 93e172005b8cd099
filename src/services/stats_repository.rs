//! Historical per-team rolling statistics.
//!
//! Built once from the processed table and read-only afterwards. Every game
//! contributes one record for the visitor (as visitor) and one for the home
//! team (as home); a lookup returns the latest record for the pair.

use std::collections::HashMap;

use crate::error::{PredictorError, Result};
use crate::models::{ProcessedGame, TeamRole, TeamStatsRecord};
use crate::utils::closest_match;

pub struct StatsRepository {
    /// All records in construction order
    records: Vec<TeamStatsRecord>,
    /// (role, team) -> index of the record with the highest `as_of`
    latest: HashMap<(TeamRole, String), usize>,
}

impl StatsRepository {
    /// Build from the processed table. Row position is the chronological ordinal.
    pub fn from_games(games: &[ProcessedGame]) -> Self {
        let records = games
            .iter()
            .enumerate()
            .flat_map(|(as_of, game)| {
                [
                    TeamStatsRecord {
                        team_identity: game.visitor_team.clone(),
                        role: TeamRole::Visitor,
                        goals_avg: game.visitor_goals_avg,
                        allowed_avg: game.visitor_allowed_avg,
                        as_of,
                    },
                    TeamStatsRecord {
                        team_identity: game.home_team.clone(),
                        role: TeamRole::Home,
                        goals_avg: game.home_goals_avg,
                        allowed_avg: game.home_allowed_avg,
                        as_of,
                    },
                ]
            })
            .collect();
        Self::from_records(records)
    }

    /// Records may arrive in any order; the one with the highest `as_of` wins,
    /// and among equal `as_of` the later one in the input.
    pub fn from_records(records: Vec<TeamStatsRecord>) -> Self {
        let mut latest: HashMap<(TeamRole, String), usize> = HashMap::new();
        for (i, record) in records.iter().enumerate() {
            let key = (record.role, record.team_identity.clone());
            match latest.get(&key) {
                Some(&j) if records[j].as_of > record.as_of => {}
                _ => {
                    latest.insert(key, i);
                }
            }
        }

        tracing::debug!(
            "Stats repository holds {} records for {} team/role pairs",
            records.len(),
            latest.len()
        );

        Self { records, latest }
    }

    /// Latest rolling-average record for `team` playing in `role`.
    pub fn lookup(&self, team: &str, role: TeamRole) -> Result<&TeamStatsRecord> {
        self.latest
            .get(&(role, team.to_string()))
            .map(|&i| &self.records[i])
            .ok_or_else(|| PredictorError::UnknownTeam {
                team: team.to_string(),
                role,
                suggestion: closest_match(team, self.teams(role)).map(str::to_string),
            })
    }

    /// Teams with at least one record in `role`, sorted.
    pub fn teams(&self, role: TeamRole) -> Vec<&str> {
        let mut teams: Vec<&str> = self
            .latest
            .keys()
            .filter(|(r, _)| *r == role)
            .map(|(_, team)| team.as_str())
            .collect();
        teams.sort_unstable();
        teams
    }

    /// The most recent `limit` records for a team in a role, newest first.
    pub fn history(&self, team: &str, role: TeamRole, limit: usize) -> Vec<&TeamStatsRecord> {
        let mut history: Vec<&TeamStatsRecord> = self
            .records
            .iter()
            .filter(|r| r.role == role && r.team_identity == team)
            .collect();
        history.sort_by(|a, b| b.as_of.cmp(&a.as_of));
        history.truncate(limit);
        history
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(team: &str, role: TeamRole, goals: f64, as_of: usize) -> TeamStatsRecord {
        TeamStatsRecord {
            team_identity: team.to_string(),
            role,
            goals_avg: goals,
            allowed_avg: 2.0,
            as_of,
        }
    }

    #[test]
    fn test_lookup_returns_tail_record() {
        let repo = StatsRepository::from_records(vec![
            record("Boston Bruins", TeamRole::Visitor, 2.0, 0),
            record("Boston Bruins", TeamRole::Home, 9.0, 1),
            record("Boston Bruins", TeamRole::Visitor, 3.0, 2),
            record("Dallas Stars", TeamRole::Visitor, 1.0, 3),
        ]);
        let rec = repo.lookup("Boston Bruins", TeamRole::Visitor).unwrap();
        assert_eq!(rec.goals_avg, 3.0);
        assert_eq!(rec.as_of, 2);
    }

    #[test]
    fn test_roles_are_separate() {
        let repo = StatsRepository::from_records(vec![record("Boston Bruins", TeamRole::Visitor, 2.0, 0)]);
        assert!(repo.lookup("Boston Bruins", TeamRole::Visitor).is_ok());
        assert!(matches!(
            repo.lookup("Boston Bruins", TeamRole::Home),
            Err(PredictorError::UnknownTeam { role: TeamRole::Home, .. })
        ));
    }

    #[test]
    fn test_out_of_order_records_resolve_by_as_of() {
        let repo = StatsRepository::from_records(vec![
            record("Dallas Stars", TeamRole::Home, 4.0, 7),
            record("Dallas Stars", TeamRole::Home, 1.5, 3),
        ]);
        assert_eq!(repo.lookup("Dallas Stars", TeamRole::Home).unwrap().goals_avg, 4.0);
    }

    #[test]
    fn test_unknown_team_suggests_close_name() {
        let repo = StatsRepository::from_records(vec![record("Boston Bruins", TeamRole::Visitor, 2.0, 0)]);
        match repo.lookup("Boston Bruns", TeamRole::Visitor) {
            Err(PredictorError::UnknownTeam { team, suggestion, .. }) => {
                assert_eq!(team, "Boston Bruns");
                assert_eq!(suggestion.as_deref(), Some("Boston Bruins"));
            }
            other => panic!("expected UnknownTeam, got {:?}", other),
        }
    }

    #[test]
    fn test_history_newest_first() {
        let repo = StatsRepository::from_records(vec![
            record("Boston Bruins", TeamRole::Home, 1.0, 0),
            record("Boston Bruins", TeamRole::Home, 2.0, 1),
            record("Boston Bruins", TeamRole::Home, 3.0, 2),
        ]);
        let history = repo.history("Boston Bruins", TeamRole::Home, 2);
        let goals: Vec<f64> = history.iter().map(|r| r.goals_avg).collect();
        assert_eq!(goals, vec![3.0, 2.0]);
        assert_eq!(repo.teams(TeamRole::Home), vec!["Boston Bruins"]);
        assert!(repo.teams(TeamRole::Visitor).is_empty());
    }
}
