//! Per-team view of the result table
//!
//! Each match the team played, with the team's own rolling features taken
//! from whichever side it was on.

use super::{mean, require_window};
use crate::features::{FeatureColumn, Metric, ResultTable};
use crate::{FootballError, MatchId, Outcome, Result, Role};
use chrono::NaiveDate;
use serde::Serialize;

/// Metrics shown in the team view
pub const TEAM_METRICS: [Metric; 9] = [
    Metric::Goals,
    Metric::Wins,
    Metric::Form,
    Metric::CleanSheets,
    Metric::ShotConversion,
    Metric::ShotAccuracy,
    Metric::YellowCards,
    Metric::RedCards,
    Metric::Fouls,
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricValue {
    pub metric: Metric,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamMatchView {
    pub match_id: MatchId,
    pub date: NaiveDate,
    pub role: Role,
    pub opponent: String,
    pub goals_for: u32,
    pub goals_against: u32,
    pub outcome: Outcome,
    /// Team's features at this match, in `TEAM_METRICS` order
    pub features: Vec<MetricValue>,
    /// Opponent's features from the other side of the same row
    pub opponent_features: Vec<MetricValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamReport {
    pub team: String,
    pub window: usize,
    pub matches: Vec<TeamMatchView>,
    /// Mean of each metric over the matches where it is present
    pub averages: Vec<MetricValue>,
}

pub fn team_report(table: &ResultTable, team: &str, window: usize) -> Result<TeamReport> {
    require_window(table, window)?;

    let matches: Vec<TeamMatchView> = table
        .team_rows(team)
        .map(|(row, role)| {
            let record = &row.record;
            let side_values = |side: Role| -> Vec<MetricValue> {
                TEAM_METRICS
                    .iter()
                    .map(|&metric| MetricValue {
                        metric,
                        value: table.feature(row, &FeatureColumn::new(side, window, metric)),
                    })
                    .collect()
            };
            TeamMatchView {
                match_id: record.id,
                date: record.date,
                role,
                opponent: record.team(role.opposite()).to_string(),
                goals_for: record.goals(role),
                goals_against: record.goals(role.opposite()),
                outcome: record.outcome_for(role),
                features: side_values(role),
                opponent_features: side_values(role.opposite()),
            }
        })
        .collect();

    if matches.is_empty() {
        return Err(FootballError::TeamNotFound(team.to_string()));
    }

    let averages = TEAM_METRICS
        .iter()
        .enumerate()
        .map(|(i, &metric)| {
            let present: Vec<f64> = matches
                .iter()
                .filter_map(|m| m.features[i].value)
                .collect();
            MetricValue {
                metric,
                value: mean(&present),
            }
        })
        .collect();

    log::debug!("{} matches for {} at window {}", matches.len(), team, window);

    Ok(TeamReport {
        team: team.to_string(),
        window,
        matches,
        averages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::store::fixtures::make_match;
    use crate::data::MatchStore;
    use crate::features::FeatureEngine;

    fn table() -> ResultTable {
        let store = MatchStore::new(vec![
            make_match(1, "Arsenal", "Spurs", 2, 0),
            make_match(2, "Chelsea", "Arsenal", 1, 1),
            make_match(3, "Spurs", "Chelsea", 0, 3),
            make_match(4, "Arsenal", "Chelsea", 0, 1),
        ])
        .unwrap();
        FeatureEngine::new(&[2, 5]).unwrap().run(&store).unwrap().table
    }

    fn lookup(values: &[MetricValue], metric: Metric) -> Option<f64> {
        values.iter().find(|v| v.metric == metric).and_then(|v| v.value)
    }

    fn value(view: &TeamMatchView, metric: Metric) -> Option<f64> {
        lookup(&view.features, metric)
    }

    #[test]
    fn test_team_matches_use_own_role() {
        let report = team_report(&table(), "Arsenal", 5).unwrap();
        assert_eq!(report.matches.len(), 3);

        let away = &report.matches[1];
        assert_eq!(away.match_id, MatchId(2));
        assert_eq!(away.role, Role::Away);
        assert_eq!(away.opponent, "Chelsea");
        assert_eq!(away.outcome, Outcome::Draw);
        assert_eq!(value(away, Metric::Goals), Some(3.0));
        assert_eq!(value(away, Metric::Wins), Some(1.0));

        let last = &report.matches[2];
        assert_eq!(last.goals_for, 0);
        assert_eq!(last.outcome, Outcome::Loss);
        // W, D, L: 4 of 9 points
        assert_eq!(value(last, Metric::Form), Some(4.0 / 9.0 * 100.0));
    }

    #[test]
    fn test_opponent_side_of_each_fixture() {
        let report = team_report(&table(), "Arsenal", 5).unwrap();

        // Match 2: Chelsea at home, first appearance, scored 1
        let second = &report.matches[1];
        assert_eq!(lookup(&second.opponent_features, Metric::Goals), Some(1.0));
        assert_eq!(lookup(&second.opponent_features, Metric::Wins), Some(0.0));

        // Match 4: Chelsea away, D then W then W
        let last = &report.matches[2];
        assert_eq!(lookup(&last.opponent_features, Metric::Goals), Some(5.0));
        assert_eq!(lookup(&last.opponent_features, Metric::Wins), Some(2.0));
        assert_eq!(last.opponent_features.len(), TEAM_METRICS.len());
    }

    #[test]
    fn test_window_limits_features() {
        let report = team_report(&table(), "Arsenal", 2).unwrap();
        // Window of two drops the opening win
        assert_eq!(value(&report.matches[2], Metric::Goals), Some(1.0));
        assert_eq!(value(&report.matches[2], Metric::Wins), Some(0.0));
    }

    #[test]
    fn test_averages() {
        let report = team_report(&table(), "Spurs", 5).unwrap();
        let goals = report
            .averages
            .iter()
            .find(|v| v.metric == Metric::Goals)
            .unwrap();
        assert_eq!(goals.value, Some(0.0));
        assert_eq!(report.averages.len(), TEAM_METRICS.len());
    }

    #[test]
    fn test_unknown_team_and_window() {
        let t = table();
        assert!(matches!(
            team_report(&t, "Leeds", 5),
            Err(FootballError::TeamNotFound(ref name)) if name == "Leeds"
        ));
        assert!(matches!(
            team_report(&t, "Arsenal", 38),
            Err(FootballError::Config(_))
        ));
    }
}
