//! Rolling window aggregation
//!
//! Trailing statistics over a team's own match history. Each window is a
//! single forward pass: the newest match is added to running totals and the
//! match that falls out of the window is subtracted again.

use super::history::TeamMatchHistory;
use super::metrics::Metric;
use crate::{FootballError, MatchId, MatchRecord, Outcome, Result, Role};
use std::collections::VecDeque;

/// One match seen from one team's side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamMatchLine {
    pub goals_for: u32,
    pub goals_against: u32,
    pub shots: u32,
    pub shots_on_target: u32,
    pub corners: u32,
    pub fouls: u32,
    pub yellow_cards: u32,
    pub red_cards: u32,
    pub outcome: Outcome,
}

impl TeamMatchLine {
    /// Role-adjusted view of a match for the team playing in `role`
    pub fn from_match(record: &MatchRecord, role: Role) -> Self {
        let own = record.side(role);
        TeamMatchLine {
            goals_for: record.goals(role),
            goals_against: record.goals(role.opposite()),
            shots: own.shots,
            shots_on_target: own.shots_on_target,
            corners: own.corners,
            fouls: own.fouls,
            yellow_cards: own.yellow_cards,
            red_cards: own.red_cards,
            outcome: record.outcome_for(role),
        }
    }
}

/// Running sums over the matches currently in a window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowTotals {
    pub matches: u64,
    pub goals_for: u64,
    pub goals_against: u64,
    pub wins: u64,
    pub draws: u64,
    pub losses: u64,
    pub shots: u64,
    pub shots_on_target: u64,
    pub corners: u64,
    pub fouls: u64,
    pub yellow_cards: u64,
    pub red_cards: u64,
    pub clean_sheets: u64,
    pub failed_to_score: u64,
}

impl WindowTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a match to the totals
    pub fn add(&mut self, line: &TeamMatchLine) {
        self.apply(line, 1);
    }

    /// Remove a match previously added
    pub fn remove(&mut self, line: &TeamMatchLine) {
        self.apply(line, -1);
    }

    fn apply(&mut self, line: &TeamMatchLine, sign: i8) {
        fn step(total: &mut u64, amount: u32, sign: i8) {
            if sign > 0 {
                *total += u64::from(amount);
            } else {
                *total -= u64::from(amount);
            }
        }

        step(&mut self.matches, 1, sign);
        step(&mut self.goals_for, line.goals_for, sign);
        step(&mut self.goals_against, line.goals_against, sign);
        step(&mut self.shots, line.shots, sign);
        step(&mut self.shots_on_target, line.shots_on_target, sign);
        step(&mut self.corners, line.corners, sign);
        step(&mut self.fouls, line.fouls, sign);
        step(&mut self.yellow_cards, line.yellow_cards, sign);
        step(&mut self.red_cards, line.red_cards, sign);
        step(&mut self.clean_sheets, u32::from(line.goals_against == 0), sign);
        step(&mut self.failed_to_score, u32::from(line.goals_for == 0), sign);

        match line.outcome {
            Outcome::Win => step(&mut self.wins, 1, sign),
            Outcome::Draw => step(&mut self.draws, 1, sign),
            Outcome::Loss => step(&mut self.losses, 1, sign),
        }
    }

    /// Standard three points for a win, one for a draw
    pub fn points(&self) -> u64 {
        3 * self.wins + self.draws
    }

    pub fn goal_difference(&self) -> i64 {
        self.goals_for as i64 - self.goals_against as i64
    }

    /// Goals per shot as a percentage, 0 when no shots were taken
    pub fn shot_conversion(&self) -> f64 {
        percentage(self.goals_for, self.shots)
    }

    /// Shots on target per shot as a percentage, 0 when no shots were taken
    pub fn shot_accuracy(&self) -> f64 {
        percentage(self.shots_on_target, self.shots)
    }

    /// Share of available points earned, 0 for an empty window
    pub fn form(&self) -> f64 {
        percentage(self.points(), self.matches * 3)
    }

    /// Value of a single metric
    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Goals => self.goals_for as f64,
            Metric::GoalsConceded => self.goals_against as f64,
            Metric::GoalDiff => self.goal_difference() as f64,
            Metric::Wins => self.wins as f64,
            Metric::Draws => self.draws as f64,
            Metric::Losses => self.losses as f64,
            Metric::Points => self.points() as f64,
            Metric::Shots => self.shots as f64,
            Metric::ShotsOnTarget => self.shots_on_target as f64,
            Metric::ShotConversion => self.shot_conversion(),
            Metric::ShotAccuracy => self.shot_accuracy(),
            Metric::Corners => self.corners as f64,
            Metric::Fouls => self.fouls as f64,
            Metric::YellowCards => self.yellow_cards as f64,
            Metric::RedCards => self.red_cards as f64,
            Metric::Form => self.form(),
            Metric::CleanSheets => self.clean_sheets as f64,
            Metric::FailedToScore => self.failed_to_score as f64,
        }
    }
}

fn percentage(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64 * 100.0
    }
}

/// Trailing window of at most `size` matches
#[derive(Debug, Clone)]
pub struct RollingWindow {
    size: usize,
    lines: VecDeque<TeamMatchLine>,
    totals: WindowTotals,
}

impl RollingWindow {
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(FootballError::InvalidWindow(size));
        }
        Ok(RollingWindow {
            size,
            lines: VecDeque::new(),
            totals: WindowTotals::new(),
        })
    }

    /// Add the newest match, evicting the oldest once the window is full
    pub fn push(&mut self, line: TeamMatchLine) -> &WindowTotals {
        if self.lines.len() == self.size {
            if let Some(evicted) = self.lines.pop_front() {
                self.totals.remove(&evicted);
            }
        }
        self.totals.add(&line);
        self.lines.push_back(line);
        &self.totals
    }

}

/// All metric values for one team at one match
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureBundle {
    /// Match at which the window ends
    pub match_id: MatchId,
    /// Number of matches that contributed
    pub matches_in_window: usize,
    values: [f64; Metric::COUNT],
}

impl FeatureBundle {
    pub fn from_totals(match_id: MatchId, totals: &WindowTotals) -> Self {
        FeatureBundle {
            match_id,
            matches_in_window: totals.matches as usize,
            values: Metric::ALL.map(|m| totals.metric(m)),
        }
    }

    pub fn get(&self, metric: Metric) -> f64 {
        self.values[metric.index()]
    }

    /// Values in `Metric::ALL` order
    pub fn values(&self) -> &[f64; Metric::COUNT] {
        &self.values
    }
}

/// Compute one bundle per match in the team's history, in chronological order.
///
/// `records` is the full store the history was indexed from.
pub fn aggregate(
    history: &TeamMatchHistory,
    records: &[MatchRecord],
    window: usize,
) -> Result<Vec<FeatureBundle>> {
    let mut rolling = RollingWindow::new(window)?;
    let mut bundles = Vec::with_capacity(history.len());

    for entry in &history.entries {
        let record = records.get(entry.position).ok_or_else(|| {
            FootballError::Internal(format!(
                "history of {} points past the end of the match log (position {})",
                history.team, entry.position
            ))
        })?;
        if record.team(entry.role) != history.team {
            return Err(FootballError::UnknownTeam {
                match_id: record.id,
                team: history.team.clone(),
            });
        }

        let totals = rolling.push(TeamMatchLine::from_match(record, entry.role));
        bundles.push(FeatureBundle::from_totals(record.id, totals));
    }

    Ok(bundles)
}

/// Feature sequence for one team and one window size
#[derive(Debug, Clone, PartialEq)]
pub struct TeamFeatureSeries {
    pub team: String,
    pub window: usize,
    pub bundles: Vec<FeatureBundle>,
}

impl TeamFeatureSeries {
    pub fn compute(
        history: &TeamMatchHistory,
        records: &[MatchRecord],
        window: usize,
    ) -> Result<Self> {
        Ok(TeamFeatureSeries {
            team: history.team.clone(),
            window,
            bundles: aggregate(history, records, window)?,
        })
    }

    /// Bundle for the window ending at `match_id`
    pub fn get(&self, match_id: MatchId) -> Option<&FeatureBundle> {
        self.bundles
            .binary_search_by_key(&match_id, |b| b.match_id)
            .ok()
            .map(|i| &self.bundles[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::store::fixtures::{make_match, make_match_with_stats, side};
    use crate::data::MatchStore;
    use crate::features::history::{index, HistoryEntry};

    fn series(store: &MatchStore, team: &str, window: usize) -> Vec<FeatureBundle> {
        let histories = index(store);
        aggregate(&histories[team], store.records(), window).unwrap()
    }

    /// Recompute a window from scratch for comparison with the sliding version
    fn brute_force(store: &MatchStore, team: &str, window: usize) -> Vec<WindowTotals> {
        let lines: Vec<TeamMatchLine> = store
            .records()
            .iter()
            .filter_map(|r| r.role_of(team).map(|role| TeamMatchLine::from_match(r, role)))
            .collect();
        (0..lines.len())
            .map(|i| {
                let start = (i + 1).saturating_sub(window);
                let mut totals = WindowTotals::new();
                for line in &lines[start..=i] {
                    totals.add(line);
                }
                totals
            })
            .collect()
    }

    fn league() -> MatchStore {
        let teams = ["A", "B", "C", "D"];
        let mut records = Vec::new();
        let mut id = 1;
        for round in 0..6u32 {
            for (i, home) in teams.iter().enumerate() {
                let away = teams[(i + 1 + round as usize % 3) % 4];
                if *home == away {
                    continue;
                }
                records.push(make_match_with_stats(
                    id,
                    home,
                    away,
                    ((id as u32 * 7) % 4, (id as u32 * 3) % 3),
                    side(
                        id as u32 % 9,
                        id as u32 % 5,
                        4,
                        11,
                        id as u32 % 3,
                        u32::from(id % 7 == 0),
                    ),
                    side((id as u32 * 5) % 8, (id as u32 * 2) % 4, 3, 9, 1, 0),
                ));
                id += 1;
            }
        }
        MatchStore::new(records).unwrap()
    }

    #[test]
    fn test_role_adjusted_line() {
        let record = make_match_with_stats(
            1,
            "A",
            "B",
            (2, 1),
            side(10, 4, 6, 12, 2, 0),
            side(7, 3, 2, 14, 3, 1),
        );
        let home = TeamMatchLine::from_match(&record, Role::Home);
        assert_eq!(home.goals_for, 2);
        assert_eq!(home.goals_against, 1);
        assert_eq!(home.shots, 10);
        assert_eq!(home.outcome, Outcome::Win);

        let away = TeamMatchLine::from_match(&record, Role::Away);
        assert_eq!(away.goals_for, 1);
        assert_eq!(away.goals_against, 2);
        assert_eq!(away.fouls, 14);
        assert_eq!(away.red_cards, 1);
        assert_eq!(away.outcome, Outcome::Loss);
    }

    #[test]
    fn test_expanding_window_at_start() {
        // Team A scores 1, 2, 0 in its first three matches, then 3 in the fourth
        let store = MatchStore::new(vec![
            make_match(1, "A", "B", 1, 0),
            make_match(2, "C", "A", 1, 2),
            make_match(3, "A", "D", 0, 0),
            make_match(4, "B", "A", 1, 3),
        ])
        .unwrap();
        let bundles = series(&store, "A", 5);
        assert_eq!(bundles.len(), 4);
        assert_eq!(bundles[3].matches_in_window, 4);
        assert_eq!(bundles[3].get(Metric::Goals), 6.0);
        assert_eq!(bundles[0].get(Metric::Goals), 1.0);
        assert_eq!(bundles[2].get(Metric::Goals), 3.0);
    }

    #[test]
    fn test_window_evicts_oldest() {
        let store = MatchStore::new(vec![
            make_match(1, "A", "B", 4, 0),
            make_match(2, "A", "C", 1, 0),
            make_match(3, "D", "A", 0, 2),
        ])
        .unwrap();
        let bundles = series(&store, "A", 2);
        assert_eq!(bundles[1].get(Metric::Goals), 5.0);
        assert_eq!(bundles[2].matches_in_window, 2);
        assert_eq!(bundles[2].get(Metric::Goals), 3.0);
        assert_eq!(bundles[2].get(Metric::Wins), 2.0);
        assert_eq!(bundles[2].get(Metric::CleanSheets), 2.0);
    }

    #[test]
    fn test_results_and_points() {
        let store = MatchStore::new(vec![
            make_match(1, "A", "B", 2, 1), // A home win
            make_match(2, "C", "A", 1, 1), // draw
            make_match(3, "D", "A", 3, 0), // A away loss
            make_match(4, "E", "A", 0, 1), // A away win
        ])
        .unwrap();
        let last = series(&store, "A", 38).pop().unwrap();
        assert_eq!(last.get(Metric::Wins), 2.0);
        assert_eq!(last.get(Metric::Draws), 1.0);
        assert_eq!(last.get(Metric::Losses), 1.0);
        assert_eq!(last.get(Metric::Points), 7.0);
        assert_eq!(last.get(Metric::GoalDiff), 4.0 - 5.0);
        assert_eq!(last.get(Metric::Form), 7.0 / 12.0 * 100.0);
        assert_eq!(last.get(Metric::CleanSheets), 1.0);
        assert_eq!(last.get(Metric::FailedToScore), 1.0);
    }

    #[test]
    fn test_zero_shots_gives_zero_rates() {
        let store = MatchStore::new(vec![make_match(1, "A", "B", 0, 0)]).unwrap();
        let bundle = &series(&store, "A", 5)[0];
        assert_eq!(bundle.get(Metric::Shots), 0.0);
        assert_eq!(bundle.get(Metric::ShotConversion), 0.0);
        assert_eq!(bundle.get(Metric::ShotAccuracy), 0.0);
        assert!(bundle.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_shot_rates_are_not_clamped() {
        // 3 goals from 2 recorded shots: conversion exceeds 100
        let record = make_match_with_stats(
            1,
            "A",
            "B",
            (3, 0),
            side(2, 1, 0, 0, 0, 0),
            side(4, 2, 0, 0, 0, 0),
        );
        let store = MatchStore::new(vec![record]).unwrap();
        let bundle = &series(&store, "A", 5)[0];
        assert_eq!(bundle.get(Metric::ShotConversion), 150.0);
        assert_eq!(bundle.get(Metric::ShotAccuracy), 50.0);
    }

    #[test]
    fn test_empty_totals_form_is_zero() {
        let totals = WindowTotals::new();
        assert_eq!(totals.form(), 0.0);
        assert_eq!(totals.shot_conversion(), 0.0);
    }

    #[test]
    fn test_zero_window_rejected() {
        assert!(matches!(
            RollingWindow::new(0),
            Err(FootballError::InvalidWindow(0))
        ));
    }

    #[test]
    fn test_sliding_matches_brute_force() {
        let store = league();
        for team in ["A", "B", "C", "D"] {
            for window in [1, 2, 5, 15, 38] {
                let sliding = series(&store, team, window);
                let expected = brute_force(&store, team, window);
                assert_eq!(sliding.len(), expected.len());
                for (i, (bundle, totals)) in sliding.iter().zip(&expected).enumerate() {
                    assert_eq!(bundle.matches_in_window, window.min(i + 1));
                    for metric in Metric::ALL {
                        assert_eq!(
                            bundle.get(metric),
                            totals.metric(metric),
                            "{} {} {}",
                            team,
                            window,
                            metric
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_metric_identities() {
        let store = league();
        for team in ["A", "B", "C", "D"] {
            for bundle in series(&store, team, 5) {
                assert_eq!(
                    bundle.get(Metric::GoalDiff),
                    bundle.get(Metric::Goals) - bundle.get(Metric::GoalsConceded)
                );
                assert_eq!(
                    bundle.get(Metric::Points),
                    3.0 * bundle.get(Metric::Wins) + bundle.get(Metric::Draws)
                );
                let form = bundle.get(Metric::Form);
                assert!((0.0..=100.0).contains(&form));
            }
        }
    }

    #[test]
    fn test_causal_window() {
        // Appending later matches must not change earlier bundles
        let store = league();
        let truncated = MatchStore::new(store.records()[..10].to_vec()).unwrap();
        for team in ["A", "B", "C", "D"] {
            let full = series(&store, team, 5);
            let partial = series(&truncated, team, 5);
            assert_eq!(&full[..partial.len()], &partial[..]);
        }
    }

    #[test]
    fn test_cross_team_independence() {
        let base = MatchStore::new(vec![
            make_match(1, "A", "B", 1, 0),
            make_match(3, "A", "C", 2, 2),
        ])
        .unwrap();
        let with_other = MatchStore::new(vec![
            make_match(1, "A", "B", 1, 0),
            make_match(2, "D", "E", 5, 0),
            make_match(3, "A", "C", 2, 2),
        ])
        .unwrap();
        assert_eq!(series(&base, "A", 5), series(&with_other, "A", 5));
    }

    #[test]
    fn test_series_lookup() {
        let store = league();
        let histories = index(&store);
        let s = TeamFeatureSeries::compute(&histories["B"], store.records(), 15).unwrap();
        for entry in &histories["B"].entries {
            assert_eq!(s.get(entry.match_id).unwrap().match_id, entry.match_id);
        }
        assert!(s.get(MatchId(10_000)).is_none());
    }

    #[test]
    fn test_huge_window_on_short_history() {
        let store = MatchStore::new(vec![
            make_match(1, "A", "B", 1, 0),
            make_match(2, "C", "A", 2, 2),
        ])
        .unwrap();
        for window in [usize::MAX, 1_000_000_000_000] {
            let bundles = series(&store, "A", window);
            assert_eq!(bundles.len(), 2);
            assert_eq!(bundles[1].matches_in_window, 2);
            assert_eq!(bundles[1].get(Metric::Goals), 3.0);
            assert_eq!(bundles[1].get(Metric::Points), 4.0);
        }
    }

    #[test]
    fn test_history_entry_for_absent_team() {
        let store = MatchStore::new(vec![make_match(1, "B", "C", 1, 0)]).unwrap();
        let mut history = TeamMatchHistory::new("A");
        history.entries.push(HistoryEntry {
            match_id: MatchId(1),
            role: Role::Home,
            position: 0,
        });
        let err = aggregate(&history, store.records(), 5).unwrap_err();
        assert!(matches!(
            err,
            FootballError::UnknownTeam { match_id: MatchId(1), ref team } if team == "A"
        ));
    }

    #[test]
    fn test_history_position_past_end() {
        let store = MatchStore::new(vec![make_match(1, "A", "B", 1, 0)]).unwrap();
        let mut history = TeamMatchHistory::new("A");
        history.entries.push(HistoryEntry {
            match_id: MatchId(2),
            role: Role::Home,
            position: 1,
        });
        assert!(matches!(
            aggregate(&history, store.records(), 5),
            Err(FootballError::Internal(_))
        ));
    }
}
