//! In-memory match record store
//!
//! Holds the validated input table in chronological (`id`) order. Built once
//! per run and never mutated afterwards.

use crate::{FootballError, MatchRecord, Result};
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Ordered, immutable collection of match records
#[derive(Debug, Clone, Default)]
pub struct MatchStore {
    records: Vec<MatchRecord>,
}

impl MatchStore {
    /// Build a store, sorting by id and checking the record invariants
    pub fn new(mut records: Vec<MatchRecord>) -> Result<Self> {
        records.sort_by_key(|r| r.id);

        for pair in records.windows(2) {
            if pair[0].id == pair[1].id {
                return Err(FootballError::DuplicateMatchId(pair[1].id));
            }
        }

        for record in &records {
            check_teams(record)?;
        }

        Ok(MatchStore { records })
    }

    pub fn records(&self) -> &[MatchRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct team identifiers, sorted
    pub fn teams(&self) -> BTreeSet<&str> {
        self.records
            .iter()
            .flat_map(|r| [r.home_team.as_str(), r.away_team.as_str()])
            .collect()
    }

    /// Earliest and latest match date
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let earliest = self.records.iter().map(|r| r.date).min()?;
        let latest = self.records.iter().map(|r| r.date).max()?;
        Some((earliest, latest))
    }
}

fn check_teams(record: &MatchRecord) -> Result<()> {
    for team in [&record.home_team, &record.away_team] {
        if team.trim().is_empty() {
            return Err(FootballError::UnknownTeam {
                match_id: record.id,
                team: team.clone(),
            });
        }
    }
    if record.home_team == record.away_team {
        return Err(FootballError::InvalidRow {
            match_id: record.id.to_string(),
            field: "AwayTeam".to_string(),
            reason: format!("team {:?} cannot play itself", record.home_team),
        });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::{MatchId, MatchRecord, MatchResult, SideStats};
    use chrono::NaiveDate;

    /// Minimal record with the given score; result follows the score
    pub fn make_match(
        id: u64,
        home: &str,
        away: &str,
        home_goals: u32,
        away_goals: u32,
    ) -> MatchRecord {
        let result = match home_goals.cmp(&away_goals) {
            std::cmp::Ordering::Greater => MatchResult::HomeWin,
            std::cmp::Ordering::Less => MatchResult::AwayWin,
            std::cmp::Ordering::Equal => MatchResult::Draw,
        };
        MatchRecord {
            id: MatchId(id),
            division: Some("E0".to_string()),
            date: NaiveDate::from_ymd_opt(2023, 8, 1).unwrap() + chrono::Days::new(id),
            time: None,
            home_team: home.to_string(),
            away_team: away.to_string(),
            home_goals,
            away_goals,
            result,
            home: SideStats::default(),
            away: SideStats::default(),
        }
    }

    /// Record with shots/corners/cards filled in for both sides
    pub fn make_match_with_stats(
        id: u64,
        home: &str,
        away: &str,
        score: (u32, u32),
        home_stats: SideStats,
        away_stats: SideStats,
    ) -> MatchRecord {
        MatchRecord {
            home: home_stats,
            away: away_stats,
            ..make_match(id, home, away, score.0, score.1)
        }
    }

    pub fn side(
        shots: u32,
        on_target: u32,
        corners: u32,
        fouls: u32,
        yellows: u32,
        reds: u32,
    ) -> SideStats {
        SideStats {
            shots,
            shots_on_target: on_target,
            fouls,
            corners,
            yellow_cards: yellows,
            red_cards: reds,
        }
    }
}
