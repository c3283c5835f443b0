//! Rolling statistics engine
//!
//! Runs the full batch: index team histories, aggregate every team for every
//! window, project onto match rows and assemble the result table.

use super::history;
use super::projector::{project, MissingFeatureReport, TeamAggregates};
use super::table::{self, ResultTable};
use crate::data::MatchStore;
use crate::{EngineConfig, FootballError, Result};

/// Result of one engine run
#[derive(Debug, Clone)]
pub struct EngineOutput {
    pub table: ResultTable,
    pub missing: MissingFeatureReport,
}

/// Configured rolling statistics computation
#[derive(Debug, Clone)]
pub struct FeatureEngine {
    windows: Vec<usize>,
}

impl FeatureEngine {
    /// Create an engine for the given window sizes (sorted and de-duplicated)
    pub fn new(windows: &[usize]) -> Result<Self> {
        if windows.is_empty() {
            return Err(FootballError::Config(
                "at least one window size is required".to_string(),
            ));
        }
        if let Some(&bad) = windows.iter().find(|&&w| w == 0) {
            return Err(FootballError::InvalidWindow(bad));
        }
        let mut windows = windows.to_vec();
        windows.sort_unstable();
        windows.dedup();
        Ok(FeatureEngine { windows })
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Self::new(&config.windows)
    }

    pub fn windows(&self) -> &[usize] {
        &self.windows
    }

    /// Compute the result table for every match in the store
    pub fn run(&self, store: &MatchStore) -> Result<EngineOutput> {
        let histories = history::index(store);
        log::info!(
            "Computing windows {:?} for {} teams over {} matches",
            self.windows,
            histories.len(),
            store.len()
        );

        let aggregates = TeamAggregates::compute(store, &histories, &self.windows)?;
        let projection = project(store, &aggregates);
        let table = table::build(store, &self.windows, projection.rows)?;

        Ok(EngineOutput {
            table,
            missing: projection.report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::store::fixtures::{make_match_with_stats, side};
    use crate::features::metrics::{FeatureColumn, Metric};
    use crate::{MatchRecord, Role};

    fn season() -> Vec<MatchRecord> {
        vec![
            make_match_with_stats(
                1,
                "Arsenal",
                "Chelsea",
                (2, 1),
                side(14, 6, 7, 10, 1, 0),
                side(9, 3, 4, 12, 2, 0),
            ),
            make_match_with_stats(
                2,
                "Everton",
                "Fulham",
                (0, 0),
                side(0, 0, 2, 15, 3, 0),
                side(0, 0, 1, 11, 2, 1),
            ),
            make_match_with_stats(
                3,
                "Chelsea",
                "Everton",
                (3, 0),
                side(18, 9, 8, 8, 0, 0),
                side(5, 1, 2, 14, 4, 0),
            ),
            make_match_with_stats(
                4,
                "Fulham",
                "Arsenal",
                (1, 1),
                side(10, 4, 5, 9, 1, 0),
                side(12, 5, 6, 10, 2, 0),
            ),
            make_match_with_stats(
                5,
                "Arsenal",
                "Everton",
                (4, 0),
                side(20, 10, 9, 7, 0, 0),
                side(3, 0, 1, 13, 2, 1),
            ),
            make_match_with_stats(
                6,
                "Chelsea",
                "Fulham",
                (1, 2),
                side(11, 4, 6, 10, 1, 0),
                side(8, 5, 3, 9, 1, 0),
            ),
        ]
    }

    #[test]
    fn test_windows_sorted_and_deduplicated() {
        let engine = FeatureEngine::new(&[38, 5, 15, 5]).unwrap();
        assert_eq!(engine.windows(), &[5, 15, 38]);
        assert!(FeatureEngine::new(&[]).is_err());
        assert!(matches!(
            FeatureEngine::new(&[5, 0]),
            Err(FootballError::InvalidWindow(0))
        ));
    }

    #[test]
    fn test_run_produces_row_per_match() {
        let store = MatchStore::new(season()).unwrap();
        let output = FeatureEngine::new(&[5, 15, 38]).unwrap().run(&store).unwrap();
        assert!(output.missing.is_empty());
        assert_eq!(output.table.len(), 6);
        assert!(output
            .table
            .rows()
            .iter()
            .all(|r| r.features.iter().all(|v| v.is_some())));
    }

    #[test]
    fn test_output_row_invariant() {
        let store = MatchStore::new(season()).unwrap();
        let output = FeatureEngine::new(&[2, 5]).unwrap().run(&store).unwrap();
        let table = &output.table;

        // Arsenal at match 5 (home): matches 1, 4, 5 in window 5; 4, 5 in window 2
        let row = &table.rows()[4];
        let col = |window, metric| FeatureColumn::new(Role::Home, window, metric);
        assert_eq!(table.feature(row, &col(5, Metric::Goals)), Some(7.0));
        assert_eq!(table.feature(row, &col(5, Metric::Points)), Some(7.0));
        assert_eq!(table.feature(row, &col(2, Metric::Goals)), Some(5.0));
        assert_eq!(table.feature(row, &col(2, Metric::Shots)), Some(32.0));
        assert_eq!(table.feature(row, &col(2, Metric::ShotConversion)), Some(5.0 / 32.0 * 100.0));

        // Everton away at match 5: matches 2, 3, 5, no goals and no clean sheet after match 2
        let away = |metric| FeatureColumn::new(Role::Away, 5, metric);
        assert_eq!(table.feature(row, &away(Metric::Goals)), Some(0.0));
        assert_eq!(table.feature(row, &away(Metric::FailedToScore)), Some(3.0));
        assert_eq!(table.feature(row, &away(Metric::CleanSheets)), Some(1.0));
        assert_eq!(table.feature(row, &away(Metric::Form)), Some(1.0 / 9.0 * 100.0));
    }

    #[test]
    fn test_zero_shot_team_gets_zero_rates() {
        let store = MatchStore::new(season()).unwrap();
        let output = FeatureEngine::new(&[5]).unwrap().run(&store).unwrap();
        let row = &output.table.rows()[1]; // Everton v Fulham, no shots either side
        for role in Role::ALL {
            for metric in [Metric::ShotConversion, Metric::ShotAccuracy] {
                let column = FeatureColumn::new(role, 5, metric);
                assert_eq!(output.table.feature(row, &column), Some(0.0));
            }
        }
    }

    #[test]
    fn test_run_is_deterministic() {
        let store = MatchStore::new(season()).unwrap();
        let engine = FeatureEngine::new(&[5, 15, 38]).unwrap();
        let first = engine.run(&store).unwrap().table;
        let second = engine.run(&store).unwrap().table;
        assert_eq!(first, second);
        for (a, b) in first.rows().iter().zip(second.rows()) {
            let bits_a: Vec<Option<u64>> = a.features.iter().map(|v| v.map(f64::to_bits)).collect();
            let bits_b: Vec<Option<u64>> = b.features.iter().map(|v| v.map(f64::to_bits)).collect();
            assert_eq!(bits_a, bits_b);
        }
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let mut shuffled = season();
        shuffled.reverse();
        let engine = FeatureEngine::new(&[5]).unwrap();
        let a = engine.run(&MatchStore::new(season()).unwrap()).unwrap().table;
        let b = engine.run(&MatchStore::new(shuffled).unwrap()).unwrap().table;
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_store() {
        let output = FeatureEngine::new(&[5]).unwrap().run(&MatchStore::default()).unwrap();
        assert!(output.table.is_empty());
        assert!(output.missing.is_empty());
    }
}
