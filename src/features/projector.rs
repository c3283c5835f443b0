//! Feature projection
//!
//! Joins per-team feature series back onto the match rows, once for the home
//! side and once for the away side.

use super::history::TeamMatchHistory;
use super::metrics::{column_offset, FeatureColumn, Metric};
use super::rolling::TeamFeatureSeries;
use crate::data::MatchStore;
use crate::{MatchId, Result, Role};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// Feature series of every team for every window size
#[derive(Debug, Clone, Default)]
pub struct TeamAggregates {
    windows: Vec<usize>,
    series: HashMap<(String, usize), TeamFeatureSeries>,
}

impl TeamAggregates {
    /// Empty set for the given windows (must be sorted ascending)
    pub fn new(windows: Vec<usize>) -> Self {
        TeamAggregates {
            windows,
            series: HashMap::new(),
        }
    }

    /// Run the aggregator for each team and each window
    pub fn compute(
        store: &MatchStore,
        histories: &BTreeMap<String, TeamMatchHistory>,
        windows: &[usize],
    ) -> Result<Self> {
        let mut aggregates = TeamAggregates::new(windows.to_vec());
        for history in histories.values() {
            for &window in windows {
                let series = TeamFeatureSeries::compute(history, store.records(), window)?;
                aggregates.insert(series);
            }
            log::debug!("{}: {} matches aggregated", history.team, history.len());
        }
        Ok(aggregates)
    }

    pub fn insert(&mut self, series: TeamFeatureSeries) {
        self.series
            .insert((series.team.clone(), series.window), series);
    }

    pub fn get(&self, team: &str, window: usize) -> Option<&TeamFeatureSeries> {
        self.series.get(&(team.to_string(), window))
    }

    pub fn windows(&self) -> &[usize] {
        &self.windows
    }
}

/// A feature lookup that found no precomputed bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingFeature {
    pub match_id: MatchId,
    pub team: String,
    pub role: Role,
    pub window: usize,
}

impl fmt::Display for MissingFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no L{} features for {} ({}) at match {}",
            self.window, self.team, self.role, self.match_id
        )
    }
}

/// Aggregated record of missing feature lookups
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissingFeatureReport {
    pub missing: Vec<MissingFeature>,
}

impl MissingFeatureReport {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty()
    }

    /// Number of (team, match, window) lookups that failed
    pub fn len(&self) -> usize {
        self.missing.len()
    }

    /// Number of distinct rows with at least one missing feature
    pub fn affected_rows(&self) -> usize {
        self.missing
            .iter()
            .map(|m| m.match_id)
            .collect::<BTreeSet<_>>()
            .len()
    }
}

/// Feature cells for one match row, in result-table column order
#[derive(Debug, Clone, PartialEq)]
pub struct RowFeatures {
    pub match_id: MatchId,
    pub values: Vec<Option<f64>>,
}

/// Output of the projector: one row per match plus the missing report
#[derive(Debug, Clone)]
pub struct Projection {
    pub windows: Vec<usize>,
    pub rows: Vec<RowFeatures>,
    pub report: MissingFeatureReport,
}

/// Attach home and away features to every match.
///
/// A missing bundle leaves its cells empty and is recorded in the report;
/// it never aborts the run and is never replaced by a default value.
pub fn project(store: &MatchStore, aggregates: &TeamAggregates) -> Projection {
    let windows = aggregates.windows().to_vec();
    let width = windows.len() * Metric::COUNT * Role::ALL.len();
    let mut rows = Vec::with_capacity(store.len());
    let mut report = MissingFeatureReport::default();

    for record in store.records() {
        let mut values = vec![None; width];

        for &window in &windows {
            for role in Role::ALL {
                let team = record.team(role);
                let bundle = aggregates
                    .get(team, window)
                    .and_then(|series| series.get(record.id));

                let Some(bundle) = bundle else {
                    let missing = MissingFeature {
                        match_id: record.id,
                        team: team.to_string(),
                        role,
                        window,
                    };
                    log::warn!("Missing feature: {}", missing);
                    report.missing.push(missing);
                    continue;
                };

                for metric in Metric::ALL {
                    let column = FeatureColumn::new(role, window, metric);
                    if let Some(offset) = column_offset(&windows, &column) {
                        values[offset] = Some(bundle.get(metric));
                    }
                }
            }
        }

        rows.push(RowFeatures {
            match_id: record.id,
            values,
        });
    }

    if !report.is_empty() {
        log::warn!(
            "{} feature lookups missing across {} rows",
            report.len(),
            report.affected_rows()
        );
    }

    Projection {
        windows,
        rows,
        report,
    }
}
