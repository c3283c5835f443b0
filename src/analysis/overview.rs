//! League-wide overview for one window
//!
//! Outcome distribution, correlations between results and rolling form,
//! card impact on home wins and month-by-month averages.

use super::{mean, pearson, quantile, require_window};
use crate::features::{FeatureColumn, Metric, OutputRow, ResultTable};
use crate::{MatchResult, Result, Role};
use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeMap;

/// Quartile labels for the yellow-card buckets, lowest first
pub const CARD_LEVELS: [&str; 4] = ["Low", "Medium", "High", "Very High"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    pub home_wins: usize,
    pub away_wins: usize,
    pub draws: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// `values[i][j]` correlates `columns[i]` with `columns[j]`
    pub values: Vec<Vec<Option<f64>>>,
}

/// Home win rate for one group of matches
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WinRateBucket {
    pub label: String,
    /// Inclusive upper edge of the bucket, where one applies
    pub upper: Option<f64>,
    pub matches: usize,
    /// Percentage of matches won by the home side, None for an empty bucket
    pub home_win_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyAverages {
    pub matches: usize,
    pub home_goals: Option<f64>,
    pub away_goals: Option<f64>,
    pub home_form: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub window: usize,
    pub matches: usize,
    pub outcomes: OutcomeCounts,
    pub mean_home_goals: Option<f64>,
    pub mean_away_goals: Option<f64>,
    pub correlations: CorrelationMatrix,
    pub yellow_card_levels: Vec<WinRateBucket>,
    pub red_card_impact: Vec<WinRateBucket>,
    /// Keyed by calendar month, 1 = January
    pub monthly: BTreeMap<u32, MonthlyAverages>,
}

pub fn overview(table: &ResultTable, window: usize) -> Result<Overview> {
    require_window(table, window)?;
    let rows = table.rows();

    let mut outcomes = OutcomeCounts::default();
    for row in rows {
        match row.record.result {
            MatchResult::HomeWin => outcomes.home_wins += 1,
            MatchResult::AwayWin => outcomes.away_wins += 1,
            MatchResult::Draw => outcomes.draws += 1,
        }
    }

    let home_goals: Vec<f64> = rows.iter().map(|r| f64::from(r.record.home_goals)).collect();
    let away_goals: Vec<f64> = rows.iter().map(|r| f64::from(r.record.away_goals)).collect();

    let yellow = FeatureColumn::new(Role::Home, window, Metric::YellowCards);
    let red = FeatureColumn::new(Role::Home, window, Metric::RedCards);
    let form = FeatureColumn::new(Role::Home, window, Metric::Form);

    Ok(Overview {
        window,
        matches: rows.len(),
        outcomes,
        mean_home_goals: mean(&home_goals),
        mean_away_goals: mean(&away_goals),
        correlations: correlations(table, window),
        yellow_card_levels: quartile_buckets(table, &yellow),
        red_card_impact: red_card_impact(table, &red),
        monthly: monthly(table, &form),
    })
}

fn correlation_columns(window: usize) -> Vec<String> {
    let mut columns = vec!["FTHG".to_string(), "FTAG".to_string()];
    for metric in [Metric::Goals, Metric::ShotConversion, Metric::Form] {
        for role in Role::ALL {
            columns.push(FeatureColumn::new(role, window, metric).name());
        }
    }
    columns
}

fn correlations(table: &ResultTable, window: usize) -> CorrelationMatrix {
    let columns = correlation_columns(window);
    let series: Vec<Vec<Option<f64>>> = columns
        .iter()
        .map(|name| table.rows().iter().map(|row| table.value(row, name)).collect())
        .collect();

    let values = series
        .iter()
        .map(|xs| series.iter().map(|ys| pearson(xs, ys)).collect())
        .collect();

    CorrelationMatrix { columns, values }
}

fn home_win_rate<'a>(
    label: &str,
    upper: Option<f64>,
    rows: impl Iterator<Item = &'a OutputRow>,
) -> WinRateBucket {
    let mut matches = 0;
    let mut wins = 0;
    for row in rows {
        matches += 1;
        if row.record.result == MatchResult::HomeWin {
            wins += 1;
        }
    }
    WinRateBucket {
        label: label.to_string(),
        upper,
        matches,
        home_win_rate: (matches > 0).then(|| wins as f64 / matches as f64 * 100.0),
    }
}

/// Split rows into quartiles of a feature and report the home win rate of each.
///
/// Edges are linearly interpolated quantiles. A value belongs to the first
/// bucket whose upper edge it does not exceed, so tied edges leave later
/// buckets empty. Rows missing the feature are left out.
fn quartile_buckets(table: &ResultTable, column: &FeatureColumn) -> Vec<WinRateBucket> {
    let valued: Vec<(f64, &OutputRow)> = table
        .rows()
        .iter()
        .filter_map(|row| table.feature(row, column).map(|v| (v, row)))
        .collect();

    let mut sorted: Vec<f64> = valued.iter().map(|(v, _)| *v).collect();
    sorted.sort_by(f64::total_cmp);
    let edges: Vec<Option<f64>> = [0.25, 0.5, 0.75, 1.0]
        .iter()
        .map(|&q| quantile(&sorted, q))
        .collect();

    let bucket_of = |value: f64| {
        edges
            .iter()
            .position(|edge| edge.is_some_and(|e| value <= e))
            .unwrap_or(CARD_LEVELS.len() - 1)
    };

    CARD_LEVELS
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let rows = valued
                .iter()
                .filter(|(v, _)| bucket_of(*v) == i)
                .map(|(_, row)| *row);
            home_win_rate(label, edges[i], rows)
        })
        .collect()
}

fn red_card_impact(table: &ResultTable, column: &FeatureColumn) -> Vec<WinRateBucket> {
    let valued: Vec<(f64, &OutputRow)> = table
        .rows()
        .iter()
        .filter_map(|row| table.feature(row, column).map(|v| (v, row)))
        .collect();

    vec![
        home_win_rate(
            "No Red Cards",
            Some(0.0),
            valued.iter().filter(|(v, _)| *v <= 0.0).map(|(_, r)| *r),
        ),
        home_win_rate(
            "Has Red Cards",
            None,
            valued.iter().filter(|(v, _)| *v > 0.0).map(|(_, r)| *r),
        ),
    ]
}

fn monthly(table: &ResultTable, form: &FeatureColumn) -> BTreeMap<u32, MonthlyAverages> {
    let mut groups: BTreeMap<u32, Vec<&OutputRow>> = BTreeMap::new();
    for row in table.rows() {
        groups.entry(row.record.date.month()).or_default().push(row);
    }

    groups
        .into_iter()
        .map(|(month, rows)| {
            let home: Vec<f64> = rows.iter().map(|r| f64::from(r.record.home_goals)).collect();
            let away: Vec<f64> = rows.iter().map(|r| f64::from(r.record.away_goals)).collect();
            let form: Vec<f64> = rows.iter().filter_map(|r| table.feature(r, form)).collect();
            let averages = MonthlyAverages {
                matches: rows.len(),
                home_goals: mean(&home),
                away_goals: mean(&away),
                home_form: mean(&form),
            };
            (month, averages)
        })
        .collect()
}
