//! Read-only reports over the result table
//!
//! Data quality checks, per-team views and league-wide overview aggregates.
//! Nothing here feeds back into the engine.

pub mod overview;
pub mod quality;
pub mod team;

pub use overview::{overview, Overview};
pub use quality::{assess, DataQuality};
pub use team::{team_report, TeamReport};

use crate::features::ResultTable;
use crate::{FootballError, Result};

/// Fail unless the table carries features for this window
pub(crate) fn require_window(table: &ResultTable, window: usize) -> Result<()> {
    if table.windows().contains(&window) {
        Ok(())
    } else {
        Err(FootballError::Config(format!(
            "window {} not in table (available: {:?})",
            window,
            table.windows()
        )))
    }
}

/// Mean of the values, None when there are none
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Pearson correlation over pairs where both values are present.
///
/// None with fewer than two pairs or when either side has zero variance.
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

/// Linearly interpolated quantile of sorted values, `q` in [0, 1]
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 2.0, 6.0]), Some(3.0));
    }

    #[test]
    fn test_pearson() {
        let xs = [Some(1.0), Some(2.0), Some(3.0), None];
        let ys = [Some(2.0), Some(4.0), Some(6.0), Some(100.0)];
        let r = pearson(&xs, &ys).unwrap();
        assert!((r - 1.0).abs() < 1e-12);

        let inverse = [Some(3.0), Some(2.0), Some(1.0), None];
        assert!((pearson(&xs, &inverse).unwrap() + 1.0).abs() < 1e-12);

        let flat = [Some(5.0), Some(5.0), Some(5.0), Some(5.0)];
        assert_eq!(pearson(&xs, &flat), None);
        assert_eq!(pearson(&[Some(1.0)], &[Some(1.0)]), None);
    }

    #[test]
    fn test_quantile() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(quantile(&values, 0.0), Some(1.0));
        assert_eq!(quantile(&values, 0.5), Some(3.0));
        assert_eq!(quantile(&values, 0.25), Some(2.0));
        assert_eq!(quantile(&[0.0, 10.0], 0.25), Some(2.5));
        assert_eq!(quantile(&[], 0.5), None);
    }
}
