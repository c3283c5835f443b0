//! Metric catalogue and column naming
//!
//! Every rolling feature is a (role, window, metric) triple. The metric order
//! declared here is the column order of the result table.

use crate::Role;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A rolling team metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    Goals,
    GoalsConceded,
    GoalDiff,
    Wins,
    Draws,
    Losses,
    Points,
    Shots,
    ShotsOnTarget,
    ShotConversion,
    ShotAccuracy,
    Corners,
    Fouls,
    YellowCards,
    RedCards,
    Form,
    CleanSheets,
    FailedToScore,
}

impl Metric {
    /// Number of metrics per (role, window)
    pub const COUNT: usize = 18;

    /// All metrics in declared column order
    pub const ALL: [Metric; Metric::COUNT] = [
        Metric::Goals,
        Metric::GoalsConceded,
        Metric::GoalDiff,
        Metric::Wins,
        Metric::Draws,
        Metric::Losses,
        Metric::Points,
        Metric::Shots,
        Metric::ShotsOnTarget,
        Metric::ShotConversion,
        Metric::ShotAccuracy,
        Metric::Corners,
        Metric::Fouls,
        Metric::YellowCards,
        Metric::RedCards,
        Metric::Form,
        Metric::CleanSheets,
        Metric::FailedToScore,
    ];

    /// Position in `Metric::ALL`
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Goals => "Goals",
            Metric::GoalsConceded => "GoalsConceded",
            Metric::GoalDiff => "GoalDiff",
            Metric::Wins => "Wins",
            Metric::Draws => "Draws",
            Metric::Losses => "Losses",
            Metric::Points => "Points",
            Metric::Shots => "Shots",
            Metric::ShotsOnTarget => "ShotsOnTarget",
            Metric::ShotConversion => "ShotConversion",
            Metric::ShotAccuracy => "ShotAccuracy",
            Metric::Corners => "Corners",
            Metric::Fouls => "Fouls",
            Metric::YellowCards => "YellowCards",
            Metric::RedCards => "RedCards",
            Metric::Form => "Form",
            Metric::CleanSheets => "CleanSheets",
            Metric::FailedToScore => "FailedToScore",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Metric::ALL
            .iter()
            .copied()
            .find(|m| m.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifies one derived column: role tag + window + metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeatureColumn {
    pub role: Role,
    pub window: usize,
    pub metric: Metric,
}

impl FeatureColumn {
    pub fn new(role: Role, window: usize, metric: Metric) -> Self {
        FeatureColumn {
            role,
            window,
            metric,
        }
    }

    /// Column name, e.g. `Home_Goals_L5`
    pub fn name(&self) -> String {
        format!("{}_{}_L{}", self.role.prefix(), self.metric.name(), self.window)
    }

    /// Parse a name produced by [`FeatureColumn::name`]
    pub fn parse(name: &str) -> Option<Self> {
        let (prefix, rest) = name.split_once('_')?;
        let role = match prefix {
            "Home" => Role::Home,
            "Away" => Role::Away,
            _ => return None,
        };
        let (metric, window) = rest.rsplit_once("_L")?;
        let window: usize = window.parse().ok()?;
        Some(FeatureColumn::new(role, window, Metric::from_name(metric)?))
    }
}

impl fmt::Display for FeatureColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Feature columns for the given (sorted) windows: window ascending, then
/// metric order, home column before away column.
pub fn feature_columns(windows: &[usize]) -> Vec<FeatureColumn> {
    let mut columns = Vec::with_capacity(windows.len() * Metric::COUNT * 2);
    for &window in windows {
        for metric in Metric::ALL {
            for role in Role::ALL {
                columns.push(FeatureColumn::new(role, window, metric));
            }
        }
    }
    columns
}

/// Position of a column inside the layout produced by [`feature_columns`]
pub fn column_offset(windows: &[usize], column: &FeatureColumn) -> Option<usize> {
    let w = windows.iter().position(|&w| w == column.window)?;
    let role = match column.role {
        Role::Home => 0,
        Role::Away => 1,
    };
    Some((w * Metric::COUNT + column.metric.index()) * 2 + role)
}
