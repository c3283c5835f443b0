//! Football rolling form statistics
//!
//! Trailing-window team features computed from a chronological match log.

pub mod analysis;
pub mod data;
pub mod features;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Chronological key of a match (the `Incremental_ID` column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MatchId(pub u64);

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Side a team occupies in a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Home,
    Away,
}

impl Role {
    /// Both roles, home first (column order)
    pub const ALL: [Role; 2] = [Role::Home, Role::Away];

    /// Column prefix used in the result table
    pub fn prefix(&self) -> &'static str {
        match self {
            Role::Home => "Home",
            Role::Away => "Away",
        }
    }

    pub fn opposite(&self) -> Role {
        match self {
            Role::Home => Role::Away,
            Role::Away => Role::Home,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Full-time result of a match (the `FTR` column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchResult {
    HomeWin,
    AwayWin,
    Draw,
}

impl MatchResult {
    pub fn code(&self) -> &'static str {
        match self {
            MatchResult::HomeWin => "H",
            MatchResult::AwayWin => "A",
            MatchResult::Draw => "D",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "H" => Some(MatchResult::HomeWin),
            "A" => Some(MatchResult::AwayWin),
            "D" => Some(MatchResult::Draw),
            _ => None,
        }
    }

    /// Result seen from the team playing in `role`
    pub fn outcome_for(&self, role: Role) -> Outcome {
        match (self, role) {
            (MatchResult::Draw, _) => Outcome::Draw,
            (MatchResult::HomeWin, Role::Home) | (MatchResult::AwayWin, Role::Away) => Outcome::Win,
            (MatchResult::HomeWin, Role::Away) | (MatchResult::AwayWin, Role::Home) => {
                Outcome::Loss
            }
        }
    }
}

/// Role-adjusted result for one team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Draw,
    Loss,
}

impl Outcome {
    pub fn letter(&self) -> &'static str {
        match self {
            Outcome::Win => "W",
            Outcome::Draw => "D",
            Outcome::Loss => "L",
        }
    }
}

/// Match statistics recorded for one side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideStats {
    pub shots: u32,
    pub shots_on_target: u32,
    pub fouls: u32,
    pub corners: u32,
    pub yellow_cards: u32,
    pub red_cards: u32,
}

/// A single historical fixture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: MatchId,
    pub division: Option<String>,
    pub date: NaiveDate,
    pub time: Option<String>,
    pub home_team: String,
    pub away_team: String,
    pub home_goals: u32,
    pub away_goals: u32,
    pub result: MatchResult,
    pub home: SideStats,
    pub away: SideStats,
}

impl MatchRecord {
    /// Team playing in the given role
    pub fn team(&self, role: Role) -> &str {
        match role {
            Role::Home => &self.home_team,
            Role::Away => &self.away_team,
        }
    }

    /// Role the given team played in, or None if it did not take part
    pub fn role_of(&self, team: &str) -> Option<Role> {
        if self.home_team == team {
            Some(Role::Home)
        } else if self.away_team == team {
            Some(Role::Away)
        } else {
            None
        }
    }

    /// Goals scored by the side in `role`
    pub fn goals(&self, role: Role) -> u32 {
        match role {
            Role::Home => self.home_goals,
            Role::Away => self.away_goals,
        }
    }

    pub fn side(&self, role: Role) -> &SideStats {
        match role {
            Role::Home => &self.home,
            Role::Away => &self.away,
        }
    }

    pub fn outcome_for(&self, role: Role) -> Outcome {
        self.result.outcome_for(role)
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum FootballError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid data in match {match_id}, field {field}: {reason}")]
    InvalidRow {
        match_id: String,
        field: String,
        reason: String,
    },

    #[error("Duplicate match id: {0}")]
    DuplicateMatchId(MatchId),

    #[error("Unknown team reference in match {match_id}: {team:?}")]
    UnknownTeam { match_id: MatchId, team: String },

    #[error("Team not found: {0}")]
    TeamNotFound(String),

    #[error("Window size must be a positive integer, got {0}")]
    InvalidWindow(usize),

    #[error("No matches available - run `football import` first")]
    NoMatches,

    #[error("No processed table - run `football process` first")]
    NotProcessed,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, FootballError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub engine: EngineConfig,
    pub data: DataConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub windows: Vec<usize>,
    pub invalid_rows: InvalidRowPolicy,
}

/// What to do with an input row that fails validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidRowPolicy {
    /// Drop the row, log a warning and keep going
    Skip,
    /// Fail the whole run on the first bad row
    Abort,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub database_path: String,
    pub raw_table: String,
    pub processed_table: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            engine: EngineConfig {
                windows: vec![5, 15, 38],
                invalid_rows: InvalidRowPolicy::Skip,
            },
            data: DataConfig {
                database_path: "data/football.db".to_string(),
                raw_table: "raw_data".to_string(),
                processed_table: "processed_data".to_string(),
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FootballError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| FootballError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| FootballError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings the engine or the database layer cannot use
    pub fn validate(&self) -> Result<()> {
        if self.engine.windows.is_empty() {
            return Err(FootballError::Config(
                "engine.windows must list at least one window size".to_string(),
            ));
        }
        if let Some(&bad) = self.engine.windows.iter().find(|&&w| w == 0) {
            return Err(FootballError::InvalidWindow(bad));
        }
        for name in [&self.data.raw_table, &self.data.processed_table] {
            if !is_table_name(name) {
                return Err(FootballError::Config(format!(
                    "Invalid table name {:?}: use letters, digits and underscores",
                    name
                )));
            }
        }
        if self.data.raw_table == self.data.processed_table {
            return Err(FootballError::Config(
                "raw_table and processed_table must differ".to_string(),
            ));
        }
        Ok(())
    }
}

fn is_table_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
