//! Raw match row format
//!
//! Column layout of the input sheet (football-data naming) and validation of
//! a raw row into a [`MatchRecord`].

use crate::{FootballError, MatchId, MatchRecord, MatchResult, Result, SideStats};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Input columns, in output order
pub const RAW_COLUMNS: [&str; 21] = [
    "Incremental_ID",
    "Div",
    "Date",
    "Time",
    "HomeTeam",
    "AwayTeam",
    "FTHG",
    "FTAG",
    "FTR",
    "HS",
    "AS",
    "HST",
    "AST",
    "HF",
    "AF",
    "HC",
    "AC",
    "HY",
    "AY",
    "HR",
    "AR",
];

/// Columns that hold non-negative integer counts
pub const NUMERIC_COLUMNS: [&str; 14] = [
    "FTHG", "FTAG", "HS", "AS", "HST", "AST", "HF", "AF", "HC", "AC", "HY", "AY", "HR", "AR",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One row as read from the sheet, before validation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRow {
    #[serde(rename = "Incremental_ID")]
    pub id: Option<String>,
    #[serde(rename = "Div")]
    pub division: Option<String>,
    #[serde(rename = "Date")]
    pub date: Option<String>,
    #[serde(rename = "Time")]
    pub time: Option<String>,
    #[serde(rename = "HomeTeam")]
    pub home_team: Option<String>,
    #[serde(rename = "AwayTeam")]
    pub away_team: Option<String>,
    #[serde(rename = "FTHG")]
    pub home_goals: Option<String>,
    #[serde(rename = "FTAG")]
    pub away_goals: Option<String>,
    #[serde(rename = "FTR")]
    pub result: Option<String>,
    #[serde(rename = "HS")]
    pub home_shots: Option<String>,
    #[serde(rename = "AS")]
    pub away_shots: Option<String>,
    #[serde(rename = "HST")]
    pub home_shots_on_target: Option<String>,
    #[serde(rename = "AST")]
    pub away_shots_on_target: Option<String>,
    #[serde(rename = "HF")]
    pub home_fouls: Option<String>,
    #[serde(rename = "AF")]
    pub away_fouls: Option<String>,
    #[serde(rename = "HC")]
    pub home_corners: Option<String>,
    #[serde(rename = "AC")]
    pub away_corners: Option<String>,
    #[serde(rename = "HY")]
    pub home_yellow_cards: Option<String>,
    #[serde(rename = "AY")]
    pub away_yellow_cards: Option<String>,
    #[serde(rename = "HR")]
    pub home_red_cards: Option<String>,
    #[serde(rename = "AR")]
    pub away_red_cards: Option<String>,
}

impl RawRow {
    /// Validate the row. The first bad field is reported with the match id.
    pub fn into_record(self) -> Result<MatchRecord> {
        let id_text = self
            .id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("?")
            .to_string();
        let field = FieldReader { match_id: &id_text };

        let id = field.id("Incremental_ID", &self.id)?;
        let date = field.date("Date", &self.date)?;
        let home_team = field.text("HomeTeam", &self.home_team)?;
        let away_team = field.text("AwayTeam", &self.away_team)?;
        if home_team == away_team {
            return Err(field.invalid(
                "AwayTeam",
                format!("team {:?} cannot play itself", home_team),
            ));
        }

        let result_code = field.text("FTR", &self.result)?;
        let result = MatchResult::from_code(&result_code)
            .ok_or_else(|| field.invalid("FTR", format!("unknown result code {:?}", result_code)))?;

        Ok(MatchRecord {
            id,
            division: optional_text(&self.division),
            date,
            time: optional_text(&self.time),
            home_team,
            away_team,
            home_goals: field.count("FTHG", &self.home_goals)?,
            away_goals: field.count("FTAG", &self.away_goals)?,
            result,
            home: SideStats {
                shots: field.count("HS", &self.home_shots)?,
                shots_on_target: field.count("HST", &self.home_shots_on_target)?,
                fouls: field.count("HF", &self.home_fouls)?,
                corners: field.count("HC", &self.home_corners)?,
                yellow_cards: field.count("HY", &self.home_yellow_cards)?,
                red_cards: field.count("HR", &self.home_red_cards)?,
            },
            away: SideStats {
                shots: field.count("AS", &self.away_shots)?,
                shots_on_target: field.count("AST", &self.away_shots_on_target)?,
                fouls: field.count("AF", &self.away_fouls)?,
                corners: field.count("AC", &self.away_corners)?,
                yellow_cards: field.count("AY", &self.away_yellow_cards)?,
                red_cards: field.count("AR", &self.away_red_cards)?,
            },
        })
    }

    pub fn from_record(record: &MatchRecord) -> Self {
        let n = |v: u32| Some(v.to_string());
        RawRow {
            id: Some(record.id.to_string()),
            division: record.division.clone(),
            date: Some(format_date(record.date)),
            time: record.time.clone(),
            home_team: Some(record.home_team.clone()),
            away_team: Some(record.away_team.clone()),
            home_goals: n(record.home_goals),
            away_goals: n(record.away_goals),
            result: Some(record.result.code().to_string()),
            home_shots: n(record.home.shots),
            away_shots: n(record.away.shots),
            home_shots_on_target: n(record.home.shots_on_target),
            away_shots_on_target: n(record.away.shots_on_target),
            home_fouls: n(record.home.fouls),
            away_fouls: n(record.away.fouls),
            home_corners: n(record.home.corners),
            away_corners: n(record.away.corners),
            home_yellow_cards: n(record.home.yellow_cards),
            away_yellow_cards: n(record.away.yellow_cards),
            home_red_cards: n(record.home.red_cards),
            away_red_cards: n(record.away.red_cards),
        }
    }

    /// Cells in `RAW_COLUMNS` order
    pub fn cells(&self) -> Vec<Option<String>> {
        vec![
            self.id.clone(),
            self.division.clone(),
            self.date.clone(),
            self.time.clone(),
            self.home_team.clone(),
            self.away_team.clone(),
            self.home_goals.clone(),
            self.away_goals.clone(),
            self.result.clone(),
            self.home_shots.clone(),
            self.away_shots.clone(),
            self.home_shots_on_target.clone(),
            self.away_shots_on_target.clone(),
            self.home_fouls.clone(),
            self.away_fouls.clone(),
            self.home_corners.clone(),
            self.away_corners.clone(),
            self.home_yellow_cards.clone(),
            self.away_yellow_cards.clone(),
            self.home_red_cards.clone(),
            self.away_red_cards.clone(),
        ]
    }
}

/// Numeric value of a raw integer column for a record
pub fn numeric_value(record: &MatchRecord, column: &str) -> Option<u32> {
    let value = match column {
        "FTHG" => record.home_goals,
        "FTAG" => record.away_goals,
        "HS" => record.home.shots,
        "AS" => record.away.shots,
        "HST" => record.home.shots_on_target,
        "AST" => record.away.shots_on_target,
        "HF" => record.home.fouls,
        "AF" => record.away.fouls,
        "HC" => record.home.corners,
        "AC" => record.away.corners,
        "HY" => record.home.yellow_cards,
        "AY" => record.away.yellow_cards,
        "HR" => record.home.red_cards,
        "AR" => record.away.red_cards,
        _ => return None,
    };
    Some(value)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse the date formats seen in football-data sheets
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    // Two-digit years first: %Y would read "23" as year 23
    for format in ["%d/%m/%y", "%d/%m/%Y", DATE_FORMAT] {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|dt| dt.date())
}

fn optional_text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

struct FieldReader<'a> {
    match_id: &'a str,
}

impl FieldReader<'_> {
    fn invalid(&self, field: &str, reason: String) -> FootballError {
        FootballError::InvalidRow {
            match_id: self.match_id.to_string(),
            field: field.to_string(),
            reason,
        }
    }

    fn text(&self, field: &str, value: &Option<String>) -> Result<String> {
        optional_text(value).ok_or_else(|| self.invalid(field, "missing value".to_string()))
    }

    fn date(&self, field: &str, value: &Option<String>) -> Result<NaiveDate> {
        let text = self.text(field, value)?;
        parse_date(&text)
            .ok_or_else(|| self.invalid(field, format!("unrecognised date {:?}", text)))
    }

    fn id(&self, field: &str, value: &Option<String>) -> Result<MatchId> {
        let text = self.text(field, value)?;
        text.parse::<u64>()
            .map(MatchId)
            .map_err(|_| self.invalid(field, format!("not a valid match id: {:?}", text)))
    }

    /// Non-negative integer; spreadsheet exports like "3.0" are accepted
    fn count(&self, field: &str, value: &Option<String>) -> Result<u32> {
        let text = self.text(field, value)?;
        if let Ok(n) = text.parse::<u32>() {
            return Ok(n);
        }
        match text.parse::<f64>() {
            Ok(v) if v.is_finite() && v < 0.0 => {
                Err(self.invalid(field, format!("negative value {}", text)))
            }
            Ok(v) if v.is_finite() && v.fract() == 0.0 && v <= u32::MAX as f64 => Ok(v as u32),
            _ => Err(self.invalid(field, format!("not a non-negative integer: {:?}", text))),
        }
    }
}
