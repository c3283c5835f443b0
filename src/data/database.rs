//! SQLite workbook for match data
//!
//! Keeps the raw match sheet and the processed sheet as two tables in one
//! database file. Processing replaces the processed table and never touches
//! the raw one.

use super::raw::{format_date, parse_date, NUMERIC_COLUMNS, RAW_COLUMNS};
use crate::features::metrics::{feature_columns, FeatureColumn};
use crate::features::table::{OutputRow, ResultTable};
use crate::{
    DataConfig, FootballError, MatchId, MatchRecord, MatchResult, Result, SideStats,
};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;

/// Row counts and date range of the stored tables
#[derive(Debug, Clone, Default)]
pub struct DbStats {
    pub raw_rows: usize,
    pub processed_rows: Option<usize>,
    pub team_count: usize,
    pub earliest_match: Option<NaiveDate>,
    pub latest_match: Option<NaiveDate>,
}

/// Database connection and operations
pub struct Database {
    conn: Connection,
    raw_table: String,
    processed_table: String,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P, config: &DataConfig) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn, config)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory(config: &DataConfig) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, config)
    }

    fn with_connection(conn: Connection, config: &DataConfig) -> Result<Self> {
        let db = Database {
            conn,
            raw_table: config.raw_table.clone(),
            processed_table: config.processed_table.clone(),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS "{raw}" (
                "Incremental_ID" INTEGER PRIMARY KEY,
                "Div" TEXT,
                "Date" TEXT NOT NULL,
                "Time" TEXT,
                "HomeTeam" TEXT NOT NULL,
                "AwayTeam" TEXT NOT NULL,
                "FTHG" INTEGER NOT NULL,
                "FTAG" INTEGER NOT NULL,
                "FTR" TEXT NOT NULL,
                "HS" INTEGER NOT NULL,
                "AS" INTEGER NOT NULL,
                "HST" INTEGER NOT NULL,
                "AST" INTEGER NOT NULL,
                "HF" INTEGER NOT NULL,
                "AF" INTEGER NOT NULL,
                "HC" INTEGER NOT NULL,
                "AC" INTEGER NOT NULL,
                "HY" INTEGER NOT NULL,
                "AY" INTEGER NOT NULL,
                "HR" INTEGER NOT NULL,
                "AR" INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS "idx_{raw}_teams" ON "{raw}"("HomeTeam", "AwayTeam");
            "#,
            raw = self.raw_table
        ))?;
        Ok(())
    }

    // ==================== Raw Table ====================

    /// Insert or replace match records, keyed by match id
    pub fn upsert_matches(&mut self, records: &[MatchRecord]) -> Result<usize> {
        self.write_raw(records, false)
    }

    /// Make the raw table hold exactly these records
    pub fn replace_matches(&mut self, records: &[MatchRecord]) -> Result<usize> {
        self.write_raw(records, true)
    }

    fn write_raw(&mut self, records: &[MatchRecord], clear: bool) -> Result<usize> {
        let sql = format!(
            "INSERT OR REPLACE INTO \"{}\" ({}) VALUES ({})",
            self.raw_table,
            quoted_list(RAW_COLUMNS.iter().copied()),
            placeholders(RAW_COLUMNS.len())
        );

        let tx = self.conn.transaction()?;
        if clear {
            tx.execute(&format!("DELETE FROM \"{}\"", self.raw_table), [])?;
        }
        {
            let mut stmt = tx.prepare(&sql)?;
            for record in records {
                stmt.execute(params_from_iter(raw_values(record)))?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }

    /// All raw matches in id order
    pub fn get_all_matches(&self) -> Result<Vec<MatchRecord>> {
        let sql = format!(
            "SELECT {} FROM \"{}\" ORDER BY \"Incremental_ID\"",
            quoted_list(RAW_COLUMNS.iter().copied()),
            self.raw_table
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| read_raw_columns(row))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row??);
        }
        Ok(records)
    }

    // ==================== Processed Table ====================

    /// Replace the processed table with the given result table
    pub fn write_processed(&mut self, table: &ResultTable) -> Result<usize> {
        let header = table.header();
        let column_defs: Vec<String> = RAW_COLUMNS
            .iter()
            .map(|c| format!("\"{}\" {}", c, raw_column_type(c)))
            .chain(table.new_columns().iter().map(|c| format!("\"{}\" REAL", c)))
            .collect();

        let insert = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({})",
            self.processed_table,
            quoted_list(header.iter().map(String::as_str)),
            placeholders(header.len())
        );

        let tx = self.conn.transaction()?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS \"{table}\"; CREATE TABLE \"{table}\" ({defs});",
            table = self.processed_table,
            defs = column_defs.join(", ")
        ))?;
        {
            let mut stmt = tx.prepare(&insert)?;
            for row in table.rows() {
                let mut values = raw_values(&row.record);
                values.extend(row.features.iter().map(|v| match v {
                    Some(x) => Value::Real(*x),
                    None => Value::Null,
                }));
                stmt.execute(params_from_iter(values))?;
            }
        }
        tx.commit()?;
        log::info!(
            "Wrote {} rows x {} columns to table {}",
            table.len(),
            header.len(),
            self.processed_table
        );
        Ok(table.len())
    }

    /// Read the processed table back, or None if processing has not run
    pub fn load_processed(&self) -> Result<Option<ResultTable>> {
        if !self.table_exists(&self.processed_table)? {
            return Ok(None);
        }

        let mut stmt = self.conn.prepare(&format!(
            "SELECT * FROM \"{}\" ORDER BY \"Incremental_ID\"",
            self.processed_table
        ))?;
        let names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

        if names.len() < RAW_COLUMNS.len() || names[..RAW_COLUMNS.len()] != RAW_COLUMNS {
            return Err(FootballError::Config(format!(
                "table {} does not start with the match columns",
                self.processed_table
            )));
        }

        let features: Vec<FeatureColumn> = names[RAW_COLUMNS.len()..]
            .iter()
            .map(|name| {
                FeatureColumn::parse(name).ok_or_else(|| {
                    FootballError::Config(format!("unrecognised feature column {:?}", name))
                })
            })
            .collect::<Result<_>>()?;
        let mut windows: Vec<usize> = features.iter().map(|c| c.window).collect();
        windows.sort_unstable();
        windows.dedup();
        if feature_columns(&windows) != features {
            return Err(FootballError::Config(format!(
                "feature columns of table {} are not in engine order",
                self.processed_table
            )));
        }

        let width = names.len();
        let rows = stmt.query_map([], |row| {
            let record = read_raw_columns(row)?;
            let mut values = Vec::with_capacity(width - RAW_COLUMNS.len());
            for i in RAW_COLUMNS.len()..width {
                values.push(row.get::<_, Option<f64>>(i)?);
            }
            Ok((record, values))
        })?;

        let mut output = Vec::new();
        for row in rows {
            let (record, features) = row?;
            output.push(OutputRow {
                record: record?,
                features,
            });
        }
        ResultTable::from_rows(windows, output).map(Some)
    }

    // ==================== Statistics ====================

    /// Get database statistics
    pub fn get_stats(&self) -> Result<DbStats> {
        let raw = &self.raw_table;
        let raw_rows: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM \"{}\"", raw), [], |row| row.get(0))?;

        let team_count: i64 = self.conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM (SELECT \"HomeTeam\" FROM \"{raw}\" UNION SELECT \"AwayTeam\" FROM \"{raw}\")"
            ),
            [],
            |row| row.get(0),
        )?;

        let (earliest, latest): (Option<String>, Option<String>) = self.conn.query_row(
            &format!("SELECT MIN(\"Date\"), MAX(\"Date\") FROM \"{}\"", raw),
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let processed_rows = if self.table_exists(&self.processed_table)? {
            let n: i64 = self.conn.query_row(
                &format!("SELECT COUNT(*) FROM \"{}\"", self.processed_table),
                [],
                |row| row.get(0),
            )?;
            Some(n as usize)
        } else {
            None
        };

        Ok(DbStats {
            raw_rows: raw_rows as usize,
            processed_rows,
            team_count: team_count as usize,
            earliest_match: earliest.and_then(|d| parse_date(&d)),
            latest_match: latest.and_then(|d| parse_date(&d)),
        })
    }

    fn table_exists(&self, name: &str) -> Result<bool> {
        let found: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

fn quoted_list<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names
        .map(|n| format!("\"{}\"", n))
        .collect::<Vec<_>>()
        .join(", ")
}

fn placeholders(n: usize) -> String {
    (1..=n).map(|i| format!("?{}", i)).collect::<Vec<_>>().join(", ")
}

fn raw_column_type(column: &str) -> &'static str {
    match column {
        "Incremental_ID" => "INTEGER PRIMARY KEY",
        c if NUMERIC_COLUMNS.contains(&c) => "INTEGER",
        _ => "TEXT",
    }
}

/// Raw columns of a record as SQL values, in `RAW_COLUMNS` order
fn raw_values(record: &MatchRecord) -> Vec<Value> {
    let text = |s: &str| Value::Text(s.to_string());
    let int = |n: u32| Value::Integer(i64::from(n));
    let optional = |s: &Option<String>| s.as_deref().map(text).unwrap_or(Value::Null);

    vec![
        Value::Integer(record.id.0 as i64),
        optional(&record.division),
        text(&format_date(record.date)),
        optional(&record.time),
        text(&record.home_team),
        text(&record.away_team),
        int(record.home_goals),
        int(record.away_goals),
        text(record.result.code()),
        int(record.home.shots),
        int(record.away.shots),
        int(record.home.shots_on_target),
        int(record.away.shots_on_target),
        int(record.home.fouls),
        int(record.away.fouls),
        int(record.home.corners),
        int(record.away.corners),
        int(record.home.yellow_cards),
        int(record.away.yellow_cards),
        int(record.home.red_cards),
        int(record.away.red_cards),
    ]
}

/// Decode the leading raw columns of a row.
///
/// The outer result is the SQLite read, the inner one the record validation.
fn read_raw_columns(row: &Row<'_>) -> rusqlite::Result<Result<MatchRecord>> {
    let id: i64 = row.get(0)?;
    let date_text: String = row.get(2)?;
    let code: String = row.get(8)?;

    let invalid = |field: &str, reason: String| FootballError::InvalidRow {
        match_id: id.to_string(),
        field: field.to_string(),
        reason,
    };
    let Some(date) = parse_date(&date_text) else {
        return Ok(Err(invalid("Date", format!("unrecognised date {:?}", date_text))));
    };
    let Some(result) = MatchResult::from_code(&code) else {
        return Ok(Err(invalid("FTR", format!("unknown result code {:?}", code))));
    };

    // Stat columns alternate home/away: HS AS HST AST HF AF HC AC HY AY HR AR
    let side = |start: usize| -> rusqlite::Result<SideStats> {
        Ok(SideStats {
            shots: row.get(start)?,
            shots_on_target: row.get(start + 2)?,
            fouls: row.get(start + 4)?,
            corners: row.get(start + 6)?,
            yellow_cards: row.get(start + 8)?,
            red_cards: row.get(start + 10)?,
        })
    };

    Ok(Ok(MatchRecord {
        id: MatchId(id as u64),
        division: row.get(1)?,
        date,
        time: row.get(3)?,
        home_team: row.get(4)?,
        away_team: row.get(5)?,
        home_goals: row.get(6)?,
        away_goals: row.get(7)?,
        result,
        home: side(9)?,
        away: side(10)?,
    }))
}
