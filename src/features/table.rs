//! Result table assembly
//!
//! Original match columns followed by every projected feature column.

use super::metrics::{column_offset, feature_columns, FeatureColumn};
use super::projector::RowFeatures;
use crate::data::raw::{numeric_value, RawRow, RAW_COLUMNS};
use crate::data::MatchStore;
use crate::{FootballError, MatchRecord, Result, Role};

/// One row of the result table
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRow {
    pub record: MatchRecord,
    /// Feature cells in `ResultTable::feature_columns` order; `None` = missing
    pub features: Vec<Option<f64>>,
}

/// The enriched match table
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    windows: Vec<usize>,
    columns: Vec<FeatureColumn>,
    rows: Vec<OutputRow>,
}

impl ResultTable {
    /// Assemble a table from already laid-out rows.
    ///
    /// `windows` must be sorted ascending and every row must carry one cell
    /// per feature column.
    pub fn from_rows(windows: Vec<usize>, rows: Vec<OutputRow>) -> Result<Self> {
        if windows.windows(2).any(|w| w[0] >= w[1]) {
            return Err(FootballError::Internal(format!(
                "window sizes must be strictly ascending: {:?}",
                windows
            )));
        }
        let columns = feature_columns(&windows);
        if let Some(row) = rows.iter().find(|r| r.features.len() != columns.len()) {
            return Err(FootballError::Internal(format!(
                "match {} has {} feature cells, expected {}",
                row.record.id,
                row.features.len(),
                columns.len()
            )));
        }
        Ok(ResultTable {
            windows,
            columns,
            rows,
        })
    }

    pub fn windows(&self) -> &[usize] {
        &self.windows
    }

    pub fn feature_columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    pub fn rows(&self) -> &[OutputRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Full header: original columns, then feature columns
    pub fn header(&self) -> Vec<String> {
        RAW_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(self.columns.iter().map(|c| c.name()))
            .collect()
    }

    /// Names of the derived columns only
    pub fn new_columns(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name()).collect()
    }

    /// Value of one feature cell
    pub fn feature(&self, row: &OutputRow, column: &FeatureColumn) -> Option<f64> {
        let offset = column_offset(&self.windows, column)?;
        row.features.get(offset).copied().flatten()
    }

    /// Numeric value of any column by name (raw counts or features)
    pub fn value(&self, row: &OutputRow, name: &str) -> Option<f64> {
        if let Some(v) = numeric_value(&row.record, name) {
            return Some(f64::from(v));
        }
        let column = FeatureColumn::parse(name)?;
        self.feature(row, &column)
    }

    /// True if the table has a column of this name
    pub fn has_column(&self, name: &str) -> bool {
        RAW_COLUMNS.contains(&name)
            || FeatureColumn::parse(name)
                .and_then(|c| column_offset(&self.windows, &c))
                .is_some()
    }

    /// Rows in which the given team played, with the role it played in
    pub fn team_rows<'a>(
        &'a self,
        team: &'a str,
    ) -> impl Iterator<Item = (&'a OutputRow, Role)> + 'a {
        self.rows
            .iter()
            .filter_map(move |row| row.record.role_of(team).map(|role| (row, role)))
    }

    /// Every cell rendered as text, `None` for empty cells
    pub fn cells(&self, row: &OutputRow) -> Vec<Option<String>> {
        let mut cells = RawRow::from_record(&row.record).cells();
        cells.extend(row.features.iter().map(|v| v.map(format_value)));
        cells
    }
}

/// Shortest text that parses back to the same float
pub fn format_value(value: f64) -> String {
    value.to_string()
}

/// Join projected features onto the original records, in store order
pub fn build(
    store: &MatchStore,
    windows: &[usize],
    features: Vec<RowFeatures>,
) -> Result<ResultTable> {
    if features.len() != store.len() {
        return Err(FootballError::Internal(format!(
            "projected {} rows for {} matches",
            features.len(),
            store.len()
        )));
    }

    let rows = store
        .records()
        .iter()
        .zip(features)
        .map(|(record, projected)| {
            if projected.match_id != record.id {
                return Err(FootballError::Internal(format!(
                    "projected row for match {} joined to match {}",
                    projected.match_id, record.id
                )));
            }
            Ok(OutputRow {
                record: record.clone(),
                features: projected.values,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    ResultTable::from_rows(windows.to_vec(), rows)
}
