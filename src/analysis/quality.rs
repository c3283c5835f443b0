//! Data quality report
//!
//! Counts problems in the result table without fixing them: duplicates are
//! counted, not removed, and missing cells are counted, not imputed.

use crate::features::ResultTable;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataQuality {
    pub rows: usize,
    pub columns: usize,
    pub missing_cells: usize,
    /// Share of non-missing cells, in percent
    pub completeness: f64,
    /// Rows identical to an earlier row in every column
    pub duplicate_rows: usize,
    /// Columns with at least one missing cell
    pub missing_by_column: Vec<(String, usize)>,
}

pub fn assess(table: &ResultTable) -> DataQuality {
    let header = table.header();
    let columns = header.len();
    let mut missing_per_column = vec![0usize; header.len()];
    let mut seen: HashSet<Vec<Option<String>>> = HashSet::with_capacity(table.len());
    let mut duplicate_rows = 0;

    for row in table.rows() {
        let cells = table.cells(row);
        for (count, cell) in missing_per_column.iter_mut().zip(&cells) {
            if cell.is_none() {
                *count += 1;
            }
        }
        if !seen.insert(cells) {
            duplicate_rows += 1;
        }
    }

    let missing_cells: usize = missing_per_column.iter().sum();
    let total_cells = table.len() * columns;
    let completeness = if total_cells == 0 {
        100.0
    } else {
        (1.0 - missing_cells as f64 / total_cells as f64) * 100.0
    };

    let missing_by_column = header
        .into_iter()
        .zip(missing_per_column)
        .filter(|(_, n)| *n > 0)
        .collect();

    DataQuality {
        rows: table.len(),
        columns,
        missing_cells,
        completeness,
        duplicate_rows,
        missing_by_column,
    }
}
