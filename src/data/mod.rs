//! Data ingestion and storage
//!
//! CSV loading with row validation, the in-memory match store, and the
//! SQLite workbook holding the raw and processed tables.

pub mod csv_io;
pub mod database;
pub mod raw;
pub mod store;

pub use csv_io::{load_matches, read_matches, save_table, write_table, LoadReport};
pub use database::Database;
pub use store::MatchStore;
