//! Rolling feature computation
//!
//! Team history indexing, trailing-window aggregation, projection onto match
//! rows and assembly of the result table.

pub mod engine;
pub mod history;
pub mod metrics;
pub mod projector;
pub mod rolling;
pub mod table;

pub use engine::{EngineOutput, FeatureEngine};
pub use metrics::{FeatureColumn, Metric};
pub use projector::MissingFeatureReport;
pub use table::{OutputRow, ResultTable};
