//! Sleep efficiency report: loads the efficiency and university sleep
//! datasets, normalizes them, derives sleep-stage durations and builds the
//! chart data the report displays.

pub mod data;
pub mod error;
pub mod report;

pub use data::model::{CellValue, Column, ColumnType, Table};
pub use data::pipeline::{prepare, prepare_tables, PreparedData, Sources};
pub use error::{PipelineError, Result, SchemaError};
