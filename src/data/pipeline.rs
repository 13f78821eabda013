use std::path::PathBuf;
use std::time::Duration;

use log::info;

use crate::error::Result;

use super::derive::derive_sleep_stage_times;
use super::loader::{fetch_university_table, load_efficiency_table};
use super::model::Table;
use super::normalize::SchemaMapping;
use super::schema::{EFFICIENCY_SCHEMA, UNIVERSITY_SCHEMA};

pub const DEFAULT_UNIVERSITY_URL: &str =
    "https://raw.githubusercontent.com/reisanar/datasets/master/SleepStudy.csv";
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the two raw datasets come from.
#[derive(Debug, Clone)]
pub struct Sources {
    pub efficiency_path: PathBuf,
    pub university_url: String,
    pub fetch_timeout: Duration,
}

impl Sources {
    pub fn new(efficiency_path: impl Into<PathBuf>) -> Self {
        Sources {
            efficiency_path: efficiency_path.into(),
            university_url: DEFAULT_UNIVERSITY_URL.to_string(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// The analysis-ready tables. Built once, read-only afterwards.
#[derive(Debug, Clone)]
pub struct PreparedData {
    efficiency: Table,
    university: Table,
}

impl PreparedData {
    /// Normalized efficiency table with the derived sleep-stage times.
    pub fn efficiency(&self) -> &Table {
        &self.efficiency
    }

    /// Normalized, trimmed university table.
    pub fn university(&self) -> &Table {
        &self.university
    }
}

/// Load both sources and prepare them. Any failure aborts the whole run.
pub fn prepare(sources: &Sources) -> Result<PreparedData> {
    let efficiency = load_efficiency_table(&sources.efficiency_path)?;
    let university = fetch_university_table(&sources.university_url, sources.fetch_timeout)?;
    prepare_tables(efficiency, university)
}

/// Normalize, validate and derive on already loaded raw tables.
pub fn prepare_tables(efficiency: Table, university: Table) -> Result<PreparedData> {
    let mapping = SchemaMapping::standard()?;

    let efficiency = mapping.normalize_efficiency(efficiency)?;
    EFFICIENCY_SCHEMA.validate(&efficiency)?;
    let efficiency = derive_sleep_stage_times(efficiency)?;

    let university = mapping.normalize_university(university)?;
    UNIVERSITY_SCHEMA.validate(&university)?;

    info!(
        "prepared efficiency ({} x {}) and university ({} x {}) tables",
        efficiency.len(),
        efficiency.width(),
        university.len(),
        university.width()
    );
    Ok(PreparedData {
        efficiency,
        university,
    })
}
