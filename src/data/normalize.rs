use std::collections::BTreeSet;

use log::debug;

use crate::error::SchemaError;

use super::model::Table;

// ---------------------------------------------------------------------------
// Fixed column mappings
// ---------------------------------------------------------------------------

/// Raw efficiency-dataset labels → canonical names.
pub const EFFICIENCY_RENAMES: &[(&str, &str)] = &[
    ("Wakeup time", "wakeup_time"),
    ("Sleep duration", "sleep_duration"),
    ("Sleep efficiency", "sleep_efficiency"),
    ("REM sleep percentage", "REM_sleep_percentage"),
    ("Deep sleep percentage", "deep_sleep_percentage"),
    ("Light sleep percentage", "light_sleep_percentage"),
    ("Caffeine consumption", "caffeine_consumption"),
    ("Alcohol consumption", "alcohol_consumption"),
    ("Smoking status", "smoking_status"),
    ("Exercise frequency", "exercise_frequency"),
    ("Age", "age"),
    ("Gender", "gender"),
    ("Bedtime", "bedtime"),
    ("Awakenings", "awakenings"),
];

/// Raw university-dataset labels → canonical names.
pub const UNIVERSITY_RENAMES: &[(&str, &str)] = &[
    ("AnxietyScore", "anxiety_score"),
    ("StressScore", "stress_score"),
    ("DepressionStatus", "depression_status"),
    ("AnxietyStatus", "anxiety_status"),
    ("AlcoholUse", "alcohol_use"),
    ("WeekdayBed", "weekday_bed"),
    ("WeekdayRise", "weekday_rise"),
    ("WeekdaySleep", "weekday_sleep"),
    ("WeekendBed", "weekend_bed"),
    ("WeekendRise", "weekend_rise"),
    ("WeekendSleep", "weekend_sleep"),
    ("AverageSleep", "average_sleep"),
    ("AllNighter", "all_nighter"),
];

/// University-dataset columns irrelevant to the sleep-duration comparison.
pub const UNIVERSITY_DROPPED: &[&str] = &[
    "ClassYear",
    "DASScore",
    "LarkOwl",
    "NumEarlyClass",
    "EarlyClass",
    "GPA",
    "ClassesMissed",
    "CognitionZscore",
    "PoorSleepQuality",
    "DepressionScore",
];

// ---------------------------------------------------------------------------
// SchemaMapping
// ---------------------------------------------------------------------------

/// A checked set of rename/drop rules for both tables.
///
/// Construction guarantees that no canonical name is also a raw name (of
/// either table, renamed or dropped) and that no two raw names share a
/// canonical name. Under those conditions normalizing a table twice is the
/// same as normalizing it once.
#[derive(Debug, Clone)]
pub struct SchemaMapping {
    efficiency: &'static [(&'static str, &'static str)],
    university: &'static [(&'static str, &'static str)],
    dropped: &'static [&'static str],
}

impl SchemaMapping {
    pub fn new(
        efficiency: &'static [(&'static str, &'static str)],
        university: &'static [(&'static str, &'static str)],
        dropped: &'static [&'static str],
    ) -> Result<Self, SchemaError> {
        let raw: BTreeSet<&str> = efficiency
            .iter()
            .chain(university)
            .map(|(from, _)| *from)
            .chain(dropped.iter().copied())
            .collect();

        for renames in [efficiency, university] {
            let mut targets = BTreeSet::new();
            for (_, to) in renames {
                if raw.contains(to) || !targets.insert(*to) {
                    return Err(SchemaError::ConflictingMapping(to.to_string()));
                }
            }
        }

        Ok(SchemaMapping {
            efficiency,
            university,
            dropped,
        })
    }

    /// The mapping used by the report.
    pub fn standard() -> Result<Self, SchemaError> {
        Self::new(EFFICIENCY_RENAMES, UNIVERSITY_RENAMES, UNIVERSITY_DROPPED)
    }

    /// Rename the efficiency table's columns. Unmapped columns pass through.
    pub fn normalize_efficiency(&self, table: Table) -> Result<Table, SchemaError> {
        let renamed = self.present(&table, self.efficiency);
        debug!("efficiency: renaming {renamed} columns");
        table.rename_columns(self.efficiency.iter().copied())
    }

    /// Drop the irrelevant university columns, then rename the rest.
    pub fn normalize_university(&self, table: Table) -> Result<Table, SchemaError> {
        let before = table.width();
        let table = table.drop_columns(self.dropped);
        debug!(
            "university: dropped {} columns, renaming {}",
            before - table.width(),
            self.present(&table, self.university)
        );
        table.rename_columns(self.university.iter().copied())
    }

    fn present(&self, table: &Table, renames: &[(&str, &str)]) -> usize {
        renames.iter().filter(|(from, _)| table.has_column(from)).count()
    }
}
