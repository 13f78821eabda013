use log::{info, warn};

use crate::error::SchemaError;

use super::model::{Column, Table};

pub const ACTUAL_SLEEP_TIME: &str = "actual_sleep_time";
pub const REM_SLEEP_TIME: &str = "REM_sleep_time";
pub const DEEP_SLEEP_TIME: &str = "deep_sleep_time";
pub const LIGHT_SLEEP_TIME: &str = "light_sleep_time";

/// (percentage column, derived time column) per sleep stage.
pub const STAGE_COLUMNS: [(&str, &str); 3] = [
    ("REM_sleep_percentage", REM_SLEEP_TIME),
    ("deep_sleep_percentage", DEEP_SLEEP_TIME),
    ("light_sleep_percentage", LIGHT_SLEEP_TIME),
];

/// Round half away from zero to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Append the absolute sleep-stage durations to a normalized efficiency table.
///
/// * `actual_sleep_time = sleep_duration × sleep_efficiency` (unrounded;
///   efficiency is a fraction)
/// * `<stage>_sleep_time = round2(actual_sleep_time × <stage>_percentage / 100)`
///
/// Every input column is checked before anything is produced, so a schema
/// error never leaves a half-derived table behind. A null input yields a null
/// derived cell. Source columns that already carry a derived name are
/// overwritten.
pub fn derive_sleep_stage_times(table: Table) -> Result<Table, SchemaError> {
    let duration = table.numeric("sleep_duration")?;
    let efficiency = table.numeric("sleep_efficiency")?;
    let percentages = STAGE_COLUMNS
        .iter()
        .map(|(pct, _)| table.numeric(pct))
        .collect::<Result<Vec<_>, _>>()?;

    let actual: Vec<Option<f64>> = duration
        .iter()
        .zip(&efficiency)
        .map(|(d, e)| Some((*d)? * (*e)?))
        .collect();

    let mut derived = vec![Column::from_floats(ACTUAL_SLEEP_TIME, actual.clone())];
    for ((_, name), pct) in STAGE_COLUMNS.iter().zip(percentages) {
        let times = actual
            .iter()
            .zip(pct)
            .map(|(a, p)| Some(round2((*a)? * p? / 100.0)))
            .collect();
        derived.push(Column::from_floats(*name, times));
    }

    let mut table = table;
    for column in derived {
        if table.has_column(&column.name) {
            warn!("source column '{}' is recomputed", column.name);
        }
        table = table.with_column(column)?;
    }
    info!("derived sleep stage times for {} subjects", table.len());
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CellValue;

    fn efficiency(rows: &[[&str; 5]]) -> Table {
        let headers = [
            "sleep_duration",
            "sleep_efficiency",
            "REM_sleep_percentage",
            "deep_sleep_percentage",
            "light_sleep_percentage",
        ];
        Table::from_records(
            headers.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
            None,
        )
        .unwrap()
    }

    #[test]
    fn worked_example() {
        let out = derive_sleep_stage_times(efficiency(&[["8.0", "0.75", "20", "30", "50"]])).unwrap();
        assert_eq!(out.numeric(ACTUAL_SLEEP_TIME).unwrap(), vec![Some(6.0)]);
        assert_eq!(out.numeric(REM_SLEEP_TIME).unwrap(), vec![Some(1.2)]);
        assert_eq!(out.numeric(DEEP_SLEEP_TIME).unwrap(), vec![Some(1.8)]);
        assert_eq!(out.numeric(LIGHT_SLEEP_TIME).unwrap(), vec![Some(3.0)]);
    }

    #[test]
    fn actual_sleep_time_is_not_rounded() {
        let out = derive_sleep_stage_times(efficiency(&[["7.5", "0.883", "18", "70", "12"]])).unwrap();
        assert_eq!(out.numeric(ACTUAL_SLEEP_TIME).unwrap(), vec![Some(7.5 * 0.883)]);
        // 6.6225 * 18 / 100 = 1.19205
        assert_eq!(out.numeric(REM_SLEEP_TIME).unwrap(), vec![Some(1.19)]);
    }

    #[test]
    fn stage_times_sum_to_actual_time() {
        let out = derive_sleep_stage_times(efficiency(&[
            ["6.0", "0.88", "18", "70", "12"],
            ["9.0", "0.66", "24", "28", "48"],
            ["7.0", "0.93", "25", "55", "20"],
        ]))
        .unwrap();
        let actual = out.numeric(ACTUAL_SLEEP_TIME).unwrap();
        for (i, a) in actual.iter().enumerate() {
            let sum: f64 = STAGE_COLUMNS
                .iter()
                .map(|(_, name)| out.numeric(name).unwrap()[i].unwrap())
                .sum();
            assert!((sum - a.unwrap()).abs() <= 0.03, "row {i}: {sum} vs {a:?}");
        }
    }

    #[test]
    fn null_input_gives_null_output() {
        let out = derive_sleep_stage_times(efficiency(&[["8.0", "", "20", "30", "50"]])).unwrap();
        let col = out.column(DEEP_SLEEP_TIME).unwrap();
        assert_eq!(col.values, vec![CellValue::Null]);
    }

    #[test]
    fn missing_input_aborts_without_new_columns() {
        let table = efficiency(&[["8.0", "0.75", "20", "30", "50"]]).drop_columns(&["light_sleep_percentage"]);
        let err = derive_sleep_stage_times(table).unwrap_err();
        assert_eq!(err, SchemaError::MissingColumn("light_sleep_percentage".into()));
    }

    #[test]
    fn text_input_is_a_type_error() {
        let err = derive_sleep_stage_times(efficiency(&[["eight", "0.75", "20", "30", "50"]])).unwrap_err();
        assert!(matches!(err, SchemaError::TypeMismatch { .. }));
    }

    #[test]
    fn existing_derived_column_is_recomputed() {
        let table = efficiency(&[["8.0", "0.5", "20", "30", "50"]])
            .with_column(Column::from_floats(ACTUAL_SLEEP_TIME, vec![Some(99.0)]))
            .unwrap();
        let out = derive_sleep_stage_times(table).unwrap();
        assert_eq!(out.numeric(ACTUAL_SLEEP_TIME).unwrap(), vec![Some(4.0)]);
        assert_eq!(out.width(), 9);
    }
}
