use crate::error::SchemaError;

use super::model::Table;

// ---------------------------------------------------------------------------
// Declared schemas for the two normalized tables
// ---------------------------------------------------------------------------

/// Semantic kind of a declared column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Integer or float.
    Numeric,
    /// Any type; used for labels, flags and timestamps kept as text.
    Categorical,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const fn field(name: &'static str, kind: FieldKind, required: bool) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        required,
    }
}

/// A list of declared columns. Columns not listed are not checked.
#[derive(Debug, Clone, Copy)]
pub struct TableSchema {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

use FieldKind::{Categorical, Numeric};

pub const EFFICIENCY_SCHEMA: TableSchema = TableSchema {
    name: "efficiency",
    fields: &[
        field("sleep_duration", Numeric, true),
        field("sleep_efficiency", Numeric, true),
        field("REM_sleep_percentage", Numeric, true),
        field("deep_sleep_percentage", Numeric, true),
        field("light_sleep_percentage", Numeric, true),
        field("age", Numeric, false),
        field("awakenings", Numeric, false),
        field("caffeine_consumption", Numeric, false),
        field("alcohol_consumption", Numeric, false),
        field("exercise_frequency", Numeric, false),
        field("gender", Categorical, false),
        field("bedtime", Categorical, false),
        field("wakeup_time", Categorical, false),
        field("smoking_status", Categorical, false),
    ],
};

pub const UNIVERSITY_SCHEMA: TableSchema = TableSchema {
    name: "university",
    fields: &[
        field("average_sleep", Numeric, true),
        field("anxiety_score", Numeric, false),
        field("stress_score", Numeric, false),
        field("weekday_bed", Numeric, false),
        field("weekday_rise", Numeric, false),
        field("weekday_sleep", Numeric, false),
        field("weekend_bed", Numeric, false),
        field("weekend_rise", Numeric, false),
        field("weekend_sleep", Numeric, false),
        field("depression_status", Categorical, false),
        field("anxiety_status", Categorical, false),
        field("alcohol_use", Categorical, false),
        field("all_nighter", Categorical, false),
    ],
};

impl TableSchema {
    /// Check every declared field against the table.
    ///
    /// Required fields must be present; any present field must have a
    /// compatible type.
    pub fn validate(&self, table: &Table) -> Result<(), SchemaError> {
        for spec in self.fields {
            let Some(col) = table.column(spec.name) else {
                if spec.required {
                    return Err(SchemaError::MissingColumn(spec.name.to_string()));
                }
                continue;
            };
            if spec.kind == Numeric && !col.dtype.is_numeric() {
                return Err(SchemaError::TypeMismatch {
                    column: spec.name.to_string(),
                    expected: "numeric",
                    found: col.dtype,
                });
            }
        }
        log::debug!("{} table matches its declared schema", self.name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::ColumnType;

    fn table(headers: &[&str], row: &[&str]) -> Table {
        Table::from_records(
            headers.iter().map(|s| s.to_string()).collect(),
            vec![row.iter().map(|s| s.to_string()).collect()],
            None,
        )
        .unwrap()
    }

    #[test]
    fn optional_fields_may_be_absent() {
        let t = table(&["average_sleep"], &["7.5"]);
        assert!(UNIVERSITY_SCHEMA.validate(&t).is_ok());
    }

    #[test]
    fn missing_required_field_fails() {
        let t = table(&["anxiety_score"], &["3"]);
        assert_eq!(
            UNIVERSITY_SCHEMA.validate(&t),
            Err(SchemaError::MissingColumn("average_sleep".into()))
        );
    }

    #[test]
    fn text_in_numeric_field_fails() {
        let t = table(&["average_sleep", "weekday_bed"], &["7.5", "late"]);
        assert_eq!(
            UNIVERSITY_SCHEMA.validate(&t),
            Err(SchemaError::TypeMismatch {
                column: "weekday_bed".into(),
                expected: "numeric",
                found: ColumnType::Text,
            })
        );
    }

    #[test]
    fn categorical_accepts_any_type() {
        let t = table(&["average_sleep", "all_nighter"], &["7.5", "1"]);
        assert!(UNIVERSITY_SCHEMA.validate(&t).is_ok());
    }
}
