use std::fmt;

use serde::Serialize;

use super::model::{ColumnType, Table};

// ---------------------------------------------------------------------------
// Descriptive statistics
// ---------------------------------------------------------------------------

/// Linear-interpolated quantile of an ascending slice, `q` in `[0, 1]`.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

/// Non-null values of a numeric series, sorted ascending.
pub fn sorted_values(values: impl IntoIterator<Item = Option<f64>>) -> Vec<f64> {
    let mut out: Vec<f64> = values.into_iter().flatten().collect();
    out.sort_by(f64::total_cmp);
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericStats {
    pub mean: f64,
    /// Sample standard deviation; `NaN` with a single value.
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl NumericStats {
    /// Stats over an ascending slice; `None` when empty.
    pub fn from_sorted(sorted: &[f64]) -> Option<Self> {
        let n = sorted.len();
        let mean = sorted.iter().sum::<f64>() / n as f64;
        let var = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n as f64 - 1.0);
        Some(NumericStats {
            mean,
            std: var.sqrt(),
            min: *sorted.first()?,
            q25: quantile(sorted, 0.25)?,
            median: quantile(sorted, 0.5)?,
            q75: quantile(sorted, 0.75)?,
            max: *sorted.last()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub name: String,
    pub dtype: ColumnType,
    pub non_null: usize,
    /// Present for numeric columns with at least one value.
    pub stats: Option<NumericStats>,
}

/// Shape, dtypes and `describe()`-style statistics of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSummary {
    pub name: String,
    pub rows: usize,
    pub columns: Vec<ColumnSummary>,
}

pub fn summarize(name: &str, table: &Table) -> TableSummary {
    let columns = table
        .columns()
        .iter()
        .map(|col| {
            let stats = if col.dtype.is_numeric() {
                NumericStats::from_sorted(&sorted_values(col.as_f64_values()))
            } else {
                None
            };
            ColumnSummary {
                name: col.name.clone(),
                dtype: col.dtype,
                non_null: col.len() - col.null_count(),
                stats,
            }
        })
        .collect();

    TableSummary {
        name: name.to_string(),
        rows: table.len(),
        columns,
    }
}

impl fmt::Display for TableSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}: {} rows x {} columns", self.name, self.rows, self.columns.len())?;
        let width = self
            .columns
            .iter()
            .map(|c| c.name.len())
            .max()
            .unwrap_or(6)
            .max(6);
        writeln!(
            f,
            "{:<width$}  {:<7}  {:>8}  {:>9}  {:>9}  {:>9}  {:>9}  {:>9}  {:>9}  {:>9}",
            "column", "dtype", "non-null", "mean", "std", "min", "25%", "50%", "75%", "max"
        )?;
        for col in &self.columns {
            write!(f, "{:<width$}  {:<7}  {:>8}", col.name, col.dtype.to_string(), col.non_null)?;
            if let Some(s) = &col.stats {
                for v in [s.mean, s.std, s.min, s.q25, s.median, s.q75, s.max] {
                    write!(f, "  {v:>9.3}")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantiles_interpolate_linearly() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&v, 0.0), Some(1.0));
        assert_eq!(quantile(&v, 0.5), Some(2.5));
        assert_eq!(quantile(&v, 0.25), Some(1.75));
        assert_eq!(quantile(&v, 1.0), Some(4.0));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn summary_skips_nulls_and_text() {
        let table = Table::from_records(
            vec!["x".into(), "g".into()],
            vec![
                vec!["2".into(), "a".into()],
                vec!["".into(), "b".into()],
                vec!["4".into(), "a".into()],
            ],
            None,
        )
        .unwrap();
        let summary = summarize("t", &table);
        assert_eq!(summary.rows, 3);

        let x = &summary.columns[0];
        assert_eq!(x.non_null, 2);
        let stats = x.stats.as_ref().unwrap();
        assert_eq!(stats.mean, 3.0);
        assert!((stats.std - 2f64.sqrt()).abs() < 1e-12);

        assert!(summary.columns[1].stats.is_none());
        assert!(summary.to_string().starts_with("t: 3 rows x 2 columns"));
    }
}
