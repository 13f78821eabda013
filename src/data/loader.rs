use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

use arrow::array::{ArrayRef, AsArray};
use arrow::compute::{cast_with_options, CastOptions};
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use log::info;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use crate::error::{PipelineError, Result};

use super::model::{CellValue, Column, Table};

/// Row identifier column of the efficiency dataset.
pub const EFFICIENCY_INDEX: &str = "ID";

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load the efficiency dataset from a local file, indexed by `ID`.
/// Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – comma-delimited with a header row
/// * `.json`    – `[{ "ID": 1, "Age": 65, ... }, ...]`
/// * `.parquet` – flat scalar columns
pub fn load_efficiency_table(path: &Path) -> Result<Table> {
    let table = load_file(path, Some(EFFICIENCY_INDEX))?;
    info!(
        "loaded {} rows x {} columns from {}",
        table.len(),
        table.width(),
        path.display()
    );
    Ok(table)
}

/// Load any supported local table, optionally promoting a column to the index.
pub fn load_file(path: &Path, index: Option<&str>) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => load_parquet(path, index),
        "json" => load_json(path, index),
        _ => {
            let file = std::fs::File::open(path).map_err(|e| origin_err(path, e))?;
            read_csv(file, &path.display().to_string(), index)
        }
    }
}

/// Fetch the university dataset over HTTP. Rows are positional (no index).
///
/// One attempt, bounded by `timeout`. Transport errors, non-success statuses
/// and undecodable bodies are all I/O errors.
pub fn fetch_university_table(url: &str, timeout: Duration) -> Result<Table> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| PipelineError::io(url, e))?;

    let body = client
        .get(url)
        .send()
        .and_then(|resp| resp.error_for_status())
        .and_then(|resp| resp.bytes())
        .map_err(|e| PipelineError::io(url, e))?;

    let table = read_csv(body.as_ref(), url, None)?;
    info!(
        "fetched {} rows x {} columns from {url}",
        table.len(),
        table.width()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// Parse a comma-delimited table with a header row. Column types are
/// inferred per column; see [`Column::parse`].
pub fn read_csv<R: Read>(reader: R, origin: &str, index: Option<&str>) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| PipelineError::io(origin, e))?
        .iter()
        .map(|h| h.to_string())
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(PipelineError::io(origin, "no header row"));
    }

    let records = reader
        .records()
        .map(|record| {
            record
                .map(|r| r.iter().map(str::to_string).collect())
                .map_err(|e| PipelineError::io(origin, e))
        })
        .collect::<Result<Vec<Vec<String>>>>()?;

    Ok(Table::from_records(headers, records, index)?)
}

/// Write a table as CSV: the index (if any) first, then every column.
/// Null cells become empty fields.
pub fn write_csv<W: Write>(table: &Table, writer: W) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    let columns: Vec<&Column> = table.index().into_iter().chain(table.columns()).collect();

    writer.write_record(columns.iter().map(|c| c.name.as_str()))?;
    for row in 0..table.len() {
        writer.write_record(columns.iter().map(|c| c.values[row].to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON (`df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "ID": 1, "Age": 65, "Gender": "Female", "Sleep duration": 6.0 },
///   ...
/// ]
/// ```
///
/// Column order follows the first appearance of each key.
fn load_json(path: &Path, index: Option<&str>) -> Result<Table> {
    let text = std::fs::read_to_string(path).map_err(|e| origin_err(path, e))?;
    let root: JsonValue = serde_json::from_str(&text).map_err(|e| origin_err(path, e))?;

    let records = root
        .as_array()
        .ok_or_else(|| origin_err(path, "expected top-level JSON array"))?;

    let mut names: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| origin_err(path, format!("row {i} is not a JSON object")))?;
        for key in obj.keys() {
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
    }

    let columns = names
        .into_iter()
        .map(|name| {
            let cells = records
                .iter()
                .map(|rec| rec.get(&name).map_or(CellValue::Null, json_to_cell))
                .collect();
            Column::from_cells(name, cells)
        })
        .collect();

    Ok(Table::from_columns(columns, index)?)
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one scalar column per field.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`), as well as `generate_sample`.
/// Columns of a type that has no cell representation are an I/O error.
fn load_parquet(path: &Path, index: Option<&str>) -> Result<Table> {
    let file = std::fs::File::open(path).map_err(|e| origin_err(path, e))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| origin_err(path, e))?;
    let names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().map_err(|e| origin_err(path, e))?;

    let mut cells: Vec<Vec<CellValue>> = names.iter().map(|_| Vec::new()).collect();

    for batch_result in reader {
        let batch = batch_result.map_err(|e| origin_err(path, e))?;
        for (col_idx, (name, out)) in names.iter().zip(cells.iter_mut()).enumerate() {
            let values = column_cells(batch.column(col_idx))
                .map_err(|e| origin_err(path, format!("column '{name}': {e}")))?;
            out.extend(values);
        }
    }

    let columns = names
        .into_iter()
        .zip(cells)
        .map(|(name, values)| Column::from_cells(name, values))
        .collect();

    Ok(Table::from_columns(columns, index)?)
}

/// The Arrow type a column is widened to before its cells are read.
///
/// * any integer width → `Int64`
/// * any float width → `Float64`
/// * strings, dates, times and timestamps → `Utf8`
/// * dictionaries (pandas categoricals) → their value type, as above
fn cell_type(dt: &DataType) -> Option<DataType> {
    match dt {
        DataType::Boolean => Some(DataType::Boolean),
        dt if dt.is_integer() => Some(DataType::Int64),
        dt if dt.is_floating() => Some(DataType::Float64),
        DataType::Utf8
        | DataType::LargeUtf8
        | DataType::Utf8View
        | DataType::Date32
        | DataType::Date64
        | DataType::Time32(_)
        | DataType::Time64(_)
        | DataType::Timestamp(..) => Some(DataType::Utf8),
        DataType::Dictionary(_, values) => cell_type(values),
        _ => None,
    }
}

/// Read every cell of one Arrow column.
fn column_cells(col: &ArrayRef) -> std::result::Result<Vec<CellValue>, String> {
    let target = cell_type(col.data_type())
        .ok_or_else(|| format!("unsupported column type {}", col.data_type()))?;
    // Unsafe casts fail instead of turning out-of-range values into nulls.
    let options = CastOptions {
        safe: false,
        ..Default::default()
    };
    let col = cast_with_options(col, &target, &options).map_err(|e| e.to_string())?;

    let cells = match target {
        DataType::Int64 => col
            .as_primitive::<Int64Type>()
            .iter()
            .map(|v| v.map_or(CellValue::Null, CellValue::Integer))
            .collect(),
        DataType::Float64 => col
            .as_primitive::<Float64Type>()
            .iter()
            .map(|v| v.map_or(CellValue::Null, float_cell))
            .collect(),
        DataType::Boolean => col
            .as_boolean()
            .iter()
            .map(|v| v.map_or(CellValue::Null, CellValue::Bool))
            .collect(),
        _ => col
            .as_string::<i32>()
            .iter()
            .map(|v| v.map_or(CellValue::Null, |s| CellValue::Text(s.to_string())))
            .collect(),
    };
    Ok(cells)
}

/// Pandas writes missing floats as NaN rather than null.
fn float_cell(v: f64) -> CellValue {
    if v.is_nan() {
        CellValue::Null
    } else {
        CellValue::Float(v)
    }
}

fn origin_err(path: &Path, err: impl std::fmt::Display) -> PipelineError {
    PipelineError::io(path.display().to_string(), err)
}
