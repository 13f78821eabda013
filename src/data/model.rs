use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::error::SchemaError;

// ---------------------------------------------------------------------------
// CellValue – a single cell of a table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring the dtypes a CSV column can take.
/// Grouping downstream uses `BTreeMap` / `BTreeSet`, so `CellValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        use CellValue::*;

        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) | Float(_) => 2,
                Text(_) => 3,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            // Mixed numerics compare by value, ints first on a tie.
            (Integer(a), Float(b)) => (*a as f64).total_cmp(b).then(Ordering::Less),
            (Float(a), Integer(b)) => a.total_cmp(&(*b as f64)).then(Ordering::Greater),
            (Text(a), Text(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Text(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            // `{:?}` keeps the fraction (`6.0`), so written floats read back as floats.
            CellValue::Float(v) => write!(f, "{v:?}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => Ok(()),
        }
    }
}

impl CellValue {
    /// Interpret the value as an `f64` when it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

impl From<Option<f64>> for CellValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(CellValue::Null, CellValue::Float)
    }
}

/// Tokens read as a missing value.
const NULL_TOKENS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL"];

pub fn is_null_token(s: &str) -> bool {
    NULL_TOKENS.contains(&s.trim())
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Column – a named, typed vector of cells
// ---------------------------------------------------------------------------

/// The inferred type of a whole column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    Bool,
    Text,
}

impl ColumnType {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Integer => "int64",
            ColumnType::Float => "float64",
            ColumnType::Bool => "bool",
            ColumnType::Text => "text",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub dtype: ColumnType,
    pub values: Vec<CellValue>,
}

impl Column {
    /// Infer a column type from raw text cells and convert every cell to it.
    ///
    /// * all non-null cells parse as `i64` → [`ColumnType::Integer`]
    /// * all non-null cells parse as `f64` → [`ColumnType::Float`]
    /// * all non-null cells are `true`/`false` → [`ColumnType::Bool`]
    /// * anything else → [`ColumnType::Text`], cells kept verbatim
    ///
    /// A column without any non-null cell is `Float`.
    pub fn parse(name: impl Into<String>, raw: Vec<String>) -> Self {
        let present = || raw.iter().map(|s| s.trim()).filter(|s| !is_null_token(s));

        let dtype = if present().next().is_none() {
            ColumnType::Float
        } else if present().all(|s| s.parse::<i64>().is_ok()) {
            ColumnType::Integer
        } else if present().all(|s| s.parse::<f64>().is_ok()) {
            ColumnType::Float
        } else if present().all(|s| parse_bool(s).is_some()) {
            ColumnType::Bool
        } else {
            ColumnType::Text
        };

        let values = raw
            .into_iter()
            .map(|s| {
                if is_null_token(&s) {
                    return CellValue::Null;
                }
                let t = s.trim();
                match dtype {
                    ColumnType::Integer => t.parse().map(CellValue::Integer).ok(),
                    ColumnType::Float => t.parse().map(CellValue::Float).ok(),
                    ColumnType::Bool => parse_bool(t).map(CellValue::Bool),
                    ColumnType::Text => None,
                }
                .unwrap_or(CellValue::Text(s))
            })
            .collect();

        Column {
            name: name.into(),
            dtype,
            values,
        }
    }

    /// Build a column from already-typed cells, promoting to a common type.
    ///
    /// Integers mixed with floats become floats; any text, or bools mixed with
    /// numbers, turns the whole column into text.
    pub fn from_cells(name: impl Into<String>, cells: Vec<CellValue>) -> Self {
        let (mut ints, mut floats, mut bools, mut texts) = (false, false, false, false);
        for cell in &cells {
            match cell {
                CellValue::Integer(_) => ints = true,
                CellValue::Float(_) => floats = true,
                CellValue::Bool(_) => bools = true,
                CellValue::Text(_) => texts = true,
                CellValue::Null => {}
            }
        }

        let dtype = if texts || (bools && (ints || floats)) {
            ColumnType::Text
        } else if bools {
            ColumnType::Bool
        } else if floats || !ints {
            ColumnType::Float
        } else {
            ColumnType::Integer
        };

        let values = cells
            .into_iter()
            .map(|cell| match (dtype, cell) {
                (_, CellValue::Null) => CellValue::Null,
                (ColumnType::Float, CellValue::Integer(i)) => CellValue::Float(i as f64),
                (ColumnType::Text, c @ CellValue::Text(_)) => c,
                (ColumnType::Text, c) => CellValue::Text(c.to_string()),
                (_, c) => c,
            })
            .collect();

        Column {
            name: name.into(),
            dtype,
            values,
        }
    }

    /// A float column where `None` becomes a null cell.
    pub fn from_floats(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Column {
            name: name.into(),
            dtype: ColumnType::Float,
            values: values.into_iter().map(CellValue::from).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Numeric view of the column; non-numeric cells read as `None`.
    pub fn as_f64_values(&self) -> Vec<Option<f64>> {
        self.values.iter().map(CellValue::as_f64).collect()
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }
}

// ---------------------------------------------------------------------------
// Table – ordered named columns over ordered rows
// ---------------------------------------------------------------------------

/// An immutable-by-convention table: an optional index column plus ordered,
/// uniquely named data columns of equal length.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    index: Option<Column>,
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    /// Assemble a table, checking lengths, column-name uniqueness and
    /// index-label uniqueness.
    pub fn new(index: Option<Column>, columns: Vec<Column>) -> Result<Self, SchemaError> {
        let rows = index
            .as_ref()
            .or(columns.first())
            .map_or(0, Column::len);

        let mut names = BTreeSet::new();
        for col in index.iter().chain(columns.iter()) {
            if col.len() != rows {
                return Err(SchemaError::LengthMismatch {
                    column: col.name.clone(),
                    expected: rows,
                    found: col.len(),
                });
            }
            if !names.insert(col.name.as_str()) {
                return Err(SchemaError::DuplicateColumn(col.name.clone()));
            }
        }

        if let Some(idx) = &index {
            let mut seen = BTreeSet::new();
            for label in &idx.values {
                if !seen.insert(label) {
                    return Err(SchemaError::DuplicateIndex {
                        column: idx.name.clone(),
                        label: label.to_string(),
                    });
                }
            }
        }

        Ok(Table {
            index,
            columns,
            rows,
        })
    }

    /// Build a table from typed columns, promoting `index` (if given) out of
    /// the data columns and into the row index.
    pub fn from_columns(mut columns: Vec<Column>, index: Option<&str>) -> Result<Self, SchemaError> {
        let index = match index {
            Some(name) => {
                let pos = columns
                    .iter()
                    .position(|c| c.name == name)
                    .ok_or_else(|| SchemaError::MissingColumn(name.to_string()))?;
                Some(columns.remove(pos))
            }
            None => None,
        };
        Table::new(index, columns)
    }

    /// Build a table from a header row and raw text records, inferring each
    /// column's type.
    pub fn from_records(
        headers: Vec<String>,
        records: Vec<Vec<String>>,
        index: Option<&str>,
    ) -> Result<Self, SchemaError> {
        let mut raw: Vec<Vec<String>> = headers
            .iter()
            .map(|_| Vec::with_capacity(records.len()))
            .collect();
        for record in records {
            for (cells, value) in raw.iter_mut().zip(record) {
                cells.push(value);
            }
        }
        let columns = headers
            .into_iter()
            .zip(raw)
            .map(|(name, cells)| Column::parse(name, cells))
            .collect();
        Table::from_columns(columns, index)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Number of data columns (the index is not counted).
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn index(&self) -> Option<&Column> {
        self.index.as_ref()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Like [`Table::column`], but a missing column is a schema error.
    pub fn require(&self, name: &str) -> Result<&Column, SchemaError> {
        self.column(name)
            .ok_or_else(|| SchemaError::MissingColumn(name.to_string()))
    }

    /// Numeric values of a column; the column must exist and be numeric.
    pub fn numeric(&self, name: &str) -> Result<Vec<Option<f64>>, SchemaError> {
        let col = self.require(name)?;
        if !col.dtype.is_numeric() {
            return Err(SchemaError::TypeMismatch {
                column: name.to_string(),
                expected: "numeric",
                found: col.dtype,
            });
        }
        Ok(col.as_f64_values())
    }

    /// Row position of an index label.
    pub fn position_of(&self, label: &CellValue) -> Option<usize> {
        self.index.as_ref()?.values.iter().position(|v| v == label)
    }

    pub fn row(&self, position: usize) -> Option<Row<'_>> {
        (position < self.rows).then_some(Row {
            table: self,
            position,
        })
    }

    /// Row addressed by its index label.
    pub fn row_by_label(&self, label: &CellValue) -> Option<Row<'_>> {
        self.position_of(label).and_then(|pos| self.row(pos))
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        (0..self.rows).map(move |position| Row {
            table: self,
            position,
        })
    }

    /// Relabel data columns. Pairs whose source is absent are skipped.
    /// Fails if the result would contain the same name twice.
    pub fn rename_columns<'a>(
        mut self,
        renames: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, SchemaError> {
        for (from, to) in renames {
            if let Some(col) = self.columns.iter_mut().find(|c| c.name == from) {
                col.name = to.to_string();
            }
        }
        Table::new(self.index, self.columns)
    }

    /// Remove data columns by name; absent names are ignored.
    pub fn drop_columns(mut self, names: &[&str]) -> Self {
        self.columns.retain(|c| !names.contains(&c.name.as_str()));
        self
    }

    /// Append a column, or replace the column of the same name in place.
    pub fn with_column(mut self, column: Column) -> Result<Self, SchemaError> {
        if column.len() != self.rows {
            let found = column.len();
            return Err(SchemaError::LengthMismatch {
                column: column.name,
                expected: self.rows,
                found,
            });
        }
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        Ok(self)
    }
}

// ---------------------------------------------------------------------------
// Row – a borrowed view of one row
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    position: usize,
}

impl<'a> Row<'a> {
    pub fn position(&self) -> usize {
        self.position
    }

    /// The index label of this row, if the table has an index.
    pub fn label(&self) -> Option<&'a CellValue> {
        self.table.index.as_ref().map(|idx| &idx.values[self.position])
    }

    pub fn get(&self, column: &str) -> Option<&'a CellValue> {
        self.table.column(column).map(|c| &c.values[self.position])
    }
}
