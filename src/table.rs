//! In-memory table model shared by every comparison stage

use crate::error::{Result, SheetdiffError};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Declared type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Text,
    Integer,
    Decimal,
    Date,
    DateTime,
    /// Delimiter-separated tokens, e.g. position numbers "R1, R2, C5"
    MultiValueText,
}

impl ColumnType {
    pub fn label(&self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Integer => "integer",
            ColumnType::Decimal => "decimal",
            ColumnType::Date => "date",
            ColumnType::DateTime => "datetime",
            ColumnType::MultiValueText => "multi-value text",
        }
    }
}

/// A single cell value.
///
/// Equality is exact, with one allowance: integers and decimals compare by numeric value, so a
/// whole-number cell read as `100` from one file and `100.0` from another still matches. Text
/// never equals a number.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Text(String),
    Integer(i64),
    Decimal(f64),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Null and empty text both count as missing
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Integer(_) | Value::Decimal(_) => 1,
            Value::Date(_) => 2,
            Value::DateTime(_) => 3,
            Value::Text(_) => 4,
        }
    }

    /// Bit pattern used for hashing numbers so that equal numbers hash equally
    fn numeric_bits(n: f64) -> u64 {
        Self::canonical(n).to_bits()
    }

    /// Fold `-0.0` into `0.0` and every NaN into one NaN
    fn canonical(n: f64) -> f64 {
        if n == 0.0 {
            0.0
        } else if n.is_nan() {
            f64::NAN
        } else {
            n
        }
    }

    /// Exact ordering of an integer against a decimal, without rounding the integer to f64
    fn cmp_integer_decimal(i: i64, d: f64) -> Ordering {
        const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
        if d.is_nan() || d >= TWO_POW_63 {
            return Ordering::Less;
        }
        if d < -TWO_POW_63 {
            return Ordering::Greater;
        }
        let whole = d.trunc();
        match i.cmp(&(whole as i64)) {
            Ordering::Equal => whole.partial_cmp(&d).unwrap_or(Ordering::Equal),
            other => other,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Null => {}
            Value::Text(s) => s.hash(state),
            Value::Integer(i) => Self::numeric_bits(*i as f64).hash(state),
            Value::Decimal(d) => Self::numeric_bits(*d).hash(state),
            Value::Date(d) => d.hash(state),
            Value::DateTime(dt) => dt.hash(state),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Decimal(a), Value::Decimal(b)) => {
                Self::canonical(*a).total_cmp(&Self::canonical(*b))
            }
            (Value::Integer(i), Value::Decimal(d)) => Self::cmp_integer_decimal(*i, *d),
            (Value::Decimal(d), Value::Integer(i)) => Self::cmp_integer_decimal(*i, *d).reverse(),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::DateTime(a), Value::DateTime(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Text(s) => write!(f, "{}", s),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Decimal(d)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Column name and declared type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Ordered columns plus row-major values. Every row has exactly one value per column.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table of text-typed columns; handy for fixtures and ad-hoc callers
    pub fn from_rows(
        name: impl Into<String>,
        headers: &[&str],
        rows: Vec<Vec<Value>>,
    ) -> Result<Self> {
        let columns = headers
            .iter()
            .map(|h| Column::new(*h, ColumnType::Text))
            .collect();
        let mut table = Self::new(name, columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(SheetdiffError::data_processing(format!(
                "Row {} of {} has {} values but the table has {} columns",
                self.rows.len() + 1,
                self.name,
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Index of `name`, or a `MissingColumn` error naming this table
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| SheetdiffError::missing_column(name, &self.name))
    }

    pub fn set_column_type(&mut self, index: usize, column_type: ColumnType) {
        if let Some(column) = self.columns.get_mut(index) {
            column.column_type = column_type;
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> &[Value] {
        &self.rows[index]
    }

    pub fn value(&self, row: usize, column: usize) -> &Value {
        &self.rows[row][column]
    }

    /// All values of one column, top to bottom
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().map(move |row| &row[index])
    }

    /// Copy of this table holding only the given rows, in the given order
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            name: self.name.clone(),
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }
}

/// Composite key: a non-empty list of distinct column names
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeySpec(Vec<String>);

impl KeySpec {
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = Vec::new();
        for column in columns {
            let column = column.into();
            if names.contains(&column) {
                return Err(SheetdiffError::invalid_key_spec(format!(
                    "key column '{}' listed more than once",
                    column
                )));
            }
            names.push(column);
        }
        if names.is_empty() {
            return Err(SheetdiffError::invalid_key_spec(
                "at least one key column is required",
            ));
        }
        Ok(Self(names))
    }

    pub fn columns(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.iter().any(|c| c == column)
    }

    /// Resolve key column positions in `table`
    pub fn indices(&self, table: &Table) -> Result<Vec<usize>> {
        self.0.iter().map(|c| table.require_column(c)).collect()
    }
}

/// Ordered key values of one row. Missing cells (null or empty text) are stored as `Null`, so a
/// blank key in one file matches a null key in the other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct KeyTuple(pub Vec<Value>);

impl KeyTuple {
    pub fn from_row(row: &[Value], key_indices: &[usize]) -> Self {
        Self(
            key_indices
                .iter()
                .map(|&i| if row[i].is_missing() { Value::Null } else { row[i].clone() })
                .collect(),
        )
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }
}

impl fmt::Display for KeyTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{}", value)?;
        }
        Ok(())
    }
}

/// Non-key columns selected for field-level comparison
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldSelection(Vec<String>);

impl FieldSelection {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = Vec::new();
        for field in fields {
            let field = field.into();
            if !names.contains(&field) {
                names.push(field);
            }
        }
        Self(names)
    }

    /// Every column present in both tables except the key columns, in left-table order
    pub fn common_non_key(left: &Table, right: &Table, keys: &KeySpec) -> Self {
        Self(
            left.columns()
                .iter()
                .map(|c| c.name.clone())
                .filter(|name| right.has_column(name) && !keys.contains(name))
                .collect(),
        )
    }

    pub fn fields(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Drop any field that is also a key column
    pub fn without_keys(&self, keys: &KeySpec) -> Self {
        Self(self.0.iter().filter(|f| !keys.contains(f)).cloned().collect())
    }
}
