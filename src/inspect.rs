//! Column type introspection

use crate::set_diff::DEFAULT_DELIMITERS;
use crate::table::{ColumnType, Table, Value};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M",
];

/// Per-column summary shown by `inspect`
#[derive(Debug, Clone, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub column_type: ColumnType,
    pub non_missing: usize,
    pub missing: usize,
}

/// Parse a date or datetime written as text
pub fn parse_temporal(s: &str) -> Option<Value> {
    let s = s.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Value::DateTime(dt));
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(Value::Date(d));
        }
    }
    None
}

#[derive(Default)]
struct Tally {
    present: usize,
    dates: usize,
    datetimes: usize,
    has_time: bool,
    integers: usize,
    decimals: usize,
    multi_value: bool,
    free_text: bool,
}

impl Tally {
    fn observe(&mut self, value: &Value) {
        if value.is_missing() {
            return;
        }
        self.present += 1;
        match value {
            Value::Integer(_) => self.integers += 1,
            Value::Decimal(d) if d.fract() == 0.0 => self.integers += 1,
            Value::Decimal(_) => self.decimals += 1,
            Value::Date(_) => self.dates += 1,
            Value::DateTime(dt) => {
                self.datetimes += 1;
                self.has_time |= dt.time() != NaiveTime::MIN;
            }
            Value::Text(s) => self.observe_text(s),
            Value::Null => {}
        }
    }

    fn observe_text(&mut self, s: &str) {
        match parse_temporal(s) {
            Some(Value::DateTime(_)) => {
                self.datetimes += 1;
                self.has_time = true;
                return;
            }
            Some(_) => {
                self.dates += 1;
                return;
            }
            None => {}
        }
        let trimmed = s.trim();
        if trimmed.parse::<i64>().is_ok() {
            self.integers += 1;
            return;
        }
        if trimmed.parse::<f64>().is_ok_and(|f| f.is_finite()) {
            self.decimals += 1;
            return;
        }

        let tokens: Vec<&str> = s
            .split(|c: char| DEFAULT_DELIMITERS.contains(&c))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.iter().any(|t| t.contains(char::is_whitespace)) {
            self.free_text = true;
        } else if tokens.len() > 1 {
            self.multi_value = true;
        }
    }

    fn classify(&self) -> ColumnType {
        if self.present == 0 {
            return ColumnType::Text;
        }
        let temporal = self.dates + self.datetimes;
        if temporal == self.present {
            return if self.datetimes > 0 && self.has_time {
                ColumnType::DateTime
            } else {
                ColumnType::Date
            };
        }
        let numeric = self.integers + self.decimals;
        if numeric == self.present {
            return if self.decimals > 0 {
                ColumnType::Decimal
            } else {
                ColumnType::Integer
            };
        }
        if self.multi_value && !self.free_text {
            return ColumnType::MultiValueText;
        }
        ColumnType::Text
    }
}

/// Classify a column from its values
pub fn classify_column<'a>(values: impl IntoIterator<Item = &'a Value>) -> ColumnType {
    let mut tally = Tally::default();
    for value in values {
        tally.observe(value);
    }
    tally.classify()
}

/// Classify every column of `table`
pub fn profile_table(table: &Table) -> Vec<ColumnProfile> {
    table
        .columns()
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let missing = table.column_values(index).filter(|v| v.is_missing()).count();
            ColumnProfile {
                name: column.name.clone(),
                column_type: classify_column(table.column_values(index)),
                non_missing: table.row_count() - missing,
                missing,
            }
        })
        .collect()
}
