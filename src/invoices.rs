//! Consecutive invoice number detection

use crate::error::Result;
use crate::table::{Table, Value};
use std::collections::HashSet;

/// Header used by invoice exports when no column is given
pub const DEFAULT_INVOICE_COLUMN: &str = "发票号码";

/// Invoice numbers one below and one above `number`, varying only the last two digits.
///
/// Returns `(None, None)` when the number does not end in two ASCII digits. A neighbour that
/// would leave the `00..=99` range is `None`.
pub fn neighbours(number: &str) -> (Option<String>, Option<String>) {
    let bytes = number.as_bytes();
    if bytes.len() < 2 || !bytes[bytes.len() - 2..].iter().all(u8::is_ascii_digit) {
        return (None, None);
    }
    // the last two bytes are ASCII, so this is a char boundary
    let (prefix, digits) = number.split_at(number.len() - 2);
    let n: u8 = match digits.parse() {
        Ok(n) => n,
        Err(_) => return (None, None),
    };
    let prev = n.checked_sub(1).map(|p| format!("{}{:02}", prefix, p));
    let next = (n < 99).then(|| format!("{}{:02}", prefix, n + 1));
    (prev, next)
}

/// Finds rows whose invoice number has a neighbouring number in the same table
#[derive(Debug, Clone)]
pub struct ConsecutiveInvoiceFinder {
    pub invoice_column: String,
    /// Category column and the values to keep
    pub category_filter: Option<(String, Vec<String>)>,
}

impl ConsecutiveInvoiceFinder {
    pub fn new(invoice_column: impl Into<String>) -> Self {
        Self {
            invoice_column: invoice_column.into(),
            category_filter: None,
        }
    }

    pub fn with_category_filter(mut self, column: impl Into<String>, values: Vec<String>) -> Self {
        self.category_filter = Some((column.into(), values));
        self
    }

    /// Rows with a consecutive neighbour, sorted by invoice number
    pub fn find(&self, table: &Table) -> Result<Table> {
        let invoice_idx = table.require_column(&self.invoice_column)?;
        let category = match &self.category_filter {
            Some((column, values)) => Some((table.require_column(column)?, values)),
            None => None,
        };

        let numbers: Vec<Option<String>> = table
            .column_values(invoice_idx)
            .map(|v| (!v.is_missing()).then(|| v.to_string()))
            .collect();
        let known: HashSet<&str> = numbers.iter().flatten().map(String::as_str).collect();

        let mut hits: Vec<(usize, &str)> = numbers
            .iter()
            .enumerate()
            .filter_map(|(row, number)| number.as_deref().map(|n| (row, n)))
            .filter(|(_, number)| {
                let (prev, next) = neighbours(number);
                [prev, next]
                    .iter()
                    .flatten()
                    .any(|candidate| known.contains(candidate.as_str()))
            })
            .filter(|(row, _)| match category {
                Some((col, values)) => {
                    let value: &Value = table.value(*row, col);
                    !value.is_missing() && values.iter().any(|v| *v == value.to_string())
                }
                None => true,
            })
            .collect();
        hits.sort_by(|a, b| a.1.cmp(b.1));

        log::debug!(
            "Found {} consecutive invoices among {} rows of {}",
            hits.len(),
            table.row_count(),
            table.name()
        );

        let indices: Vec<usize> = hits.into_iter().map(|(row, _)| row).collect();
        Ok(table.select_rows(&indices))
    }
}
