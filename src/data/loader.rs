//! CSV loading for the sales dataset.
//!
//! Reads a table with the columns `Date, Product, Revenue, Expenses,
//! Customers`, derives profit and month for each row, and rejects the file
//! as a whole if any required column or value is unusable.

use crate::error::LoadError;
use crate::models::{SalesDataset, SalesRecord};
use chrono::{NaiveDate, NaiveDateTime};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Columns every dataset must provide.
pub const REQUIRED_COLUMNS: [&str; 5] = ["Date", "Product", "Revenue", "Expenses", "Customers"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Load a dataset from a CSV file.
pub fn load_dataset(path: &Path) -> Result<SalesDataset, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let dataset = load_from_reader(file, path.display().to_string())?;
    info!(
        "Loaded {} sales records from {}",
        dataset.len(),
        path.display()
    );

    Ok(dataset)
}

/// Load a dataset from any CSV reader.
pub fn load_from_reader<R: Read>(
    reader: R,
    source: impl Into<String>,
) -> Result<SalesDataset, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let columns = ColumnIndex::resolve(&headers)?;

    let mut records = Vec::new();
    for (i, row) in csv_reader.records().enumerate() {
        let row = row?;
        let row_number = i + 1;

        let date_raw = columns.field(&row, columns.date);
        let date = parse_date(date_raw).ok_or_else(|| LoadError::InvalidDate {
            row: row_number,
            value: date_raw.to_string(),
        })?;

        let product = columns.field(&row, columns.product);
        let revenue = parse_amount(&columns, &row, columns.revenue, "Revenue", row_number)?;
        let expenses = parse_amount(&columns, &row, columns.expenses, "Expenses", row_number)?;

        let customers_raw = columns.field(&row, columns.customers);
        let customers =
            parse_count(customers_raw).ok_or_else(|| LoadError::InvalidNumber {
                row: row_number,
                column: "Customers".to_string(),
                value: customers_raw.to_string(),
            })?;

        if revenue < 0.0 || expenses < 0.0 {
            warn!(
                "Row {}: negative amount (revenue {}, expenses {})",
                row_number, revenue, expenses
            );
        }

        let record = SalesRecord::new(date, product, revenue, expenses, customers);
        debug!("Row {}: {:?}", row_number, record);
        records.push(record);
    }

    Ok(SalesDataset::new(source, records))
}

/// Positions of the required columns within the header.
struct ColumnIndex {
    date: usize,
    product: usize,
    revenue: usize,
    expenses: usize,
    customers: usize,
}

impl ColumnIndex {
    fn resolve(headers: &csv::StringRecord) -> Result<Self, LoadError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| LoadError::MissingColumn(name.to_string()))
        };

        let [date, product, revenue, expenses, customers] = REQUIRED_COLUMNS;
        Ok(Self {
            date: find(date)?,
            product: find(product)?,
            revenue: find(revenue)?,
            expenses: find(expenses)?,
            customers: find(customers)?,
        })
    }

    fn field<'a>(&self, row: &'a csv::StringRecord, index: usize) -> &'a str {
        row.get(index).unwrap_or("")
    }
}

fn parse_amount(
    columns: &ColumnIndex,
    row: &csv::StringRecord,
    index: usize,
    column: &str,
    row_number: usize,
) -> Result<f64, LoadError> {
    let raw = columns.field(row, index);
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| LoadError::InvalidNumber {
            row: row_number,
            column: column.to_string(),
            value: raw.to_string(),
        })
}

/// Parse a customer count; integral floats such as `12.0` are accepted.
fn parse_count(raw: &str) -> Option<u64> {
    if let Ok(n) = raw.parse::<u64>() {
        return Some(n);
    }
    let value = raw.parse::<f64>().ok()?;
    // `u64::MAX as f64` rounds up to 2^64, which itself does not fit.
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value < u64::MAX as f64 {
        Some(value as u64)
    } else {
        None
    }
}

/// Parse a date in any of the accepted layouts.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}
