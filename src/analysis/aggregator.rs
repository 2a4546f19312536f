//! Sales aggregation and statistics.
//!
//! This module computes the summary statistics that feed every prompt:
//! totals, margin, per-product and per-month tables, and the best month and
//! product by revenue.

use crate::error::SummaryError;
use crate::models::{AggregateSummary, MonthStats, ProductStats, SalesDataset, SalesRecord};
use indexmap::IndexMap;

/// Compute the aggregate summary of a dataset.
///
/// Fails on an empty dataset, and when total revenue is zero (the margin
/// would be a division by zero).
pub fn summarize(dataset: &SalesDataset) -> Result<AggregateSummary, SummaryError> {
    let records = dataset.records();
    let (first, last) = match (records.first(), records.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(SummaryError::EmptyDataset),
    };

    let totals = dataset_totals(dataset);
    if totals.revenue == 0.0 {
        return Err(SummaryError::ZeroRevenue);
    }

    let products = group_by_product(records);
    let months = group_by_month(records);

    let best_product = argmax_revenue(products.iter().map(|(k, v)| (k, v.revenue)))
        .ok_or(SummaryError::EmptyDataset)?;
    let best_month = argmax_revenue(months.iter().map(|(k, v)| (k, v.revenue)))
        .ok_or(SummaryError::EmptyDataset)?;

    let period_start = records.iter().map(|r| r.date).min().unwrap_or(first.date);
    let period_end = records.iter().map(|r| r.date).max().unwrap_or(last.date);

    Ok(AggregateSummary {
        record_count: records.len(),
        period_start,
        period_end,
        total_revenue: totals.revenue,
        total_expenses: totals.expenses,
        total_profit: totals.profit,
        profit_margin: 100.0 * totals.profit / totals.revenue,
        avg_customers: totals.avg_customers.unwrap_or_default(),
        products,
        months,
        best_month,
        best_product,
    })
}

/// Plain column totals. Never fails; used where an empty table is allowed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DatasetTotals {
    pub revenue: f64,
    pub expenses: f64,
    pub profit: f64,
    pub customers: u64,
    /// Mean customers per row; `None` for an empty dataset.
    pub avg_customers: Option<f64>,
}

/// Sum the numeric columns of a dataset.
pub fn dataset_totals(dataset: &SalesDataset) -> DatasetTotals {
    let mut totals = DatasetTotals::default();

    for record in dataset.records() {
        totals.revenue += record.revenue;
        totals.expenses += record.expenses;
        totals.profit += record.profit;
        totals.customers = totals.customers.saturating_add(record.customers);
    }

    if !dataset.is_empty() {
        totals.avg_customers = Some(totals.customers as f64 / dataset.len() as f64);
    }

    totals
}

/// Group records by product, in first-seen order.
pub fn group_by_product(records: &[SalesRecord]) -> IndexMap<String, ProductStats> {
    let mut grouped: IndexMap<String, ProductStats> = IndexMap::new();

    for record in records {
        let stats = grouped.entry(record.product.clone()).or_default();
        stats.revenue += record.revenue;
        stats.expenses += record.expenses;
        stats.profit += record.profit;
        stats.customers = stats.customers.saturating_add(record.customers);
    }

    grouped
}

/// Group records by month label, in first-seen order.
pub fn group_by_month(records: &[SalesRecord]) -> IndexMap<String, MonthStats> {
    let mut grouped: IndexMap<String, MonthStats> = IndexMap::new();

    for record in records {
        let stats = grouped.entry(record.month.clone()).or_default();
        stats.revenue += record.revenue;
        stats.profit += record.profit;
        stats.customers = stats.customers.saturating_add(record.customers);
    }

    grouped
}

/// Distinct product labels, in first-seen order.
pub fn distinct_products(dataset: &SalesDataset) -> Vec<String> {
    let mut seen: IndexMap<&str, ()> = IndexMap::new();
    for record in dataset.records() {
        seen.entry(record.product.as_str()).or_default();
    }
    seen.into_keys().map(String::from).collect()
}

/// Key with the highest revenue. Ties keep the first key seen.
fn argmax_revenue<'a>(entries: impl Iterator<Item = (&'a String, f64)>) -> Option<String> {
    let mut best: Option<(&String, f64)> = None;

    for (key, revenue) in entries {
        match best {
            Some((_, top)) if revenue <= top => {}
            _ => best = Some((key, revenue)),
        }
    }

    best.map(|(key, _)| key.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(date: (i32, u32, u32), product: &str, revenue: f64, expenses: f64, customers: u64) -> SalesRecord {
        let date = NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap();
        SalesRecord::new(date, product, revenue, expenses, customers)
    }

    fn example_dataset() -> SalesDataset {
        SalesDataset::new(
            "example",
            vec![
                record((2024, 1, 1), "Phone", 1000.0, 400.0, 10),
                record((2024, 2, 1), "Laptop", 2000.0, 500.0, 5),
            ],
        )
    }

    #[test]
    fn test_summarize_example() {
        let summary = summarize(&example_dataset()).unwrap();

        assert_eq!(summary.total_revenue, 3000.0);
        assert_eq!(summary.total_expenses, 900.0);
        assert_eq!(summary.total_profit, 2100.0);
        assert!((summary.profit_margin - 70.0).abs() < 1e-9);
        assert_eq!(summary.avg_customers, 7.5);
        assert_eq!(summary.best_product, "Laptop");
        assert_eq!(summary.best_month, "February");
        assert_eq!(summary.record_count, 2);
        assert_eq!(summary.period_start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(summary.period_end, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }

    #[test]
    fn test_profit_identity() {
        let dataset = SalesDataset::new(
            "mixed",
            vec![
                record((2024, 1, 3), "Phone", 1234.56, 789.01, 3),
                record((2024, 1, 9), "Tablet", 99.99, 120.5, 1),
                record((2024, 4, 2), "Laptop", 5000.25, 1000.75, 20),
            ],
        );
        let summary = summarize(&dataset).unwrap();
        let diff = summary.total_revenue - summary.total_expenses;
        assert!((summary.total_profit - diff).abs() < 1e-6);
    }

    #[test]
    fn test_summarize_is_pure() {
        let dataset = example_dataset();
        let a = summarize(&dataset).unwrap();
        let b = summarize(&dataset).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.total_profit.to_bits(), b.total_profit.to_bits());
    }

    #[test]
    fn test_empty_dataset_fails() {
        let dataset = SalesDataset::new("empty", vec![]);
        assert_eq!(summarize(&dataset), Err(SummaryError::EmptyDataset));
    }

    #[test]
    fn test_zero_revenue_fails() {
        let dataset = SalesDataset::new("zero", vec![record((2024, 1, 1), "Phone", 0.0, 10.0, 1)]);
        assert_eq!(summarize(&dataset), Err(SummaryError::ZeroRevenue));
    }

    #[test]
    fn test_ties_resolve_to_first_seen() {
        let dataset = SalesDataset::new(
            "ties",
            vec![
                record((2024, 3, 1), "Tablet", 500.0, 100.0, 1),
                record((2024, 1, 1), "Phone", 500.0, 100.0, 1),
            ],
        );
        let summary = summarize(&dataset).unwrap();
        assert_eq!(summary.best_product, "Tablet");
        assert_eq!(summary.best_month, "March");
    }

    #[test]
    fn test_best_is_argmax_of_grouped_revenue() {
        // Phone wins only after its two rows are summed.
        let dataset = SalesDataset::new(
            "grouped",
            vec![
                record((2024, 1, 1), "Laptop", 900.0, 100.0, 1),
                record((2024, 2, 1), "Phone", 600.0, 100.0, 1),
                record((2024, 2, 15), "Phone", 600.0, 100.0, 1),
            ],
        );
        let summary = summarize(&dataset).unwrap();
        assert_eq!(summary.best_product, "Phone");
        assert_eq!(summary.best_month, "February");
    }

    #[test]
    fn test_grouping_keeps_first_seen_order() {
        let dataset = SalesDataset::new(
            "order",
            vec![
                record((2024, 5, 1), "Tablet", 1.0, 0.0, 1),
                record((2024, 1, 1), "Phone", 1.0, 0.0, 1),
                record((2024, 5, 2), "Laptop", 1.0, 0.0, 1),
                record((2024, 1, 2), "Tablet", 1.0, 0.0, 1),
            ],
        );

        let by_product = group_by_product(dataset.records());
        let products: Vec<&String> = by_product.keys().collect();
        assert_eq!(products, vec!["Tablet", "Phone", "Laptop"]);

        let by_month = group_by_month(dataset.records());
        let months: Vec<&String> = by_month.keys().collect();
        assert_eq!(months, vec!["May", "January"]);

        assert_eq!(distinct_products(&dataset), vec!["Tablet", "Phone", "Laptop"]);
    }

    #[test]
    fn test_group_sums() {
        let dataset = SalesDataset::new(
            "sums",
            vec![
                record((2024, 1, 1), "Phone", 100.0, 40.0, 2),
                record((2024, 1, 20), "Phone", 50.0, 10.0, 3),
            ],
        );
        let products = group_by_product(dataset.records());
        let phone = &products["Phone"];
        assert_eq!(phone.revenue, 150.0);
        assert_eq!(phone.expenses, 50.0);
        assert_eq!(phone.profit, 100.0);
        assert_eq!(phone.customers, 5);

        let months = group_by_month(dataset.records());
        assert_eq!(months["January"].customers, 5);
    }

    #[test]
    fn test_customer_sums_saturate() {
        let dataset = SalesDataset::new(
            "huge",
            vec![
                record((2024, 1, 1), "Phone", 10.0, 1.0, u64::MAX),
                record((2024, 1, 2), "Phone", 10.0, 1.0, u64::MAX),
            ],
        );

        let summary = summarize(&dataset).unwrap();
        assert_eq!(summary.products["Phone"].customers, u64::MAX);
        assert_eq!(summary.months["January"].customers, u64::MAX);
        assert_eq!(dataset_totals(&dataset).customers, u64::MAX);
    }

    #[test]
    fn test_dataset_totals_on_empty() {
        let totals = dataset_totals(&SalesDataset::new("empty", vec![]));
        assert_eq!(totals.revenue, 0.0);
        assert_eq!(totals.avg_customers, None);
    }
}
