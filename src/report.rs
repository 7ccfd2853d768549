// 🧾 Activity Report - Text, CSV and JSON output for aggregate rows

use crate::aggregation::{AggregateRow, Granularity};
use crate::error::{Result as CrateResult, StoreError};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

const HEADERS: [&str; 9] = [
    "period",
    "records",
    "total_cost",
    "mean_cost",
    "fixed_expense",
    "variable_expense",
    "part_cost",
    "part_lifespan",
    "top_product",
];

// ============================================================================
// SUMMARY
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub granularity: Granularity,
    pub period_count: usize,
    pub record_count: usize,
    pub grand_total_cost: f64,
    /// Period with the highest total cost (earliest on ties)
    pub busiest_period: Option<AggregateRow>,
}

impl ReportSummary {
    pub fn from_rows(granularity: Granularity, rows: &[AggregateRow]) -> Self {
        let busiest_period = rows
            .iter()
            .fold(None::<&AggregateRow>, |best, row| match best {
                Some(b) if b.total_cost_sum >= row.total_cost_sum => Some(b),
                _ => Some(row),
            })
            .cloned();

        ReportSummary {
            granularity,
            period_count: rows.len(),
            record_count: rows.iter().map(|r| r.record_count).sum(),
            grand_total_cost: rows.iter().map(|r| r.total_cost_sum).sum(),
            busiest_period,
        }
    }

    pub fn summary(&self) -> String {
        let busiest = match &self.busiest_period {
            Some(row) => format!(
                ", busiest {} ({:.2})",
                row.period_start, row.total_cost_sum
            ),
            None => String::new(),
        };
        format!(
            "{} report: {} periods, {} records, total cost {:.2}{}",
            self.granularity, self.period_count, self.record_count, self.grand_total_cost, busiest
        )
    }
}

// ============================================================================
// RENDERING
// ============================================================================

fn row_cells(row: &AggregateRow) -> [String; 9] {
    [
        row.period_start.format("%Y-%m-%d").to_string(),
        row.record_count.to_string(),
        format!("{:.2}", row.total_cost_sum),
        format!("{:.2}", row.total_cost_mean),
        format!("{:.2}", row.fixed_expense_sum),
        format!("{:.2}", row.variable_expense_sum),
        format!("{:.2}", row.avg_part_cost_mean),
        format!("{:.1}", row.avg_part_lifespan_mean),
        row.dominant_product.clone(),
    ]
}

/// Fixed-width text table: header line, then one line per row.
pub fn render_table(rows: &[AggregateRow]) -> String {
    let cells: Vec<[String; 9]> = rows.iter().map(row_cells).collect();

    let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.len()).collect();
    for line in &cells {
        for (w, cell) in widths.iter_mut().zip(line.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header: Vec<String> = HEADERS
        .iter()
        .zip(&widths)
        .map(|(h, w)| format!("{:>w$}", h, w = *w))
        .collect();
    let _ = writeln!(out, "{}", header.join("  "));

    for line in &cells {
        let padded: Vec<String> = line
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:>w$}", c, w = *w))
            .collect();
        let _ = writeln!(out, "{}", padded.join("  "));
    }

    out
}

/// Write rows as CSV with a header line.
pub fn write_csv(rows: &[AggregateRow], path: &Path) -> Result<(), StoreError> {
    let mut wtr = csv::Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn to_json(rows: &[AggregateRow]) -> CrateResult<String> {
    Ok(serde_json::to_string_pretty(rows)?)
}
