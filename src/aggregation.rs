// 📊 Activity Aggregator - Per-period repair statistics
//
// Records are bucketed by the start date of their calendar period:
//
//   daily     → the date itself
//   weekly    → Monday of that week (weeks run Monday..Sunday)
//   monthly   → 1st of the month
//   quarterly → 1st of Jan / Apr / Jul / Oct
//   yearly    → January 1st
//
// One AggregateRow per distinct period start, oldest first.

use crate::activity::ActivityRecord;
use crate::error::AggregationError;
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

// ============================================================================
// GRANULARITY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Granularity {
    pub const ALL: [Granularity; 5] = [
        Granularity::Daily,
        Granularity::Weekly,
        Granularity::Monthly,
        Granularity::Quarterly,
        Granularity::Yearly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Daily => "daily",
            Granularity::Weekly => "weekly",
            Granularity::Monthly => "monthly",
            Granularity::Quarterly => "quarterly",
            Granularity::Yearly => "yearly",
        }
    }

    /// First day of the period containing `date`.
    pub fn period_start(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Daily => date,
            Granularity::Weekly => {
                date - Duration::days(date.weekday().num_days_from_monday() as i64)
            }
            Granularity::Monthly => first_of_month(date.year(), date.month()),
            Granularity::Quarterly => {
                let quarter_month = (date.month0() / 3) * 3 + 1;
                first_of_month(date.year(), quarter_month)
            }
            Granularity::Yearly => first_of_month(date.year(), 1),
        }
    }
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    // Day 1 exists for every month chrono can represent.
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = AggregationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "day" => Ok(Granularity::Daily),
            "weekly" | "week" => Ok(Granularity::Weekly),
            "monthly" | "month" => Ok(Granularity::Monthly),
            "quarterly" | "quarter" => Ok(Granularity::Quarterly),
            "yearly" | "year" => Ok(Granularity::Yearly),
            _ => Err(AggregationError::InvalidGranularity(s.to_string())),
        }
    }
}

// ============================================================================
// AGGREGATE ROW
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub period_start: NaiveDate,
    pub record_count: usize,
    pub total_cost_sum: f64,
    pub total_cost_mean: f64,
    pub fixed_expense_sum: f64,
    pub variable_expense_sum: f64,
    pub avg_part_cost_mean: f64,
    pub avg_part_lifespan_mean: f64,
    /// Most frequent product; ties go to the one seen first
    pub dominant_product: String,
}

// ============================================================================
// AGGREGATOR
// ============================================================================

pub struct ActivityAggregator;

impl ActivityAggregator {
    /// One row per period that has at least one record, ascending.
    pub fn aggregate(records: &[ActivityRecord], granularity: Granularity) -> Vec<AggregateRow> {
        let mut buckets: BTreeMap<NaiveDate, Vec<&ActivityRecord>> = BTreeMap::new();
        for record in records {
            buckets
                .entry(granularity.period_start(record.date))
                .or_default()
                .push(record);
        }

        debug!(
            granularity = %granularity,
            records = records.len(),
            buckets = buckets.len(),
            "Aggregating activity"
        );

        buckets
            .into_iter()
            .map(|(period_start, bucket)| summarize(period_start, &bucket))
            .collect()
    }

    /// Same as `aggregate`, with the granularity given by name.
    pub fn aggregate_by_name(
        records: &[ActivityRecord],
        granularity: &str,
    ) -> Result<Vec<AggregateRow>, AggregationError> {
        let granularity = granularity.parse::<Granularity>()?;
        Ok(Self::aggregate(records, granularity))
    }
}

/// `bucket` is never empty and keeps input order.
fn summarize(period_start: NaiveDate, bucket: &[&ActivityRecord]) -> AggregateRow {
    let n = bucket.len() as f64;
    let sum = |f: fn(&ActivityRecord) -> f64| bucket.iter().map(|r| f(r)).sum::<f64>();

    let total_cost_sum = sum(|r| r.total_cost);

    AggregateRow {
        period_start,
        record_count: bucket.len(),
        total_cost_sum,
        total_cost_mean: total_cost_sum / n,
        fixed_expense_sum: sum(|r| r.fixed_expense),
        variable_expense_sum: sum(|r| r.variable_expense),
        avg_part_cost_mean: sum(|r| r.average_part_cost) / n,
        avg_part_lifespan_mean: sum(|r| r.average_part_lifespan) / n,
        dominant_product: dominant_product(bucket.iter().map(|r| r.product.as_str()))
            .unwrap_or_default()
            .to_string(),
    }
}

/// Stable mode: highest count wins, ties go to the first value seen.
pub fn dominant_product<'a, I>(products: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    // First-seen order is kept by the Vec; buckets are small.
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for product in products {
        match counts.iter_mut().find(|(p, _)| *p == product) {
            Some((_, count)) => *count += 1,
            None => counts.push((product, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (product, count) in counts {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((product, count));
        }
    }
    best.map(|(product, _)| product)
}
