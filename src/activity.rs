// 📒 Activity Log - Historical repair activity
// In-memory SQLite table of activity records, seeded with random data for the
// last year or loaded from CSV.

use crate::error::StoreError;
use chrono::{Duration, NaiveDate};
use rand::seq::IndexedRandom;
use rand::Rng;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Products that show up in generated activity.
pub const SEED_PRODUCTS: [&str; 5] = ["Mouse", "Keyboard", "Monitor", "Laptop", "Tablet"];

// ============================================================================
// ACTIVITY RECORD
// ============================================================================

/// One repair job. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub date: NaiveDate,
    pub product: String,
    pub total_cost: f64,
    pub fixed_expense: f64,
    pub variable_expense: f64,
    pub average_part_cost: f64,
    /// Hours
    pub average_part_lifespan: f64,
}

impl ActivityRecord {
    fn validate(&self) -> Result<(), StoreError> {
        if self.product.trim().is_empty() {
            return Err(StoreError::InvalidRecord(format!(
                "record dated {} has no product",
                self.date
            )));
        }
        let amounts = [
            ("total_cost", self.total_cost),
            ("fixed_expense", self.fixed_expense),
            ("variable_expense", self.variable_expense),
            ("average_part_cost", self.average_part_cost),
            ("average_part_lifespan", self.average_part_lifespan),
        ];
        if let Some((field, value)) = amounts.iter().find(|(_, v)| !v.is_finite()) {
            return Err(StoreError::InvalidRecord(format!(
                "record dated {} has non-numeric {}: {}",
                self.date, field, value
            )));
        }
        Ok(())
    }
}

// ============================================================================
// ACTIVITY LOG
// ============================================================================

pub struct ActivityLog {
    conn: Connection,
}

impl ActivityLog {
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        setup_activity_table(&conn)?;
        Ok(ActivityLog { conn })
    }

    /// Log filled with `count` random records dated within the year before `today`.
    pub fn seeded<R: Rng>(
        count: usize,
        rng: &mut R,
        today: NaiveDate,
    ) -> Result<Self, StoreError> {
        let log = Self::open_in_memory()?;
        let records = generate_records(count, rng, today);
        log.insert_records(&records)?;
        info!(count = records.len(), "Seeded activity log");
        Ok(log)
    }

    /// Log loaded from a CSV file with one column per record field.
    pub fn from_csv(csv_path: &Path) -> Result<Self, StoreError> {
        let records = load_csv(csv_path)?;
        let log = Self::open_in_memory()?;
        log.insert_records(&records)?;
        info!(path = %csv_path.display(), count = records.len(), "Loaded activity log");
        Ok(log)
    }

    pub fn insert_records(&self, records: &[ActivityRecord]) -> Result<usize, StoreError> {
        for record in records {
            record.validate()?;
        }

        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO activity_log (
                    date, product, total_cost, fixed_expense, variable_expense,
                    average_part_cost, average_part_lifespan
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for record in records {
                stmt.execute(params![
                    record.date.format(DATE_FORMAT).to_string(),
                    record.product,
                    record.total_cost,
                    record.fixed_expense,
                    record.variable_expense,
                    record.average_part_cost,
                    record.average_part_lifespan,
                ])?;
            }
        }
        tx.commit()?;

        Ok(records.len())
    }

    /// All records in insertion order.
    pub fn all_records(&self) -> Result<Vec<ActivityRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT date, product, total_cost, fixed_expense, variable_expense,
                    average_part_cost, average_part_lifespan
             FROM activity_log
             ORDER BY id",
        )?;

        let records = stmt
            .query_map([], |row| {
                let date_str: String = row.get(0)?;
                let date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        0,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;

                Ok(ActivityRecord {
                    date,
                    product: row.get(1)?,
                    total_cost: row.get(2)?,
                    fixed_expense: row.get(3)?,
                    variable_expense: row.get(4)?,
                    average_part_cost: row.get(5)?,
                    average_part_lifespan: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    pub fn count(&self) -> Result<i64, StoreError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM activity_log", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn setup_activity_table(conn: &Connection) -> Result<(), StoreError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS activity_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            product TEXT NOT NULL,
            total_cost REAL NOT NULL,
            fixed_expense REAL NOT NULL,
            variable_expense REAL NOT NULL,
            average_part_cost REAL NOT NULL,
            average_part_lifespan REAL NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_activity_date ON activity_log(date)",
        [],
    )?;

    Ok(())
}

pub fn load_csv(csv_path: &Path) -> Result<Vec<ActivityRecord>, StoreError> {
    let mut rdr = csv::Reader::from_path(csv_path)?;

    let mut records = Vec::new();
    for result in rdr.deserialize() {
        let record: ActivityRecord = result?;
        record.validate()?;
        records.push(record);
    }

    Ok(records)
}

/// Random records over the 365 days before `today`.
pub fn generate_records<R: Rng>(
    count: usize,
    rng: &mut R,
    today: NaiveDate,
) -> Vec<ActivityRecord> {
    let start = today - Duration::days(365);

    (0..count)
        .map(|_| {
            let product = SEED_PRODUCTS.choose(rng).copied().unwrap_or("Mouse");
            ActivityRecord {
                date: start + Duration::days(rng.random_range(0..=365)),
                product: product.to_string(),
                total_cost: round_cents(rng.random_range(50.0..=300.0)),
                fixed_expense: round_cents(rng.random_range(10.0..=50.0)),
                variable_expense: round_cents(rng.random_range(5.0..=30.0)),
                average_part_cost: round_cents(rng.random_range(5.0..=50.0)),
                average_part_lifespan: rng.random_range(1000..=10000) as f64,
            }
        })
        .collect()
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
