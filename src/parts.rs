// 🖱️ Part Catalog - Purchasable mouse parts
// In-memory SQLite store seeded with the default catalog, optionally loaded from CSV.
//
// Category lookups are prefix matches on the part name, so "Body Premium"
// shows up under "Body".

use crate::error::StoreError;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;
use tracing::info;

// ============================================================================
// PART
// ============================================================================

/// A purchasable part. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub id: i64,
    pub name: String,
    /// Expected service life in hours
    pub lifespan: i64,
    pub price: f64,
    /// Opaque reference to the part's picture
    pub image_path: String,
}

impl Part {
    pub fn new(id: i64, name: &str, lifespan: i64, price: f64, image_path: &str) -> Self {
        Part {
            id,
            name: name.to_string(),
            lifespan,
            price,
            image_path: image_path.to_string(),
        }
    }

    /// True when the part belongs to `category` (prefix match on the name).
    pub fn matches_category(&self, category: &str) -> bool {
        self.name.starts_with(category)
    }

    fn validate(&self) -> Result<(), StoreError> {
        if self.lifespan <= 0 {
            return Err(StoreError::InvalidPart {
                id: self.id,
                reason: format!("lifespan must be positive, got {}", self.lifespan),
            });
        }
        if self.price.is_nan() || self.price < 0.0 {
            return Err(StoreError::InvalidPart {
                id: self.id,
                reason: format!("price must be non-negative, got {}", self.price),
            });
        }
        Ok(())
    }
}

/// The default catalog: one part per base category plus two premium variants.
pub fn default_parts() -> Vec<Part> {
    vec![
        Part::new(1, "Body", 5000, 20.0, "body.png"),
        Part::new(2, "Sensor", 3000, 15.0, "sensor.png"),
        Part::new(3, "Circuit Board", 4000, 25.0, "circuit.png"),
        Part::new(4, "Right Button", 7000, 5.0, "right_button.png"),
        Part::new(5, "Left Button", 7000, 5.0, "left_button.png"),
        Part::new(6, "Scroll", 4000, 7.0, "scroll.png"),
        Part::new(7, "Body Premium", 8000, 35.0, "body_premium.png"),
        Part::new(8, "Sensor Pro", 5000, 30.0, "sensor_pro.png"),
    ]
}

// ============================================================================
// SORT STRATEGY
// ============================================================================

/// Orders the parts offered for a category.
pub trait SortStrategy {
    fn sort(&self, parts: &mut [Part]);
}

/// Longest-lived parts first, cheaper first among equal lifespans.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptimalSort;

impl SortStrategy for OptimalSort {
    fn sort(&self, parts: &mut [Part]) {
        parts.sort_by(|a, b| {
            b.lifespan
                .cmp(&a.lifespan)
                .then_with(|| a.price.partial_cmp(&b.price).unwrap_or(Ordering::Equal))
        });
    }
}

// ============================================================================
// CATALOG
// ============================================================================

pub struct PartCatalog {
    conn: Connection,
}

impl PartCatalog {
    /// Create an empty in-memory catalog
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        setup_parts_table(&conn)?;
        Ok(PartCatalog { conn })
    }

    /// Catalog pre-loaded with `default_parts()`
    pub fn with_defaults() -> Result<Self, StoreError> {
        let catalog = Self::open_in_memory()?;
        catalog.insert_parts(&default_parts())?;
        Ok(catalog)
    }

    /// Catalog loaded from a CSV file with `id,name,lifespan,price,image_path` columns
    pub fn from_csv(csv_path: &Path) -> Result<Self, StoreError> {
        let parts = load_parts_csv(csv_path)?;
        let catalog = Self::open_in_memory()?;
        catalog.insert_parts(&parts)?;
        info!(path = %csv_path.display(), count = parts.len(), "Loaded part catalog");
        Ok(catalog)
    }

    /// Insert parts; a duplicate id is rejected by the primary key.
    pub fn insert_parts(&self, parts: &[Part]) -> Result<usize, StoreError> {
        for part in parts {
            part.validate()?;
        }

        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO parts (id, name, lifespan, price, image_path)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for part in parts {
                stmt.execute(params![
                    part.id,
                    part.name,
                    part.lifespan,
                    part.price,
                    part.image_path,
                ])?;
            }
        }
        tx.commit()?;

        Ok(parts.len())
    }

    pub fn all_parts(&self) -> Result<Vec<Part>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, lifespan, price, image_path FROM parts ORDER BY id")?;

        let parts = stmt
            .query_map([], row_to_part)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(parts)
    }

    pub fn find(&self, id: i64) -> Result<Option<Part>, StoreError> {
        let part = self
            .conn
            .query_row(
                "SELECT id, name, lifespan, price, image_path FROM parts WHERE id = ?1",
                params![id],
                row_to_part,
            )
            .optional()?;
        Ok(part)
    }

    /// Parts whose name starts with `category`, ordered by `strategy`.
    ///
    /// Filtering happens in Rust: SQLite's `LIKE` is case-insensitive and
    /// would widen the match.
    pub fn parts_in_category(
        &self,
        category: &str,
        strategy: &dyn SortStrategy,
    ) -> Result<Vec<Part>, StoreError> {
        let mut parts: Vec<Part> = self
            .all_parts()?
            .into_iter()
            .filter(|p| p.matches_category(category))
            .collect();
        strategy.sort(&mut parts);
        Ok(parts)
    }

    pub fn count(&self) -> Result<i64, StoreError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM parts", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn setup_parts_table(conn: &Connection) -> Result<(), StoreError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS parts (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            lifespan INTEGER NOT NULL,
            price REAL NOT NULL,
            image_path TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

fn row_to_part(row: &rusqlite::Row<'_>) -> rusqlite::Result<Part> {
    Ok(Part {
        id: row.get(0)?,
        name: row.get(1)?,
        lifespan: row.get(2)?,
        price: row.get(3)?,
        image_path: row.get(4)?,
    })
}

pub fn load_parts_csv(csv_path: &Path) -> Result<Vec<Part>, StoreError> {
    let mut rdr = csv::Reader::from_path(csv_path)?;

    let mut parts = Vec::new();
    for result in rdr.deserialize() {
        let part: Part = result?;
        part.validate()?;
        parts.push(part);
    }

    Ok(parts)
}
