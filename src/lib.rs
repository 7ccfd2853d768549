// Repair Simulator - Core Library
// Mouse assembly with sequence validation and cost tracking, plus
// per-period statistics over historical repair activity.

pub mod error;
pub mod config;
pub mod parts;          // Part catalog (SQLite, seeded or CSV)
pub mod notification;   // Observer registry for cost updates
pub mod assembly;       // Merge engine + repair session
pub mod activity;       // Activity log (SQLite, seeded or CSV)
pub mod aggregation;    // Period bucketing + per-period stats
pub mod report;

// Re-export commonly used types
pub use error::{
    Error, Result,
    AssemblyError, AggregationError, StoreError, ConfigError, ObserverError, SessionError,
};
pub use config::AppConfig;
pub use parts::{Part, PartCatalog, SortStrategy, OptimalSort, default_parts};
pub use notification::{
    NotificationBus, Observer, ObserverHandle, NotifyReport,
    CostDisplay, CostHistory, FnObserver,
};
pub use assembly::{
    AssemblyComponent, ComponentId, RepairProcess, RepairSession,
    default_required_sequence, validate_sequence,
};
pub use activity::{ActivityRecord, ActivityLog, generate_records};
pub use aggregation::{ActivityAggregator, AggregateRow, Granularity, dominant_product};
pub use report::{ReportSummary, render_table, write_csv, to_json};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
