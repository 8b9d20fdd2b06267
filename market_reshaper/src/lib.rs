pub mod cache;
pub mod config;
pub mod data_loader;
pub mod distribution;
pub mod error;
pub mod models;
pub mod reshape;
pub mod schema;

pub use cache::CachedLoader;
pub use config::{DashboardConfig, SourceConfig};
pub use data_loader::DataLoader;
pub use distribution::{price_distribution, DistributionSummary};
pub use error::{ReshapeError, Result};
pub use models::{AggregationMode, FilterSpec, LongRecord, RankedEntry, RawRecord, Table, ValueRange};
pub use schema::{ColumnSpec, Direction, MeasureKind, Product, SchemaMapping};
