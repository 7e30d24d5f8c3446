//! Filter-and-aggregate core for the student cohort dashboard.
//!
//! A [`RecordTable`] is loaded once, narrowed by a cascading [`Selection`]
//! and summarised into [`Metrics`] and per-column [`Distribution`]s. None of
//! these steps mutate the source table or fail on missing columns.

pub mod distribution;
pub mod error;
pub mod export;
pub mod filter;
pub mod ingest;
pub mod metrics;
pub mod models;
pub mod report;

pub use distribution::{ChartSeries, Distribution, Orientation};
pub use error::IngestError;
pub use filter::{CascadeOptions, Choice, Dimension, Selection};
pub use metrics::Metrics;
pub use models::{RecordTable, Value};
