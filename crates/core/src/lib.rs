//! Shared data model, error taxonomy, and configuration for the sales
//! analytics dashboard.

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod types;

pub use config::AppConfig;
pub use error::{SalesError, SalesResult};
pub use types::{
    AggregateRow, ArithmeticOverflow, DashboardVariant, Dataset, Dimension, DimensionKey, FilterCriteria,
    MarginFormula, SalesFigures, TransactionRecord,
};
