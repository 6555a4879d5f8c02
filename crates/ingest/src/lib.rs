//! CSV ingestion boundary: header validation, per-row rejection, and the
//! single point where order timestamps are normalized to UTC.

pub mod loader;
pub mod parse;

pub use loader::{load_csv, load_csv_bytes, load_csv_file, LoadedDataset, RowRejection, REQUIRED_COLUMNS};
