//! Sales reporting — the Filter Engine, the Aggregation Engine, selection
//! defaults, and dashboard report assembly.

pub mod aggregate;
pub mod dashboard;
pub mod export;
pub mod filter;
pub mod selection;

#[cfg(test)]
mod testing;

pub use aggregate::{aggregate, order_by_key, rank, summarize, top_n_by_frequency, RankBy};
pub use dashboard::{build_report, DashboardReport, DashboardRequest, ReportOutcome};
pub use export::{report_to_json, rows_to_csv};
pub use filter::{filter, filter_by_date};
pub use selection::{resolve, ActiveSelection, SelectionDefaults, UserSelection};
