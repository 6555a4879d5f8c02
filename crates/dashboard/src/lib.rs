//! Sales dashboard session: the boundary the interactive UI shell calls
//! into. Holds the uploaded dataset and the report cache, and turns every
//! failure into a displayable outcome.

pub mod session;
pub mod telemetry;

pub use session::{AnalysisOutcome, DashboardSession, UploadSummary};
pub use telemetry::init_tracing;
