//! Dashboard session: one uploaded dataset, its cached reports, and the
//! outermost error boundary for analysis.

use chrono::{DateTime, Utc};
use sales_cache::{CacheKey, ReportCache};
use sales_core::config::AppConfig;
use sales_core::fingerprint::sha256_hex;
use sales_core::types::{DashboardVariant, Dataset, MarginFormula};
use sales_core::{SalesError, SalesResult};
use sales_ingest::{load_csv_bytes, LoadedDataset, RowRejection};
use sales_reporting::{build_report, DashboardReport, DashboardRequest, ReportOutcome, SelectionDefaults};
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct UploadSummary {
    pub dataset_id: Uuid,
    pub name: String,
    pub fingerprint: String,
    pub rows: usize,
    pub rejected_count: usize,
    pub rejections: Vec<RowRejection>,
    pub date_bounds: Option<(DateTime<Utc>, DateTime<Utc>)>,
    /// The upload had the same content as the dataset already loaded.
    pub reused: bool,
}

impl UploadSummary {
    fn from_loaded(loaded: &LoadedDataset, reused: bool) -> Self {
        Self {
            dataset_id: loaded.id,
            name: loaded.name.clone(),
            fingerprint: loaded.fingerprint.clone(),
            rows: loaded.dataset.len(),
            rejected_count: loaded.rejected_count,
            rejections: loaded.rejections.clone(),
            date_bounds: loaded.dataset.date_bounds(),
            reused,
        }
    }
}

/// What the shell should display after an analysis request.
#[derive(Debug, Clone)]
pub enum AnalysisOutcome {
    /// No dataset has been uploaded yet.
    AwaitingUpload,
    /// Warning: the date range is missing a bound or inverted.
    InvalidRange { message: String },
    /// Informational: nothing matched; aggregation was skipped.
    NoMatches { message: String },
    Ready(Arc<DashboardReport>),
    /// Generic failure with diagnostic detail.
    Failed { message: String, detail: String },
}

/// Everything besides the dataset that determines a report.
#[derive(Serialize)]
struct ReportScope<'a> {
    request: &'a DashboardRequest,
    variant: DashboardVariant,
    margin_formula: MarginFormula,
    default_top_n: usize,
    top_products: usize,
}

pub struct DashboardSession {
    config: AppConfig,
    loaded: Option<LoadedDataset>,
    cache: ReportCache<Arc<DashboardReport>>,
}

impl DashboardSession {
    pub fn new(config: AppConfig) -> Self {
        let cache = ReportCache::new(config.cache.max_entries);
        Self {
            config,
            loaded: None,
            cache,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.loaded.as_ref().map(|l| &l.dataset)
    }

    pub fn cached_reports(&self) -> usize {
        self.cache.len()
    }

    /// Load a new upload. Identical content keeps the current dataset and its
    /// cached reports; new content replaces both. On failure the session
    /// returns to the pre-upload state.
    pub fn upload(&mut self, name: &str, bytes: &[u8]) -> SalesResult<UploadSummary> {
        if let Some(current) = &self.loaded {
            if current.fingerprint == sha256_hex(bytes) {
                info!(file = %name, dataset_id = %current.id, "Upload unchanged, keeping loaded dataset");
                return Ok(UploadSummary {
                    name: name.to_string(),
                    ..UploadSummary::from_loaded(current, true)
                });
            }
        }

        match load_csv_bytes(name, bytes, &self.config.ingest) {
            Ok(loaded) => {
                if let Some(previous) = self.loaded.take() {
                    self.cache.invalidate_dataset(&previous.fingerprint);
                }
                let summary = UploadSummary::from_loaded(&loaded, false);
                self.loaded = Some(loaded);
                Ok(summary)
            }
            Err(e) => {
                error!(file = %name, error = %e, "Upload failed");
                self.reset();
                Err(e)
            }
        }
    }

    /// Drop the dataset and every cached report.
    pub fn reset(&mut self) {
        self.loaded = None;
        self.cache.clear();
    }

    pub fn date_bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.dataset().and_then(Dataset::date_bounds)
    }

    /// Option lists for the selection widgets. `top_n` falls back to the
    /// configured default.
    pub fn selection_defaults(&self, top_n: Option<usize>) -> Option<SelectionDefaults> {
        let top_n = top_n.unwrap_or(self.config.dashboard.default_top_n).max(1);
        self.dataset()
            .map(|dataset| SelectionDefaults::from_dataset(dataset, top_n))
    }

    /// Run the full pipeline for `request`. Never panics and never returns an error.
    pub fn analyze(&self, request: &DashboardRequest) -> AnalysisOutcome {
        let Some(loaded) = &self.loaded else {
            return AnalysisOutcome::AwaitingUpload;
        };

        match panic::catch_unwind(AssertUnwindSafe(|| self.run(loaded, request))) {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(SalesError::InvalidRange(message))) => {
                warn!(reason = %message, "Rejected analysis request");
                AnalysisOutcome::InvalidRange { message }
            }
            Ok(Err(e)) => {
                error!(dataset_id = %loaded.id, error = %e, "Analysis failed");
                AnalysisOutcome::Failed {
                    message: format!("An error occurred during analysis: {e}"),
                    detail: format!("{e:?}"),
                }
            }
            Err(payload) => {
                let detail = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(dataset_id = %loaded.id, detail = %detail, "Analysis panicked");
                AnalysisOutcome::Failed {
                    message: "An error occurred during analysis".to_string(),
                    detail,
                }
            }
        }
    }

    fn run(&self, loaded: &LoadedDataset, request: &DashboardRequest) -> SalesResult<AnalysisOutcome> {
        let dashboard = &self.config.dashboard;
        let key = if self.config.cache.enabled {
            let scope = ReportScope {
                request,
                variant: dashboard.variant,
                margin_formula: dashboard.margin_formula,
                default_top_n: dashboard.default_top_n,
                top_products: dashboard.top_products,
            };
            Some(CacheKey::new(&loaded.fingerprint, &scope)?)
        } else {
            None
        };

        if let Some(report) = key.as_ref().and_then(|k| self.cache.get(k)) {
            return Ok(AnalysisOutcome::Ready(report));
        }

        match build_report(&loaded.dataset, request, dashboard)? {
            ReportOutcome::Empty { date_filtered_rows } => Ok(AnalysisOutcome::NoMatches {
                message: format!(
                    "No data found for the selected criteria ({date_filtered_rows} rows in the date range)"
                ),
            }),
            ReportOutcome::Report(report) => {
                let report: Arc<DashboardReport> = Arc::from(report);
                if let Some(key) = key {
                    self.cache.put(key, Arc::clone(&report));
                }
                Ok(AnalysisOutcome::Ready(report))
            }
        }
    }
}
