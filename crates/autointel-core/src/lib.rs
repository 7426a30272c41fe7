pub mod error;
pub mod records;
pub mod settings;
pub mod store;
#[cfg(feature = "runtime")]
pub mod db;
pub mod loader;
pub mod quality_gate;
pub mod features;
pub mod frame;
pub mod stats;
pub mod insights;
pub mod report;
pub mod report_store;
pub mod orchestrator;

pub use error::{PersistenceError, PipelineError, SettingsError, StoreError};
pub use orchestrator::{trigger, Orchestrator, Persistence, RunControl, RunHandle, RunOutcome};
pub use records::{CleanedRecord, RawArticle, RawRecord, RawReview, RecordKind};
pub use report::{AnalysisReport, PipelineState, ReportSummary, RunRequest, RunStatus};
pub use report_store::ReportStore;
pub use settings::{AnalysisThresholds, Settings};
pub use stats::Granularity;
pub use store::RecordStore;
