//! Document upload jobs
//!
//! - `types`: [`UploadJob`] and its lifecycle
//! - `admission`: extension and size rules checked at enqueue time
//! - `progress`: percentage extraction from status text
//! - `tracker`: the sequential upload queue and status poller

pub mod admission;
pub mod progress;
pub mod tracker;
pub mod types;

pub use admission::{AdmissionError, AdmissionRules, DEFAULT_MAX_FILE_SIZE_BYTES};
pub use progress::{parse_percent, progress_from_status, DEFAULT_PROGRESS_PERCENT};
pub use tracker::{BatchSummary, JobEvent, JobTracker};
pub use types::{
    format_size, FileContents, InvalidTransition, JobId, JobRecord, JobStatus, UploadFile,
    UploadJob,
};
