//! Upload job types and lifecycle
//!
//! An [`UploadJob`] moves through `queued -> uploading -> processing ->
//! completed | failed`; `uploading` may also fail directly. The transition
//! methods on the job refuse any other move, so terminal states are final.

use crate::error::{Result, RagdeskError};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use ulid::Ulid;

/// Local identifier of an upload job
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Generate a new, unique job id
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }

    /// The id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Lifecycle state of an upload job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Uploading,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Whether the job has reached an end state
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Whether moving from `self` to `next` is a legal transition
    ///
    /// `processing -> processing` is legal and carries progress updates.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Queued, Uploading)
                | (Uploading, Processing)
                | (Uploading, Failed)
                | (Processing, Processing)
                | (Processing, Completed)
                | (Processing, Failed)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            JobStatus::Queued => "queued",
            JobStatus::Uploading => "uploading",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Rejected lifecycle transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid job transition from {from} to {to}")]
pub struct InvalidTransition {
    pub from: JobStatus,
    pub to: JobStatus,
}

/// Where the bytes of an upload come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContents {
    /// Read lazily from disk when the upload starts
    Path(PathBuf),
    /// Already in memory
    Memory(Bytes),
}

/// File descriptor for an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// File name sent to the service
    pub name: String,
    /// Size in bytes, used for admission
    pub size: u64,
    /// Declared MIME type
    pub content_type: String,
    pub contents: FileContents,
}

impl UploadFile {
    /// Describe an in-memory file
    pub fn from_bytes(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let name = name.into();
        let data = data.into();
        Self {
            content_type: content_type_for(&name).to_string(),
            size: data.len() as u64,
            name,
            contents: FileContents::Memory(data),
        }
    }

    /// Describe a file on disk without reading it
    ///
    /// # Errors
    ///
    /// Returns error if the path has no file name or its metadata cannot be read
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                RagdeskError::Validation(format!("{} is not a file", path.display()))
            })?;

        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(RagdeskError::Validation(format!("{} is not a file", path.display())).into());
        }

        Ok(Self {
            content_type: content_type_for(&name).to_string(),
            size: metadata.len(),
            name,
            contents: FileContents::Path(path.to_path_buf()),
        })
    }

    /// Load the file bytes
    pub async fn read_contents(&self) -> Result<Bytes> {
        match &self.contents {
            FileContents::Memory(data) => Ok(data.clone()),
            FileContents::Path(path) => Ok(Bytes::from(tokio::fs::read(path).await?)),
        }
    }
}

fn content_type_for(name: &str) -> &'static str {
    let is_pdf = Path::new(name)
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    if is_pdf {
        "application/pdf"
    } else {
        "application/octet-stream"
    }
}

/// One file moving through upload and remote processing
#[derive(Debug, Clone)]
pub struct UploadJob {
    pub id: JobId,
    pub file: UploadFile,
    status: JobStatus,
    remote_task_id: Option<String>,
    progress_percent: u8,
    message: String,
}

impl UploadJob {
    /// Create a queued job for `file`
    pub fn new(file: UploadFile) -> Self {
        Self {
            id: JobId::generate(),
            file,
            status: JobStatus::Queued,
            remote_task_id: None,
            progress_percent: 0,
            message: "Queued".to_string(),
        }
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Remote task handle, set once the upload is accepted
    pub fn remote_task_id(&self) -> Option<&str> {
        self.remote_task_id.as_deref()
    }

    pub fn progress_percent(&self) -> u8 {
        self.progress_percent
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// `queued -> uploading`
    pub fn begin_upload(&mut self) -> std::result::Result<(), InvalidTransition> {
        self.transition(JobStatus::Uploading)?;
        self.message = "Uploading...".to_string();
        Ok(())
    }

    /// `uploading -> processing` once the service returned a task id
    pub fn accept(
        &mut self,
        task_id: impl Into<String>,
        message: impl Into<String>,
    ) -> std::result::Result<(), InvalidTransition> {
        self.transition(JobStatus::Processing)?;
        self.remote_task_id = Some(task_id.into());
        self.message = message.into();
        Ok(())
    }

    /// `processing -> processing` with a fresh percentage
    pub fn report_progress(
        &mut self,
        percent: u8,
        message: impl Into<String>,
    ) -> std::result::Result<(), InvalidTransition> {
        self.transition(JobStatus::Processing)?;
        self.progress_percent = percent.min(100);
        self.message = message.into();
        Ok(())
    }

    /// `processing -> completed`
    pub fn complete(
        &mut self,
        message: impl Into<String>,
    ) -> std::result::Result<(), InvalidTransition> {
        self.transition(JobStatus::Completed)?;
        self.progress_percent = 100;
        self.message = message.into();
        Ok(())
    }

    /// `uploading | processing -> failed`; progress is left as it was
    pub fn fail(&mut self, message: impl Into<String>) -> std::result::Result<(), InvalidTransition> {
        self.transition(JobStatus::Failed)?;
        self.message = message.into();
        Ok(())
    }

    /// Snapshot for display and change notifications
    pub fn record(&self) -> JobRecord {
        JobRecord {
            id: self.id.clone(),
            file_name: self.file.name.clone(),
            file_size: self.file.size,
            status: self.status,
            message: self.message.clone(),
            progress_percent: self.progress_percent,
            remote_task_id: self.remote_task_id.clone(),
        }
    }

    fn transition(&mut self, next: JobStatus) -> std::result::Result<(), InvalidTransition> {
        if !self.status.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        tracing::debug!(job_id = %self.id, from = %self.status, to = %next, "Job transition");
        self.status = next;
        Ok(())
    }
}

/// Read-only view of a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRecord {
    pub id: JobId,
    pub file_name: String,
    pub file_size: u64,
    pub status: JobStatus,
    pub message: String,
    pub progress_percent: u8,
    pub remote_task_id: Option<String>,
}

/// Human-readable byte count (`"1.5 MB"`)
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let formatted = format!("{:.2}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}
