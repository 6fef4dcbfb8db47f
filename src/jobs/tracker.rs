//! Upload queue and job lifecycle driver
//!
//! [`JobTracker`] admits files into a queue, uploads them strictly one after
//! another and polls the remote processing status of each accepted upload
//! until it reaches a terminal state. Polling runs as a loop that selects on
//! a per-job [`CancellationToken`], so dropping a job from tracking stops its
//! poll chain.

use super::admission::{AdmissionError, AdmissionRules};
use super::progress::progress_from_status;
use super::types::{format_size, InvalidTransition, JobId, JobRecord, JobStatus, UploadFile, UploadJob};
use crate::api::{RemoteStatus, UploadApi};
use crate::config::UploadsConfig;
use crate::error::RagdeskError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

const EVENT_CAPACITY: usize = 256;

/// Change notification emitted by the tracker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    /// A file was admitted into the queue
    Queued(JobRecord),
    /// A job was dropped from the queue or from tracking
    Removed(JobId),
    /// A dispatched job changed state, progress or message
    Updated(JobRecord),
    /// `run_all` finished its batch
    BatchFinished(BatchSummary),
}

/// Outcome counts of one `run_all` batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub completed: usize,
    pub failed: usize,
}

#[derive(Default)]
struct TrackerState {
    queue: Vec<UploadJob>,
    jobs: Vec<UploadJob>,
    polls: HashMap<JobId, CancellationToken>,
}

/// Upload queue, dispatcher and status poller
///
/// All methods take `&self`; share the tracker behind an [`Arc`] to dequeue
/// jobs while a batch is running.
pub struct JobTracker {
    api: Arc<dyn UploadApi>,
    rules: AdmissionRules,
    poll_interval: Duration,
    state: Mutex<TrackerState>,
    events: broadcast::Sender<JobEvent>,
}

impl JobTracker {
    /// Create a tracker
    ///
    /// # Arguments
    ///
    /// * `api` - Upload service transport
    /// * `rules` - Admission rules applied by [`JobTracker::enqueue`]
    /// * `poll_interval` - Delay between two status polls of one job
    pub fn new(api: Arc<dyn UploadApi>, rules: AdmissionRules, poll_interval: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            api,
            rules,
            poll_interval,
            state: Mutex::new(TrackerState::default()),
            events,
        }
    }

    /// Create a tracker from the uploads section of the configuration
    pub fn from_config(api: Arc<dyn UploadApi>, config: &UploadsConfig) -> Self {
        Self::new(api, AdmissionRules::from_config(config), config.poll_interval())
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.events.subscribe()
    }

    /// Admit a file into the queue
    ///
    /// # Errors
    ///
    /// Returns the [`AdmissionError`] naming the rule the file broke
    pub fn enqueue(&self, file: UploadFile) -> Result<JobId, AdmissionError> {
        if let Err(e) = self.rules.check(&file.name, file.size) {
            tracing::warn!("Rejected {}", e);
            return Err(e);
        }

        let job = UploadJob::new(file);
        let id = job.id.clone();
        let record = job.record();
        self.lock().queue.push(job);

        tracing::info!(job_id = %id, "Queued {} ({})", record.file_name, format_size(record.file_size));
        self.emit(JobEvent::Queued(record));
        Ok(id)
    }

    /// Admit several files, reporting the outcome of each in input order
    pub fn enqueue_all(
        &self,
        files: impl IntoIterator<Item = UploadFile>,
    ) -> Vec<Result<JobId, AdmissionError>> {
        files.into_iter().map(|file| self.enqueue(file)).collect()
    }

    /// Drop a job
    ///
    /// A queued job is removed from the queue. A dispatched job is removed
    /// from tracking and its polling is cancelled; an upload request already
    /// on the wire is left to finish. Returns `false` for unknown ids.
    pub fn dequeue(&self, id: &JobId) -> bool {
        let removed = {
            let mut state = self.lock();
            if let Some(pos) = state.queue.iter().position(|job| &job.id == id) {
                state.queue.remove(pos);
                true
            } else if let Some(pos) = state.jobs.iter().position(|job| &job.id == id) {
                state.jobs.remove(pos);
                if let Some(token) = state.polls.remove(id) {
                    token.cancel();
                }
                true
            } else {
                false
            }
        };

        if removed {
            tracing::debug!(job_id = %id, "Removed job");
            self.emit(JobEvent::Removed(id.clone()));
        }
        removed
    }

    /// Empty the queue, returning how many jobs were dropped
    pub fn clear_queue(&self) -> usize {
        let dropped: Vec<JobId> = self.lock().queue.drain(..).map(|job| job.id).collect();
        for id in &dropped {
            self.emit(JobEvent::Removed(id.clone()));
        }
        dropped.len()
    }

    /// Jobs waiting for dispatch, in queue order
    pub fn queued(&self) -> Vec<JobRecord> {
        self.lock().queue.iter().map(UploadJob::record).collect()
    }

    /// Dispatched jobs, in dispatch order
    pub fn jobs(&self) -> Vec<JobRecord> {
        self.lock().jobs.iter().map(UploadJob::record).collect()
    }

    /// Look up a queued or dispatched job
    pub fn job(&self, id: &JobId) -> Option<JobRecord> {
        let state = self.lock();
        state
            .queue
            .iter()
            .chain(state.jobs.iter())
            .find(|job| &job.id == id)
            .map(UploadJob::record)
    }

    /// Run every job queued at call time, one after another
    ///
    /// Each job's whole lifecycle (upload and every status poll) finishes
    /// before the next upload starts. Files enqueued while the batch runs
    /// stay queued for the next call.
    pub async fn run_all(&self) -> BatchSummary {
        let batch: Vec<JobId> = self.lock().queue.iter().map(|job| job.id.clone()).collect();
        tracing::info!("Starting upload batch of {} file(s)", batch.len());

        let mut summary = BatchSummary::default();
        for id in &batch {
            match self.run_one(id).await {
                Some(JobStatus::Completed) => summary.completed += 1,
                Some(JobStatus::Failed) => summary.failed += 1,
                _ => {}
            }
        }

        tracing::info!(
            completed = summary.completed,
            failed = summary.failed,
            "Upload batch finished"
        );
        self.emit(JobEvent::BatchFinished(summary));
        summary
    }

    /// Upload one queued job and drive it to a terminal state
    ///
    /// Returns the final status, or `None` when the job is not queued or was
    /// removed from tracking before it finished.
    pub async fn run_one(&self, id: &JobId) -> Option<JobStatus> {
        let (file, token, record) = {
            let mut state = self.lock();
            let pos = state.queue.iter().position(|job| &job.id == id)?;
            let mut job = state.queue.remove(pos);
            if let Err(e) = job.begin_upload() {
                tracing::warn!(job_id = %id, "{}", e);
                return None;
            }
            let token = CancellationToken::new();
            state.polls.insert(id.clone(), token.clone());
            let dispatched = (job.file.clone(), token, job.record());
            state.jobs.push(job);
            dispatched
        };
        self.emit(JobEvent::Updated(record));

        tracing::info!(job_id = %id, "Uploading {}", file.name);
        match self.api.upload(&file).await {
            Err(e) => {
                let message = format!("Upload failed: {}", error_text(&e));
                self.update(id, |job| job.fail(message));
            }
            Ok(response) => match (response.success, response.task_id) {
                (true, Some(task_id)) => {
                    let message = response
                        .message
                        .unwrap_or_else(|| "Processing started".to_string());
                    if self
                        .update(id, |job| job.accept(task_id.clone(), message))
                        .is_some()
                    {
                        self.poll(id, &task_id, &token).await;
                    }
                }
                (_, _) => {
                    let reason = response
                        .message
                        .unwrap_or_else(|| "Unknown error".to_string());
                    let message = format!("Upload failed: {}", reason);
                    self.update(id, |job| job.fail(message));
                }
            },
        }

        self.lock().polls.remove(id);
        self.job(id).map(|record| record.status)
    }

    async fn poll(&self, id: &JobId, task_id: &str, token: &CancellationToken) {
        loop {
            let response = tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!(job_id = %id, "Polling cancelled");
                    return;
                }
                response = self.api.status(task_id) => response,
            };

            match response {
                Ok(status) => {
                    let message = status.message;
                    match status.status {
                        RemoteStatus::Processing => {
                            let percent =
                                progress_from_status(status.progress.as_deref(), &message);
                            if self
                                .update(id, |job| job.report_progress(percent, message))
                                .is_none()
                            {
                                return;
                            }
                        }
                        RemoteStatus::Completed => {
                            self.update(id, |job| job.complete(message));
                            return;
                        }
                        RemoteStatus::Failed => {
                            self.update(id, |job| job.fail(message));
                            return;
                        }
                    }
                }
                Err(e) => {
                    let message = format!("Status check failed: {}", error_text(&e));
                    self.update(id, |job| job.fail(message));
                    return;
                }
            }

            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!(job_id = %id, "Polling cancelled");
                    return;
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }

    /// Apply a transition to a dispatched job and broadcast the result
    ///
    /// Returns `None` when the job is no longer tracked or the transition
    /// is refused.
    fn update(
        &self,
        id: &JobId,
        apply: impl FnOnce(&mut UploadJob) -> Result<(), InvalidTransition>,
    ) -> Option<JobStatus> {
        let record = {
            let mut state = self.lock();
            let job = state.jobs.iter_mut().find(|job| &job.id == id)?;
            if let Err(e) = apply(job) {
                tracing::warn!(job_id = %id, "{}", e);
                return None;
            }
            job.record()
        };

        match record.status {
            JobStatus::Failed => {
                tracing::error!(job_id = %id, "{} failed: {}", record.file_name, record.message)
            }
            JobStatus::Completed => tracing::info!(job_id = %id, "{} processed", record.file_name),
            _ => tracing::debug!(
                job_id = %id,
                progress = record.progress_percent,
                "{}",
                record.message
            ),
        }

        let status = record.status;
        self.emit(JobEvent::Updated(record));
        Some(status)
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn emit(&self, event: JobEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

/// Message of a transport or parse error without the category prefix
fn error_text(err: &anyhow::Error) -> String {
    match err.downcast_ref::<RagdeskError>() {
        Some(RagdeskError::Transport(message)) | Some(RagdeskError::Parse(message)) => {
            message.clone()
        }
        Some(other) => other.to_string(),
        None => format!("{:#}", err),
    }
}
