//! Upload command handler
//!
//! Admits every file, then runs the batch while a listener task prints
//! progress events as they arrive.

use crate::api::HttpUploadClient;
use crate::config::Config;
use crate::error::{Result, RagdeskError};
use crate::jobs::{format_size, JobEvent, JobRecord, JobStatus, JobTracker, UploadFile};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

/// Upload files one after another and report each outcome
///
/// # Errors
///
/// Returns error if no file was admitted or any admitted upload failed
pub async fn run_upload(config: Config, files: Vec<PathBuf>) -> Result<()> {
    let api = Arc::new(HttpUploadClient::from_config(&config.services)?);
    let tracker = JobTracker::from_config(api, &config.uploads);

    let mut admitted = 0;
    for path in &files {
        let file = match UploadFile::from_path(path) {
            Ok(file) => file,
            Err(e) => {
                eprintln!("{}", format!("Skipping {}: {:#}", path.display(), e).red());
                continue;
            }
        };
        match tracker.enqueue(file) {
            Ok(_) => admitted += 1,
            Err(e) => eprintln!("{}", format!("Rejected {}", e).red()),
        }
    }

    if admitted == 0 {
        return Err(RagdeskError::Validation("No files to upload".to_string()).into());
    }

    for record in tracker.queued() {
        println!(
            "{} {} ({})",
            "queued".dimmed(),
            record.file_name,
            format_size(record.file_size)
        );
    }

    let mut events = tracker.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(JobEvent::Updated(record)) => print_record(&record),
                Ok(JobEvent::BatchFinished(_)) | Err(RecvError::Closed) => break,
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Progress printer lagged");
                }
            }
        }
    });

    let summary = tracker.run_all().await;
    if let Err(e) = printer.await {
        tracing::warn!("Progress printer stopped: {}", e);
    }

    println!();
    println!(
        "{} completed, {} failed",
        summary.completed.to_string().green(),
        summary.failed.to_string().red()
    );

    if summary.failed > 0 {
        return Err(RagdeskError::Transport(format!(
            "{} upload(s) failed",
            summary.failed
        ))
        .into());
    }
    Ok(())
}

fn print_record(record: &JobRecord) {
    let status = match record.status {
        JobStatus::Completed => record.status.to_string().green(),
        JobStatus::Failed => record.status.to_string().red(),
        _ => record.status.to_string().yellow(),
    };
    println!(
        "{:>10} {:>3}% {} {}",
        status,
        record.progress_percent,
        record.file_name.bold(),
        record.message.dimmed()
    );
}
