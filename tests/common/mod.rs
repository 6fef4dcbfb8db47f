use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use ragdesk::api::HttpUploadClient;
use ragdesk::jobs::{AdmissionRules, JobTracker};
use ragdesk::storage::SqliteStore;

#[allow(dead_code)]
pub fn create_temp_store() -> (SqliteStore, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let db_path = tmp.path().join("ragdesk.db");
    let store = SqliteStore::new_with_path(db_path).expect("failed to create sqlite store");
    (store, tmp)
}

/// Tracker talking to `base_url` with a short poll interval
#[allow(dead_code)]
pub fn upload_tracker(base_url: &str) -> Arc<JobTracker> {
    let api = HttpUploadClient::new(base_url, Duration::from_secs(5))
        .expect("failed to create upload client");
    Arc::new(JobTracker::new(
        Arc::new(api),
        AdmissionRules::default(),
        Duration::from_millis(10),
    ))
}

/// Sparse file of `size` bytes; only metadata is touched until upload
#[allow(dead_code)]
pub fn sparse_file(dir: &TempDir, name: &str, size: u64) -> PathBuf {
    let path = dir.path().join(name);
    let file = std::fs::File::create(&path).expect("failed to create file");
    file.set_len(size).expect("failed to size file");
    path
}
