//! Upload job lifecycle tests against a `wiremock` upload service
//!
//! Each test mounts `POST /upload` and `GET /status/{task_id}` mocks and
//! drives a real `HttpUploadClient` through the `JobTracker`.

mod common;

use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

use ragdesk::jobs::{AdmissionError, JobEvent, JobStatus, UploadFile};

use common::{sparse_file, upload_tracker};

/// Matches a multipart upload carrying the given file name
struct FileNamed(&'static str);

impl Match for FileNamed {
    fn matches(&self, request: &Request) -> bool {
        String::from_utf8_lossy(&request.body).contains(&format!("filename=\"{}\"", self.0))
    }
}

fn accepted(task_id: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "success": true,
        "task_id": task_id,
        "message": "Upload successful, processing started"
    }))
}

fn status(status: &str, message: &str, progress: Option<&str>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "status": status,
        "message": message,
        "progress": progress
    }))
}

fn pdf(name: &str) -> UploadFile {
    UploadFile::from_bytes(name, b"%PDF-1.7 test".to_vec())
}

#[tokio::test]
async fn test_job_goes_through_full_lifecycle() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(accepted("task_1"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status/task_1"))
        .respond_with(status("processing", "Extracting text", Some("37%")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status/task_1"))
        .respond_with(status("processing", "Embedding chunks", None))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status/task_1"))
        .respond_with(status("completed", "Indexed 42 chunks", None))
        .expect(1)
        .mount(&server)
        .await;

    let tracker = upload_tracker(&server.uri());
    let mut events = tracker.subscribe();
    let id = tracker.enqueue(pdf("report.pdf")).unwrap();

    assert_eq!(tracker.run_one(&id).await, Some(JobStatus::Completed));

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let JobEvent::Updated(record) = event {
            seen.push((record.status, record.progress_percent));
        }
    }
    assert_eq!(
        seen,
        vec![
            (JobStatus::Uploading, 0),
            (JobStatus::Processing, 0),
            (JobStatus::Processing, 37),
            (JobStatus::Processing, 50),
            (JobStatus::Completed, 100),
        ]
    );

    let record = tracker.job(&id).unwrap();
    assert_eq!(record.remote_task_id.as_deref(), Some("task_1"));
    assert_eq!(record.message, "Indexed 42 chunks");
}

#[tokio::test]
async fn test_uploads_run_strictly_one_after_another() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(FileNamed("a.pdf"))
        .respond_with(accepted("task_a"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(FileNamed("b.pdf"))
        .respond_with(accepted("task_b"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status/task_a"))
        .respond_with(status("processing", "Working", Some("10%")))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    for task in ["/status/task_a", "/status/task_b"] {
        Mock::given(method("GET"))
            .and(path(task))
            .respond_with(status("completed", "Done", None))
            .mount(&server)
            .await;
    }

    let tracker = upload_tracker(&server.uri());
    tracker.enqueue(pdf("a.pdf")).unwrap();
    tracker.enqueue(pdf("b.pdf")).unwrap();

    let summary = tracker.run_all().await;
    assert_eq!(summary.completed, 2);
    assert!(tracker.queued().is_empty());

    let requests = server.received_requests().await.unwrap();
    let order: Vec<String> = requests.iter().map(|r| r.url.path().to_string()).collect();
    assert_eq!(
        order,
        vec![
            "/upload",
            "/status/task_a",
            "/status/task_a",
            "/status/task_a",
            "/upload",
            "/status/task_b",
        ]
    );
}

#[tokio::test]
async fn test_rejected_upload_reports_server_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"detail": "Only PDF files are allowed"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(status("completed", "Done", None))
        .expect(0)
        .mount(&server)
        .await;

    let tracker = upload_tracker(&server.uri());
    let id = tracker.enqueue(pdf("report.pdf")).unwrap();
    assert_eq!(tracker.run_one(&id).await, Some(JobStatus::Failed));

    let record = tracker.job(&id).unwrap();
    assert_eq!(record.message, "Upload failed: Only PDF files are allowed");
    assert!(record.remote_task_id.is_none());
}

#[tokio::test]
async fn test_unsuccessful_upload_body_fails_job() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Disk full"
        })))
        .mount(&server)
        .await;

    let tracker = upload_tracker(&server.uri());
    let id = tracker.enqueue(pdf("report.pdf")).unwrap();
    tracker.run_one(&id).await;

    assert_eq!(tracker.job(&id).unwrap().message, "Upload failed: Disk full");
}

#[tokio::test]
async fn test_status_error_fails_job_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(accepted("task_1"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status/task_1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let tracker = upload_tracker(&server.uri());
    let id = tracker.enqueue(pdf("report.pdf")).unwrap();
    assert_eq!(tracker.run_one(&id).await, Some(JobStatus::Failed));
    assert_eq!(
        tracker.job(&id).unwrap().message,
        "Status check failed: HTTP error! status: 500 Internal Server Error"
    );
}

#[tokio::test]
async fn test_unknown_remote_status_is_a_parse_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(accepted("task_1"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status/task_1"))
        .respond_with(status("paused", "On hold", None))
        .expect(1)
        .mount(&server)
        .await;

    let tracker = upload_tracker(&server.uri());
    let id = tracker.enqueue(pdf("report.pdf")).unwrap();
    tracker.run_one(&id).await;

    let record = tracker.job(&id).unwrap();
    assert_eq!(record.status, JobStatus::Failed);
    assert!(record
        .message
        .starts_with("Status check failed: Failed to parse status response"));
}

#[tokio::test]
async fn test_task_id_is_percent_encoded_in_status_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(accepted("task_1_my report.pdf"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status/task_1_my%20report.pdf"))
        .respond_with(status("completed", "Done", None))
        .expect(1)
        .mount(&server)
        .await;

    let tracker = upload_tracker(&server.uri());
    let id = tracker.enqueue(pdf("my report.pdf")).unwrap();
    assert_eq!(tracker.run_one(&id).await, Some(JobStatus::Completed));
}

#[tokio::test]
async fn test_dequeue_stops_polling_in_flight_job() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(accepted("task_1"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status/task_1"))
        .respond_with(status("processing", "Still working", None))
        .mount(&server)
        .await;

    let tracker = upload_tracker(&server.uri());
    let mut events = tracker.subscribe();
    let id = tracker.enqueue(pdf("report.pdf")).unwrap();

    let runner = {
        let tracker = tracker.clone();
        let id = id.clone();
        tokio::spawn(async move { tracker.run_one(&id).await })
    };

    loop {
        if let JobEvent::Updated(record) = events.recv().await.unwrap() {
            if record.progress_percent == 50 {
                break;
            }
        }
    }

    assert!(tracker.dequeue(&id));
    assert_eq!(runner.await.unwrap(), None);
    assert!(tracker.jobs().is_empty());

    let polls = server.received_requests().await.unwrap().len();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(server.received_requests().await.unwrap().len(), polls);
}

#[tokio::test]
async fn test_admission_rules_for_files_on_disk() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start().await;
    let tracker = upload_tracker(&server.uri());

    let docx = UploadFile::from_path(sparse_file(&dir, "report.docx", 1024)).unwrap();
    assert!(matches!(
        tracker.enqueue(docx),
        Err(AdmissionError::UnsupportedType { .. })
    ));

    let big = UploadFile::from_path(sparse_file(&dir, "big.pdf", 51 * 1024 * 1024)).unwrap();
    assert!(matches!(
        tracker.enqueue(big),
        Err(AdmissionError::TooLarge { .. })
    ));

    let report = UploadFile::from_path(sparse_file(&dir, "report.pdf", 10 * 1024 * 1024)).unwrap();
    assert!(tracker.enqueue(report).is_ok());

    assert_eq!(tracker.queued().len(), 1);
    assert!(server.received_requests().await.unwrap().is_empty());
}
