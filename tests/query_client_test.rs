//! Query service client tests against a `wiremock` server

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ragdesk::api::{HttpQueryClient, QueryApi};
use ragdesk::chat::{ChatClient, APOLOGY_MESSAGE};
use ragdesk::session::{Role, SessionStore};
use ragdesk::storage::MemoryStore;
use ragdesk::RagdeskError;

fn client(server: &MockServer) -> HttpQueryClient {
    HttpQueryClient::new(&server.uri(), Duration::from_secs(5)).expect("valid client")
}

#[tokio::test]
async fn test_query_sends_question_and_chunk_count() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .and(body_json(json!({"question": "What is RAG?", "num_chunks": 10})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "question": "What is RAG?",
            "answer": "Retrieval-augmented generation.",
            "sources": [3, 7, "glossary.pdf"],
            "chunks_used": 3,
            "runtime_ms": 812,
            "low_confidence": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server).query("What is RAG?", 10).await.unwrap();
    assert_eq!(response.answer, "Retrieval-augmented generation.");
    assert_eq!(response.sources, vec!["3", "7", "glossary.pdf"]);
    assert_eq!(response.runtime_ms, Some(812));
    assert_eq!(response.chunks_used, Some(3));
}

#[tokio::test]
async fn test_query_error_carries_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(
            ResponseTemplate::new(503).set_body_json(json!({"detail": "Index is rebuilding"})),
        )
        .mount(&server)
        .await;

    let err = client(&server).query("anything", 10).await.unwrap_err();
    match err.downcast_ref::<RagdeskError>() {
        Some(RagdeskError::Transport(message)) => assert_eq!(message, "Index is rebuilding"),
        other => panic!("expected transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_answer_is_a_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client(&server).query("anything", 10).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<RagdeskError>(),
        Some(RagdeskError::Parse(_))
    ));
}

#[tokio::test]
async fn test_chat_client_records_exchange_in_history() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .and(body_json(json!({"question": "Summarize chapter 2", "num_chunks": 4})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answer": "Chapter 2 covers **indexing**.",
            "sources": ["1", "1", "2"],
            "runtime_ms": 1500.4
        })))
        .mount(&server)
        .await;

    let store = SessionStore::new(Arc::new(MemoryStore::new()));
    let mut chat = ChatClient::new(store, Arc::new(client(&server))).with_num_chunks(4);

    let answer = chat.ask("Summarize chapter 2").await.unwrap();
    assert_eq!(answer.sources, vec!["1", "2"]);
    assert_eq!(answer.runtime_ms, Some(1500));

    let history = chat.store().load_history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].title, "Summarize chapter 2");
    assert_eq!(history[0].message_count, 2);
}

#[tokio::test]
async fn test_chat_client_apologizes_when_service_is_down() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let store = SessionStore::new(Arc::new(MemoryStore::new()));
    let mut chat = ChatClient::new(store, Arc::new(client(&server)));

    assert!(chat.ask("Hello?").await.is_err());

    let session = chat
        .store()
        .load_session(chat.store().current_id())
        .unwrap();
    assert_eq!(session.messages.len(), 2);
    assert_eq!(session.messages[1].role, Role::Bot);
    assert_eq!(session.messages[1].content, APOLOGY_MESSAGE);
}
