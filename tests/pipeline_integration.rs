//! End-to-end pipeline tests against mock HTTP collaborators.
//!
//! A single mock server stands in for all three external services: file storage, the
//! Ollama completion endpoint, and the summary store. Completion mocks are told apart by
//! distinctive markers in the prompts. Scenarios run sequentially inside one test because
//! configuration is process-global.

use axum::{
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use httpmock::{Method::GET, Method::POST, MockServer};
use serde_json::json;
use std::sync::Arc;
use studysum::{
    api,
    config,
    pipeline::{PipelineError, SummarizeRequest, SummaryService},
};
use tower::ServiceExt;

fn set_env(key: &str, value: &str) {
    // SAFETY: Tests run in a single process and establish deterministic configuration upfront.
    unsafe { std::env::set_var(key, value) }
}

#[tokio::test]
async fn end_to_end_scenarios() {
    let server = MockServer::start_async().await;
    let base_url = server.base_url();

    set_env("LLM_PROVIDER", "ollama");
    set_env("LLM_MODEL", "llama3");
    set_env("LLM_BASE_URL", &base_url);
    set_env("SUMMARY_STORE_URL", &base_url);
    config::init_config();

    let service = Arc::new(SummaryService::new());

    // --- Scenario A: short text, no chunking, structured model output, via the router. ---

    let file_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/files/short-note.txt");
            then.status(200).body("Short note.");
        })
        .await;

    let structured_body = json!({
        "summary": "A short note about studying.",
        "keyPoints": ["The note concerns studying habits"],
        "mainTopic": "Study Notes",
        "wordCount": 5
    })
    .to_string();
    let final_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/generate")
                .body_contains("keyPoints")
                .body_contains("Short note.");
            then.status(200)
                .json_body(json!({ "response": structured_body, "done": true }));
        })
        .await;

    let structure_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/generate")
                .body_contains("hasAbstract");
            then.status(200).json_body(json!({
                "response": json!({
                    "documentType": "article",
                    "sections": [],
                    "hasAbstract": false,
                    "hasConclusion": false,
                    "estimatedPages": 1
                })
                .to_string(),
                "done": true
            }));
        })
        .await;

    let stored_a = json!({
        "id": "sum-a",
        "userId": "student-1",
        "title": "short-note",
        "content": "A short note about studying.",
        "keyPoints": ["The note concerns studying habits"],
        "mainTopic": "Study Notes",
        "wordCount": 5,
        "fileName": "short-note.txt",
        "fileUrl": format!("{base_url}/files/short-note.txt"),
        "documentType": "article",
        "hasAbstract": false,
        "hasConclusion": false,
        "estimatedPages": 1,
        "createdAt": "2025-01-01T00:00:00Z",
        "updatedAt": "2025-01-01T00:00:00Z"
    });
    let store_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/users/student-1/summaries")
                .json_body_partial(
                    json!({
                        "userId": "student-1",
                        "title": "short-note",
                        "content": "A short note about studying.",
                        "mainTopic": "Study Notes",
                        "wordCount": 5,
                        "documentType": "article",
                        "estimatedPages": 1
                    })
                    .to_string(),
                );
            then.status(201).json_body(stored_a.clone());
        })
        .await;

    let app = api::create_router(Arc::clone(&service));
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/summaries")
                .header("content-type", "application/json")
                .header("x-user-id", "student-1")
                .body(Body::from(
                    json!({
                        "fileUrl": format!("{base_url}/files/short-note.txt"),
                        "fileName": "short-note.txt"
                    })
                    .to_string(),
                ))
                .expect("request"),
        )
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let payload: serde_json::Value = serde_json::from_slice(&body).expect("json body");
    assert_eq!(payload["success"], true);
    assert_eq!(payload["summary"]["id"], "sum-a");
    assert_eq!(payload["summary"]["wordCount"], 5);
    assert_eq!(payload["summary"]["mainTopic"], "Study Notes");

    file_mock.assert_async().await;
    // One final call, no fragment calls: the text is far below the chunking threshold.
    assert_eq!(final_mock.hits_async().await, 1);
    structure_mock.assert_async().await;
    store_mock.assert_async().await;

    let snapshot = service.metrics_snapshot();
    assert_eq!(snapshot.documents_summarized, 1);
    assert_eq!(snapshot.fragment_calls, 0);
    assert_eq!(snapshot.parse_fallbacks, 0);

    file_mock.delete_async().await;
    final_mock.delete_async().await;
    structure_mock.delete_async().await;
    store_mock.delete_async().await;

    // --- Scenario B: long text, capped chunking, prose model output, structure call down. ---

    let long_text = "The mitochondria is the powerhouse of the cell. ".repeat(105);
    assert!(long_text.chars().count() > 4000);
    let expected_pages = long_text.chars().count().div_ceil(2000) as u64;

    let file_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/files/handout.txt");
            then.status(200).body(long_text.clone());
        })
        .await;

    let fragment_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/generate")
                .body_contains("fragment of a study document");
            then.status(200).json_body(json!({
                "response": "Fragment summary covering cell biology basics.",
                "done": true
            }));
        })
        .await;

    let prose = "This handout explains cell structure. It focuses on the mitochondria and \
                 energy production. Additional detail follows throughout the text.";
    let final_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/generate")
                .body_contains("keyPoints");
            then.status(200)
                .json_body(json!({ "response": prose, "done": true }));
        })
        .await;

    let structure_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/generate")
                .body_contains("hasAbstract");
            then.status(500).body("model overloaded");
        })
        .await;

    let stored_b = json!({
        "id": "sum-b",
        "userId": "student-1",
        "title": "handout",
        "content": prose,
        "keyPoints": [
            "This handout explains cell structure",
            "It focuses on the mitochondria and energy production",
            "Additional detail follows throughout the text"
        ],
        "mainTopic": "Document Analysis",
        "wordCount": 19,
        "fileName": "handout.txt",
        "fileUrl": format!("{base_url}/files/handout.txt"),
        "documentType": "other",
        "hasAbstract": false,
        "hasConclusion": false,
        "estimatedPages": expected_pages,
        "createdAt": "2025-01-01T00:00:00Z",
        "updatedAt": "2025-01-01T00:00:00Z"
    });
    let store_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/users/student-1/summaries")
                .json_body_partial(
                    json!({
                        "userId": "student-1",
                        "mainTopic": "Document Analysis",
                        "wordCount": 19,
                        "documentType": "other",
                        "hasAbstract": false,
                        "hasConclusion": false,
                        "estimatedPages": expected_pages
                    })
                    .to_string(),
                );
            then.status(201).json_body(stored_b.clone());
        })
        .await;

    let stored = service
        .summarize_document(
            "student-1",
            SummarizeRequest {
                file_url: format!("{base_url}/files/handout.txt"),
                file_name: "handout.txt".to_string(),
            },
        )
        .await
        .expect("scenario B summary");

    assert_eq!(stored.id, "sum-b");
    assert_eq!(stored.record.main_topic, "Document Analysis");
    assert!(stored.record.key_points.len() <= 5);
    assert!(!stored.record.key_points.is_empty());

    file_mock.assert_async().await;
    // Chunk cap bounds fragment calls regardless of document length.
    assert_eq!(fragment_mock.hits_async().await, 3);
    assert_eq!(final_mock.hits_async().await, 1);
    structure_mock.assert_async().await;
    store_mock.assert_async().await;

    let snapshot = service.metrics_snapshot();
    assert_eq!(snapshot.documents_summarized, 2);
    assert_eq!(snapshot.fragment_calls, 3);
    assert_eq!(snapshot.parse_fallbacks, 1);
    assert_eq!(snapshot.structure_fallbacks, 1);

    file_mock.delete_async().await;
    fragment_mock.delete_async().await;
    final_mock.delete_async().await;
    structure_mock.delete_async().await;
    store_mock.delete_async().await;

    // --- Scenario C: corrupt PDF aborts before any model or store call. ---

    let file_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/files/corrupt.pdf");
            then.status(200).body("this is not a real pdf payload");
        })
        .await;

    let generate_mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(200)
                .json_body(json!({ "response": "unreachable", "done": true }));
        })
        .await;

    let store_mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/users/student-1/summaries");
            then.status(201).json_body(json!({}));
        })
        .await;

    let error = service
        .summarize_document(
            "student-1",
            SummarizeRequest {
                file_url: format!("{base_url}/files/corrupt.pdf"),
                file_name: "corrupt.pdf".to_string(),
            },
        )
        .await
        .expect_err("scenario C error");

    assert!(matches!(error, PipelineError::Extraction(_)));
    file_mock.assert_async().await;
    assert_eq!(generate_mock.hits_async().await, 0);
    assert_eq!(store_mock.hits_async().await, 0);

    let snapshot = service.metrics_snapshot();
    assert_eq!(snapshot.documents_summarized, 2);
}
