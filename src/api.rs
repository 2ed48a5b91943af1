//! HTTP surface for StudySum.
//!
//! This module exposes a compact Axum router with a handful of endpoints:
//!
//! - `POST /summaries` – Download an already-uploaded document, summarize it, and persist
//!   the summary for the calling user. Accepts `{ "fileUrl", "fileName" }` and returns the
//!   stored summary record.
//! - `GET /summaries` – List the calling user's summaries.
//! - `DELETE /summaries/:id` – Delete one of the calling user's summaries.
//! - `GET /metrics` – Observe summarization counters.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools/hosts.
//!
//! Caller identity is established by the upstream auth collaborator, which injects an
//! `x-user-id` header. Handlers fail closed with 401 when the header is absent, before
//! any pipeline work happens.

use crate::pipeline::{PipelineError, SummarizeRequest, SummaryApi};
use crate::store::{StoreError, StoredSummary};
use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, State},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Header populated by the auth layer in front of this service.
const USER_ID_HEADER: &str = "x-user-id";

/// Build the HTTP router exposing the summarization API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: SummaryApi + 'static,
{
    Router::new()
        .route(
            "/summaries",
            post(create_summary::<S>).get(list_summaries::<S>),
        )
        .route("/summaries/:id", delete(delete_summary::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .with_state(service)
}

/// Authenticated caller identity extracted from the auth header.
pub struct CallerIdentity(pub String);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| CallerIdentity(value.to_string()))
            .ok_or(AppError::Unauthenticated)
    }
}

/// Request body for the `POST /summaries` endpoint.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSummaryRequest {
    /// Storage URL of the already-uploaded file.
    file_url: String,
    /// Original file name of the upload.
    file_name: String,
}

/// Success response for the `POST /summaries` endpoint.
#[derive(Serialize)]
struct CreateSummaryResponse {
    success: bool,
    summary: StoredSummary,
}

/// Summarize an uploaded document and persist the result for the caller.
async fn create_summary<S>(
    State(service): State<Arc<S>>,
    CallerIdentity(user_id): CallerIdentity,
    Json(request): Json<CreateSummaryRequest>,
) -> Result<Json<CreateSummaryResponse>, AppError>
where
    S: SummaryApi,
{
    let CreateSummaryRequest {
        file_url,
        file_name,
    } = request;
    if file_url.trim().is_empty() || file_name.trim().is_empty() {
        return Err(AppError::MissingFields);
    }

    let summary = service
        .summarize_document(
            &user_id,
            SummarizeRequest {
                file_url,
                file_name,
            },
        )
        .await?;
    tracing::info!(
        user = user_id,
        summary = %summary.id,
        word_count = summary.record.word_count,
        "Summary request completed"
    );
    Ok(Json(CreateSummaryResponse {
        success: true,
        summary,
    }))
}

/// Response body for `GET /summaries`.
#[derive(Serialize)]
struct SummariesResponse {
    summaries: Vec<StoredSummary>,
}

/// List the calling user's stored summaries.
async fn list_summaries<S>(
    State(service): State<Arc<S>>,
    CallerIdentity(user_id): CallerIdentity,
) -> Result<Json<SummariesResponse>, AppError>
where
    S: SummaryApi,
{
    let summaries = service.list_summaries(&user_id).await?;
    Ok(Json(SummariesResponse { summaries }))
}

/// Delete one of the calling user's summaries.
async fn delete_summary<S>(
    State(service): State<Arc<S>>,
    CallerIdentity(user_id): CallerIdentity,
    Path(summary_id): Path<String>,
) -> Result<StatusCode, AppError>
where
    S: SummaryApi,
{
    service.delete_summary(&user_id, &summary_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Return a concise metrics snapshot with summarization counters.
async fn get_metrics<S>(
    State(service): State<Arc<S>>,
) -> Json<crate::metrics::MetricsSnapshot>
where
    S: SummaryApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery/UX in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "summarize",
                method: "POST",
                path: "/summaries",
                description: "Download an uploaded document, summarize it with the configured model, and persist the summary for the caller. Response returns { \"success\": true, \"summary\": { ... } }.",
                request_example: Some(json!({
                    "fileUrl": "https://files.example.org/uploads/notes.pdf",
                    "fileName": "notes.pdf"
                })),
            },
            CommandDescriptor {
                name: "list_summaries",
                method: "GET",
                path: "/summaries",
                description: "Return the calling user's stored summaries.",
                request_example: None,
            },
            CommandDescriptor {
                name: "delete_summary",
                method: "DELETE",
                path: "/summaries/:id",
                description: "Delete one of the calling user's summaries by id.",
                request_example: None,
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return summarization counters useful for observability dashboards.",
                request_example: None,
            },
        ],
    })
}

/// Error surface of the HTTP layer.
///
/// Infra failures map to loud 4xx/5xx responses with a user-facing message distinct from
/// the internal cause; parse fallbacks never reach this type because the pipeline absorbs
/// them into valid summaries.
pub enum AppError {
    /// No caller identity was established by the auth layer.
    Unauthenticated,
    /// Request body was missing required fields.
    MissingFields,
    /// Pipeline stage failed.
    Pipeline(PipelineError),
}

impl From<PipelineError> for AppError {
    fn from(inner: PipelineError) -> Self {
        Self::Pipeline(inner)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            Self::Unauthenticated => (StatusCode::UNAUTHORIZED, "Not authenticated", None),
            Self::MissingFields => (
                StatusCode::BAD_REQUEST,
                "fileUrl and fileName are required",
                None,
            ),
            Self::Pipeline(PipelineError::EmptyDocument) => (
                StatusCode::BAD_REQUEST,
                "Document contains no extractable text",
                None,
            ),
            Self::Pipeline(error @ PipelineError::Extraction(_)) => (
                StatusCode::BAD_REQUEST,
                "Unable to read the uploaded document",
                Some(error.to_string()),
            ),
            Self::Pipeline(PipelineError::Store(StoreError::NotFound)) => {
                (StatusCode::NOT_FOUND, "Summary not found", None)
            }
            Self::Pipeline(error) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to process document",
                Some(error.to_string()),
            ),
        };
        (status, Json(ErrorBody { error, details })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::{create_router, get_commands};
    use crate::extract::ExtractionError;
    use crate::metrics::MetricsSnapshot;
    use crate::pipeline::types::DocumentType;
    use crate::pipeline::{PipelineError, SummarizeRequest, SummaryApi, SummaryRecord};
    use crate::store::{StoreError, StoredSummary};
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use serde_json::json;
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    fn sample_stored(user_id: &str) -> StoredSummary {
        StoredSummary {
            id: "sum-1".into(),
            user_id: user_id.into(),
            record: SummaryRecord {
                title: "notes".into(),
                content: "A narrative summary.".into(),
                key_points: vec!["Key point one".into(), "Key point two".into()],
                main_topic: "Biology".into(),
                word_count: 321,
                file_name: "notes.pdf".into(),
                file_url: "https://files.example/notes.pdf".into(),
                document_type: DocumentType::Report,
                has_abstract: true,
                has_conclusion: false,
                estimated_pages: 4,
            },
            created_at: "2025-01-01T00:00:00Z".into(),
            updated_at: "2025-01-01T00:00:00Z".into(),
        }
    }

    #[derive(Clone, Debug)]
    struct SummarizeCall {
        user_id: String,
        request: SummarizeRequest,
    }

    struct StubSummaryService {
        calls: Arc<Mutex<Vec<SummarizeCall>>>,
        fail_with: Option<fn() -> PipelineError>,
    }

    impl StubSummaryService {
        fn succeeding() -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                fail_with: None,
            }
        }

        fn failing(fail_with: fn() -> PipelineError) -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                fail_with: Some(fail_with),
            }
        }

        async fn recorded_calls(&self) -> Vec<SummarizeCall> {
            self.calls.lock().await.clone()
        }
    }

    #[async_trait]
    impl SummaryApi for StubSummaryService {
        async fn summarize_document(
            &self,
            user_id: &str,
            request: SummarizeRequest,
        ) -> Result<StoredSummary, PipelineError> {
            self.calls.lock().await.push(SummarizeCall {
                user_id: user_id.to_string(),
                request,
            });
            match self.fail_with {
                Some(fail) => Err(fail()),
                None => Ok(sample_stored(user_id)),
            }
        }

        async fn list_summaries(
            &self,
            user_id: &str,
        ) -> Result<Vec<StoredSummary>, PipelineError> {
            Ok(vec![sample_stored(user_id)])
        }

        async fn delete_summary(
            &self,
            _user_id: &str,
            summary_id: &str,
        ) -> Result<(), PipelineError> {
            if summary_id == "missing" {
                Err(PipelineError::Store(StoreError::NotFound))
            } else {
                Ok(())
            }
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot {
                documents_summarized: 7,
                fragment_calls: 12,
                parse_fallbacks: 1,
                structure_fallbacks: 2,
            }
        }
    }

    fn summarize_request(user_header: Option<&str>, body: serde_json::Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/summaries")
            .header("content-type", "application/json");
        if let Some(user) = user_header {
            builder = builder.header("x-user-id", user);
        }
        builder.body(Body::from(body.to_string())).expect("request")
    }

    #[tokio::test]
    async fn commands_catalog_exposes_summarize_endpoint() {
        let response = get_commands().await;
        let commands = response.0.commands;
        let summarize = commands
            .iter()
            .find(|cmd| cmd.name == "summarize")
            .expect("summarize command present");

        assert_eq!(summarize.method, "POST");
        assert_eq!(summarize.path, "/summaries");
        assert!(summarize.description.to_lowercase().contains("summarize"));
        assert!(commands.len() >= 4);
    }

    #[tokio::test]
    async fn summarize_route_returns_stored_summary() {
        let service = Arc::new(StubSummaryService::succeeding());
        let app = create_router(service.clone());

        let response = app
            .oneshot(summarize_request(
                Some("user-7"),
                json!({
                    "fileUrl": "https://files.example/notes.pdf",
                    "fileName": "notes.pdf"
                }),
            ))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(json["success"], true);
        assert_eq!(json["summary"]["id"], "sum-1");
        assert_eq!(json["summary"]["mainTopic"], "Biology");
        assert_eq!(json["summary"]["keyPoints"].as_array().unwrap().len(), 2);
        assert_eq!(json["summary"]["documentType"], "report");

        let calls = service.recorded_calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].user_id, "user-7");
        assert_eq!(calls[0].request.file_name, "notes.pdf");
    }

    #[tokio::test]
    async fn summarize_route_fails_closed_without_identity() {
        let service = Arc::new(StubSummaryService::succeeding());
        let app = create_router(service.clone());

        let response = app
            .oneshot(summarize_request(
                None,
                json!({ "fileUrl": "https://x", "fileName": "a.txt" }),
            ))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(json["error"], "Not authenticated");
        assert!(service.recorded_calls().await.is_empty());
    }

    #[tokio::test]
    async fn summarize_route_rejects_blank_fields() {
        let service = Arc::new(StubSummaryService::succeeding());
        let app = create_router(service.clone());

        let response = app
            .oneshot(summarize_request(
                Some("user-7"),
                json!({ "fileUrl": "   ", "fileName": "a.txt" }),
            ))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(service.recorded_calls().await.is_empty());
    }

    #[tokio::test]
    async fn extraction_failure_maps_to_bad_request() {
        let service = Arc::new(StubSummaryService::failing(|| {
            PipelineError::Extraction(ExtractionError::Pdf(
                pdf_extract::OutputError::FormatError(std::fmt::Error),
            ))
        }));
        let app = create_router(service);

        let response = app
            .oneshot(summarize_request(
                Some("user-7"),
                json!({ "fileUrl": "https://x/corrupt.pdf", "fileName": "corrupt.pdf" }),
            ))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(json["error"], "Unable to read the uploaded document");
        assert!(json["details"].as_str().is_some());
    }

    #[tokio::test]
    async fn delete_route_maps_missing_summary_to_not_found() {
        let service = Arc::new(StubSummaryService::succeeding());
        let app = create_router(service);

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::DELETE)
                    .uri("/summaries/missing")
                    .header("x-user-id", "user-7")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn metrics_route_reports_counters() {
        let service = Arc::new(StubSummaryService::succeeding());
        let app = create_router(service);

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/metrics")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(json["documents_summarized"], 7);
        assert_eq!(json["parse_fallbacks"], 1);
    }
}
