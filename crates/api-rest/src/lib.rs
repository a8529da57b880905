//! # API REST
//!
//! REST transport for the ward census.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS)
//!
//! Each operator's conversation is driven through three endpoints: one for commands, one for
//! free-text messages and one for selections. Every call returns the reply the operator should
//! see. Census logic lives in `census-core`; nothing here inspects records beyond mapping them to
//! JSON.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use census_core::conversation::{Delivery, Reply, ReplyOption};
use census_core::record::CriticalFlag;
use census_core::{report, Command, ConversationService, Inbound, OperatorId, PatientRecord};
use census_types::ServiceCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

type ApiResult<T> = Result<T, (StatusCode, &'static str)>;

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    conversations: Arc<ConversationService>,
}

impl AppState {
    pub fn new(conversations: ConversationService) -> Self {
        Self {
            conversations: Arc::new(conversations),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CommandReq {
    /// Command name, with or without a leading `/`.
    pub command: String,
}

#[derive(Deserialize, ToSchema)]
pub struct MessageReq {
    pub text: String,
}

#[derive(Deserialize, ToSchema)]
pub struct SelectionReq {
    /// Token of the chosen option.
    pub token: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ReplyOptionRes {
    pub label: String,
    pub token: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ReplyRes {
    pub text: String,
    pub options: Vec<ReplyOptionRes>,
    /// `new_message`, `edit_previous` or `edit_options`.
    pub delivery: String,
    pub preformatted: bool,
}

impl From<Reply> for ReplyRes {
    fn from(reply: Reply) -> Self {
        let delivery = match reply.delivery {
            Delivery::NewMessage => "new_message",
            Delivery::EditPrevious => "edit_previous",
            Delivery::EditOptions => "edit_options",
        };
        Self {
            text: reply.text,
            options: reply
                .options
                .into_iter()
                .map(|ReplyOption { label, token }| ReplyOptionRes { label, token })
                .collect(),
            delivery: delivery.to_string(),
            preformatted: reply.preformatted,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct PatientRes {
    pub row: usize,
    pub line: String,
    pub service: String,
    pub disposition: Option<String>,
    pub critical: bool,
    pub ward_bed: String,
    pub jric: String,
    pub cwi: String,
}

impl From<PatientRecord> for PatientRes {
    fn from(record: PatientRecord) -> Self {
        Self {
            service: record.service_code().to_string(),
            critical: record.critical() == CriticalFlag::Critical,
            disposition: record.disposition.map(|d| d.to_string()),
            row: record.row,
            line: record.line,
            ward_bed: record.ward_bed,
            jric: record.jric,
            cwi: record.cwi,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ListPatientsRes {
    pub patients: Vec<PatientRes>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ReportRes {
    pub text: String,
    pub preformatted: bool,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_patients,
        service_report,
        send_command,
        send_message,
        send_selection,
    ),
    components(schemas(
        HealthRes,
        CommandReq,
        MessageReq,
        SelectionReq,
        ReplyOptionRes,
        ReplyRes,
        PatientRes,
        ListPatientsRes,
        ReportRes,
    ))
)]
pub struct ApiDoc;

/// Build the REST router, including Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/patients", get(list_patients))
        .route("/reports/service/:service", get(service_report))
        .route("/operators/:operator/commands", post(send_command))
        .route("/operators/:operator/messages", post(send_message))
        .route("/operators/:operator/selections", post(send_selection))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn internal_error(context: &str, err: impl std::fmt::Display) -> (StatusCode, &'static str) {
    tracing::error!("{}: {}", context, err);
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
}

/// Run one conversation event on the blocking pool.
async fn dispatch(
    state: AppState,
    operator: String,
    input: Inbound,
) -> ApiResult<Json<ReplyRes>> {
    let operator =
        OperatorId::new(&operator).map_err(|_| (StatusCode::BAD_REQUEST, "Invalid operator id"))?;

    let conversations = state.conversations.clone();
    let reply = tokio::task::spawn_blocking(move || conversations.handle(&operator, input))
        .await
        .map_err(|e| internal_error("Conversation task failed", e))?;

    Ok(Json(reply.into()))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Census REST API is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/patients",
    responses(
        (status = 200, description = "Every record on the census, in sheet order", body = ListPatientsRes),
        (status = 500, description = "Internal server error")
    )
)]
/// List every census record.
#[axum::debug_handler]
async fn list_patients(State(state): State<AppState>) -> ApiResult<Json<ListPatientsRes>> {
    let conversations = state.conversations.clone();
    let records = tokio::task::spawn_blocking(move || conversations.store().load_records())
        .await
        .map_err(|e| internal_error("Record listing task failed", e))?
        .map_err(|e| internal_error("List patients error", e))?;

    Ok(Json(ListPatientsRes {
        patients: records.into_iter().map(PatientRes::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/reports/service/{service}",
    params(
        ("service" = String, Path, description = "Service number or code, e.g. `3` or `GM3`")
    ),
    responses(
        (status = 200, description = "Rendered service report", body = ReportRes),
        (status = 500, description = "Internal server error")
    )
)]
/// Render today's census report for one service.
#[axum::debug_handler]
async fn service_report(
    State(state): State<AppState>,
    AxumPath(service): AxumPath<String>,
) -> ApiResult<Json<ReportRes>> {
    let service = ServiceCode::normalise(&service);
    let conversations = state.conversations.clone();
    let records = tokio::task::spawn_blocking(move || conversations.store().load_records())
        .await
        .map_err(|e| internal_error("Report task failed", e))?
        .map_err(|e| internal_error("Service report error", e))?;

    let view = report::service_report(&service, &records, chrono::Local::now().date_naive());
    Ok(Json(ReportRes {
        text: view.render(),
        preformatted: view.is_preformatted(),
    }))
}

#[utoipa::path(
    post,
    path = "/operators/{operator}/commands",
    request_body = CommandReq,
    params(("operator" = String, Path, description = "Operator identity")),
    responses(
        (status = 200, description = "Reply to show the operator", body = ReplyRes),
        (status = 400, description = "Unknown command or invalid operator")
    )
)]
/// Issue a command, starting or cancelling a flow.
#[axum::debug_handler]
async fn send_command(
    State(state): State<AppState>,
    AxumPath(operator): AxumPath<String>,
    Json(req): Json<CommandReq>,
) -> ApiResult<Json<ReplyRes>> {
    let command: Command = req.command.parse().map_err(|e| {
        tracing::debug!("Rejected command: {}", e);
        (StatusCode::BAD_REQUEST, "Unknown command")
    })?;
    dispatch(state, operator, Inbound::Command(command)).await
}

#[utoipa::path(
    post,
    path = "/operators/{operator}/messages",
    request_body = MessageReq,
    params(("operator" = String, Path, description = "Operator identity")),
    responses(
        (status = 200, description = "Reply to show the operator", body = ReplyRes),
        (status = 400, description = "Invalid operator")
    )
)]
/// Send free text to the operator's active flow.
#[axum::debug_handler]
async fn send_message(
    State(state): State<AppState>,
    AxumPath(operator): AxumPath<String>,
    Json(req): Json<MessageReq>,
) -> ApiResult<Json<ReplyRes>> {
    dispatch(state, operator, Inbound::Text(req.text)).await
}

#[utoipa::path(
    post,
    path = "/operators/{operator}/selections",
    request_body = SelectionReq,
    params(("operator" = String, Path, description = "Operator identity")),
    responses(
        (status = 200, description = "Reply to show the operator", body = ReplyRes),
        (status = 400, description = "Invalid operator")
    )
)]
/// Choose one of the options offered by the previous reply.
#[axum::debug_handler]
async fn send_selection(
    State(state): State<AppState>,
    AxumPath(operator): AxumPath<String>,
    Json(req): Json<SelectionReq>,
) -> ApiResult<Json<ReplyRes>> {
    dispatch(state, operator, Inbound::Selection(req.token)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use census_core::sheet::MemorySheet;
    use census_core::{CensusConfig, CensusStore};
    use tower::ServiceExt;

    fn app() -> Router {
        let cfg = CensusConfig::from_env_values(None, None, None, None).expect("default config");
        let store = CensusStore::new(Arc::new(MemorySheet::with_header(10)), &cfg);
        router(AppState::new(ConversationService::new(store)))
    }

    async fn post_json(app: &Router, uri: &str, body: &str) -> axum::response::Response {
        app.clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request"),
            )
            .await
            .expect("response")
    }

    async fn get(app: &Router, uri: &str) -> axum::response::Response {
        app.clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response")
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        serde_json::from_slice(&body).expect("Failed to parse JSON")
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = get(&app(), "/health").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_command_is_bad_request() {
        let response =
            post_json(&app(), "/operators/ward-1/commands", r#"{"command":"/nope"}"#).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn add_flow_commits_and_lists_the_patient() {
        let app = app();
        let reply: ReplyRes =
            body_json(post_json(&app, "/operators/ward-1/commands", r#"{"command":"add"}"#).await)
                .await;
        assert!(reply.text.starts_with("Please enter the GM service number"));

        for text in ["1", "Cruz", "NC", "Negative", "123", "45", "A", "2", "JoyD"] {
            let body = serde_json::json!({ "text": text }).to_string();
            post_json(&app, "/operators/ward-1/messages", &body).await;
        }
        let reply: ReplyRes = body_json(
            post_json(&app, "/operators/ward-1/selections", r#"{"token":"dtype_ADMITTED"}"#).await,
        )
        .await;
        assert_eq!(reply.delivery, "edit_previous");

        post_json(&app, "/operators/ward-1/messages", r#"{"text":"CAP"}"#).await;
        let reply: ReplyRes = body_json(
            post_json(&app, "/operators/ward-1/selections", r#"{"token":"done"}"#).await,
        )
        .await;
        assert!(reply.text.starts_with("✅ Patient added successfully!"));

        let listed: ListPatientsRes = body_json(get(&app, "/patients").await).await;
        assert_eq!(listed.patients.len(), 1);
        assert_eq!(listed.patients[0].row, 2);
        assert_eq!(listed.patients[0].service, "GM1");
        assert_eq!(listed.patients[0].disposition.as_deref(), Some("ADMITTED"));
        assert!(!listed.patients[0].critical);

        let report: ReportRes = body_json(get(&app, "/reports/service/1").await).await;
        assert!(report.preformatted);
        assert!(report.text.ends_with("GM1 = 0 + 1 - 0 = 1"));
    }

    #[tokio::test]
    async fn report_on_empty_sheet_is_plain_text() {
        let report: ReportRes = body_json(get(&app(), "/reports/service/GM2").await).await;
        assert_eq!(report.text, "No patients found in the sheet.");
        assert!(!report.preformatted);
    }
}
