// HTTP route handlers for the Testbench API

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use testbench_common::types::{
    ErrorKind, Language, ProblemState, SessionContext, Submission, TestCase, TestStatus,
};
use testbench_harness::reports::{IssueType, TestCaseReport};
use testbench_harness::{BatchRunner, CaseResult, Signal, TestCaseField};
use tokio::sync::Mutex;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::ApiError;
use crate::metrics;
use crate::{AppState, SharedRunner};

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub question_id: String,
    pub context_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub input_test_cases: Vec<String>,
    #[serde(default)]
    pub output_test_cases: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub test_cases: usize,
}

#[derive(Debug, Deserialize)]
pub struct AddCaseRequest {
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub expected_output: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCaseRequest {
    pub input: Option<String>,
    pub expected_output: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmissionRequest {
    pub language: Language,
    pub source_code: String,
}

impl From<SubmissionRequest> for Submission {
    fn from(request: SubmissionRequest) -> Self {
        Submission::new(request.language, request.source_code)
    }
}

#[derive(Debug, Deserialize)]
pub struct ExecRequest {
    pub language: Language,
    pub source_code: String,
    #[serde(default)]
    pub stdin: String,
}

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    pub issue_type: IssueType,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub id: u32,
    pub passed: bool,
    pub status: TestStatus,
    pub actual_output: String,
    pub error_kind: Option<ErrorKind>,
    pub reveal_hidden: bool,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub run_id: Uuid,
    pub all_passed: bool,
    pub signals: Vec<Signal>,
    pub cases: Vec<CaseResult>,
}

#[derive(Debug, Serialize)]
pub struct ExecResponse {
    pub output: String,
    pub error_kind: Option<ErrorKind>,
}

async fn session(state: &AppState, session_id: Uuid) -> ApiResult<SharedRunner> {
    state
        .sessions
        .read()
        .await
        .get(&session_id)
        .cloned()
        .ok_or(ApiError::SessionNotFound(session_id))
}

/// GET /status - Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let sessions = state.sessions.read().await.len();
    Json(serde_json::json!({
        "status": "ok",
        "sessions": sessions,
        "started_at": state.started_at,
    }))
}

/// GET /metrics - Prometheus text format
pub async fn metrics_handler() -> impl IntoResponse {
    match metrics::render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// POST /sessions - Start a harness for one user and problem
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateSessionRequest>,
) -> ApiResult<impl IntoResponse> {
    let context = SessionContext::new(payload.user_id, payload.question_id.as_str(), payload.context_id);
    let session_id = context.session_id;

    let mut runner = BatchRunner::from_config(&state.config, context, state.http.clone());
    runner.load_problem(&ProblemState {
        question_id: payload.question_id,
        input_test_cases: payload.input_test_cases,
        output_test_cases: payload.output_test_cases,
    })?;
    let test_cases = runner.store().len();

    state
        .sessions
        .write()
        .await
        .insert(session_id, Arc::new(Mutex::new(runner)));

    info!(session_id = %session_id, test_cases, "Session created");
    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse { session_id, test_cases }),
    ))
}

/// DELETE /sessions/:session_id - Logout
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .sessions
        .write()
        .await
        .remove(&session_id)
        .ok_or(ApiError::SessionNotFound(session_id))?;

    info!(session_id = %session_id, "Session closed");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /sessions/:session_id/cases
pub async fn list_cases(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<Vec<TestCase>>> {
    let runner = session(&state, session_id).await?;
    let cases = runner.lock().await.listed_cases().await?;
    Ok(Json(cases))
}

/// POST /sessions/:session_id/cases
pub async fn add_case(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<AddCaseRequest>,
) -> ApiResult<impl IntoResponse> {
    let runner = session(&state, session_id).await?;
    let id = runner
        .lock()
        .await
        .store_mut()
        .add(payload.input, payload.expected_output);

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// PATCH /sessions/:session_id/cases/:case_id
pub async fn update_case(
    State(state): State<Arc<AppState>>,
    Path((session_id, case_id)): Path<(Uuid, u32)>,
    Json(payload): Json<UpdateCaseRequest>,
) -> ApiResult<StatusCode> {
    let runner = session(&state, session_id).await?;
    let mut runner = runner.lock().await;

    if let Some(input) = payload.input {
        runner.store_mut().update(case_id, TestCaseField::Input(input))?;
    }
    if let Some(expected) = payload.expected_output {
        runner
            .store_mut()
            .update(case_id, TestCaseField::ExpectedOutput(expected))?;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /sessions/:session_id/cases/:case_id
pub async fn remove_case(
    State(state): State<Arc<AppState>>,
    Path((session_id, case_id)): Path<(Uuid, u32)>,
) -> ApiResult<StatusCode> {
    let runner = session(&state, session_id).await?;
    runner.lock().await.store_mut().remove(case_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /sessions/:session_id/cases/:case_id/run
pub async fn run_case(
    State(state): State<Arc<AppState>>,
    Path((session_id, case_id)): Path<(Uuid, u32)>,
    Json(payload): Json<SubmissionRequest>,
) -> ApiResult<Json<RunResponse>> {
    let runner = session(&state, session_id).await?;
    let mut runner = runner.lock().await;

    let outcome = match runner.run_one(case_id, &payload.into()).await {
        Ok(outcome) => outcome,
        Err(e) => {
            if e.is_service_failure() {
                metrics::record_run("single", "error");
            }
            return Err(e.into());
        }
    };

    let verdict = if outcome.evaluation.passed { "passed" } else { "failed" };
    metrics::record_run("single", verdict);

    let case = runner.store().get(case_id);
    Ok(Json(RunResponse {
        id: outcome.id,
        passed: outcome.evaluation.passed,
        status: case.map(|case| case.status).unwrap_or(TestStatus::Failed),
        actual_output: case.map(|case| case.actual_output.clone()).unwrap_or_default(),
        error_kind: outcome.evaluation.error_kind,
        reveal_hidden: outcome.reveal_hidden,
    }))
}

/// POST /sessions/:session_id/submit - Run every test case
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<SubmissionRequest>,
) -> ApiResult<Json<SubmitResponse>> {
    let runner = session(&state, session_id).await?;
    let report = runner.lock().await.run_all(&payload.into()).await?;

    metrics::record_batch(if report.all_passed { "passed" } else { "failed" });
    for case in &report.cases {
        let verdict = match (case.status, &case.error) {
            (_, Some(_)) => "error",
            (TestStatus::Passed, None) => "passed",
            _ => "failed",
        };
        metrics::record_run("batch", verdict);
    }

    // solved marking keeps running in the background
    Ok(Json(SubmitResponse {
        run_id: report.run_id,
        all_passed: report.all_passed,
        signals: report.signals,
        cases: report.cases,
    }))
}

/// POST /sessions/:session_id/exec - Free-form run with custom stdin
pub async fn exec(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<ExecRequest>,
) -> ApiResult<Json<ExecResponse>> {
    let runner = session(&state, session_id).await?;
    let submission = Submission::new(payload.language, payload.source_code);
    let evaluation = runner.lock().await.run_code(&submission, &payload.stdin).await?;

    metrics::record_run("exec", if evaluation.error_kind.is_some() { "failed" } else { "passed" });
    Ok(Json(ExecResponse {
        output: evaluation.display_text(),
        error_kind: evaluation.error_kind,
    }))
}

/// POST /sessions/:session_id/cases/:case_id/report
pub async fn report_case(
    State(state): State<Arc<AppState>>,
    Path((session_id, case_id)): Path<(Uuid, u32)>,
    Json(payload): Json<ReportRequest>,
) -> ApiResult<impl IntoResponse> {
    let sink = state
        .reports
        .clone()
        .ok_or_else(|| ApiError::Unavailable("test case reports are not configured".to_string()))?;

    let runner = session(&state, session_id).await?;
    let report: TestCaseReport = runner
        .lock()
        .await
        .report_case(case_id, payload.issue_type, &payload.description, sink.as_ref())
        .await?;

    Ok((StatusCode::CREATED, Json(report)))
}
