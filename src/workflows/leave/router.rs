use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    ApproverRole, Decision, DecisionPayload, LeaveCategory, LeaveRequestId, LeaveSubmission,
    WithdrawalPayload,
};
use super::repository::{
    EmployeeDirectory, LeaveRepository, NotificationPublisher, RepositoryError,
};
use super::service::{LeaveWorkflowService, WorkflowError};

const ROLE_QUEUE_LIMIT: usize = 50;

/// Router builder exposing HTTP endpoints for submission, decisions, status,
/// and per-role queues. Both review screens (general and medical) drive the
/// same endpoints; they differ only in which roles they surface.
pub fn leave_router<R, E, N>(service: Arc<LeaveWorkflowService<R, E, N>>) -> Router
where
    R: LeaveRepository + 'static,
    E: EmployeeDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route("/api/v1/leave/requests", post(submit_handler::<R, E, N>))
        .route(
            "/api/v1/leave/requests/:request_id",
            get(status_handler::<R, E, N>),
        )
        .route(
            "/api/v1/leave/requests/:request_id/history",
            get(history_handler::<R, E, N>),
        )
        .route(
            "/api/v1/leave/requests/:request_id/decisions",
            post(decision_handler::<R, E, N>),
        )
        .route(
            "/api/v1/leave/requests/:request_id/withdraw",
            post(withdraw_handler::<R, E, N>),
        )
        .route(
            "/api/v1/leave/requests/:request_id/actions/:role",
            get(actions_handler::<R, E, N>),
        )
        .route(
            "/api/v1/leave/queues/:role",
            get(queue_handler::<R, E, N>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct DecisionRequest {
    pub role: ApproverRole,
    pub decision: Decision,
    pub decided_by: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub paid_days: Option<u32>,
    #[serde(default)]
    pub unpaid_days: Option<u32>,
    #[serde(default)]
    pub category: Option<LeaveCategory>,
}

pub(crate) async fn submit_handler<R, E, N>(
    State(service): State<Arc<LeaveWorkflowService<R, E, N>>>,
    axum::Json(submission): axum::Json<LeaveSubmission>,
) -> Response
where
    R: LeaveRepository + 'static,
    E: EmployeeDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    match service.submit(submission) {
        Ok(record) => {
            let view = record.status_view();
            (StatusCode::ACCEPTED, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<R, E, N>(
    State(service): State<Arc<LeaveWorkflowService<R, E, N>>>,
    Path(request_id): Path<String>,
) -> Response
where
    R: LeaveRepository + 'static,
    E: EmployeeDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    let id = LeaveRequestId(request_id);
    match service.get(&id) {
        Ok(record) => {
            let view = record.status_view();
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn history_handler<R, E, N>(
    State(service): State<Arc<LeaveWorkflowService<R, E, N>>>,
    Path(request_id): Path<String>,
) -> Response
where
    R: LeaveRepository + 'static,
    E: EmployeeDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    let id = LeaveRequestId(request_id);
    match service.history(&id) {
        Ok(history) => (StatusCode::OK, axum::Json(history)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn decision_handler<R, E, N>(
    State(service): State<Arc<LeaveWorkflowService<R, E, N>>>,
    Path(request_id): Path<String>,
    axum::Json(body): axum::Json<DecisionRequest>,
) -> Response
where
    R: LeaveRepository + 'static,
    E: EmployeeDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    let id = LeaveRequestId(request_id);
    let payload = DecisionPayload {
        decided_by: body.decided_by,
        comment: body.comment,
        paid_days: body.paid_days,
        unpaid_days: body.unpaid_days,
        category: body.category,
    };

    match service.submit_decision(&id, body.role, body.decision, payload) {
        Ok(record) => {
            let view = record.status_view();
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn withdraw_handler<R, E, N>(
    State(service): State<Arc<LeaveWorkflowService<R, E, N>>>,
    Path(request_id): Path<String>,
    axum::Json(payload): axum::Json<WithdrawalPayload>,
) -> Response
where
    R: LeaveRepository + 'static,
    E: EmployeeDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    let id = LeaveRequestId(request_id);
    match service.withdraw(&id, payload) {
        Ok(record) => {
            let view = record.status_view();
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn actions_handler<R, E, N>(
    State(service): State<Arc<LeaveWorkflowService<R, E, N>>>,
    Path((request_id, role)): Path<(String, String)>,
) -> Response
where
    R: LeaveRepository + 'static,
    E: EmployeeDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    let Some(role) = ApproverRole::parse(&role) else {
        return unknown_role_response(&role);
    };

    let id = LeaveRequestId(request_id);
    match service.actions(&id, role) {
        Ok(availability) => (StatusCode::OK, axum::Json(availability)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn queue_handler<R, E, N>(
    State(service): State<Arc<LeaveWorkflowService<R, E, N>>>,
    Path(role): Path<String>,
) -> Response
where
    R: LeaveRepository + 'static,
    E: EmployeeDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    let Some(role) = ApproverRole::parse(&role) else {
        return unknown_role_response(&role);
    };

    match service.queue_for_role(role, ROLE_QUEUE_LIMIT) {
        Ok(records) => {
            let views: Vec<_> = records
                .iter()
                .map(|record| record.status_view())
                .collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(error) => error_response(error),
    }
}

fn unknown_role_response(role: &str) -> Response {
    let payload = json!({
        "error": format!("unknown approver role '{role}'"),
    });
    (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
}

fn error_response(error: WorkflowError) -> Response {
    match &error {
        WorkflowError::RequestNotFound(_) | WorkflowError::EmployeeNotFound(_) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        WorkflowError::NotYourTurn { .. } | WorkflowError::AlreadyFinal { .. } => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        WorkflowError::Ineligible(block) => {
            let payload = json!({
                "error": error.to_string(),
                "reason": block.to_string(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        WorkflowError::Reconciliation(failure) => {
            let violations: Vec<String> = failure
                .violations()
                .iter()
                .map(|violation| violation.to_string())
                .collect();
            let payload = json!({
                "error": error.to_string(),
                "violations": violations,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        WorkflowError::Submission(_) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        WorkflowError::Repository(RepositoryError::Conflict) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        WorkflowError::Repository(_) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
