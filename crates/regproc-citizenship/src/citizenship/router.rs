use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde_json::json;

use super::collaborators::{FieldStore, NinUsageGuard};
use super::domain::RegistrationId;
use super::repository::{AuditSink, RecordError, StageStatus, VerificationRepository};
use super::service::{CitizenshipVerificationService, VerificationServiceError};

pub const VERIFICATION_ROUTE: &str =
    "/api/v1/registrations/:registration_id/citizenship-verification";

type SharedService<S, G, R, A> = Arc<CitizenshipVerificationService<S, G, R, A>>;

/// Router builder exposing the verification stage over HTTP.
pub fn verification_router<S, G, R, A>(service: SharedService<S, G, R, A>) -> Router
where
    S: FieldStore + 'static,
    G: NinUsageGuard + 'static,
    R: VerificationRepository + 'static,
    A: AuditSink + 'static,
{
    Router::new()
        .route(
            VERIFICATION_ROUTE,
            post(process_handler::<S, G, R, A>).get(status_handler::<S, G, R, A>),
        )
        .with_state(service)
}

pub(crate) async fn process_handler<S, G, R, A>(
    State(service): State<SharedService<S, G, R, A>>,
    Path(registration_id): Path<String>,
) -> Response
where
    S: FieldStore + 'static,
    G: NinUsageGuard + 'static,
    R: VerificationRepository + 'static,
    A: AuditSink + 'static,
{
    let id = RegistrationId(registration_id);
    match service.process(&id) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(VerificationServiceError::Evaluation(error)) if error.is_retryable() => {
            let payload = json!({
                "registration_id": id.0,
                "status": StageStatus::Failed.label(),
                "error": error.to_string(),
            });
            (StatusCode::SERVICE_UNAVAILABLE, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn status_handler<S, G, R, A>(
    State(service): State<SharedService<S, G, R, A>>,
    Path(registration_id): Path<String>,
) -> Response
where
    S: FieldStore + 'static,
    G: NinUsageGuard + 'static,
    R: VerificationRepository + 'static,
    A: AuditSink + 'static,
{
    let id = RegistrationId(registration_id);
    match service.get(&id) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(VerificationServiceError::Record(RecordError::NotFound)) => {
            let payload = json!({
                "registration_id": id.0,
                "error": "registration has not been verified",
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
