use axum::http::StatusCode;

/// Handler for `GET /healthz`. Liveness only; readiness depends on each
/// service's storage and lives with the service.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}
