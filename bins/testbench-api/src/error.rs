// Mapping harness failures onto HTTP responses
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use testbench_harness::HarnessError;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug)]
pub enum ApiError {
    Harness(HarnessError),
    SessionNotFound(Uuid),
    Unavailable(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Harness(error) => match error {
                HarnessError::AccessDenied(_) => StatusCode::FORBIDDEN,
                HarnessError::CooldownActive { .. } => StatusCode::TOO_MANY_REQUESTS,
                HarnessError::Validation(_) => StatusCode::BAD_REQUEST,
                HarnessError::AlreadyRunning(_) => StatusCode::CONFLICT,
                HarnessError::RuntimeNotFound(_)
                | HarnessError::CompileError(_)
                | HarnessError::RuntimeError(_) => StatusCode::UNPROCESSABLE_ENTITY,
                HarnessError::Network(_) | HarnessError::ExecutionService { .. } => StatusCode::BAD_GATEWAY,
            },
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Harness(error) => error.to_string(),
            ApiError::SessionNotFound(id) => format!("session {} not found", id),
            ApiError::Unavailable(reason) => reason.clone(),
        }
    }
}

impl From<HarnessError> for ApiError {
    fn from(error: HarnessError) -> Self {
        ApiError::Harness(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        if status.is_server_error() {
            warn!(status = status.as_u16(), error = %message, "Request failed");
        }

        let mut body = json!({ "error": message });
        if let ApiError::Harness(HarnessError::CooldownActive { remaining_secs }) = &self {
            body["retry_after_secs"] = json!(remaining_secs);
        }
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(error: HarnessError) -> StatusCode {
        ApiError::from(error).status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_of(HarnessError::AccessDenied("hidden".into())), StatusCode::FORBIDDEN);
        assert_eq!(
            status_of(HarnessError::CooldownActive { remaining_secs: 3 }),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(status_of(HarnessError::Validation("empty".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(HarnessError::AlreadyRunning(2)), StatusCode::CONFLICT);
        assert_eq!(
            status_of(HarnessError::RuntimeNotFound("go".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(status_of(HarnessError::Network("reset".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_of(HarnessError::ExecutionService { status: 500, message: "down".into() }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(ApiError::SessionNotFound(Uuid::nil()).status(), StatusCode::NOT_FOUND);
    }
}
