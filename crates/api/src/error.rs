//! Rendering of [`AppError`] as HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use kontor_shared::AppError;

/// Handler error: an [`AppError`] rendered as `{"error", "message"}`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl<E> From<E> for ApiError
where
    E: Into<AppError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = if self.0.is_server_error() {
            error!(error = %self.0, "Request failed");
            "An error occurred"
        } else {
            self.0.message()
        };

        (
            status,
            Json(json!({
                "error": self.0.error_code(),
                "message": message,
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use rstest::rstest;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = ApiError(err).into_response();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[rstest]
    #[case(AppError::Validation("unbalanced".into()), StatusCode::BAD_REQUEST, "VALIDATION_ERROR")]
    #[case(AppError::SodViolation("maker".into()), StatusCode::FORBIDDEN, "SOD_VIOLATION")]
    #[case(AppError::PeriodClosed("CLOSED".into()), StatusCode::CONFLICT, "PERIOD_CLOSED")]
    #[case(AppError::AlreadyGenerated("x".into()), StatusCode::CONFLICT, "ALREADY_GENERATED")]
    #[case(AppError::NotFound("journal".into()), StatusCode::NOT_FOUND, "NOT_FOUND")]
    #[tokio::test]
    async fn test_client_errors_keep_message(
        #[case] err: AppError,
        #[case] status: StatusCode,
        #[case] code: &str,
    ) {
        let message = err.message().to_string();
        let (actual, body) = render(err).await;
        assert_eq!(actual, status);
        assert_eq!(body["error"], code);
        assert_eq!(body["message"], message);
    }

    #[tokio::test]
    async fn test_server_errors_hide_detail() {
        let (status, body) = render(AppError::Database("connection refused".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "DATABASE_ERROR");
        assert_eq!(body["message"], "An error occurred");
    }
}
