use axum::{http::StatusCode, response::Json};
use service::{Outcome, ServiceError, Status};
use tracing::{debug, error};

use crate::schemas::{ApiResponse, ErrorResponse};

/// Rejection returned by every handler
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub fn status_code(status: Status) -> StatusCode {
    match status {
        Status::Success => StatusCode::OK,
        Status::NotFound => StatusCode::NOT_FOUND,
        Status::BadRequest => StatusCode::BAD_REQUEST,
        Status::Forbidden => StatusCode::FORBIDDEN,
        Status::Conflict => StatusCode::CONFLICT,
        Status::Unauthorized => StatusCode::UNAUTHORIZED,
        Status::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Turns a service failure into an error response. Internal failures are
/// logged and reported without detail.
pub fn reject(err: ServiceError) -> ApiError {
    let status = err.status();
    let message = match status {
        Status::Internal => {
            error!("Request failed: {}", err);
            "Internal server error".to_string()
        }
        _ => {
            debug!("Request rejected with {}: {}", status, err);
            err.to_string()
        }
    };

    (
        status_code(status),
        Json(ErrorResponse {
            error: message,
            code: status.as_str().to_string(),
            success: false,
        }),
    )
}

/// Wraps a successful outcome, converting the entity into its response shape.
pub fn respond<T, R: From<T>>(outcome: Outcome<T>) -> Json<ApiResponse<R>> {
    Json(ApiResponse::from(outcome.map(R::from)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_failures_keep_message_and_code() {
        let (code, Json(body)) = reject(ServiceError::conflict("Username already exists"));
        assert_eq!(code, StatusCode::CONFLICT);
        assert_eq!(body.error, "Username already exists");
        assert_eq!(body.code, "Conflict");
        assert!(!body.success);
    }

    #[test]
    fn test_internal_failures_are_not_leaked() {
        let err = ServiceError::from(sea_orm::DbErr::Custom("secret table missing".to_string()));
        let (code, Json(body)) = reject(err);
        assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Internal server error");
        assert_eq!(body.code, "Internal");
    }
}
