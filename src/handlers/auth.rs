use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use service::{IssuedToken, LoginRequest};
use tracing::{instrument, trace};
use utoipa::ToSchema;

use crate::extract::ApiJson;
use crate::responses::{reject, respond, ApiResult};
use crate::schemas::AppState;

/// Bearer token issued on login
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// Signed JWT to send as `Authorization: Bearer <token>`
    pub token: String,
    /// Always `Bearer`
    pub token_type: String,
    /// When the token stops being accepted
    pub expires_at: DateTime<Utc>,
}

impl From<IssuedToken> for LoginResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            token: issued.token,
            token_type: "Bearer".to_string(),
            expires_at: issued.expires_at,
        }
    }
}

/// Exchange username and password for a bearer token
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid username or password", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request), fields(username = %request.username))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    trace!("Entering login function");
    state.users.login(request).await.map(respond).map_err(reject)
}
