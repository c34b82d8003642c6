use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use service::{policy, RequestContext, ServiceError};
use tracing::debug;

use crate::responses::{reject, ApiError};
use crate::schemas::AppState;

/// Caller identity resolved from the `Authorization: Bearer <jwt>` header.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub RequestContext);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = extract_bearer(&parts.headers).map_err(reject)?;
        let claims = state.users.tokens().verify(token).map_err(reject)?;
        let ctx = claims.context().map_err(reject)?;

        debug!(requester_id = ?ctx.requester_id, role = %ctx.role, "Authenticated request");
        Ok(AuthUser(ctx))
    }
}

/// Refuses callers that are not accountants.
pub fn require_accountant(ctx: &RequestContext) -> Result<(), ApiError> {
    policy::require_accountant(ctx).map_err(|denial| reject(denial.into()))
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, ServiceError> {
    let missing = || ServiceError::unauthorized("Missing bearer token");

    let header = headers.get(AUTHORIZATION).ok_or_else(missing)?;
    let header = header.to_str().map_err(|_| missing())?;
    let token = header.strip_prefix("Bearer ").ok_or_else(missing)?.trim();

    if token.is_empty() {
        return Err(missing());
    }
    Ok(token)
}
