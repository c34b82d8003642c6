use axum::{extract::State, response::Json};
use model::entities::user;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service::{RegisterUserRequest, UserProfile};
use tracing::{debug, instrument, trace};
use utoipa::{IntoParams, ToSchema};

use crate::auth::{require_accountant, AuthUser};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::handlers::loans::LoanResponse;
use crate::responses::{reject, respond, ApiResult};
use crate::schemas::{ApiResponse, AppState};

/// User response model. The password hash never leaves the service.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub age: i32,
    pub salary: Decimal,
    pub is_blocked: bool,
    /// `RegularUser` or `Accountant`
    pub role: String,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            first_name: model.first_name,
            last_name: model.last_name,
            username: model.username,
            age: model.age,
            salary: model.salary,
            is_blocked: model.is_blocked,
            role: model.role.to_string(),
        }
    }
}

/// User together with the loans it owns
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserProfileResponse {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub age: i32,
    pub salary: Decimal,
    pub is_blocked: bool,
    pub role: String,
    pub loans: Vec<LoanResponse>,
}

impl From<UserProfile> for UserProfileResponse {
    fn from(profile: UserProfile) -> Self {
        let user = UserResponse::from(profile.user);
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            username: user.username,
            age: user.age,
            salary: user.salary,
            is_blocked: user.is_blocked,
            role: user.role,
            loans: profile.loans.into_iter().map(LoanResponse::from).collect(),
        }
    }
}

/// Query parameters for blocking or unblocking a user
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BlockedStatusQuery {
    /// `true` to block the user, `false` to unblock
    pub is_blocked: bool,
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "users",
    request_body = RegisterUserRequest,
    responses(
        (status = 200, description = "User added successfully", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Username already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request), fields(username = %request.username))]
pub async fn register_user(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterUserRequest>,
) -> ApiResult<UserResponse> {
    trace!("Entering register_user function");
    state.users.register(request).await.map(respond).map_err(reject)
}

/// Get all users with their loans (accountants only)
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Users retrieved successfully", body = ApiResponse<Vec<UserProfileResponse>>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an accountant", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_users(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
) -> ApiResult<Vec<UserProfileResponse>> {
    trace!("Entering get_users function");
    require_accountant(&ctx)?;

    let outcome = state.users.list_users().await.map_err(reject)?;
    debug!("Returning {} users", outcome.data.len());
    let outcome = outcome.map(|profiles| {
        profiles
            .into_iter()
            .map(UserProfileResponse::from)
            .collect::<Vec<_>>()
    });
    Ok(Json(ApiResponse::from(outcome)))
}

/// Get the caller's own profile with loans
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User information retrieved", body = ApiResponse<UserProfileResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_current_user(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
) -> ApiResult<UserProfileResponse> {
    trace!("Entering get_current_user function");
    state.users.current_user(&ctx).await.map(respond).map_err(reject)
}

/// Get a user by ID with loans (accountants only)
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("user_id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User retrieved successfully", body = ApiResponse<UserProfileResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an accountant", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    ApiPath(user_id): ApiPath<i32>,
) -> ApiResult<UserProfileResponse> {
    trace!("Entering get_user function");
    require_accountant(&ctx)?;
    state.users.get_user(user_id).await.map(respond).map_err(reject)
}

/// Delete a user and all of their loans
#[utoipa::path(
    delete,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("user_id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User deleted, data is the deleted ID", body = ApiResponse<i32>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Cannot delete another user's account", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    ApiPath(user_id): ApiPath<i32>,
) -> ApiResult<i32> {
    trace!("Entering delete_user function");
    state.users.delete_user(&ctx, user_id).await.map(respond).map_err(reject)
}

/// Block or unblock a user (accountants only)
#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}/status",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("user_id" = i32, Path, description = "User ID"),
        BlockedStatusQuery
    ),
    responses(
        (status = 200, description = "User status updated", body = ApiResponse<UserResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an accountant", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn change_user_status(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    ApiPath(user_id): ApiPath<i32>,
    ApiQuery(query): ApiQuery<BlockedStatusQuery>,
) -> ApiResult<UserResponse> {
    trace!("Entering change_user_status function");
    require_accountant(&ctx)?;
    state
        .users
        .change_blocked_status(user_id, query.is_blocked)
        .await
        .map(respond)
        .map_err(reject)
}
