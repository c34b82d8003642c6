use axum::{extract::State, response::Json};
use model::entities::loan;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service::{CreateLoanRequest, UpdateLoanRequest};
use tracing::{debug, instrument, trace};
use utoipa::ToSchema;

use crate::auth::AuthUser;
use crate::extract::{ApiJson, ApiPath};
use crate::responses::{reject, respond, ApiResult};
use crate::schemas::{ApiResponse, AppState};

/// Loan response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoanResponse {
    pub id: i32,
    /// `Auto`, `Rapid` or `Insurance`
    pub loan_type: String,
    pub amount: Decimal,
    /// `GEL`, `EUR` or `USD`
    pub currency: String,
    /// Repayment period in months
    pub loan_period: i32,
    /// `InProgress`, `Approved` or `Declined`
    pub status: String,
    /// Owner of the loan
    pub user_id: i32,
}

impl From<loan::Model> for LoanResponse {
    fn from(model: loan::Model) -> Self {
        Self {
            id: model.id,
            loan_type: model.loan_type.to_string(),
            amount: model.amount,
            currency: model.currency.to_string(),
            loan_period: model.loan_period,
            status: model.status.to_string(),
            user_id: model.user_id,
        }
    }
}

/// List loans: every loan for accountants, own loans otherwise
#[utoipa::path(
    get,
    path = "/api/v1/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Loans retrieved successfully", body = ApiResponse<Vec<LoanResponse>>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Role not allowed to list loans", body = ErrorResponse),
        (status = 404, description = "No loans found for this user", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_loans(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
) -> ApiResult<Vec<LoanResponse>> {
    trace!("Entering get_loans function");
    let outcome = state.loans.list_loans(&ctx).await.map_err(reject)?;
    debug!("Returning {} loans", outcome.data.len());

    let outcome = outcome.map(|loans| loans.into_iter().map(LoanResponse::from).collect::<Vec<_>>());
    Ok(Json(ApiResponse::from(outcome)))
}

/// Submit a new loan for the caller
#[utoipa::path(
    post,
    path = "/api/v1/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = CreateLoanRequest,
    responses(
        (status = 200, description = "Loan added successfully", body = ApiResponse<LoanResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "User is blocked", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_loan(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    ApiJson(request): ApiJson<CreateLoanRequest>,
) -> ApiResult<LoanResponse> {
    trace!("Entering create_loan function");
    state.loans.create_loan(&ctx, request).await.map(respond).map_err(reject)
}

/// Get a loan by ID
#[utoipa::path(
    get,
    path = "/api/v1/loans/{loan_id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("loan_id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan retrieved successfully", body = ApiResponse<LoanResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Loan belongs to another user", body = ErrorResponse),
        (status = 404, description = "Loan not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_loan(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    ApiPath(loan_id): ApiPath<i32>,
) -> ApiResult<LoanResponse> {
    trace!("Entering get_loan function");
    state.loans.get_loan(&ctx, loan_id).await.map(respond).map_err(reject)
}

/// Update a loan. Owners edit the terms of pending loans; accountants also set the status.
#[utoipa::path(
    put,
    path = "/api/v1/loans/{loan_id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("loan_id" = i32, Path, description = "Loan ID")
    ),
    request_body = UpdateLoanRequest,
    responses(
        (status = 200, description = "Loan updated successfully", body = ApiResponse<LoanResponse>),
        (status = 400, description = "Invalid request or missing status", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Loan belongs to another user or is already reviewed", body = ErrorResponse),
        (status = 404, description = "Loan not found", body = ErrorResponse),
        (status = 409, description = "Loan was changed concurrently", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_loan(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    ApiPath(loan_id): ApiPath<i32>,
    ApiJson(request): ApiJson<UpdateLoanRequest>,
) -> ApiResult<LoanResponse> {
    trace!("Entering update_loan function");
    state
        .loans
        .update_loan(&ctx, loan_id, request)
        .await
        .map(respond)
        .map_err(reject)
}

/// Delete a loan
#[utoipa::path(
    delete,
    path = "/api/v1/loans/{loan_id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("loan_id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan deleted, data is the deleted ID", body = ApiResponse<i32>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Loan belongs to another user or is already reviewed", body = ErrorResponse),
        (status = 404, description = "Loan not found", body = ErrorResponse),
        (status = 409, description = "Loan was changed concurrently", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_loan(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    ApiPath(loan_id): ApiPath<i32>,
) -> ApiResult<i32> {
    trace!("Entering delete_loan function");
    state.loans.delete_loan(&ctx, loan_id).await.map(respond).map_err(reject)
}
