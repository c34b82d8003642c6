use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use service::{LoanService, Outcome, UserService};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

use crate::handlers::{
    auth::LoginResponse,
    loans::LoanResponse,
    users::{UserProfileResponse, UserResponse},
};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    pub loans: LoanService,
    pub users: UserService,
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

impl<T> From<Outcome<T>> for ApiResponse<T> {
    fn from(outcome: Outcome<T>) -> Self {
        Self {
            data: outcome.data,
            message: outcome.message,
            success: true,
        }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::auth::login,
        crate::handlers::users::register_user,
        crate::handlers::users::get_users,
        crate::handlers::users::get_current_user,
        crate::handlers::users::get_user,
        crate::handlers::users::delete_user,
        crate::handlers::users::change_user_status,
        crate::handlers::loans::get_loans,
        crate::handlers::loans::create_loan,
        crate::handlers::loans::get_loan,
        crate::handlers::loans::update_loan,
        crate::handlers::loans::delete_loan,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            service::LoginRequest,
            service::RegisterUserRequest,
            service::CreateLoanRequest,
            service::UpdateLoanRequest,
            LoginResponse,
            UserResponse,
            UserProfileResponse,
            LoanResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "users", description = "User registration and account management"),
        (name = "loans", description = "Loan submission and review"),
    ),
    info(
        title = "LoanAPI",
        description = "Loan management API - users submit loan requests, accountants review them",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
