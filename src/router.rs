use crate::handlers::{
    auth::login,
    health::health_check,
    loans::{create_loan, delete_loan, get_loan, get_loans, update_loan},
    users::{
        change_user_status, delete_user, get_current_user, get_user, get_users, register_user,
    },
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Authentication
        .route("/api/v1/auth/login", post(login))
        // User routes
        .route("/api/v1/users", post(register_user))
        .route("/api/v1/users", get(get_users))
        .route("/api/v1/users/me", get(get_current_user))
        .route("/api/v1/users/:user_id", get(get_user))
        .route("/api/v1/users/:user_id", delete(delete_user))
        .route("/api/v1/users/:user_id/status", put(change_user_status))
        // Loan routes
        .route("/api/v1/loans", get(get_loans))
        .route("/api/v1/loans", post(create_loan))
        .route("/api/v1/loans/:loan_id", get(get_loan))
        .route("/api/v1/loans/:loan_id", put(update_loan))
        .route("/api/v1/loans/:loan_id", delete(delete_loan))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
