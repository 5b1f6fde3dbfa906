use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod extract;
pub mod routes;

use error::{AppError, ErrorBody, ErrorResponse};
use routes::{companies, invoices, StatusResponse};

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
}

/// Health check endpoint, succeeds only when the database answers
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = String),
        (status = 500, description = "Database unreachable", body = ErrorResponse)
    )
)]
async fn health_check(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    state.db.ping().await?;
    Ok((StatusCode::OK, "Service is healthy"))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

async fn not_found() -> AppError {
    AppError::NotFound("Not Found".to_string())
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "BizTime API",
        version = "0.1.0",
        description = "Companies and the invoices billed to them"
    ),
    paths(
        health_check,
        companies::list_companies,
        companies::get_company,
        companies::create_company,
        companies::update_company,
        companies::delete_company,
        invoices::list_invoices,
        invoices::get_invoice,
        invoices::create_invoice,
        invoices::update_invoice,
        invoices::delete_invoice,
        invoices::list_company_invoices
    ),
    components(schemas(
        entities::company::Model,
        entities::CompanySummary,
        entities::invoice::Model,
        entities::InvoiceSummary,
        companies::NewCompany,
        companies::CompanyChanges,
        companies::CompanyListResponse,
        companies::CompanyResponse,
        invoices::NewInvoice,
        invoices::InvoiceChanges,
        invoices::InvoiceListResponse,
        invoices::InvoiceResponse,
        invoices::InvoiceDetailResponse,
        invoices::CompanyInvoicesResponse,
        StatusResponse,
        ErrorResponse,
        ErrorBody
    )),
    tags(
        (name = "Companies", description = "Companies, keyed by code"),
        (name = "Invoices", description = "Invoices billed to companies")
    )
)]
pub struct ApiDoc;

/// Create the application with all routes and middleware
pub fn create_app(db: DatabaseConnection) -> Router {
    let state = AppState { db };

    let api_routes = Router::new()
        .merge(companies::routes())
        .merge(invoices::routes())
        .route("/health", get(health_check));

    Router::new()
        .merge(api_routes)
        .route("/api-doc/openapi.json", get(openapi_json))
        .fallback(not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
