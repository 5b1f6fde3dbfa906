use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use sea_orm::{
    sea_query::Expr,
    ActiveModelTrait, ActiveValue::{NotSet, Set}, ColumnTrait, EntityTrait, QueryFilter, QuerySelect,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::entities::{company, Company, CompanySummary};
use crate::error::{AppError, ErrorResponse};
use crate::extract::{AppJson, AppPath};
use crate::routes::StatusResponse;
use crate::AppState;

/// Request body for creating a company. `code` and `name` are required by
/// the table; leaving one out fails the insert.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct NewCompany {
    /// Unique short code, used as the key in every other route
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Request body for updating a company. A `code` field, if sent, is ignored:
/// the code in the path selects the row.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CompanyChanges {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CompanyListResponse {
    /// Every company, as `{code, name}`
    pub companies: Vec<CompanySummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CompanyResponse {
    pub company: company::Model,
}

fn no_such_company(code: &str) -> AppError {
    AppError::NotFound(format!("No such company: {}", code))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/companies", get(list_companies).post(create_company))
        .route(
            "/companies/{code}",
            get(get_company).put(update_company).delete(delete_company),
        )
}

/// List all companies
#[utoipa::path(
    get,
    path = "/companies",
    tag = "Companies",
    responses(
        (status = 200, description = "Code and name of every company", body = CompanyListResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn list_companies(
    State(state): State<AppState>,
) -> Result<Json<CompanyListResponse>, AppError> {
    let companies = Company::find()
        .select_only()
        .columns([company::Column::Code, company::Column::Name])
        .into_model::<CompanySummary>()
        .all(&state.db)
        .await?;

    Ok(Json(CompanyListResponse { companies }))
}

/// Get a single company by code
#[utoipa::path(
    get,
    path = "/companies/{code}",
    tag = "Companies",
    params(("code" = String, Path, description = "Company code")),
    responses(
        (status = 200, description = "The company", body = CompanyResponse),
        (status = 404, description = "No company with this code", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn get_company(
    State(state): State<AppState>,
    AppPath(code): AppPath<String>,
) -> Result<Json<CompanyResponse>, AppError> {
    let company = Company::find_by_id(code.as_str())
        .one(&state.db)
        .await?
        .ok_or_else(|| no_such_company(&code))?;

    Ok(Json(CompanyResponse { company }))
}

/// Create a company
#[utoipa::path(
    post,
    path = "/companies",
    tag = "Companies",
    request_body = NewCompany,
    responses(
        (status = 201, description = "Company created", body = CompanyResponse),
        (status = 500, description = "Rejected by the database, e.g. duplicate or missing code", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, new), fields(code = ?new.code))]
pub async fn create_company(
    State(state): State<AppState>,
    AppJson(new): AppJson<NewCompany>,
) -> Result<(StatusCode, Json<CompanyResponse>), AppError> {
    // Absent columns are left out of the INSERT for the table's NOT NULL to reject
    let company = company::ActiveModel {
        code: new.code.map_or(NotSet, Set),
        name: new.name.map_or(NotSet, Set),
        description: Set(new.description),
    }
    .insert(&state.db)
    .await?;

    info!(code = %company.code, "company created");
    Ok((StatusCode::CREATED, Json(CompanyResponse { company })))
}

/// Update a company's name and description
#[utoipa::path(
    put,
    path = "/companies/{code}",
    tag = "Companies",
    params(("code" = String, Path, description = "Company code")),
    request_body = CompanyChanges,
    responses(
        (status = 200, description = "The updated company", body = CompanyResponse),
        (status = 404, description = "No company with this code", body = ErrorResponse),
        (status = 500, description = "Rejected by the database, e.g. missing name", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, changes))]
pub async fn update_company(
    State(state): State<AppState>,
    AppPath(code): AppPath<String>,
    AppJson(changes): AppJson<CompanyChanges>,
) -> Result<Json<CompanyResponse>, AppError> {
    // A missing name is written as NULL; only an existing row can violate NOT NULL
    let result = Company::update_many()
        .col_expr(company::Column::Name, Expr::value(changes.name))
        .col_expr(company::Column::Description, Expr::value(changes.description))
        .filter(company::Column::Code.eq(code.as_str()))
        .exec(&state.db)
        .await?;

    if result.rows_affected == 0 {
        return Err(no_such_company(&code));
    }

    let company = Company::find_by_id(code.as_str())
        .one(&state.db)
        .await?
        .ok_or_else(|| no_such_company(&code))?;

    Ok(Json(CompanyResponse { company }))
}

/// Delete a company
#[utoipa::path(
    delete,
    path = "/companies/{code}",
    tag = "Companies",
    params(("code" = String, Path, description = "Company code")),
    responses(
        (status = 200, description = "Company deleted", body = StatusResponse),
        (status = 404, description = "No company with this code", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn delete_company(
    State(state): State<AppState>,
    AppPath(code): AppPath<String>,
) -> Result<Json<StatusResponse>, AppError> {
    let result = Company::delete_by_id(code.as_str()).exec(&state.db).await?;

    if result.rows_affected == 0 {
        return Err(no_such_company(&code));
    }

    info!(code = %code, "company deleted");
    Ok(Json(StatusResponse::deleted()))
}
