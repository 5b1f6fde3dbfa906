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

use crate::entities::{company, invoice, Company, Invoice, InvoiceSummary};
use crate::error::{AppError, ErrorResponse};
use crate::extract::{AppJson, AppPath};
use crate::routes::StatusResponse;
use crate::AppState;

/// Request body for creating an invoice. `paid`, `add_date` and `paid_date`
/// are filled in by the database.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct NewInvoice {
    /// Code of the company being billed
    pub comp_code: Option<String>,
    pub amt: Option<f64>,
}

/// Request body for updating an invoice; only the amount can change
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct InvoiceChanges {
    pub amt: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvoiceListResponse {
    pub invoices: Vec<InvoiceSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvoiceResponse {
    pub invoice: invoice::Model,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvoiceDetailResponse {
    pub invoice: invoice::Model,
    /// Owning company, `null` if the row referenced by `comp_code` is gone
    pub company: Option<company::Model>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CompanyInvoicesResponse {
    pub invoices: Vec<invoice::Model>,
}

fn no_such_invoice(id: i32) -> AppError {
    AppError::NotFound(format!("No such invoice: {}", id))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/invoices", get(list_invoices).post(create_invoice))
        .route(
            "/invoices/{id}",
            get(get_invoice).put(update_invoice).delete(delete_invoice),
        )
        .route("/invoices/companies/{code}", get(list_company_invoices))
}

/// List all invoices
#[utoipa::path(
    get,
    path = "/invoices",
    tag = "Invoices",
    responses(
        (status = 200, description = "Id and company code of every invoice", body = InvoiceListResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn list_invoices(
    State(state): State<AppState>,
) -> Result<Json<InvoiceListResponse>, AppError> {
    let invoices = Invoice::find()
        .select_only()
        .columns([invoice::Column::Id, invoice::Column::CompCode])
        .into_model::<InvoiceSummary>()
        .all(&state.db)
        .await?;

    Ok(Json(InvoiceListResponse { invoices }))
}

/// Get a single invoice together with the company it bills
#[utoipa::path(
    get,
    path = "/invoices/{id}",
    tag = "Invoices",
    params(("id" = i32, Path, description = "Invoice id")),
    responses(
        (status = 200, description = "The invoice and its company", body = InvoiceDetailResponse),
        (status = 404, description = "No invoice with this id", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn get_invoice(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<Json<InvoiceDetailResponse>, AppError> {
    // One LEFT JOIN, so invoice and company are read together
    let (invoice, company) = Invoice::find_by_id(id)
        .find_also_related(Company)
        .one(&state.db)
        .await?
        .ok_or_else(|| no_such_invoice(id))?;

    if company.is_none() {
        tracing::warn!(id, comp_code = %invoice.comp_code, "invoice references a missing company");
    }

    Ok(Json(InvoiceDetailResponse { invoice, company }))
}

/// Create an invoice
#[utoipa::path(
    post,
    path = "/invoices",
    tag = "Invoices",
    request_body = NewInvoice,
    responses(
        (status = 201, description = "Invoice created", body = InvoiceResponse),
        (status = 500, description = "Rejected by the database, e.g. unknown company or missing amount", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, new), fields(comp_code = ?new.comp_code))]
pub async fn create_invoice(
    State(state): State<AppState>,
    AppJson(new): AppJson<NewInvoice>,
) -> Result<(StatusCode, Json<InvoiceResponse>), AppError> {
    let invoice = invoice::ActiveModel {
        comp_code: new.comp_code.map_or(NotSet, Set),
        amt: new.amt.map_or(NotSet, Set),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!(id = invoice.id, "invoice created");
    Ok((StatusCode::CREATED, Json(InvoiceResponse { invoice })))
}

/// Change the amount of an invoice
#[utoipa::path(
    put,
    path = "/invoices/{id}",
    tag = "Invoices",
    params(("id" = i32, Path, description = "Invoice id")),
    request_body = InvoiceChanges,
    responses(
        (status = 200, description = "The updated invoice", body = InvoiceResponse),
        (status = 404, description = "No invoice with this id", body = ErrorResponse),
        (status = 500, description = "Rejected by the database, e.g. missing amount", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, changes))]
pub async fn update_invoice(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(changes): AppJson<InvoiceChanges>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let result = Invoice::update_many()
        .col_expr(invoice::Column::Amt, Expr::value(changes.amt))
        .filter(invoice::Column::Id.eq(id))
        .exec(&state.db)
        .await?;

    if result.rows_affected == 0 {
        return Err(no_such_invoice(id));
    }

    let invoice = Invoice::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| no_such_invoice(id))?;

    Ok(Json(InvoiceResponse { invoice }))
}

/// Delete an invoice
#[utoipa::path(
    delete,
    path = "/invoices/{id}",
    tag = "Invoices",
    params(("id" = i32, Path, description = "Invoice id")),
    responses(
        (status = 200, description = "Invoice deleted", body = StatusResponse),
        (status = 404, description = "No invoice with this id", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn delete_invoice(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<Json<StatusResponse>, AppError> {
    let result = Invoice::delete_by_id(id).exec(&state.db).await?;

    if result.rows_affected == 0 {
        return Err(no_such_invoice(id));
    }

    info!(id, "invoice deleted");
    Ok(Json(StatusResponse::deleted()))
}

/// List every invoice billed to one company.
///
/// An empty result is reported as 404, so a company without invoices looks
/// the same as an unknown company.
#[utoipa::path(
    get,
    path = "/invoices/companies/{code}",
    tag = "Invoices",
    params(("code" = String, Path, description = "Company code")),
    responses(
        (status = 200, description = "All invoices of the company", body = CompanyInvoicesResponse),
        (status = 404, description = "No invoices for this code", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn list_company_invoices(
    State(state): State<AppState>,
    AppPath(code): AppPath<String>,
) -> Result<Json<CompanyInvoicesResponse>, AppError> {
    let invoices = Invoice::find()
        .filter(invoice::Column::CompCode.eq(code.as_str()))
        .all(&state.db)
        .await?;

    if invoices.is_empty() {
        return Err(AppError::NotFound(format!("No such company: {}", code)));
    }

    Ok(Json(CompanyInvoicesResponse { invoices }))
}
