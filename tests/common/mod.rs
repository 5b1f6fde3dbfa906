#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use biztime::entities::{company, invoice};
use http_body_util::BodyExt; // For Response body handling
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ConnectOptions, ConnectionTrait, Database,
    DatabaseConnection,
};
use serde_json::Value;
use std::sync::Once;
use tower::ServiceExt; // For oneshot

static INIT: Once = Once::new();

fn setup_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt::try_init();
    });
}

const CREATE_COMPANIES: &str = "
    CREATE TABLE companies (
        code TEXT NOT NULL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        description TEXT
    )";

const CREATE_INVOICES: &str = "
    CREATE TABLE invoices (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        comp_code TEXT NOT NULL REFERENCES companies ON DELETE CASCADE,
        amt FLOAT NOT NULL,
        paid BOOLEAN NOT NULL DEFAULT 0,
        add_date DATE NOT NULL DEFAULT CURRENT_DATE,
        paid_date DATE,
        CHECK (amt > 0)
    )";

/// A fresh in-memory database with the companies/invoices schema.
///
/// The pool is pinned to a single connection: every SQLite in-memory
/// connection is its own database.
pub async fn test_db() -> DatabaseConnection {
    setup_tracing();

    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("failed to open in-memory database");
    db.execute_unprepared(CREATE_COMPANIES)
        .await
        .expect("failed to create companies");
    db.execute_unprepared(CREATE_INVOICES)
        .await
        .expect("failed to create invoices");
    db
}

pub async fn test_app() -> (Router, DatabaseConnection) {
    let db = test_db().await;
    (biztime::create_app(db.clone()), db)
}

pub async fn insert_company(
    db: &DatabaseConnection,
    code: &str,
    name: &str,
    description: Option<&str>,
) -> company::Model {
    company::ActiveModel {
        code: Set(code.to_string()),
        name: Set(name.to_string()),
        description: Set(description.map(str::to_string)),
    }
    .insert(db)
    .await
    .expect("failed to insert company")
}

/// The company used throughout the route tests
pub async fn insert_testla(db: &DatabaseConnection) -> company::Model {
    insert_company(db, "testla", "TESLA", Some("Maker of Cars.")).await
}

pub async fn insert_invoice(db: &DatabaseConnection, comp_code: &str, amt: f64) -> invoice::Model {
    invoice::ActiveModel {
        comp_code: Set(comp_code.to_string()),
        amt: Set(amt),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to insert invoice")
}

/// Insert an invoice without checking that `comp_code` names a company.
///
/// Foreign keys stay off for the rest of this connection, which is the whole
/// test database.
pub async fn insert_orphan_invoice(db: &DatabaseConnection, comp_code: &str, amt: f64) -> invoice::Model {
    db.execute_unprepared("PRAGMA foreign_keys = OFF")
        .await
        .expect("failed to disable foreign keys");
    insert_invoice(db, comp_code, amt).await
}

/// Send one request through the router and decode the JSON body.
/// Non-JSON bodies come back as `Value::String`.
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    match body {
        Some(json) => send_raw(app, method, uri, Some("application/json"), json.to_string()).await,
        None => send_raw(app, method, uri, None, String::new()).await,
    }
}

/// Like [`send`], with the body and content type passed through untouched.
pub async fn send_raw(
    app: &Router,
    method: Method,
    uri: &str,
    content_type: Option<&str>,
    body: String,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    let request = builder.body(Body::from(body)).unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

    (status, json)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

pub async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn put(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn delete(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::DELETE, uri, None).await
}
