//! HTTP host of the dashboard. Serves the page and answers each selector change with the voyage
//! summary and the map, all read from the shared datasets.
//! Date: 2025-06-17

use crate::*;   // To use everything from the crate

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;

/// The dashboard page, it calls back into the api below on every selector change
const INDEX_HTML: &str = include_str!("../assets/index.html");

/// Runs the dashboard until the process is stopped
pub async fn run(address: SocketAddr, dashboard: Dashboard) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(address).await?;
    log::info!("Voyage calculator listening on http://{}", address);

    axum::serve(listener, router(Arc::new(dashboard))).await?;
    return Ok(());
}

pub fn router(dashboard: Arc<Dashboard>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/options", get(options))
        .route("/api/voyage", get(voyage))
        .route("/api/map", get(map))
        .route("/api/figure", get(map_figure))
        .fallback(not_found)
        .with_state(dashboard)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn options(State(dashboard): State<Arc<Dashboard>>) -> Json<DashboardOptions> {
    Json(dashboard.options())
}

async fn voyage(State(dashboard): State<Arc<Dashboard>>, Query(selection): Query<Selection>) -> Json<VoyageSummary> {
    log::debug!("Voyage lookup for {:?}", selection);
    Json(dashboard.summary(&selection))
}

async fn map(State(dashboard): State<Arc<Dashboard>>, Query(selection): Query<Selection>) -> std::result::Result<Json<serde_json::Value>, AppError> {
    log::debug!("Map for {:?}", selection);
    let map = serde_json::to_value(dashboard.map(&selection))?;
    Ok(Json(map))
}

async fn map_figure(State(dashboard): State<Arc<Dashboard>>, Query(selection): Query<Selection>) -> std::result::Result<Json<serde_json::Value>, AppError> {
    log::debug!("Figure for {:?}", selection);
    let plot = serde_json::to_value(dashboard.figure(&selection))?;
    Ok(Json(plot))
}

async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found.")
}

#[derive(Serialize)]
struct ErrorMessage {
    code: u16,
    message: String,
}

fn error_response(code: StatusCode, message: &str) -> Response {
    let body = Json(ErrorMessage {
        code: code.as_u16(),
        message: message.into(),
    });
    (code, body).into_response()
}

/// Any crate error reaching a handler, answered with a 500
#[derive(Debug)]
struct AppError(Error);

impl<E: Into<Error>> From<E> for AppError {
    fn from(error: E) -> Self {
        AppError(error.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        log::error!("Error: {}", self.0);
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.")
    }
}
