use axum::extract::Path;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info};
use serde_json::{Value, json};

use crate::config::ServerConfig;
use crate::data::{GenerateRequest, GenerateResponse, RosterRow};
use crate::error::ScheduleError;
use crate::roster::StudentRoster;
use crate::solver::{self, Timetable};

type ApiError = (StatusCode, Json<Value>);

fn reject(err: ScheduleError) -> ApiError {
    let status = match err {
        ScheduleError::Configuration(_) => StatusCode::BAD_REQUEST,
        ScheduleError::UnknownEntity { .. } => StatusCode::NOT_FOUND,
        ScheduleError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": err.to_string() })))
}

fn csv_response(body: String) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], body)
}

/// Runs one generation off the async executor. Each call owns its engine.
async fn run_generation(input: GenerateRequest) -> Result<Timetable, ApiError> {
    match tokio::task::spawn_blocking(move || solver::generate(&input)).await {
        Ok(result) => result.map_err(reject),
        Err(e) => {
            error!("Generation task failed: {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "generation task failed" })),
            ))
        }
    }
}

async fn generate_handler(
    Json(input): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let occupancy_day = input.occupancy_day;
    let timetable = run_generation(input).await?;
    let response = timetable.to_response(occupancy_day).map_err(reject)?;
    Ok(Json(response))
}

async fn generate_csv_handler(
    Json(input): Json<GenerateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let timetable = run_generation(input).await?;
    let body = timetable.to_csv().map_err(reject)?;
    Ok(csv_response(body))
}

async fn batches_handler() -> Json<Vec<&'static str>> {
    Json(StudentRoster::default().batches())
}

async fn batch_handler(Path(batch): Path<String>) -> Result<Json<Vec<RosterRow>>, ApiError> {
    StudentRoster::default()
        .timetable_for(&batch)
        .map(Json)
        .map_err(reject)
}

async fn batch_csv_handler(Path(batch): Path<String>) -> Result<impl IntoResponse, ApiError> {
    let body = StudentRoster::default().to_csv(&batch).map_err(reject)?;
    Ok(csv_response(body))
}

pub fn app() -> Router {
    Router::new()
        .route("/v1/timetable/generate", post(generate_handler))
        .route("/v1/timetable/generate.csv", post(generate_csv_handler))
        .route("/v1/students", get(batches_handler))
        .route("/v1/students/:batch", get(batch_handler))
        .route("/v1/students/:batch/csv", get(batch_csv_handler))
}

pub async fn run_server(config: ServerConfig) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app()).await
}
