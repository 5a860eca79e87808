//! HTTP endpoints.

use std::collections::HashSet;

use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::info;

use data_loader::{Recommendation, load_courses, load_users};

use crate::process::{build_pipeline, run_recommendation_process};
use crate::schemas::{AppInfo, HealthResponse, InfoResponse, ProcessRequest, ProcessResponse};
use crate::state::AppState;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/engine/process", post(process))
        .route("/engine/test", post(test_pipeline))
        .route("/health", get(health_check))
        .route("/info", get(app_info))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Trigger a recommendation run. Replies 202 immediately; processing
/// continues on the runtime.
async fn process(
    State(state): State<AppState>,
    Json(request): Json<ProcessRequest>,
) -> (StatusCode, Json<ProcessResponse>) {
    info!("Received process request: batch_id={}", request.batch_id);
    let response = ProcessResponse::accepted(request.batch_id.clone());
    tokio::spawn(run_recommendation_process(state, request));
    (StatusCode::ACCEPTED, Json(response))
}

/// Health check endpoint (k8s liveness/readiness probes).
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime =
        (chrono::Utc::now() - state.started_at).num_milliseconds() as f64 / 1000.0;
    Json(HealthResponse {
        status: "UP",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: uptime,
    })
}

/// Application metadata endpoint.
async fn app_info(State(state): State<AppState>) -> Json<InfoResponse> {
    Json(InfoResponse {
        app: AppInfo {
            name: "recflow",
            version: env!("CARGO_PKG_VERSION"),
            description: "Batch course recommendation engine",
        },
        start_time: state.started_at,
    })
}

#[derive(Debug, Deserialize)]
struct TestQuery {
    top_k: Option<usize>,
}

/// Run the pipeline on directly uploaded `users_file` / `courses_file`
/// parts, bypassing object storage. Returns the recommendations inline.
async fn test_pipeline(
    State(state): State<AppState>,
    Query(query): Query<TestQuery>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let tmp_dir = tempfile::tempdir().map_err(internal_error)?;

    let mut users_path = None;
    let mut courses_path = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|err| (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()))?;
        let path = tmp_dir.path().join(format!("{name}.bin"));
        match name.as_str() {
            "users_file" => {
                tokio::fs::write(&path, &data).await.map_err(internal_error)?;
                users_path = Some(path);
            }
            "courses_file" => {
                tokio::fs::write(&path, &data).await.map_err(internal_error)?;
                courses_path = Some(path);
            }
            _ => {}
        }
    }
    let (users_path, courses_path) = users_path.zip(courses_path).ok_or((
        StatusCode::UNPROCESSABLE_ENTITY,
        "users_file and courses_file parts are required".to_string(),
    ))?;

    let top_k = query.top_k.unwrap_or(state.settings.default_top_k);
    let penalty_weights = state.settings.penalty_weights.clone();
    let result: Vec<Recommendation> = tokio::task::spawn_blocking(move || {
        let users = load_users(&users_path)?;
        let courses = load_courses(&courses_path)?;
        let pipeline = build_pipeline(penalty_weights)?;
        Ok::<_, anyhow::Error>(pipeline.run(&users, &courses, top_k)?)
    })
    .await
    .map_err(internal_error)?
    .map_err(|err| (StatusCode::UNPROCESSABLE_ENTITY, format!("{err:#}")))?;

    let total_users = result
        .iter()
        .map(|row| row.user_id.as_str())
        .collect::<HashSet<_>>()
        .len();
    Ok(Json(json!({
        "total_users": total_users,
        "total_recommendations": result.len(),
        "top_k": top_k,
        "recommendations": result,
    })))
}

fn internal_error<E: std::fmt::Display>(err: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}
