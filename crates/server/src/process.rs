//! The background recommendation job.
//!
//! One request runs download → load → pipeline → upload → callback. Failures
//! are reported through the failure callback with an error code derived from
//! the concrete error type; nothing partial is uploaded.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{error, info};

use data_loader::{load_courses, load_users, write_recommendations};
use pipeline::{
    Adjuster, ExclusionFilter, LevelWeightAdjuster, RecommendationPipeline, TfidfScorer,
};

use crate::error::error_code;
use crate::schemas::{CallbackFailurePayload, CallbackSuccessPayload, ProcessRequest};
use crate::state::AppState;

/// Run the whole recommendation process for one request.
///
/// Never propagates errors: outcomes are reported via the callback URL when
/// one was given, and logged either way.
pub async fn run_recommendation_process(state: AppState, request: ProcessRequest) {
    let batch_id = request.batch_id.clone();
    info!(batch_id = %batch_id, "Process started");

    match execute(&state, &request).await {
        Ok((result_key, user_count)) => {
            if let Some(url) = &request.callback_url {
                let payload =
                    CallbackSuccessPayload::new(batch_id.clone(), result_key, user_count);
                if let Err(err) = state.callback.send_success(url, &payload).await {
                    error!(batch_id = %batch_id, "Success callback failed: {err}");
                }
            }
            info!(batch_id = %batch_id, "Process completed successfully");
        }
        Err(err) => {
            error!(batch_id = %batch_id, "Process failed: {err:#}");
            if let Some(url) = &request.callback_url {
                let payload = CallbackFailurePayload::new(
                    batch_id.clone(),
                    error_code(&err).to_string(),
                    format!("{err:#}"),
                );
                if let Err(cb_err) = state.callback.send_failure(url, &payload).await {
                    error!(batch_id = %batch_id, "Callback also failed: {cb_err}");
                }
            }
        }
    }
}

/// Build the pipeline the way the settings describe it: `None` weights skip
/// the adjustment stage entirely.
pub fn build_pipeline(
    penalty_weights: Option<Vec<f64>>,
) -> pipeline::Result<RecommendationPipeline> {
    let adjuster: Option<Box<dyn Adjuster>> = match penalty_weights {
        Some(weights) => Some(Box::new(LevelWeightAdjuster::new(weights)?)),
        None => None,
    };
    Ok(RecommendationPipeline::new(
        TfidfScorer,
        ExclusionFilter,
        adjuster,
    ))
}

/// Run the pipeline over local dataset files and write the result next to
/// them. Loading and the pipeline are CPU-bound, so the caller is expected
/// to run this on a blocking thread.
pub fn run_local(
    users_path: &Path,
    courses_path: &Path,
    result_path: &Path,
    penalty_weights: Option<Vec<f64>>,
    top_k: usize,
) -> Result<(usize, usize)> {
    let users = load_users(users_path)?;
    let courses = load_courses(courses_path)?;

    let pipeline = build_pipeline(penalty_weights)?;
    let result = pipeline.run(&users, &courses, top_k)?;

    let user_count = result
        .iter()
        .map(|row| row.user_id.as_str())
        .collect::<HashSet<_>>()
        .len();
    let row_count = result.len();
    write_recommendations(result_path, &result)?;
    Ok((user_count, row_count))
}

async fn execute(state: &AppState, request: &ProcessRequest) -> Result<(String, usize)> {
    let tmp_dir = tempfile::tempdir().context("failed to create temp dir")?;
    let tmp_path = tmp_dir.path();

    let users_path = state
        .storage
        .download_file(&request.users_file_path, &tmp_path.join("users.parquet"))
        .await?;
    let courses_path = state
        .storage
        .download_file(
            &request.courses_file_path,
            &tmp_path.join("courses.parquet"),
        )
        .await?;

    let top_k = request.top_k.unwrap_or(state.settings.default_top_k);
    let penalty_weights = state.settings.penalty_weights.clone();
    let result_path = tmp_path.join("recommendations.parquet");

    let (user_count, row_count) = {
        let result_path = result_path.clone();
        tokio::task::spawn_blocking(move || {
            run_local(&users_path, &courses_path, &result_path, penalty_weights, top_k)
        })
        .await
        .context("pipeline task panicked")??
    };
    info!(
        "Pipeline produced {row_count} recommendations for {user_count} users"
    );

    let today = Utc::now().format("%Y/%m/%d");
    let result_key = format!(
        "results/{today}/{}/recommendations.parquet",
        request.batch_id
    );
    state.storage.upload_file(&result_path, &result_key).await?;

    Ok((result_key, user_count))
}
