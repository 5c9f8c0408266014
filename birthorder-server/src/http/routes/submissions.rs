//! Submission endpoints

use axum::{
    extract::{Path, Query, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use birthorder_core::{export_csv, validate, StatisticsOutcome, Submission};
use serde::Serialize;
use serde_json::{json, Value};

use crate::http::error::ApiError;
use crate::http::extractors::{ClientContext, SubmissionBody};
use crate::state::AppState;
use crate::store::{Pagination, PaginationParams};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub message: &'static str,
    pub submission_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub success: bool,
    pub count: usize,
    pub total: u64,
    pub page: u32,
    pub total_pages: u64,
    pub submissions: Vec<Submission>,
}

#[derive(Serialize)]
pub struct RegionResponse {
    pub success: bool,
    pub region: String,
    pub count: usize,
    pub submissions: Vec<Submission>,
}

/// POST /submit-data - validate and store one submission
async fn submit_data(
    State(state): State<AppState>,
    ClientContext(context): ClientContext,
    SubmissionBody(body): SubmissionBody,
) -> Result<Json<SubmitResponse>, ApiError> {
    let submission = validate(&body, context).inspect_err(|e| {
        tracing::info!(error = %e, "submission rejected");
    })?;
    let stored = state.store().create(submission).await?;
    tracing::info!(id = %stored.id, region = %stored.region, "submission stored");

    Ok(Json(SubmitResponse {
        success: true,
        message: "Data submitted successfully",
        submission_id: stored.id,
    }))
}

/// GET /submissions - newest first, paginated
async fn list_submissions(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ListResponse>, ApiError> {
    let page = state.store().list(Pagination::from(params)).await?;

    Ok(Json(ListResponse {
        success: true,
        count: page.items.len(),
        total: page.total,
        page: page.page,
        total_pages: page.total_pages(),
        submissions: page.items,
    }))
}

/// GET /submissions/region/{region}
async fn submissions_by_region(
    State(state): State<AppState>,
    Path(region): Path<String>,
) -> Result<Json<RegionResponse>, ApiError> {
    let submissions = state.store().list_by_region(&region).await?;

    Ok(Json(RegionResponse {
        success: true,
        count: submissions.len(),
        region,
        submissions,
    }))
}

/// GET /statistics
async fn statistics(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let body = match state.store().statistics().await? {
        StatisticsOutcome::NoData => json!({
            "success": true,
            "message": "No submissions yet",
            "statistics": {},
        }),
        StatisticsOutcome::Computed(stats) => json!({
            "success": true,
            "statistics": stats,
        }),
    };
    Ok(Json(body))
}

/// GET /export-csv - every record as a CSV download
async fn export(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let store = state.store();
    let records = store.all().await?;
    let csv = export_csv(&records, store.export_layout())?;
    tracing::info!(rows = records.len(), "exported submissions");

    Ok((
        [
            (CONTENT_TYPE, "text/csv"),
            (CONTENT_DISPOSITION, "attachment; filename=\"submissions.csv\""),
        ],
        csv,
    ))
}

/// Submission routes, including the `/submissions/...` aliases
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/submit-data", post(submit_data))
        .route("/submissions/submit-data", post(submit_data))
        .route("/submissions", get(list_submissions))
        .route("/submissions/region/{region}", get(submissions_by_region))
        .route("/statistics", get(statistics))
        .route("/submissions/statistics", get(statistics))
        .route("/export-csv", get(export))
        .route("/submissions/export-csv", get(export))
}
