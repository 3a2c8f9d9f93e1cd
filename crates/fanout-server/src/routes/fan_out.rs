use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;

use crate::envelope::ApiResponse;
use crate::error::AppError;
use crate::state::AppState;
use fanout_core::ResultRecord;

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FanOutParams {
    pub task_count: Option<i64>,
}

/// GET /api/fan-out?taskCount=<n> — run `n` units and return their records
/// in submission order.
pub async fn fan_out(
    State(app): State<AppState>,
    params: Result<Query<FanOutParams>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<ResultRecord>>>, AppError> {
    let Query(params) = params.map_err(|e| AppError::bad_request(e.body_text()))?;
    let requested = params
        .task_count
        .unwrap_or(app.config.tasks.default_count as i64);
    let count = app.config.tasks.check_count(requested)?;

    let records = app.orchestrator.run_all(count).await?;
    Ok(Json(ApiResponse::success(records)))
}
