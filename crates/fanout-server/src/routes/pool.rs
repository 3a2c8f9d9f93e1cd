use axum::extract::State;
use axum::Json;

use crate::envelope::ApiResponse;
use crate::state::AppState;
use fanout_core::pool::PoolStats;

/// GET /api/pool — execution pool counters.
pub async fn get_pool(State(app): State<AppState>) -> Json<ApiResponse<PoolStats>> {
    Json(ApiResponse::success(app.orchestrator.pool().stats()))
}
