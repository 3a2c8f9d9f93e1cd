use axum::extract::State;
use axum::Json;

use crate::envelope::ApiResponse;
use crate::state::AppState;
use fanout_core::TimeSnapshot;

/// GET /api/time — current time as `{formattedTime, epochMillis}`.
pub async fn get_time(State(app): State<AppState>) -> Json<ApiResponse<TimeSnapshot>> {
    Json(ApiResponse::success(app.clock.now(&app.time_format)))
}
