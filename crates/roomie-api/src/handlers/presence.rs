//! Presence lookups over HTTP.

use axum::Json;
use axum::extract::{Path, State};

use roomie_core::types::UserId;

use crate::dto::response::{ApiResponse, OnlineUsersResponse, PresenceResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/presence/online
pub async fn online_users(State(state): State<AppState>) -> Json<ApiResponse<OnlineUsersResponse>> {
    let user_ids = state.realtime.online_users();
    Json(ApiResponse::ok(OnlineUsersResponse {
        count: user_ids.len(),
        user_ids,
    }))
}

/// GET /api/presence/{user_id}
pub async fn user_presence(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<PresenceResponse>>, ApiError> {
    let user_id = UserId::new(user_id);
    if user_id.is_blank() {
        return Err(roomie_core::error::AppError::validation("user_id must not be blank").into());
    }
    let online = state.realtime.registry.is_online(&user_id);
    Ok(Json(ApiResponse::ok(PresenceResponse { user_id, online })))
}
