//! Target registration endpoints

use axum::{Json, extract::State};
use tracing::debug;

use crate::api::{
    error::{ApiError, ApiResult},
    state::ApiState,
    types::{MessageResponse, WebsiteInput},
};
use crate::registry::TargetSnapshot;
use crate::util::normalize_url;

/// Normalized URL from a request body, or a 400
fn requested_url(input: &WebsiteInput) -> ApiResult<String> {
    normalize_url(&input.url).map_err(|e| ApiError::InvalidRequest(format!("{e:#}")))
}

/// GET /api/websites
///
/// Current snapshot of every monitored target
pub async fn list_websites(State(state): State<ApiState>) -> Json<Vec<TargetSnapshot>> {
    Json(state.engine.targets().await)
}

/// POST /api/websites
///
/// Register a target; listeners are notified before the response is sent
pub async fn add_website(
    State(state): State<ApiState>,
    Json(input): Json<WebsiteInput>,
) -> ApiResult<Json<MessageResponse>> {
    let url = requested_url(&input)?;
    debug!("request to add {url}");

    if !state.engine.add_target(url).await {
        return Err(ApiError::InvalidRequest("Website already exists".to_string()));
    }

    Ok(Json(MessageResponse::new("Website added")))
}

/// DELETE /api/websites
///
/// Remove a target; listeners are notified before the response is sent
pub async fn remove_website(
    State(state): State<ApiState>,
    Json(input): Json<WebsiteInput>,
) -> ApiResult<Json<MessageResponse>> {
    let url = requested_url(&input)?;
    debug!("request to remove {url}");

    if !state.engine.remove_target(&url).await {
        return Err(ApiError::NotFound("Website not found".to_string()));
    }

    Ok(Json(MessageResponse::new("Website removed")))
}
