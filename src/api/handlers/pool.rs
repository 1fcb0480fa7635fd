//! Pool volume handlers.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::PoolVolumeDto;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, OracleError};

/// `GET /pool-volumes` — List every pool with reserves and 24 h volume.
///
/// # Errors
///
/// Returns [`OracleError::Persistence`] if the store cannot be read.
#[utoipa::path(
    get,
    path = "/pool-volumes",
    tag = "Pools",
    summary = "List pool volumes",
    description = "Returns every pool ordered by id with its current reserves and the raw amounts traded in on each side over the last 24 hours.",
    responses(
        (status = 200, description = "Pool volume list", body = Vec<PoolVolumeDto>),
        (status = 500, description = "Store unavailable", body = ErrorResponse),
    )
)]
pub async fn list_pool_volumes(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, OracleError> {
    let pools = state.store.find_all_pools().await?;
    let data: Vec<PoolVolumeDto> = pools.into_iter().map(PoolVolumeDto::from).collect();
    Ok(Json(data))
}

/// Pool volume routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/pool-volumes", get(list_pool_volumes))
}
