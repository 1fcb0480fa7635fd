//! Token price handlers.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::TokenPriceDto;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, OracleError};

/// `GET /token-prices` — List every known token with its latest price.
///
/// # Errors
///
/// Returns [`OracleError::Persistence`] if the store cannot be read.
#[utoipa::path(
    get,
    path = "/token-prices",
    tag = "Tokens",
    summary = "List token prices",
    description = "Returns every token the oracle has seen, ordered by account, with its latest USD price.",
    responses(
        (status = 200, description = "Token price list", body = Vec<TokenPriceDto>),
        (status = 500, description = "Store unavailable", body = ErrorResponse),
    )
)]
pub async fn list_token_prices(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, OracleError> {
    let tokens = state.store.find_all_tokens().await?;
    let data: Vec<TokenPriceDto> = tokens.into_iter().map(TokenPriceDto::from).collect();
    Ok(Json(data))
}

/// `GET /token-prices/{id}` — Get one token's price.
///
/// # Errors
///
/// Returns [`OracleError::TokenNotFound`] if the token is unknown.
#[utoipa::path(
    get,
    path = "/token-prices/{id}",
    tag = "Tokens",
    summary = "Get token price",
    params(
        ("id" = String, Path, description = "Token contract account"),
    ),
    responses(
        (status = 200, description = "Token price", body = TokenPriceDto),
        (status = 404, description = "Token not found", body = ErrorResponse),
    )
)]
pub async fn get_token_price(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, OracleError> {
    let token = state
        .store
        .find_token(&id)
        .await?
        .ok_or(OracleError::TokenNotFound(id))?;
    Ok(Json(TokenPriceDto::from(token)))
}

/// Token price routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/token-prices", get(list_token_prices))
        .route("/token-prices/{id}", get(get_token_price))
}
