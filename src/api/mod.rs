//! Read API layer: route handlers, DTOs, router composition, and the
//! OpenAPI document.
//!
//! The API only reads what the aggregation cycle last committed.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI description of the read API.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "AMM price oracle", description = "Token prices and 24 h pool volume"),
    paths(
        handlers::token::list_token_prices,
        handlers::token::get_token_price,
        handlers::pool::list_pool_volumes,
        handlers::system::health_handler,
    ),
    components(schemas(
        dto::TokenPriceDto,
        dto::PoolVolumeDto,
        handlers::system::HealthResponse,
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
    )),
    tags(
        (name = "Tokens", description = "Token USD prices"),
        (name = "Pools", description = "Pool reserves and rolling volume"),
        (name = "System", description = "Service status"),
    )
)]
pub struct ApiDoc;

/// Builds the complete read router, with Swagger UI at `/docs` when the
/// `swagger-ui` feature is enabled.
pub fn build_router() -> Router<AppState> {
    let router = handlers::routes();

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}
