//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::persistence::Store;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Token and pool storage written by the aggregation cycle.
    pub store: Arc<dyn Store>,
}
