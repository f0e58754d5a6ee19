use std::sync::Arc;

use lms_core::storage::FileStorage;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc` or is a pool handle.
#[derive(Clone)]
pub struct AppState {
    pub pool: lms_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Destination for uploaded materials, resources and editor media.
    pub storage: Arc<dyn FileStorage>,
}
